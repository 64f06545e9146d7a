//! Reading and writing `.config` fragments.
//!
//! A fragment is a list of `CONFIG_NAME=value` lines. `# CONFIG_NAME is not
//! set` assigns `n`. Blank lines and other comments are ignored. String
//! values are double-quoted with `\"` and `\\` escapes.
//!
//! # Example
//!
//! ```
//! use confmerge_core::{Tristate, Value};
//! use confmerge_db::ConfigFormat;
//!
//! let format = ConfigFormat::default();
//! let text = "CONFIG_NET=y\n# CONFIG_USB is not set\nCONFIG_NAME=\"box\"\n";
//! let assignments = format.parse(text, "inline").unwrap();
//!
//! assert_eq!(assignments[0].name, "NET");
//! assert_eq!(assignments[1].value, Value::Tri(Tristate::No));
//! assert_eq!(assignments[2].value, Value::Scalar("box".into()));
//! ```

use std::fmt::Write as _;
use std::path::Path;

use confmerge_core::{Assignment, SymbolKind, SymbolTable, Tristate, Value};
use regex::Regex;

use crate::error::{DatabaseError, Result};

/// Prefix used by default for symbol names in `.config` files.
pub const DEFAULT_PREFIX: &str = "CONFIG_";

const HEADER: &str = "#\n# Automatically generated file; DO NOT EDIT.\n# Merged by confmerge\n#\n";

/// `.config` syntax for a given symbol prefix.
#[derive(Debug, Clone)]
pub struct ConfigFormat {
    prefix: String,
    set_line: Regex,
    unset_line: Regex,
}

impl Default for ConfigFormat {
    fn default() -> Self {
        Self {
            prefix: DEFAULT_PREFIX.to_string(),
            set_line: set_pattern(DEFAULT_PREFIX).expect("static regex must compile"),
            unset_line: unset_pattern(DEFAULT_PREFIX).expect("static regex must compile"),
        }
    }
}

fn set_pattern(prefix: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!(r"^{}([A-Za-z0-9_]+)=(.*)$", regex::escape(prefix)))
}

fn unset_pattern(prefix: &str) -> std::result::Result<Regex, regex::Error> {
    Regex::new(&format!(
        r"^#\s*{}([A-Za-z0-9_]+) is not set\s*$",
        regex::escape(prefix)
    ))
}

impl ConfigFormat {
    /// Creates a format using `prefix` in front of every symbol name.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidPrefix`] if the patterns cannot be
    /// built.
    pub fn new(prefix: &str) -> Result<Self> {
        Ok(Self {
            prefix: prefix.to_string(),
            set_line: set_pattern(prefix)?,
            unset_line: unset_pattern(prefix)?,
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Parses fragment text. `origin` labels parse errors.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Parse`] for non-comment lines that are not
    /// assignments, or for unterminated quoted values.
    pub fn parse(&self, text: &str, origin: &str) -> Result<Vec<Assignment>> {
        let mut assignments = Vec::new();

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim_end();

            if let Some(caps) = self.unset_line.captures(line) {
                assignments.push(
                    Assignment::new(&caps[1], Value::Tri(Tristate::No)).at_line(line_no),
                );
                continue;
            }
            if line.trim().is_empty() || line.trim_start().starts_with('#') {
                continue;
            }

            let Some(caps) = self.set_line.captures(line) else {
                return Err(DatabaseError::Parse {
                    origin: origin.to_string(),
                    line: line_no,
                    message: format!("malformed line: {line}"),
                });
            };
            let value = unquote(&caps[2]).map_err(|message| DatabaseError::Parse {
                origin: origin.to_string(),
                line: line_no,
                message,
            })?;
            assignments.push(Assignment::new(&caps[1], Value::Scalar(value)).at_line(line_no));
        }

        Ok(assignments)
    }

    /// Reads and parses a fragment file.
    pub fn read(&self, path: impl AsRef<Path>) -> Result<Vec<Assignment>> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        self.parse(&text, &path.display().to_string())
    }

    /// Renders every named symbol's effective value.
    ///
    /// Bool/tristate symbols set to `n` are written as `is not set`
    /// comments. Scalar symbols with an empty value and untyped symbols are
    /// omitted.
    pub fn render(&self, table: &SymbolTable) -> String {
        let mut out = String::from(HEADER);
        let prefix = &self.prefix;

        for (_, symbol) in table.named() {
            let name = &symbol.name;
            match symbol.kind {
                SymbolKind::Bool | SymbolKind::Tristate => match symbol.tri_level() {
                    Tristate::No => {
                        let _ = writeln!(out, "# {prefix}{name} is not set");
                    }
                    tri => {
                        let _ = writeln!(out, "{prefix}{name}={tri}");
                    }
                },
                SymbolKind::String => {
                    let value = symbol.str_value();
                    if !value.is_empty() {
                        let _ = writeln!(out, "{prefix}{name}=\"{}\"", escape(&value));
                    }
                }
                SymbolKind::Int | SymbolKind::Hex => {
                    let value = symbol.str_value();
                    if !value.is_empty() {
                        let _ = writeln!(out, "{prefix}{name}={value}");
                    }
                }
                SymbolKind::Unknown => {}
            }
        }

        out
    }

    /// Writes the rendered configuration to `path`.
    pub fn write(&self, table: &SymbolTable, path: impl AsRef<Path>) -> Result<()> {
        std::fs::write(path, self.render(table))?;
        Ok(())
    }
}

fn unquote(raw: &str) -> std::result::Result<String, String> {
    let raw = raw.trim();
    let Some(body) = raw.strip_prefix('"') else {
        return Ok(raw.to_string());
    };

    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some(escaped) => out.push(escaped),
                None => break,
            },
            '"' => {
                let rest = chars.as_str().trim();
                if !rest.is_empty() {
                    return Err(format!("unexpected text after closing quote: {rest}"));
                }
                return Ok(out);
            }
            other => out.push(other),
        }
    }
    Err(format!("unterminated quoted value: {raw}"))
}

fn escape(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}
