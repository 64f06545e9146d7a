//! Value model for configuration symbols.
//!
//! Boolean and tristate symbols take values from the ordered domain
//! `n < m < y` ([`Tristate`]). Integer, hex and string symbols carry a
//! scalar ([`Value::Scalar`]) that relations compare directly.
//!
//! # Examples
//!
//! ```
//! use confmerge_core::Tristate;
//!
//! assert!(Tristate::No < Tristate::Module);
//! assert_eq!(Tristate::Yes.negate(), Tristate::No);
//! assert_eq!(Tristate::Module.negate(), Tristate::Module);
//! assert_eq!("m".parse::<Tristate>(), Ok(Tristate::Module));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Three-valued setting: absent, built as a loadable module, or built in.
///
/// The derived ordering follows the numeric levels `n = 0`, `m = 1`, `y = 2`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub enum Tristate {
    #[default]
    #[serde(rename = "n")]
    No,
    #[serde(rename = "m")]
    Module,
    #[serde(rename = "y")]
    Yes,
}

impl Tristate {
    /// All values in ascending order.
    pub const ALL: [Tristate; 3] = [Tristate::No, Tristate::Module, Tristate::Yes];

    /// Numeric level (`0`, `1` or `2`).
    pub fn level(self) -> u8 {
        match self {
            Tristate::No => 0,
            Tristate::Module => 1,
            Tristate::Yes => 2,
        }
    }

    /// Inverse of [`level`](Self::level). Levels above 2 saturate to `y`.
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => Tristate::No,
            1 => Tristate::Module,
            _ => Tristate::Yes,
        }
    }

    /// Logical negation, `2 - level`. Maps `n` and `y` onto each other and
    /// leaves `m` unchanged.
    pub fn negate(self) -> Self {
        Self::from_level(2 - self.level())
    }

    /// Maps a boolean to `y` or `n`.
    pub fn from_bool(value: bool) -> Self {
        if value { Tristate::Yes } else { Tristate::No }
    }

    /// The `.config` spelling: `"n"`, `"m"` or `"y"`.
    pub fn as_str(self) -> &'static str {
        match self {
            Tristate::No => "n",
            Tristate::Module => "m",
            Tristate::Yes => "y",
        }
    }
}

impl fmt::Display for Tristate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of `n`, `m`, `y`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid tristate value: {0:?}")]
pub struct ParseTristateError(pub String);

impl FromStr for Tristate {
    type Err = ParseTristateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "n" => Ok(Tristate::No),
            "m" => Ok(Tristate::Module),
            "y" => Ok(Tristate::Yes),
            other => Err(ParseTristateError(other.to_string())),
        }
    }
}

/// Declared type of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SymbolKind {
    Bool,
    Tristate,
    Int,
    Hex,
    String,
    /// Untyped symbols and quoted literal constants.
    #[default]
    Unknown,
}

impl SymbolKind {
    /// `true` for bool and tristate kinds.
    pub fn is_tristate_like(self) -> bool {
        matches!(self, SymbolKind::Bool | SymbolKind::Tristate)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Bool => "bool",
            SymbolKind::Tristate => "tristate",
            SymbolKind::Int => "int",
            SymbolKind::Hex => "hex",
            SymbolKind::String => "string",
            SymbolKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A symbol value: tri-valued for bool/tristate kinds, scalar otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Tri(Tristate),
    Scalar(String),
}

impl Value {
    /// The minimal value for `kind`: `n` for bool/tristate, empty otherwise.
    pub fn minimal(kind: SymbolKind) -> Self {
        if kind.is_tristate_like() {
            Value::Tri(Tristate::No)
        } else {
            Value::Scalar(String::new())
        }
    }

    /// Textual form, as it would appear on the right of `CONFIG_X=`.
    pub fn as_str(&self) -> &str {
        match self {
            Value::Tri(tri) => tri.as_str(),
            Value::Scalar(s) => s,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Tri(tri) => write!(f, "{tri}"),
            Value::Scalar(s) if s.is_empty() => f.write_str("\"\""),
            Value::Scalar(s) => f.write_str(s),
        }
    }
}

impl From<Tristate> for Value {
    fn from(tri: Tristate) -> Self {
        Value::Tri(tri)
    }
}

/// Parses `text` as an integer the way a symbol of `kind` is read.
///
/// Int symbols are decimal, hex symbols are base 16 with an optional `0x`
/// prefix. Untyped values auto-detect `0x`, `0o` and `0b` prefixes and fall
/// back to decimal. Returns `None` when the text is not a number.
pub fn parse_number(text: &str, kind: SymbolKind) -> Option<i64> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text.strip_prefix('+').unwrap_or(text)),
    };

    let magnitude = match kind {
        SymbolKind::Int => parse_digits(body, 10)?,
        SymbolKind::Hex => parse_digits(strip_radix_prefix(body, 'x').unwrap_or(body), 16)?,
        _ => {
            if let Some(digits) = strip_radix_prefix(body, 'x') {
                parse_digits(digits, 16)?
            } else if let Some(digits) = strip_radix_prefix(body, 'o') {
                parse_digits(digits, 8)?
            } else if let Some(digits) = strip_radix_prefix(body, 'b') {
                parse_digits(digits, 2)?
            } else {
                parse_digits(body, 10)?
            }
        }
    };

    Some(if negative { -magnitude } else { magnitude })
}

/// Unsigned digits only; the sign has already been taken off.
fn parse_digits(digits: &str, radix: u32) -> Option<i64> {
    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return None;
    }
    i64::from_str_radix(digits, radix).ok()
}

fn strip_radix_prefix(text: &str, marker: char) -> Option<&str> {
    let mut chars = text.chars();
    if chars.next() != Some('0') {
        return None;
    }
    match chars.next() {
        Some(c) if c.eq_ignore_ascii_case(&marker) => Some(chars.as_str()),
        _ => None,
    }
}
