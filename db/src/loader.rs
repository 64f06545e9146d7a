//! Schema database loading and configuration merging.
//!
//! Provides [`SchemaDatabase`], which owns the [`SymbolTable`] built from a
//! schema file and applies `.config` fragments to it.
//!
//! # Loading patterns
//!
//! ```no_run
//! use confmerge_core::ProcessOptions;
//! use confmerge_db::SchemaDatabase;
//!
//! // Load a YAML or JSON schema, chosen by file extension
//! let mut db = SchemaDatabase::from_file("schema.yml").unwrap();
//!
//! // Merge fragments in order; the first one listed wins conflicts
//! db.load_config("base.config").unwrap();
//! db.load_config("board.config").unwrap();
//!
//! let report = db.check(&ProcessOptions::default()).unwrap();
//! println!("{} unmet dependencies", report.unmet.len());
//! db.write_config(".config").unwrap();
//! ```

use std::path::{Path, PathBuf};

use confmerge_core::{
    MergeStrategy, MergeSummary, ProcessOptions, ProcessReport, Symbol, SymbolTable,
    merge_assignments, process,
};
use tracing::{debug, info};

use crate::config_file::ConfigFormat;
use crate::error::{DatabaseError, Result};
use crate::schema::SchemaFile;

/// Describes where a [`SchemaDatabase`] was loaded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseSource {
    /// Loaded from a schema file on disk.
    File(PathBuf),
    /// Parsed from an in-memory string.
    Inline,
    /// Built from an already-constructed [`SchemaFile`].
    Schema,
}

/// Symbol table plus the settings used to merge fragments into it.
///
/// # Examples
///
/// ```
/// use confmerge_core::Tristate;
/// use confmerge_db::SchemaDatabase;
///
/// let yaml = "symbols:\n  - name: NET\n    type: bool\n";
/// let mut db = SchemaDatabase::from_yaml_str(yaml).unwrap();
///
/// let summary = db.merge_str("CONFIG_NET=y\n", "inline").unwrap();
/// assert_eq!(summary.assigned, 1);
/// assert_eq!(db.get("NET").unwrap().tri_level(), Tristate::Yes);
/// ```
#[derive(Debug)]
pub struct SchemaDatabase {
    table: SymbolTable,
    source: DatabaseSource,
    format: ConfigFormat,
    strategy: MergeStrategy,
}

impl SchemaDatabase {
    fn new(table: SymbolTable, source: DatabaseSource) -> Self {
        Self {
            table,
            source,
            format: ConfigFormat::default(),
            strategy: MergeStrategy::default(),
        }
    }

    /// Loads a schema file, picking the parser from its extension
    /// (`.json`, `.yml` or `.yaml`).
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::UnsupportedFormat`] for other extensions,
    /// [`DatabaseError::IoError`] if the file cannot be read, or any error
    /// from [`SchemaFile::into_table`].
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str());
        let schema = match extension {
            Some("json") => {
                let file = std::fs::File::open(path)?;
                let reader = std::io::BufReader::new(file);
                serde_json::from_reader(reader)?
            }
            Some("yml" | "yaml") => {
                let file = std::fs::File::open(path)?;
                let reader = std::io::BufReader::new(file);
                serde_yaml::from_reader(reader)?
            }
            _ => return Err(DatabaseError::UnsupportedFormat(path.to_path_buf())),
        };

        let db = Self::build(schema, DatabaseSource::File(path.to_path_buf()))?;
        info!(path = %path.display(), symbols = db.len(), "loaded schema");
        Ok(db)
    }

    /// Parses a JSON schema document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Self::build(SchemaFile::from_json_str(text)?, DatabaseSource::Inline)
    }

    /// Parses a YAML schema document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Self::build(SchemaFile::from_yaml_str(text)?, DatabaseSource::Inline)
    }

    /// Builds a database from an in-memory schema.
    pub fn from_schema(schema: SchemaFile) -> Result<Self> {
        Self::build(schema, DatabaseSource::Schema)
    }

    fn build(schema: SchemaFile, source: DatabaseSource) -> Result<Self> {
        Ok(Self::new(schema.into_table()?, source))
    }

    /// Uses `prefix` instead of `CONFIG_` for `.config` lines.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::InvalidPrefix`] if the prefix cannot be
    /// turned into a line pattern.
    pub fn with_prefix(mut self, prefix: &str) -> Result<Self> {
        self.format = ConfigFormat::new(prefix)?;
        Ok(self)
    }

    /// Sets the conflict policy for later [`load_config`](Self::load_config)
    /// calls.
    pub fn with_strategy(mut self, strategy: MergeStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Reads a `.config` fragment and merges it into the table.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::IoError`] if the file cannot be read, or
    /// [`DatabaseError::Parse`] for malformed lines. Assignments to unknown
    /// symbols are skipped, not errors.
    pub fn load_config(&mut self, path: impl AsRef<Path>) -> Result<MergeSummary> {
        let path = path.as_ref();
        let assignments = self.format.read(path)?;
        let summary = merge_assignments(&mut self.table, &assignments, self.strategy);
        info!(
            path = %path.display(),
            assigned = summary.assigned,
            kept = summary.kept,
            skipped = summary.skipped,
            "merged fragment"
        );
        Ok(summary)
    }

    /// Merges fragment text. `origin` labels parse errors.
    pub fn merge_str(&mut self, text: &str, origin: &str) -> Result<MergeSummary> {
        let assignments = self.format.parse(text, origin)?;
        let summary = merge_assignments(&mut self.table, &assignments, self.strategy);
        debug!(origin, assigned = summary.assigned, "merged fragment text");
        Ok(summary)
    }

    /// Checks dependencies and optionally repairs them.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Dependency`] when repair hits an unsupported
    /// dependency shape or does not converge.
    pub fn check(&mut self, options: &ProcessOptions) -> Result<ProcessReport> {
        Ok(process(&mut self.table, options)?)
    }

    /// Renders the merged configuration as `.config` text.
    pub fn render_config(&self) -> String {
        self.format.render(&self.table)
    }

    /// Writes the merged configuration to `path`.
    pub fn write_config(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.format.write(&self.table, path)?;
        info!(path = %path.display(), "wrote configuration");
        Ok(())
    }

    /// Looks up a symbol by name.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.table.by_name(name)
    }

    pub fn table(&self) -> &SymbolTable {
        &self.table
    }

    /// Returns the number of schema symbols, constants excluded.
    pub fn len(&self) -> usize {
        self.table.named().count()
    }

    /// Returns `true` if the schema defines no symbols.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Returns a reference to the source metadata.
    pub fn source(&self) -> &DatabaseSource {
        &self.source
    }
}
