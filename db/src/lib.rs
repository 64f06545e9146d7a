//! Schema loading, `.config` handling and run settings.
//!
//! This crate connects the dependency engine in `confmerge-core` to files on
//! disk: symbol schemas in YAML or JSON, `.config` fragments, and YAML run
//! settings.
//!
//! # Quick start
//!
//! ```no_run
//! use confmerge_db::{RunSettings, SchemaDatabase};
//!
//! let settings = RunSettings::load("run.yml").unwrap();
//! let mut db = SchemaDatabase::from_file("schema.yml")
//!     .unwrap()
//!     .with_prefix(&settings.config_prefix)
//!     .unwrap()
//!     .with_strategy(settings.merge_strategy);
//!
//! db.load_config("defconfig").unwrap();
//! db.load_config("fragment.config").unwrap();
//!
//! let report = db.check(&settings.process_options()).unwrap();
//! for change in &report.changes {
//!     println!("{change}");
//! }
//! db.write_config(".config").unwrap();
//! ```

mod config_file;
mod error;
mod loader;
mod schema;
mod settings;

pub use config_file::{ConfigFormat, DEFAULT_PREFIX};
pub use error::{DatabaseError, Result};
pub use loader::{DatabaseSource, SchemaDatabase};
pub use schema::{ExprSpec, OperandSpec, SchemaFile, SymbolSpec};
pub use settings::RunSettings;
