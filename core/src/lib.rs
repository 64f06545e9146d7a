//! Dependency evaluation and repair for merged configuration symbols.
//!
//! This crate checks configuration values against a schema of
//! inter-dependent symbols and repairs them:
//!
//! - [`Tristate`], [`SymbolKind`], [`Value`]: the value model.
//! - [`Expr`]: dependency expression trees over [`SymbolId`] handles.
//! - [`SymbolTable`]: owns every [`Symbol`]; the engine only holds ids.
//! - [`evaluate`]: tristate evaluation of an expression.
//! - [`is_satisfied`] / [`filter_violations`]: direct-dependency checks.
//! - [`Repairer`] / [`repair`]: raises symbol values until dependencies
//!   hold.
//! - [`process`]: check, optionally repair, then re-check a whole table.
//! - [`merge_assignments`]: applies configuration fragments to a table.
//!
//! The crate does no I/O; schema and `.config` handling live elsewhere.
//!
//! # Example
//!
//! ```
//! use confmerge_core::*;
//!
//! let mut table = SymbolTable::new();
//! let net = table.add(Symbol::new("NET", SymbolKind::Bool)).unwrap();
//! let wifi = table
//!     .add(Symbol::new("WIFI", SymbolKind::Tristate).depends_on(Expr::symbol(net)))
//!     .unwrap();
//!
//! let fragment = vec![Assignment::new("WIFI", Value::Tri(Tristate::Module))];
//! merge_assignments(&mut table, &fragment, MergeStrategy::PreferBase);
//! assert_eq!(filter_violations(&table), vec![wifi]);
//!
//! let options = ProcessOptions { attempt_repair: true, ..Default::default() };
//! let report = process(&mut table, &options).unwrap();
//! assert_eq!(report.changes[0].to_string(), "NET: n -> y");
//! assert_eq!(table.get(net).tri_level(), Tristate::Yes);
//! ```

mod check;
mod error;
mod eval;
mod expr;
mod merge;
mod process;
mod repair;
mod symbol;
mod value;

pub use check::{filter_violations, is_satisfied, violation_names};
pub use error::{DependencyError, UnsupportedReason};
pub use eval::{compare, evaluate};
pub use expr::{Expr, RelOp, SymbolId};
pub use merge::{Assignment, MergeStrategy, MergeSummary, merge_assignments};
pub use process::{ProcessOptions, ProcessReport, process};
pub use repair::{Change, DEFAULT_MAX_ROUNDS, RepairReport, Repairer, repair};
pub use symbol::{Symbol, SymbolError, SymbolSource, SymbolTable};
pub use value::{ParseTristateError, SymbolKind, Tristate, Value, parse_number};
