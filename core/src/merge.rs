//! Merging configuration fragments into a symbol table.
//!
//! Fragments are applied one after another with [`merge_assignments`]. The
//! [`MergeStrategy`] decides what happens when a fragment assigns a symbol an
//! earlier fragment already set.
//!
//! # Example
//!
//! ```
//! use confmerge_core::*;
//!
//! let mut table = SymbolTable::new();
//! let usb = table.add(Symbol::new("USB", SymbolKind::Tristate)).unwrap();
//!
//! let base = vec![Assignment::new("USB", Value::Tri(Tristate::Module))];
//! let overlay = vec![Assignment::new("USB", Value::Tri(Tristate::Yes))];
//!
//! merge_assignments(&mut table, &base, MergeStrategy::PreferBase);
//! let summary = merge_assignments(&mut table, &overlay, MergeStrategy::PreferBase);
//! assert_eq!(summary.kept, 1);
//! assert_eq!(table.get(usb).tri_level(), Tristate::Module);
//! ```

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::symbol::SymbolTable;
use crate::value::Value;

/// Conflict policy for symbols set by more than one fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Keep the value from the earlier fragment (first listed wins).
    #[default]
    PreferBase,
    /// Replace it with the value from the later fragment.
    PreferOverlay,
}

/// A single `NAME=value` line from a configuration fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assignment {
    pub name: String,
    pub value: Value,
    /// 1-based line in the source fragment, when known.
    pub line: Option<usize>,
}

impl Assignment {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            line: None,
        }
    }

    pub fn at_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }
}

/// Counts from one [`merge_assignments`] call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    /// Assignments that were applied.
    pub assigned: usize,
    /// Assignments ignored because an earlier fragment already set the symbol.
    pub kept: usize,
    /// Assignments to unknown or constant symbols, or with invalid values.
    pub skipped: usize,
}

/// Applies one fragment's assignments to `table`.
///
/// A symbol assigned twice within the same fragment takes the later value.
/// Unknown symbols, constants and values that do not fit the symbol's kind
/// are skipped with a warning.
pub fn merge_assignments(
    table: &mut SymbolTable,
    assignments: &[Assignment],
    strategy: MergeStrategy,
) -> MergeSummary {
    let mut summary = MergeSummary::default();
    let mut seen = HashSet::new();

    for assignment in assignments {
        let line = assignment.line.unwrap_or(0);
        let Some(id) = table.lookup(&assignment.name) else {
            warn!(symbol = %assignment.name, line, "ignoring assignment to undefined symbol");
            summary.skipped += 1;
            continue;
        };

        let already_set = table.get(id).user_value.is_some();
        if already_set && !seen.contains(&id) && strategy == MergeStrategy::PreferBase {
            debug!(symbol = %assignment.name, "keeping value from earlier fragment");
            summary.kept += 1;
            continue;
        }
        if already_set {
            debug!(
                symbol = %assignment.name,
                old = %table.get(id).display_value(),
                new = %assignment.value,
                "symbol set more than once"
            );
        }

        match table.set_value(id, assignment.value.clone()) {
            Ok(()) => {
                seen.insert(id);
                summary.assigned += 1;
            }
            Err(err) => {
                warn!(line, "ignoring assignment: {err}");
                summary.skipped += 1;
            }
        }
    }

    summary
}
