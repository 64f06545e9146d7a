//! Whole-table dependency check with optional repair.

use serde::Serialize;
use tracing::{info, warn};

use crate::check::{filter_violations, violation_names};
use crate::error::DependencyError;
use crate::repair::{Change, DEFAULT_MAX_ROUNDS, Repairer};
use crate::symbol::SymbolTable;

/// Options for [`process`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessOptions {
    /// Run the repair engine when unmet dependencies are found.
    pub attempt_repair: bool,
    /// Round cap handed to the repair engine.
    pub max_rounds: usize,
}

impl Default for ProcessOptions {
    fn default() -> Self {
        Self {
            attempt_repair: false,
            max_rounds: DEFAULT_MAX_ROUNDS,
        }
    }
}

/// Outcome of a successful [`process`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessReport {
    /// Symbols with unmet dependencies before any repair.
    pub unmet: Vec<String>,
    /// Mutations made by the repair engine.
    pub changes: Vec<Change>,
    /// Repair rounds run (zero when repair did not run).
    pub rounds: usize,
    /// `true` when repair ran and every dependency is now met.
    pub repaired: bool,
}

impl ProcessReport {
    /// Non-fatal warnings, one per initially unmet symbol.
    pub fn warnings(&self) -> Vec<DependencyError> {
        self.unmet
            .iter()
            .cloned()
            .map(DependencyError::UnmetDependency)
            .collect()
    }

    /// `true` if unmet dependencies were left in place.
    pub fn has_unfixed(&self) -> bool {
        !self.unmet.is_empty() && !self.repaired
    }
}

/// Checks every bool/tristate symbol and optionally repairs violations.
///
/// Without repair, unmet dependencies are logged and reported but do not
/// fail the call. With repair, the table is re-checked afterwards.
///
/// # Errors
///
/// Returns any error from the repair engine, or
/// [`DependencyError::RepairDidNotConverge`] if dependencies are still unmet
/// after repair.
///
/// # Example
///
/// ```
/// use confmerge_core::*;
///
/// let mut table = SymbolTable::new();
/// let b = table.add(Symbol::new("B", SymbolKind::Tristate)).unwrap();
/// let a = table
///     .add(Symbol::new("A", SymbolKind::Tristate).depends_on(Expr::symbol(b)))
///     .unwrap();
/// table.set_value(a, Value::Tri(Tristate::Module)).unwrap();
///
/// let options = ProcessOptions { attempt_repair: true, ..Default::default() };
/// let report = process(&mut table, &options).unwrap();
/// assert_eq!(report.unmet, vec!["A".to_string()]);
/// assert!(report.repaired);
/// assert_eq!(table.get(b).tri_level(), Tristate::Module);
/// ```
pub fn process(
    table: &mut SymbolTable,
    options: &ProcessOptions,
) -> Result<ProcessReport, DependencyError> {
    let violations = filter_violations(table);
    let mut report = ProcessReport {
        unmet: violations
            .iter()
            .map(|id| table.get(*id).name.clone())
            .collect(),
        ..ProcessReport::default()
    };

    for name in &report.unmet {
        warn!(symbol = %name, "Unmet dependency for symbol {name}");
    }
    if violations.is_empty() {
        info!("all dependencies met");
        return Ok(report);
    }
    if !options.attempt_repair {
        warn!(
            count = violations.len(),
            "Unmet dependencies need to be fixed manually"
        );
        return Ok(report);
    }

    info!(count = violations.len(), "attempting to fix dependencies");
    let repaired = Repairer::new(table)
        .max_rounds(options.max_rounds)
        .run(&violations)?;
    report.changes = repaired.changes;
    report.rounds = repaired.rounds;

    let remaining = violation_names(table);
    if !remaining.is_empty() {
        return Err(DependencyError::RepairDidNotConverge(remaining));
    }

    report.repaired = true;
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Expr, RelOp};
    use crate::symbol::Symbol;
    use crate::value::{SymbolKind, Tristate, Value};

    fn unmet_table() -> SymbolTable {
        let mut table = SymbolTable::new();
        let b = table.add(Symbol::new("B", SymbolKind::Bool)).unwrap();
        let a = table
            .add(Symbol::new("A", SymbolKind::Bool).depends_on(Expr::symbol(b)))
            .unwrap();
        table.set_value(a, Value::Tri(Tristate::Yes)).unwrap();
        table
    }

    #[test]
    fn test_clean_table_succeeds() {
        let mut table = SymbolTable::new();
        table.add(Symbol::new("A", SymbolKind::Bool)).unwrap();
        let report = process(&mut table, &ProcessOptions::default()).unwrap();
        assert_eq!(report, ProcessReport::default());
    }

    #[test]
    fn test_unmet_without_repair_is_a_warning() {
        let mut table = unmet_table();
        let report = process(&mut table, &ProcessOptions::default()).unwrap();

        assert_eq!(report.unmet, vec!["A".to_string()]);
        assert!(report.changes.is_empty());
        assert!(report.has_unfixed());
        assert_eq!(
            report.warnings(),
            vec![DependencyError::UnmetDependency("A".into())]
        );
        assert_eq!(table.by_name("B").unwrap().tri_level(), Tristate::No);
    }

    #[test]
    fn test_repair_fixes_and_rechecks() {
        let mut table = unmet_table();
        let options = ProcessOptions {
            attempt_repair: true,
            ..ProcessOptions::default()
        };
        let report = process(&mut table, &options).unwrap();

        assert!(report.repaired);
        assert!(!report.has_unfixed());
        assert_eq!(report.changes.len(), 1);
        assert_eq!(table.by_name("B").unwrap().tri_level(), Tristate::Yes);
    }

    /// `A -> B -> C`, with only `A` set.
    fn chain_table() -> SymbolTable {
        let mut table = SymbolTable::new();
        let c = table.add(Symbol::new("C", SymbolKind::Bool)).unwrap();
        let b = table
            .add(Symbol::new("B", SymbolKind::Bool).depends_on(Expr::symbol(c)))
            .unwrap();
        let a = table
            .add(Symbol::new("A", SymbolKind::Bool).depends_on(Expr::symbol(b)))
            .unwrap();
        table.set_value(a, Value::Tri(Tristate::Yes)).unwrap();
        table
    }

    #[test]
    fn test_round_cap_from_options_is_fatal() {
        let mut table = chain_table();
        let options = ProcessOptions {
            attempt_repair: true,
            max_rounds: 1,
        };
        let err = process(&mut table, &options).unwrap_err();
        assert_eq!(err, DependencyError::RoundLimitExceeded(1));
        assert!(err.is_fatal());
        // The first round's change is kept.
        assert_eq!(table.by_name("B").unwrap().tri_level(), Tristate::Yes);
        assert_eq!(table.by_name("C").unwrap().tri_level(), Tristate::No);
    }

    #[test]
    fn test_chain_repairs_within_enough_rounds() {
        let mut table = chain_table();
        let options = ProcessOptions {
            attempt_repair: true,
            max_rounds: 3,
        };
        let report = process(&mut table, &options).unwrap();
        assert!(report.repaired);
        assert_eq!(report.rounds, 3);
        assert_eq!(report.changes.len(), 2);
        assert_eq!(table.by_name("C").unwrap().tri_level(), Tristate::Yes);
    }

    #[test]
    fn test_unsupported_shape_is_fatal() {
        let mut table = SymbolTable::new();
        let b = table.add(Symbol::new("B", SymbolKind::Bool)).unwrap();
        let c = table.add(Symbol::new("C", SymbolKind::Bool)).unwrap();
        let a = table
            .add(
                Symbol::new("A", SymbolKind::Bool)
                    .depends_on(Expr::or(Expr::symbol(b), Expr::symbol(c))),
            )
            .unwrap();
        table.set_value(a, Value::Tri(Tristate::Yes)).unwrap();

        let options = ProcessOptions {
            attempt_repair: true,
            ..ProcessOptions::default()
        };
        let err = process(&mut table, &options).unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(
            err,
            DependencyError::UnsupportedDependencyShape { ref symbol, .. } if symbol == "A"
        ));
    }

    #[test]
    fn test_conflicting_equalities_do_not_converge() {
        let mut table = SymbolTable::new();
        let s = table.add(Symbol::new("S", SymbolKind::String)).unwrap();
        let x = table.constant("x");
        let z = table.constant("z");
        let a = table
            .add(Symbol::new("A", SymbolKind::Bool).depends_on(Expr::relation(RelOp::Eq, s, x)))
            .unwrap();
        let b = table
            .add(Symbol::new("B", SymbolKind::Bool).depends_on(Expr::relation(RelOp::Eq, s, z)))
            .unwrap();
        table.set_value(a, Value::Tri(Tristate::Yes)).unwrap();
        table.set_value(b, Value::Tri(Tristate::Yes)).unwrap();

        let options = ProcessOptions {
            attempt_repair: true,
            ..ProcessOptions::default()
        };
        let err = process(&mut table, &options).unwrap_err();
        assert_eq!(err, DependencyError::RepairDidNotConverge(vec!["A".into()]));
    }
}
