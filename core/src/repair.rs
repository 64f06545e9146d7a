//! Automatic repair of unmet dependencies.
//!
//! [`Repairer`] works in rounds over a queue of symbols. For each symbol that
//! is still unmet it splits the direct dependency into its `&&` conjuncts and
//! raises whichever symbols a conjunct needs:
//!
//! - a plain symbol is raised to the dependent's value (tristate on
//!   tristate), to `m` (tristate dependency of a bool), or to `y`;
//! - `SYM = const` assigns the constant to `SYM`;
//! - `SYM != const` picks the remaining non-`n` value.
//!
//! Every symbol changed in a round is queued for the next round, since its
//! own dependencies may now be unmet. Repair stops when a round changes
//! nothing. Values are only ever raised. Shapes that cannot be fixed by a
//! single raise abort the whole repair with
//! [`DependencyError::UnsupportedDependencyShape`].
//!
//! # Example
//!
//! ```
//! use confmerge_core::*;
//!
//! let mut table = SymbolTable::new();
//! let b = table.add(Symbol::new("B", SymbolKind::Bool)).unwrap();
//! let a = table
//!     .add(Symbol::new("A", SymbolKind::Bool).depends_on(Expr::symbol(b)))
//!     .unwrap();
//! table.set_value(a, Value::Tri(Tristate::Yes)).unwrap();
//!
//! let violations = filter_violations(&table);
//! let report = repair(&mut table, &violations).unwrap();
//! assert_eq!(report.changes[0].to_string(), "B: n -> y");
//! assert!(filter_violations(&table).is_empty());
//! ```

use std::fmt;

use serde::Serialize;
use tracing::{debug, warn};

use crate::check::{allows, is_satisfied};
use crate::error::{DependencyError, UnsupportedReason};
use crate::eval::evaluate;
use crate::expr::{Expr, RelOp, SymbolId};
use crate::symbol::SymbolTable;
use crate::value::{SymbolKind, Tristate, Value};

/// Default cap on repair rounds.
pub const DEFAULT_MAX_ROUNDS: usize = 64;

/// One value mutation made by the repair engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Change {
    pub symbol: String,
    pub old: String,
    pub new: String,
}

impl fmt::Display for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} -> {}", self.symbol, self.old, self.new)
    }
}

/// Result of a successful repair.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairReport {
    /// Number of rounds run, including the final round that changed nothing.
    pub rounds: usize,
    /// Mutations in the order they were applied.
    pub changes: Vec<Change>,
}

/// Round-based dependency repair over a [`SymbolTable`].
pub struct Repairer<'a> {
    table: &'a mut SymbolTable,
    max_rounds: usize,
    changes: Vec<Change>,
}

impl<'a> Repairer<'a> {
    pub fn new(table: &'a mut SymbolTable) -> Self {
        Self {
            table,
            max_rounds: DEFAULT_MAX_ROUNDS,
            changes: Vec::new(),
        }
    }

    /// Sets the round cap. A value of zero is treated as one.
    pub fn max_rounds(mut self, rounds: usize) -> Self {
        self.max_rounds = rounds.max(1);
        self
    }

    /// Repairs `violations` until a round changes nothing.
    ///
    /// # Errors
    ///
    /// Returns [`DependencyError::UnsupportedDependencyShape`] naming the
    /// symbol whose dependency could not be fixed, or
    /// [`DependencyError::RoundLimitExceeded`] if symbols are still queued
    /// after the round cap. Mutations made before the error are kept.
    pub fn run(mut self, violations: &[SymbolId]) -> Result<RepairReport, DependencyError> {
        let mut queue = Vec::with_capacity(violations.len());
        for id in violations {
            if !queue.contains(id) {
                queue.push(*id);
            }
        }

        let mut rounds = 0;
        while !queue.is_empty() {
            if rounds == self.max_rounds {
                return Err(DependencyError::RoundLimitExceeded(self.max_rounds));
            }
            rounds += 1;
            debug!(round = rounds, queued = queue.len(), "dependency repair round");

            let mut next = Vec::new();
            for id in queue {
                if is_satisfied(&*self.table, id) {
                    continue;
                }
                self.fix_symbol(id, &mut next)?;
            }
            queue = next;
        }

        Ok(RepairReport {
            rounds,
            changes: self.changes,
        })
    }

    fn fix_symbol(&mut self, id: SymbolId, next: &mut Vec<SymbolId>) -> Result<(), DependencyError> {
        let dep = self.table.get(id).direct_dep.clone();
        for conjunct in dep.conjuncts() {
            match conjunct {
                Expr::Symbol(leaf) => self.fix_leaf(id, *leaf, next)?,
                Expr::Relation(op, left, right) => {
                    self.fix_relation(id, *op, *left, *right, next)?
                }
                Expr::Not(_) | Expr::Or(_, _) | Expr::And(_, _) => {
                    let symbol = self.table.get(id);
                    let value = evaluate(&*self.table, conjunct);
                    if !allows(symbol.kind, symbol.tri_level(), value) {
                        return Err(self.unsupported(id, UnsupportedReason::ComplexExpression));
                    }
                }
            }
        }
        Ok(())
    }

    fn fix_leaf(
        &mut self,
        id: SymbolId,
        leaf: SymbolId,
        next: &mut Vec<SymbolId>,
    ) -> Result<(), DependencyError> {
        let symbol = self.table.get(id);
        let dep = self.table.get(leaf);
        if allows(symbol.kind, symbol.tri_level(), dep.tri_level()) {
            return Ok(());
        }
        if dep.is_constant {
            let reason = UnsupportedReason::ConstantDependency(dep.name.clone());
            return Err(self.unsupported(id, reason));
        }

        let target = match (dep.kind, symbol.kind) {
            (SymbolKind::Tristate, SymbolKind::Tristate) => symbol.tri_level(),
            (SymbolKind::Tristate, _) => Tristate::Module,
            (SymbolKind::Bool, _) => Tristate::Yes,
            _ => {
                let reason = UnsupportedReason::NonTristateDependency(dep.name.clone());
                return Err(self.unsupported(id, reason));
            }
        };

        if target > dep.tri_level() {
            self.assign(id, leaf, Value::Tri(target), next)?;
        }
        Ok(())
    }

    fn fix_relation(
        &mut self,
        id: SymbolId,
        op: RelOp,
        left: SymbolId,
        right: SymbolId,
        next: &mut Vec<SymbolId>,
    ) -> Result<(), DependencyError> {
        if evaluate(&*self.table, &Expr::Relation(op, left, right)) == Tristate::Yes {
            return Ok(());
        }
        if !matches!(op, RelOp::Eq | RelOp::Ne) {
            return Err(self.unsupported(id, UnsupportedReason::UnsupportedOperator(op)));
        }

        let left_const = self.table.get(left).is_constant;
        let right_const = self.table.get(right).is_constant;
        let (target, source) = match (left_const, right_const) {
            (false, true) => (left, right),
            (true, false) => (right, left),
            (true, true) => return Err(self.unsupported(id, UnsupportedReason::BothConstant)),
            (false, false) => {
                return Err(self.unsupported(id, UnsupportedReason::NoConstantOperand));
            }
        };

        let target_sym = self.table.get(target);
        let source_sym = self.table.get(source);

        let value = if op == RelOp::Eq {
            if target_sym.kind.is_tristate_like() {
                let text = source_sym.str_value();
                match text.parse::<Tristate>() {
                    Ok(tri) => Value::Tri(tri),
                    Err(_) => {
                        let reason = UnsupportedReason::IncompatibleConstant {
                            target: target_sym.name.clone(),
                            value: text,
                        };
                        return Err(self.unsupported(id, reason));
                    }
                }
            } else {
                Value::Scalar(source_sym.str_value())
            }
        } else {
            if !target_sym.kind.is_tristate_like() {
                let reason = UnsupportedReason::ScalarInequality(target_sym.name.clone());
                return Err(self.unsupported(id, reason));
            }
            // `n` is never picked automatically.
            let candidates: &[Tristate] = if target_sym.kind == SymbolKind::Bool {
                &[Tristate::Yes]
            } else {
                &[Tristate::Module, Tristate::Yes]
            };
            let excluded = source_sym.tri_level();
            match candidates.iter().copied().find(|tri| *tri != excluded) {
                Some(tri) => Value::Tri(tri),
                None => {
                    let reason = UnsupportedReason::WouldLowerValue(target_sym.name.clone());
                    return Err(self.unsupported(id, reason));
                }
            }
        };

        if let Value::Tri(tri) = value {
            if tri < target_sym.tri_level() {
                let reason = UnsupportedReason::WouldLowerValue(target_sym.name.clone());
                return Err(self.unsupported(id, reason));
            }
        }

        self.assign(id, target, value, next)
    }

    /// Sets `target` to `value` on behalf of `origin`, recording the change
    /// and queueing `target` if its value actually moved.
    fn assign(
        &mut self,
        origin: SymbolId,
        target: SymbolId,
        value: Value,
        next: &mut Vec<SymbolId>,
    ) -> Result<(), DependencyError> {
        let old = self.table.get(target).display_value();
        if let Err(err) = self.table.set_value(target, value.clone()) {
            debug!(error = %err, "repair assignment rejected");
            let reason = UnsupportedReason::IncompatibleConstant {
                target: self.table.get(target).name.clone(),
                value: value.as_str().to_string(),
            };
            return Err(self.unsupported(origin, reason));
        }
        let new = self.table.get(target).display_value();
        if old == new {
            return Ok(());
        }

        let change = Change {
            symbol: self.table.get(target).name.clone(),
            old,
            new,
        };
        warn!(
            symbol = %change.symbol,
            cause = %self.table.get(origin).name,
            "Changing symbol value: {change}"
        );
        self.changes.push(change);
        if !next.contains(&target) {
            next.push(target);
        }
        Ok(())
    }

    fn unsupported(&self, id: SymbolId, reason: UnsupportedReason) -> DependencyError {
        DependencyError::UnsupportedDependencyShape {
            symbol: self.table.get(id).name.clone(),
            reason,
        }
    }
}

/// Repairs `violations` with the default round cap.
///
/// Callers should re-run [`filter_violations`](crate::filter_violations)
/// afterwards to confirm every dependency is met.
pub fn repair(
    table: &mut SymbolTable,
    violations: &[SymbolId],
) -> Result<RepairReport, DependencyError> {
    Repairer::new(table).run(violations)
}
