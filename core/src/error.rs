//! Dependency checking and repair errors.

use thiserror::Error;

use crate::expr::RelOp;

/// Why a dependency conjunct cannot be fixed automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnsupportedReason {
    /// `||` or `!` sub-expression that does not already hold.
    #[error("complex dependency statements not supported")]
    ComplexExpression,
    /// Relation other than `=` / `!=` that does not already hold.
    #[error("relational operator '{0}' not supported")]
    UnsupportedOperator(RelOp),
    /// Relation with no constant operand.
    #[error("relation between two non-constant symbols")]
    NoConstantOperand,
    /// Relation between two constants.
    #[error("relation between two constants")]
    BothConstant,
    /// Constant leaf that does not satisfy the dependency.
    #[error("dependency on constant '{0}'")]
    ConstantDependency(String),
    /// Leaf of a kind other than bool or tristate.
    #[error("non-boolean and non-tristate dependency '{0}'")]
    NonTristateDependency(String),
    /// `!=` on a scalar symbol has no single value to pick.
    #[error("inequality on non-tristate symbol '{0}'")]
    ScalarInequality(String),
    /// The constant cannot be stored in the target symbol.
    #[error("constant '{value}' cannot be assigned to '{target}'")]
    IncompatibleConstant { target: String, value: String },
    /// The only fix would lower a symbol's value.
    #[error("fixing '{0}' would lower its value")]
    WouldLowerValue(String),
}

/// Dependency errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DependencyError {
    /// A symbol's value violates its direct dependency. Non-fatal when
    /// repair is not requested.
    #[error("unmet dependency for symbol {0}")]
    UnmetDependency(String),

    /// A conjunct of `symbol`'s dependency cannot be fixed automatically.
    #[error("cannot fix dependencies of symbol {symbol}: {reason}")]
    UnsupportedDependencyShape {
        symbol: String,
        reason: UnsupportedReason,
    },

    /// Repair finished but some symbols are still unmet.
    #[error("could not fix dependencies, still unmet: {}", .0.join(", "))]
    RepairDidNotConverge(Vec<String>),

    /// Repair kept mutating symbols past the round limit.
    #[error("dependency repair did not reach a fixed point within {0} rounds")]
    RoundLimitExceeded(usize),
}

impl DependencyError {
    /// `true` for errors that must abort the run.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DependencyError::UnmetDependency(_))
    }
}
