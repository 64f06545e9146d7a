//! Dependency expression trees.
//!
//! An [`Expr`] is an immutable tree of `&&`, `||` and `!` nodes over symbol
//! references and relations between two symbols. Leaves and relation operands
//! are [`SymbolId`] handles into a [`SymbolTable`](crate::SymbolTable); quoted
//! literals are represented by constant symbols.
//!
//! # Example
//!
//! ```
//! use confmerge_core::*;
//!
//! let mut table = SymbolTable::new();
//! let a = table.add(Symbol::new("A", SymbolKind::Bool)).unwrap();
//! let b = table.add(Symbol::new("B", SymbolKind::Tristate)).unwrap();
//! let y = table.yes();
//!
//! // A && (B = y)
//! let dep = Expr::and(Expr::symbol(a), Expr::relation(RelOp::Eq, b, y));
//! assert_eq!(dep.conjuncts().len(), 2);
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

/// Handle to a symbol owned by a [`SymbolTable`](crate::SymbolTable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SymbolId(pub(crate) usize);

/// Relational operator of a [`Expr::Relation`] node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RelOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl RelOp {
    /// Applies the operator to the ordering of the left operand relative to
    /// the right one.
    pub fn holds(self, ordering: std::cmp::Ordering) -> bool {
        use std::cmp::Ordering::*;
        match self {
            RelOp::Eq => ordering == Equal,
            RelOp::Ne => ordering != Equal,
            RelOp::Lt => ordering == Less,
            RelOp::Le => ordering != Greater,
            RelOp::Gt => ordering == Greater,
            RelOp::Ge => ordering != Less,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RelOp::Eq => "=",
            RelOp::Ne => "!=",
            RelOp::Lt => "<",
            RelOp::Le => "<=",
            RelOp::Gt => ">",
            RelOp::Ge => ">=",
        }
    }
}

impl fmt::Display for RelOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Dependency expression node.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Expr {
    /// Reference to a symbol or constant.
    Symbol(SymbolId),
    /// Relation between two symbol-or-constant operands.
    Relation(RelOp, SymbolId, SymbolId),
    Not(Box<Expr>),
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
}

impl Expr {
    pub fn symbol(id: SymbolId) -> Self {
        Expr::Symbol(id)
    }

    pub fn relation(op: RelOp, left: SymbolId, right: SymbolId) -> Self {
        Expr::Relation(op, left, right)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(operand: Expr) -> Self {
        Expr::Not(Box::new(operand))
    }

    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or(Box::new(left), Box::new(right))
    }

    /// Splits the expression at top-level `&&` boundaries.
    ///
    /// `||` and `!` sub-expressions are returned whole. For `A && (B || C) && D`
    /// the result is `[A, B || C, D]`.
    pub fn conjuncts(&self) -> Vec<&Expr> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                Expr::And(left, right) => {
                    stack.push(right);
                    stack.push(left);
                }
                other => out.push(other),
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use std::cmp::Ordering;

    use super::*;

    fn id(n: usize) -> SymbolId {
        SymbolId(n)
    }

    #[test]
    fn test_conjuncts_split_only_at_and() {
        // A && (B || C) && !D
        let expr = Expr::and(
            Expr::and(
                Expr::symbol(id(0)),
                Expr::or(Expr::symbol(id(1)), Expr::symbol(id(2))),
            ),
            Expr::not(Expr::symbol(id(3))),
        );

        let parts = expr.conjuncts();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], &Expr::symbol(id(0)));
        assert!(matches!(parts[1], Expr::Or(_, _)));
        assert!(matches!(parts[2], Expr::Not(_)));
    }

    #[test]
    fn test_conjuncts_of_leaf_is_itself() {
        let expr = Expr::symbol(id(4));
        assert_eq!(expr.conjuncts(), vec![&expr]);
    }

    #[test]
    fn test_relop_holds() {
        assert!(RelOp::Eq.holds(Ordering::Equal));
        assert!(!RelOp::Ne.holds(Ordering::Equal));
        assert!(RelOp::Le.holds(Ordering::Less));
        assert!(RelOp::Le.holds(Ordering::Equal));
        assert!(!RelOp::Lt.holds(Ordering::Greater));
        assert!(RelOp::Ge.holds(Ordering::Greater));
        assert!(!RelOp::Gt.holds(Ordering::Equal));
    }
}
