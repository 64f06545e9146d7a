//! Tristate evaluation of dependency expressions.
//!
//! [`evaluate`] folds an [`Expr`] into a [`Tristate`] using the user-assigned
//! value of every symbol it references (falling back to the resolved value
//! for unset symbols). Evaluation is read-only.
//!
//! - `a && b` is `min(a, b)`; `b` is not evaluated when `a` is `n`.
//! - `a || b` is `max(a, b)`; `b` is not evaluated when `a` is `y`.
//! - `!a` is `2 - a`.
//! - Relations yield `y` or `n`, never `m`.
//!
//! # Example
//!
//! ```
//! use confmerge_core::*;
//!
//! let mut table = SymbolTable::new();
//! let a = table.add(Symbol::new("A", SymbolKind::Tristate)).unwrap();
//! table.set_value(a, Value::Tri(Tristate::Module)).unwrap();
//!
//! let expr = Expr::or(Expr::symbol(a), Expr::symbol(table.no()));
//! assert_eq!(evaluate(&table, &expr), Tristate::Module);
//! assert_eq!(evaluate(&table, &Expr::not(expr)), Tristate::Module);
//! ```

use std::cmp::Ordering;

use crate::expr::Expr;
use crate::symbol::{Symbol, SymbolSource};
use crate::value::{SymbolKind, Tristate, parse_number};

/// Evaluates `expr` against the symbols in `source`.
pub fn evaluate<S: SymbolSource + ?Sized>(source: &S, expr: &Expr) -> Tristate {
    match expr {
        Expr::Symbol(id) => source.symbol(*id).tri_level(),
        Expr::And(left, right) => {
            let v1 = evaluate(source, left);
            if v1 == Tristate::No {
                return Tristate::No;
            }
            v1.min(evaluate(source, right))
        }
        Expr::Or(left, right) => {
            let v1 = evaluate(source, left);
            if v1 == Tristate::Yes {
                return Tristate::Yes;
            }
            v1.max(evaluate(source, right))
        }
        Expr::Not(operand) => evaluate(source, operand).negate(),
        Expr::Relation(op, left, right) => {
            let ordering = compare(source.symbol(*left), source.symbol(*right));
            Tristate::from_bool(op.holds(ordering))
        }
    }
}

/// Orders two relation operands.
///
/// Two string symbols compare lexicographically. Anything else is compared
/// numerically (bool/tristate by level, int/hex in their base, untyped
/// values with prefix detection); if either side is not a number the
/// comparison falls back to lexicographic order of the text values.
pub fn compare(left: &Symbol, right: &Symbol) -> Ordering {
    if left.kind == SymbolKind::String && right.kind == SymbolKind::String {
        return left.str_value().cmp(&right.str_value());
    }
    match (to_number(left), to_number(right)) {
        (Some(a), Some(b)) => a.cmp(&b),
        _ => left.str_value().cmp(&right.str_value()),
    }
}

fn to_number(symbol: &Symbol) -> Option<i64> {
    if symbol.kind.is_tristate_like() {
        Some(i64::from(symbol.tri_level().level()))
    } else {
        parse_number(&symbol.str_value(), symbol.kind)
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::expr::{RelOp, SymbolId};
    use crate::symbol::SymbolTable;
    use crate::value::Value;

    /// Counts symbol reads so short-circuiting is observable.
    struct Counting {
        table: SymbolTable,
        reads: Cell<usize>,
    }

    impl SymbolSource for Counting {
        fn symbol(&self, id: SymbolId) -> &Symbol {
            self.reads.set(self.reads.get() + 1);
            self.table.get(id)
        }
    }

    fn leaf(table: &SymbolTable, tri: Tristate) -> Expr {
        Expr::symbol(table.tristate_constant(tri))
    }

    #[test]
    fn test_and_or_are_min_max() {
        let table = SymbolTable::new();
        for a in Tristate::ALL {
            for b in Tristate::ALL {
                let and = Expr::and(leaf(&table, a), leaf(&table, b));
                let or = Expr::or(leaf(&table, a), leaf(&table, b));
                assert_eq!(evaluate(&table, &and), a.min(b), "{a} && {b}");
                assert_eq!(evaluate(&table, &or), a.max(b), "{a} || {b}");
            }
        }
    }

    #[test]
    fn test_not_is_two_minus_value() {
        let table = SymbolTable::new();
        for tri in Tristate::ALL {
            let expr = Expr::not(leaf(&table, tri));
            assert_eq!(evaluate(&table, &expr).level(), 2 - tri.level());
        }
    }

    #[test]
    fn test_and_short_circuits_on_no() {
        let table = SymbolTable::new();
        let expr = Expr::and(
            leaf(&table, Tristate::No),
            Expr::or(leaf(&table, Tristate::Module), leaf(&table, Tristate::Yes)),
        );
        let counting = Counting {
            table,
            reads: Cell::new(0),
        };
        assert_eq!(evaluate(&counting, &expr), Tristate::No);
        assert_eq!(counting.reads.get(), 1);
    }

    #[test]
    fn test_or_short_circuits_on_yes() {
        let table = SymbolTable::new();
        let expr = Expr::or(
            leaf(&table, Tristate::Yes),
            Expr::and(leaf(&table, Tristate::Module), leaf(&table, Tristate::No)),
        );
        let counting = Counting {
            table,
            reads: Cell::new(0),
        };
        assert_eq!(evaluate(&counting, &expr), Tristate::Yes);
        assert_eq!(counting.reads.get(), 1);
    }

    #[test]
    fn test_and_evaluates_right_side_when_left_is_module() {
        let table = SymbolTable::new();
        let expr = Expr::and(leaf(&table, Tristate::Module), leaf(&table, Tristate::Yes));
        let counting = Counting {
            table,
            reads: Cell::new(0),
        };
        assert_eq!(evaluate(&counting, &expr), Tristate::Module);
        assert_eq!(counting.reads.get(), 2);
    }

    #[test]
    fn test_relations_never_yield_module() {
        let mut table = SymbolTable::new();
        let t = table.add(Symbol::new("T", SymbolKind::Tristate)).unwrap();
        table.set_value(t, Value::Tri(Tristate::Module)).unwrap();
        let m = table.module();
        let y = table.yes();

        for op in [RelOp::Eq, RelOp::Ne, RelOp::Lt, RelOp::Le, RelOp::Gt, RelOp::Ge] {
            for rhs in [m, y] {
                let value = evaluate(&table, &Expr::relation(op, t, rhs));
                assert_ne!(value, Tristate::Module);
            }
        }
        assert_eq!(evaluate(&table, &Expr::relation(RelOp::Eq, t, m)), Tristate::Yes);
        assert_eq!(evaluate(&table, &Expr::relation(RelOp::Lt, t, y)), Tristate::Yes);
    }

    #[test]
    fn test_numeric_relation_uses_symbol_base() {
        let mut table = SymbolTable::new();
        let h = table.add(Symbol::new("H", SymbolKind::Hex)).unwrap();
        let i = table.add(Symbol::new("I", SymbolKind::Int)).unwrap();
        table.set_value(h, Value::Scalar("0x10".into())).unwrap();
        table.set_value(i, Value::Scalar("9".into())).unwrap();
        let sixteen = table.constant("16");

        assert_eq!(evaluate(&table, &Expr::relation(RelOp::Eq, h, sixteen)), Tristate::Yes);
        // 9 < 16 numerically even though "9" > "16" lexicographically.
        assert_eq!(evaluate(&table, &Expr::relation(RelOp::Lt, i, sixteen)), Tristate::Yes);
    }

    #[test]
    fn test_non_numeric_relation_falls_back_to_text() {
        let mut table = SymbolTable::new();
        let s = table.add(Symbol::new("S", SymbolKind::String)).unwrap();
        table.set_value(s, Value::Scalar("beta".into())).unwrap();
        let alpha = table.constant("alpha");
        let beta = table.constant("beta");

        assert_eq!(evaluate(&table, &Expr::relation(RelOp::Gt, s, alpha)), Tristate::Yes);
        assert_eq!(evaluate(&table, &Expr::relation(RelOp::Eq, s, beta)), Tristate::Yes);
        assert_eq!(evaluate(&table, &Expr::relation(RelOp::Ne, s, beta)), Tristate::No);
    }

    #[test]
    fn test_two_strings_compare_lexicographically() {
        let mut table = SymbolTable::new();
        let a = table.add(Symbol::new("A", SymbolKind::String)).unwrap();
        let b = table.add(Symbol::new("B", SymbolKind::String)).unwrap();
        table.set_value(a, Value::Scalar("10".into())).unwrap();
        table.set_value(b, Value::Scalar("9".into())).unwrap();

        assert_eq!(evaluate(&table, &Expr::relation(RelOp::Lt, a, b)), Tristate::Yes);
    }

    #[test]
    fn test_unset_symbol_uses_resolved_value() {
        let mut table = SymbolTable::new();
        let a = table
            .add(Symbol::new("A", SymbolKind::Tristate).with_default(Value::Tri(Tristate::Module)))
            .unwrap();
        assert_eq!(evaluate(&table, &Expr::symbol(a)), Tristate::Module);
    }
}
