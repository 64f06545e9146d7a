//! Direct-dependency satisfaction checks.
//!
//! A symbol whose value is `n` (or an empty scalar) never violates its
//! dependency. Otherwise:
//!
//! - bool symbols need the dependency to evaluate to `m` or `y`;
//! - tristate symbols need their value to be at most the dependency value;
//! - scalar symbols count as `m` when set, so they need the dependency to be
//!   at least `m`.
//!
//! # Example
//!
//! ```
//! use confmerge_core::*;
//!
//! let mut table = SymbolTable::new();
//! let b = table.add(Symbol::new("B", SymbolKind::Tristate)).unwrap();
//! let a = table
//!     .add(Symbol::new("A", SymbolKind::Tristate).depends_on(Expr::symbol(b)))
//!     .unwrap();
//!
//! table.set_value(a, Value::Tri(Tristate::Yes)).unwrap();
//! table.set_value(b, Value::Tri(Tristate::Module)).unwrap();
//! assert!(!is_satisfied(&table, a));
//! assert_eq!(filter_violations(&table), vec![a]);
//!
//! table.set_value(a, Value::Tri(Tristate::Module)).unwrap();
//! assert!(is_satisfied(&table, a));
//! ```

use crate::eval::evaluate;
use crate::expr::SymbolId;
use crate::symbol::{SymbolSource, SymbolTable};
use crate::value::{SymbolKind, Tristate};

/// Returns `true` if the symbol's current value is allowed by its direct
/// dependency.
pub fn is_satisfied<S: SymbolSource + ?Sized>(source: &S, id: SymbolId) -> bool {
    let symbol = source.symbol(id);
    let value = symbol.tri_level();
    if value == Tristate::No {
        return true;
    }
    let dep = evaluate(source, &symbol.direct_dep);
    allows(symbol.kind, value, dep)
}

/// Whether a dependency value `dep` permits a symbol of `kind` to hold
/// `value`.
pub(crate) fn allows(kind: SymbolKind, value: Tristate, dep: Tristate) -> bool {
    if value == Tristate::No {
        return true;
    }
    match kind {
        SymbolKind::Bool => dep != Tristate::No,
        _ => value <= dep,
    }
}

/// Returns every non-constant bool/tristate symbol whose dependency is unmet,
/// in table order.
pub fn filter_violations(table: &SymbolTable) -> Vec<SymbolId> {
    table
        .named()
        .filter(|(_, symbol)| symbol.kind.is_tristate_like())
        .filter(|(id, _)| !is_satisfied(table, *id))
        .map(|(id, _)| id)
        .collect()
}

/// Names of the symbols returned by [`filter_violations`].
pub fn violation_names(table: &SymbolTable) -> Vec<String> {
    filter_violations(table)
        .into_iter()
        .map(|id| table.get(id).name.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr::{Expr, RelOp};
    use crate::symbol::Symbol;
    use crate::value::Value;

    fn table_with_dep(kind: SymbolKind, dep_kind: SymbolKind) -> (SymbolTable, SymbolId, SymbolId) {
        let mut table = SymbolTable::new();
        let dep = table.add(Symbol::new("DEP", dep_kind)).unwrap();
        let sym = table
            .add(Symbol::new("SYM", kind).depends_on(Expr::symbol(dep)))
            .unwrap();
        (table, sym, dep)
    }

    #[test]
    fn test_off_symbol_is_always_satisfied() {
        let mut table = SymbolTable::new();
        let no = table.no();
        for kind in [SymbolKind::Bool, SymbolKind::Tristate] {
            let name = format!("OFF_{kind}");
            let id = table
                .add(Symbol::new(name, kind).depends_on(Expr::symbol(no)))
                .unwrap();
            table.set_value(id, Value::Tri(Tristate::No)).unwrap();
            assert!(is_satisfied(&table, id));
        }
        let s = table
            .add(Symbol::new("EMPTY", SymbolKind::String).depends_on(Expr::symbol(no)))
            .unwrap();
        assert!(is_satisfied(&table, s));
    }

    #[test]
    fn test_bool_needs_non_no_dependency() {
        let (mut table, sym, dep) = table_with_dep(SymbolKind::Bool, SymbolKind::Tristate);
        table.set_value(sym, Value::Tri(Tristate::Yes)).unwrap();
        assert!(!is_satisfied(&table, sym));

        table.set_value(dep, Value::Tri(Tristate::Module)).unwrap();
        assert!(is_satisfied(&table, sym));
    }

    #[test]
    fn test_tristate_is_bounded_by_dependency() {
        let (mut table, sym, dep) = table_with_dep(SymbolKind::Tristate, SymbolKind::Tristate);
        table.set_value(dep, Value::Tri(Tristate::Module)).unwrap();

        table.set_value(sym, Value::Tri(Tristate::Module)).unwrap();
        assert!(is_satisfied(&table, sym));

        table.set_value(sym, Value::Tri(Tristate::Yes)).unwrap();
        assert!(!is_satisfied(&table, sym));
    }

    #[test]
    fn test_scalar_needs_enabled_dependency() {
        let (mut table, sym, dep) = table_with_dep(SymbolKind::Int, SymbolKind::Bool);
        table.set_value(sym, Value::Scalar("5".into())).unwrap();
        assert!(!is_satisfied(&table, sym));

        table.set_value(dep, Value::Tri(Tristate::Yes)).unwrap();
        assert!(is_satisfied(&table, sym));
    }

    #[test]
    fn test_filter_skips_scalars_and_constants() {
        let mut table = SymbolTable::new();
        let no = table.no();
        let s = table
            .add(Symbol::new("S", SymbolKind::String).depends_on(Expr::symbol(no)))
            .unwrap();
        table.set_value(s, Value::Scalar("x".into())).unwrap();
        assert!(!is_satisfied(&table, s));

        let t = table
            .add(Symbol::new("T", SymbolKind::Tristate).depends_on(Expr::symbol(no)))
            .unwrap();
        table.set_value(t, Value::Tri(Tristate::Module)).unwrap();

        assert_eq!(filter_violations(&table), vec![t]);
        assert_eq!(violation_names(&table), vec!["T".to_string()]);
    }

    #[test]
    fn test_relation_dependency() {
        let mut table = SymbolTable::new();
        let arch = table.add(Symbol::new("ARCH", SymbolKind::String)).unwrap();
        let x86 = table.constant("x86");
        let sym = table
            .add(
                Symbol::new("SYM", SymbolKind::Bool)
                    .depends_on(Expr::relation(RelOp::Eq, arch, x86)),
            )
            .unwrap();
        table.set_value(sym, Value::Tri(Tristate::Yes)).unwrap();
        assert!(!is_satisfied(&table, sym));

        table.set_value(arch, Value::Scalar("x86".into())).unwrap();
        assert!(is_satisfied(&table, sym));
    }
}
