//! Symbols and the table that owns them.
//!
//! The [`SymbolTable`] stores every [`Symbol`] in a `Vec` and hands out
//! [`SymbolId`] indices. Expressions, the checker and the repair engine only
//! ever hold ids; they read and mutate symbols through the table.
//!
//! The constants `n`, `m` and `y` are interned when the table is created.
//! Quoted literals are interned on demand with [`SymbolTable::constant`].
//!
//! # Example
//!
//! ```
//! use confmerge_core::*;
//!
//! let mut table = SymbolTable::new();
//! let usb = table.add(Symbol::new("USB", SymbolKind::Tristate)).unwrap();
//! assert_eq!(table.get(usb).tri_level(), Tristate::No);
//!
//! table.set_value(usb, Value::Tri(Tristate::Module)).unwrap();
//! assert_eq!(table.get(usb).tri_level(), Tristate::Module);
//! assert_eq!(table.lookup("USB"), Some(usb));
//! ```

use std::collections::HashMap;

use thiserror::Error;

use crate::expr::{Expr, SymbolId};
use crate::value::{SymbolKind, Tristate, Value};

/// Errors raised while building or mutating a [`SymbolTable`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SymbolError {
    /// A symbol with the same name is already registered.
    #[error("duplicate symbol: {0}")]
    Duplicate(String),
    /// Constants cannot be assigned.
    #[error("cannot assign constant symbol {0}")]
    Constant(String),
    /// The value does not fit the symbol's kind.
    #[error("invalid value {value:?} for {kind} symbol {name}")]
    InvalidValue {
        name: String,
        kind: SymbolKind,
        value: String,
    },
}

/// A named configuration symbol.
#[derive(Debug, Clone)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    /// Constants are never mutated by merge or repair.
    pub is_constant: bool,
    /// Value assigned by a configuration fragment, if any.
    pub user_value: Option<Value>,
    /// Value used when no user value is set.
    pub resolved: Value,
    /// Direct dependency; the constant `y` when the symbol has none.
    pub direct_dep: Expr,
}

impl Symbol {
    /// Creates an unset, non-constant symbol with no dependency.
    ///
    /// The dependency is the constant `y`, which every table interns at the
    /// same id.
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            is_constant: false,
            user_value: None,
            resolved: Value::minimal(kind),
            direct_dep: Expr::Symbol(YES),
        }
    }

    /// Sets the direct dependency.
    pub fn depends_on(mut self, dep: Expr) -> Self {
        self.direct_dep = dep;
        self
    }

    /// Sets the value used when no user value is assigned.
    pub fn with_default(mut self, value: Value) -> Self {
        self.resolved = value;
        self
    }

    /// Sets the user value.
    pub fn with_value(mut self, value: Value) -> Self {
        self.user_value = Some(value);
        self
    }

    /// The user value if set, otherwise the resolved value.
    pub fn effective_value(&self) -> &Value {
        self.user_value.as_ref().unwrap_or(&self.resolved)
    }

    /// Tri-valued level of the effective value.
    ///
    /// Bool symbols never report `m`. Scalar values map the literals `n`, `m`
    /// and `y` to themselves, the empty string to `n`, and anything else to
    /// `m`.
    pub fn tri_level(&self) -> Tristate {
        match self.effective_value() {
            Value::Tri(Tristate::Module) if self.kind == SymbolKind::Bool => Tristate::Yes,
            Value::Tri(tri) => *tri,
            Value::Scalar(s) => match s.parse::<Tristate>() {
                Ok(tri) => tri,
                Err(_) if s.is_empty() => Tristate::No,
                Err(_) => Tristate::Module,
            },
        }
    }

    /// Textual form of the effective value.
    pub fn str_value(&self) -> String {
        match self.effective_value() {
            Value::Tri(_) => self.tri_level().as_str().to_string(),
            Value::Scalar(s) => s.clone(),
        }
    }

    /// Converts `value` into the form stored for this symbol's kind.
    ///
    /// Bool symbols promote `m` to `y`. Bool/tristate symbols accept scalar
    /// text `n`/`m`/`y`; int and hex symbols require a number in their base;
    /// string and untyped symbols only take scalars.
    ///
    /// # Errors
    ///
    /// Returns [`SymbolError::InvalidValue`] when the value does not fit.
    pub fn normalize(&self, value: Value) -> Result<Value, SymbolError> {
        let invalid = |text: &str| SymbolError::InvalidValue {
            name: self.name.clone(),
            kind: self.kind,
            value: text.to_string(),
        };

        match self.kind {
            SymbolKind::Bool | SymbolKind::Tristate => {
                let tri = match value {
                    Value::Tri(tri) => tri,
                    Value::Scalar(text) => text.parse::<Tristate>().map_err(|_| invalid(&text))?,
                };
                if self.kind == SymbolKind::Bool && tri == Tristate::Module {
                    Ok(Value::Tri(Tristate::Yes))
                } else {
                    Ok(Value::Tri(tri))
                }
            }
            SymbolKind::Int | SymbolKind::Hex => {
                let text = value.as_str();
                if crate::value::parse_number(text, self.kind).is_none() {
                    return Err(invalid(text));
                }
                Ok(Value::Scalar(text.to_string()))
            }
            SymbolKind::String | SymbolKind::Unknown => match value {
                Value::Scalar(text) => Ok(Value::Scalar(text)),
                Value::Tri(tri) => Err(invalid(tri.as_str())),
            },
        }
    }

    /// Effective value in display form, used for audit lines.
    pub fn display_value(&self) -> String {
        if self.kind.is_tristate_like() {
            self.tri_level().to_string()
        } else {
            self.effective_value().to_string()
        }
    }
}

const NO: SymbolId = SymbolId(0);
const MODULE: SymbolId = SymbolId(1);
const YES: SymbolId = SymbolId(2);

/// Read access to symbols by id.
///
/// The evaluator and checker are written against this trait so they can run
/// over anything that resolves ids, not only a [`SymbolTable`].
pub trait SymbolSource {
    fn symbol(&self, id: SymbolId) -> &Symbol;
}

/// Owning table of symbols, indexed by [`SymbolId`].
#[derive(Debug, Clone)]
pub struct SymbolTable {
    symbols: Vec<Symbol>,
    by_name: HashMap<String, SymbolId>,
    constants: HashMap<String, SymbolId>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    /// Creates a table holding only the constants `n`, `m` and `y`.
    pub fn new() -> Self {
        let mut table = Self {
            symbols: Vec::new(),
            by_name: HashMap::new(),
            constants: HashMap::new(),
        };
        for tri in Tristate::ALL {
            let mut symbol = Symbol::new(tri.as_str(), SymbolKind::Tristate);
            symbol.is_constant = true;
            symbol.resolved = Value::Tri(tri);
            let id = table.push(symbol);
            table.constants.insert(tri.as_str().to_string(), id);
        }
        table
    }

    /// The constant `n`.
    pub fn no(&self) -> SymbolId {
        NO
    }

    /// The constant `m`.
    pub fn module(&self) -> SymbolId {
        MODULE
    }

    /// The constant `y`.
    pub fn yes(&self) -> SymbolId {
        YES
    }

    /// Id of the built-in constant for `tri`.
    pub fn tristate_constant(&self, tri: Tristate) -> SymbolId {
        match tri {
            Tristate::No => NO,
            Tristate::Module => MODULE,
            Tristate::Yes => YES,
        }
    }

    /// Registers a named symbol.
    ///
    /// # Errors
    ///
    /// Returns [`SymbolError::Duplicate`] if the name is already taken.
    pub fn add(&mut self, symbol: Symbol) -> Result<SymbolId, SymbolError> {
        if self.by_name.contains_key(&symbol.name) {
            return Err(SymbolError::Duplicate(symbol.name));
        }
        let name = symbol.name.clone();
        let id = self.push(symbol);
        self.by_name.insert(name, id);
        Ok(id)
    }

    /// Interns a constant with the given literal text.
    ///
    /// `"n"`, `"m"` and `"y"` resolve to the built-in tristate constants.
    /// Other literals become constants of kind [`SymbolKind::Unknown`] and
    /// are deduplicated by text.
    pub fn constant(&mut self, text: &str) -> SymbolId {
        if let Some(id) = self.constants.get(text) {
            return *id;
        }
        let mut symbol = Symbol::new(text, SymbolKind::Unknown);
        symbol.is_constant = true;
        symbol.resolved = Value::Scalar(text.to_string());
        let id = self.push(symbol);
        self.constants.insert(text.to_string(), id);
        id
    }

    fn push(&mut self, symbol: Symbol) -> SymbolId {
        let id = SymbolId(self.symbols.len());
        self.symbols.push(symbol);
        id
    }

    /// Looks up a named (non-literal) symbol.
    pub fn lookup(&self, name: &str) -> Option<SymbolId> {
        self.by_name.get(name).copied()
    }

    /// Returns the symbol behind `id`.
    ///
    /// # Panics
    ///
    /// Panics if `id` was issued by a different table.
    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    /// Mutable access to the symbol behind `id`.
    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    /// Looks up a symbol by name.
    pub fn by_name(&self, name: &str) -> Option<&Symbol> {
        self.lookup(name).map(|id| self.get(id))
    }

    /// Assigns a user value, normalized with [`Symbol::normalize`].
    ///
    /// # Errors
    ///
    /// Returns [`SymbolError::Constant`] for constants and
    /// [`SymbolError::InvalidValue`] when the value does not fit the kind.
    pub fn set_value(&mut self, id: SymbolId, value: Value) -> Result<(), SymbolError> {
        let symbol = self.get(id);
        if symbol.is_constant {
            return Err(SymbolError::Constant(symbol.name.clone()));
        }
        let value = symbol.normalize(value)?;
        self.get_mut(id).user_value = Some(value);
        Ok(())
    }

    /// Iterates all symbols, constants included, in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.symbols
            .iter()
            .enumerate()
            .map(|(idx, symbol)| (SymbolId(idx), symbol))
    }

    /// Iterates named, non-constant symbols in insertion order.
    pub fn named(&self) -> impl Iterator<Item = (SymbolId, &Symbol)> {
        self.iter().filter(|(_, symbol)| !symbol.is_constant)
    }

    /// Number of symbols, constants included.
    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    /// `true` when only the built-in constants are present.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

impl SymbolSource for SymbolTable {
    fn symbol(&self, id: SymbolId) -> &Symbol {
        self.get(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_table_has_tristate_constants() {
        let table = SymbolTable::new();
        assert_eq!(table.get(table.no()).tri_level(), Tristate::No);
        assert_eq!(table.get(table.module()).tri_level(), Tristate::Module);
        assert_eq!(table.get(table.yes()).tri_level(), Tristate::Yes);
        assert!(table.get(table.yes()).is_constant);
        assert!(table.is_empty());
    }

    #[test]
    fn test_add_rejects_duplicates() {
        let mut table = SymbolTable::new();
        table.add(Symbol::new("A", SymbolKind::Bool)).unwrap();
        let err = table.add(Symbol::new("A", SymbolKind::Int)).unwrap_err();
        assert_eq!(err, SymbolError::Duplicate("A".to_string()));
    }

    #[test]
    fn test_constant_interning() {
        let mut table = SymbolTable::new();
        let x1 = table.constant("x");
        let x2 = table.constant("x");
        assert_eq!(x1, x2);
        assert_eq!(table.constant("y"), table.yes());
        assert_eq!(table.get(x1).str_value(), "x");
        assert!(table.lookup("x").is_none());
    }

    #[test]
    fn test_bool_promotes_module() {
        let mut table = SymbolTable::new();
        let a = table.add(Symbol::new("A", SymbolKind::Bool)).unwrap();
        table.set_value(a, Value::Tri(Tristate::Module)).unwrap();
        assert_eq!(table.get(a).user_value, Some(Value::Tri(Tristate::Yes)));
    }

    #[test]
    fn test_set_value_rejects_constants_and_bad_numbers() {
        let mut table = SymbolTable::new();
        let yes = table.yes();
        assert!(matches!(
            table.set_value(yes, Value::Tri(Tristate::No)),
            Err(SymbolError::Constant(_))
        ));

        let n = table.add(Symbol::new("N", SymbolKind::Int)).unwrap();
        assert!(matches!(
            table.set_value(n, Value::Scalar("0x10".into())),
            Err(SymbolError::InvalidValue { .. })
        ));
        table.set_value(n, Value::Scalar("16".into())).unwrap();
        assert_eq!(table.get(n).str_value(), "16");

        let s = table.add(Symbol::new("S", SymbolKind::String)).unwrap();
        assert!(table.set_value(s, Value::Tri(Tristate::No)).is_err());
        assert!(table.get(s).user_value.is_none());
    }

    #[test]
    fn test_normalize_by_kind() {
        let b = Symbol::new("B", SymbolKind::Bool);
        assert_eq!(
            b.normalize(Value::Scalar("m".into())),
            Ok(Value::Tri(Tristate::Yes))
        );
        assert!(b.normalize(Value::Scalar("on".into())).is_err());

        let h = Symbol::new("H", SymbolKind::Hex);
        assert_eq!(
            h.normalize(Value::Scalar("0x1f".into())),
            Ok(Value::Scalar("0x1f".into()))
        );
        assert!(h.normalize(Value::Scalar("--5".into())).is_err());
    }

    #[test]
    fn test_tri_level_of_scalars() {
        let s = Symbol::new("S", SymbolKind::String);
        assert_eq!(s.tri_level(), Tristate::No);
        let s = s.with_value(Value::Scalar("hello".into()));
        assert_eq!(s.tri_level(), Tristate::Module);
        let s = Symbol::new("S", SymbolKind::String).with_value(Value::Scalar("y".into()));
        assert_eq!(s.tri_level(), Tristate::Yes);
    }

    #[test]
    fn test_effective_value_prefers_user_value() {
        let s = Symbol::new("T", SymbolKind::Tristate).with_default(Value::Tri(Tristate::Yes));
        assert_eq!(s.tri_level(), Tristate::Yes);
        let s = s.with_value(Value::Tri(Tristate::No));
        assert_eq!(s.tri_level(), Tristate::No);
    }
}
