//! Serializable symbol schema.
//!
//! A schema file lists every symbol with its type, optional default, and
//! direct dependency. Dependencies are written as a small expression tree
//! that names other symbols; [`SchemaFile::into_table`] resolves the names
//! into a [`SymbolTable`].
//!
//! # Example YAML
//!
//! ```yaml
//! symbols:
//!   - name: NET
//!     type: bool
//!   - name: ARCH
//!     type: string
//!     default: "x86"
//!   - name: WIFI
//!     type: tristate
//!     depends_on:
//!       and:
//!         - sym: NET
//!         - eq: [ARCH, { const: "x86" }]
//! ```
//!
//! Expression nodes are `sym`, `const`, `not`, `and`, `or` (`and`/`or` take
//! any number of operands) and the relations `eq`, `ne`, `lt`, `le`, `gt`,
//! `ge`, whose two operands are a symbol name or `{ const: ... }`. The names
//! `n`, `m` and `y` refer to the tristate constants.

use serde::{Deserialize, Serialize};

use confmerge_core::{Expr, RelOp, Symbol, SymbolId, SymbolKind, SymbolTable, Tristate, Value};

use crate::error::{DatabaseError, Result};

/// Top-level schema document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchemaFile {
    #[serde(default)]
    pub symbols: Vec<SymbolSpec>,
}

/// One symbol definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SymbolSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: SymbolKind,
    /// Value used when no fragment assigns the symbol.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    /// Constant symbols keep their default and are never assigned.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub constant: bool,
    /// Written as nested single-key maps (`{ and: [...] }`) in YAML too.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_yaml::with::singleton_map_recursive"
    )]
    pub depends_on: Option<ExprSpec>,
}

impl SymbolSpec {
    pub fn new(name: impl Into<String>, kind: SymbolKind) -> Self {
        Self {
            name: name.into(),
            kind,
            default: None,
            constant: false,
            depends_on: None,
        }
    }

    pub fn depends_on(mut self, dep: ExprSpec) -> Self {
        self.depends_on = Some(dep);
        self
    }

    pub fn with_default(mut self, value: &str) -> Self {
        self.default = Some(value.to_string());
        self
    }
}

/// Relation operand: a symbol name or a quoted constant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OperandSpec {
    Symbol(String),
    Const {
        #[serde(rename = "const")]
        value: String,
    },
}

/// Dependency expression as written in a schema file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExprSpec {
    Sym(String),
    Const(String),
    Not(Box<ExprSpec>),
    And(Vec<ExprSpec>),
    Or(Vec<ExprSpec>),
    Eq(OperandSpec, OperandSpec),
    Ne(OperandSpec, OperandSpec),
    Lt(OperandSpec, OperandSpec),
    Le(OperandSpec, OperandSpec),
    Gt(OperandSpec, OperandSpec),
    Ge(OperandSpec, OperandSpec),
}

impl SchemaFile {
    /// Parses a JSON schema document.
    pub fn from_json_str(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parses a YAML schema document.
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Builds a [`SymbolTable`] from the definitions.
    ///
    /// Symbols are registered first and dependencies resolved afterwards, so
    /// forward references and dependency cycles are allowed.
    ///
    /// # Errors
    ///
    /// Returns [`DatabaseError::Symbol`] for duplicate names or defaults that
    /// do not fit the symbol's type, and [`DatabaseError::UnknownSymbol`] for
    /// dependencies on undefined names.
    pub fn into_table(self) -> Result<SymbolTable> {
        let mut table = SymbolTable::new();
        let mut pending = Vec::with_capacity(self.symbols.len());

        for spec in self.symbols {
            let mut symbol = Symbol::new(spec.name.clone(), spec.kind);
            if let Some(text) = spec.default {
                symbol.resolved = symbol.normalize(Value::Scalar(text))?;
            }
            symbol.is_constant = spec.constant;
            let id = table.add(symbol)?;
            if let Some(dep) = spec.depends_on {
                pending.push((id, dep));
            }
        }

        for (id, dep) in pending {
            let expr = resolve(&mut table, id, &dep)?;
            table.get_mut(id).direct_dep = expr;
        }

        Ok(table)
    }
}

fn resolve(table: &mut SymbolTable, owner: SymbolId, spec: &ExprSpec) -> Result<Expr> {
    let expr = match spec {
        ExprSpec::Sym(name) => Expr::symbol(resolve_name(table, owner, name)?),
        ExprSpec::Const(text) => Expr::symbol(table.constant(text)),
        ExprSpec::Not(operand) => Expr::not(resolve(table, owner, operand)?),
        ExprSpec::And(operands) => fold(table, owner, operands, Tristate::Yes, Expr::and)?,
        ExprSpec::Or(operands) => fold(table, owner, operands, Tristate::No, Expr::or)?,
        ExprSpec::Eq(l, r) => relation(table, owner, RelOp::Eq, l, r)?,
        ExprSpec::Ne(l, r) => relation(table, owner, RelOp::Ne, l, r)?,
        ExprSpec::Lt(l, r) => relation(table, owner, RelOp::Lt, l, r)?,
        ExprSpec::Le(l, r) => relation(table, owner, RelOp::Le, l, r)?,
        ExprSpec::Gt(l, r) => relation(table, owner, RelOp::Gt, l, r)?,
        ExprSpec::Ge(l, r) => relation(table, owner, RelOp::Ge, l, r)?,
    };
    Ok(expr)
}

/// Folds n-ary operands left into binary nodes; `empty` is the identity.
fn fold(
    table: &mut SymbolTable,
    owner: SymbolId,
    operands: &[ExprSpec],
    empty: Tristate,
    join: fn(Expr, Expr) -> Expr,
) -> Result<Expr> {
    let mut iter = operands.iter();
    let Some(first) = iter.next() else {
        return Ok(Expr::symbol(table.tristate_constant(empty)));
    };
    let mut acc = resolve(table, owner, first)?;
    for operand in iter {
        acc = join(acc, resolve(table, owner, operand)?);
    }
    Ok(acc)
}

fn relation(
    table: &mut SymbolTable,
    owner: SymbolId,
    op: RelOp,
    left: &OperandSpec,
    right: &OperandSpec,
) -> Result<Expr> {
    let left = operand(table, owner, left)?;
    let right = operand(table, owner, right)?;
    Ok(Expr::relation(op, left, right))
}

fn operand(table: &mut SymbolTable, owner: SymbolId, spec: &OperandSpec) -> Result<SymbolId> {
    match spec {
        OperandSpec::Symbol(name) => resolve_name(table, owner, name),
        OperandSpec::Const { value } => Ok(table.constant(value)),
    }
}

fn resolve_name(table: &SymbolTable, owner: SymbolId, name: &str) -> Result<SymbolId> {
    if let Some(id) = table.lookup(name) {
        return Ok(id);
    }
    if let Ok(tri) = name.parse::<Tristate>() {
        return Ok(table.tristate_constant(tri));
    }
    Err(DatabaseError::UnknownSymbol {
        name: name.to_string(),
        referenced_by: table.get(owner).name.clone(),
    })
}
