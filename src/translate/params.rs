//! Request-scoped parameter bindings.

use serde::Serialize;

use crate::sql::{param, Dialect, Expr, SqlDialect};
use crate::value::Value;

/// One bound parameter of a composed command.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Binding {
    /// Generated name without sigil (`p1`).
    pub name: String,
    /// 1-based position within the command.
    pub position: usize,
    /// Placeholder text as it appears in the SQL (`@p1`, `$1`).
    pub placeholder: String,
    pub value: Value,
}

/// Hands out placeholder names for one command.
///
/// Names come from a counter owned by the set, so predicates translated into
/// the same set never collide no matter how many are combined.
#[derive(Debug, Clone)]
pub struct ParamSet {
    dialect: Dialect,
    stem: String,
    bindings: Vec<Binding>,
}

impl ParamSet {
    pub fn new(dialect: Dialect, stem: &str) -> Self {
        Self {
            dialect,
            stem: stem.to_string(),
            bindings: Vec::new(),
        }
    }

    /// Record `value` and return the placeholder expression standing for it.
    pub fn bind(&mut self, value: Value) -> Expr {
        let position = self.bindings.len() + 1;
        let name = format!("{}{}", self.stem, position);
        self.bindings.push(Binding {
            placeholder: self.dialect.placeholder(&name, position),
            name: name.clone(),
            position,
            value,
        });
        param(&name, position)
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn into_bindings(self) -> Vec<Binding> {
        self.bindings
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
