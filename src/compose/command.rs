use serde::Serialize;
use tracing::{debug, trace};

use crate::config::{Settings, SettingsError};
use crate::sql::Dialect;
use crate::translate::{Binding, ParamSet};
use crate::value::Value;

/// How the connection layer should run a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandKind {
    /// Returns a row cursor.
    Query,
    /// Returns an affected-row count.
    NonQuery,
    /// Returns a single value.
    Scalar,
}

/// Composed SQL text plus its ordered bindings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Command {
    pub sql: String,
    pub bindings: Vec<Binding>,
    pub kind: CommandKind,
}

impl Command {
    pub(crate) fn finish(entity: &str, sql: String, params: ParamSet, kind: CommandKind) -> Self {
        debug!(
            entity,
            kind = ?kind,
            dialect = %params.dialect(),
            bindings = params.len(),
            "composed command"
        );
        trace!(sql = %sql, "command text");
        Command {
            sql,
            bindings: params.into_bindings(),
            kind,
        }
    }

    /// Binding by generated name (`p1`).
    pub fn binding(&self, name: &str) -> Option<&Binding> {
        self.bindings.iter().find(|b| b.name == name)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.bindings.iter().map(|b| &b.value)
    }
}

/// Settings every composer shares.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposeContext {
    pub dialect: Dialect,
    pub param_stem: String,
    /// Alias of the base table in SELECT statements.
    pub table_alias: String,
    /// Bind `""` as NULL in UPDATE SET clauses.
    pub empty_string_as_null: bool,
    pub default_schema: Option<String>,
    /// Value of the tenant column for filtered and inserted rows.
    pub tenant: Option<Value>,
}

impl Default for ComposeContext {
    fn default() -> Self {
        Self::new(Dialect::default())
    }
}

impl ComposeContext {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            param_stem: "p".to_string(),
            table_alias: "t".to_string(),
            empty_string_as_null: true,
            default_schema: None,
            tenant: None,
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, SettingsError> {
        Ok(Self {
            dialect: settings.sql.dialect,
            param_stem: settings.sql.param_stem.clone(),
            table_alias: settings.sql.table_alias.clone(),
            empty_string_as_null: settings.sql.empty_string_as_null,
            default_schema: settings.mapping.resolved_default_schema()?,
            tenant: None,
        })
    }

    pub fn with_tenant(mut self, tenant: impl Into<Value>) -> Self {
        self.tenant = Some(tenant.into());
        self
    }

    pub fn with_default_schema(mut self, schema: &str) -> Self {
        self.default_schema = Some(schema.to_string());
        self
    }

    pub fn with_table_alias(mut self, alias: &str) -> Self {
        self.table_alias = alias.to_string();
        self
    }

    /// A fresh binding set for one command.
    pub fn params(&self) -> ParamSet {
        ParamSet::new(self.dialect, &self.param_stem)
    }
}
