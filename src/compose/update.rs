//! UPDATE composition and the update-by-identity fallback.

use std::sync::Arc;

use indexmap::IndexMap;

use super::command::{Command, CommandKind, ComposeContext};
use super::{and_filters, effective_schema, tenant_filter};
use crate::error::{ConfigError, Result};
use crate::metadata::{TableDefinition, ValueSource};
use crate::sql::Update;
use crate::translate::{field, Node, PredicateExt, Translator};
use crate::value::Value;

/// Equality over every primary key, using the caller's current key values.
///
/// This is the WHERE clause of an UPDATE or DELETE that names no predicate.
/// A NULL or missing key value is rejected because `pk = NULL` matches no row.
pub fn identity_filter(table: &TableDefinition, source: &dyn ValueSource) -> Result<Node> {
    let mut filter: Option<Node> = None;
    for key in table.primary_keys() {
        let value = source.value_of(&key.field).unwrap_or(Value::Null);
        if value.is_null() {
            return Err(ConfigError::UnboundedMutation {
                entity: table.entity.clone(),
                statement: "identity match",
            }
            .into());
        }
        let cond = field(&key.field).eq(value);
        filter = Some(match filter {
            Some(existing) => existing.and(cond),
            None => cond,
        });
    }
    filter.ok_or_else(|| {
        ConfigError::MissingPrimaryKey {
            entity: table.entity.clone(),
            context: "identity match",
        }
        .into()
    })
}

/// An UPDATE of one entity's table.
///
/// Assigned values come from explicit [`set`](Self::set) calls and from a
/// [`source`](Self::source) (every updatable field, or the ones named by
/// [`fields`](Self::fields)). Without a [`filter`](Self::filter) the rows are
/// matched by the source's primary key values.
#[derive(Clone)]
#[must_use = "builders have no effect until composed"]
pub struct UpdateCommand<'a> {
    table: Arc<TableDefinition>,
    source: Option<&'a dyn ValueSource>,
    fields: Option<Vec<String>>,
    assignments: IndexMap<String, Value>,
    filter: Option<Node>,
}

impl<'a> UpdateCommand<'a> {
    pub fn new(table: Arc<TableDefinition>) -> Self {
        Self {
            table,
            source: None,
            fields: None,
            assignments: IndexMap::new(),
            filter: None,
        }
    }

    pub fn source(mut self, source: &'a dyn ValueSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Restrict source-driven assignments to these fields.
    pub fn fields<S: AsRef<str>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.fields = Some(fields.into_iter().map(|f| f.as_ref().to_string()).collect());
        self
    }

    /// Assign an explicit value; wins over the source's value for the same field.
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.assignments.insert(field.to_string(), value.into());
        self
    }

    pub fn filter(mut self, predicate: Node) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn compose(&self, ctx: &ComposeContext) -> Result<Command> {
        let table = &self.table;
        let mut params = ctx.params();

        let assignments = self.assignments()?;
        if assignments.is_empty() {
            return Err(ConfigError::NothingToUpdate {
                entity: table.entity.clone(),
            }
            .into());
        }

        let mut update = Update::table(table.table.as_str()).schema(effective_schema(table, ctx));
        for (column, value) in assignments {
            let value = if ctx.empty_string_as_null && value.is_empty_text() {
                Value::Null
            } else {
                value
            };
            update = update.set(column, params.bind(value));
        }

        let predicate = match (&self.filter, self.source) {
            (Some(node), _) => node.clone(),
            (None, Some(source)) => identity_filter(table, source)?,
            (None, None) => {
                return Err(ConfigError::UnboundedMutation {
                    entity: table.entity.clone(),
                    statement: "UPDATE",
                }
                .into())
            }
        };

        let qualifier = table.table.as_str();
        let predicate = Translator::new(table, Some(qualifier), &mut params).predicate(&predicate)?;
        let tenant = tenant_filter(table, ctx, &mut params, qualifier);
        if let Some(condition) = and_filters(Some(predicate), tenant) {
            update = update.filter(condition);
        }

        let sql = update.to_sql(ctx.dialect);
        Ok(Command::finish(&table.entity, sql, params, CommandKind::NonQuery))
    }

    /// Column name and value of every assignment, ignore-on-update skipped.
    fn assignments(&self) -> Result<Vec<(String, Value)>> {
        let table = &self.table;
        let unknown = |field: &str| ConfigError::UnknownField {
            entity: table.entity.clone(),
            field: field.to_string(),
        };

        let mut values: IndexMap<String, Value> = IndexMap::new();
        if let Some(source) = self.source {
            match &self.fields {
                Some(fields) => {
                    for name in fields {
                        if table.column(name).is_none() {
                            return Err(unknown(name.as_str()).into());
                        }
                        if let Some(value) = source.value_of(name) {
                            values.insert(name.clone(), value);
                        }
                    }
                }
                None => {
                    for column in table.updatable() {
                        if let Some(value) = source.value_of(&column.field) {
                            values.insert(column.field.clone(), value);
                        }
                    }
                }
            }
        }
        for (name, value) in &self.assignments {
            if table.column(name).is_none() {
                return Err(unknown(name.as_str()).into());
            }
            values.insert(name.clone(), value.clone());
        }

        Ok(values
            .into_iter()
            .filter_map(|(name, value)| {
                table
                    .updatable()
                    .find(|c| c.field == name)
                    .map(|c| (c.name.clone(), value))
            })
            .collect())
    }
}

impl std::fmt::Debug for UpdateCommand<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UpdateCommand")
            .field("entity", &self.table.entity)
            .field("has_source", &self.source.is_some())
            .field("fields", &self.fields)
            .field("assignments", &self.assignments)
            .field("filter", &self.filter)
            .finish()
    }
}
