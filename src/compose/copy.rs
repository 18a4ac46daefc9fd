//! Copy rows of a table into itself, overriding some column values.
//!
//! ```text
//! INSERT INTO [Orders] ([CustomerID], [Status])
//! SELECT
//!   [t].[CustomerID],
//!   @p1
//! FROM [Orders] AS [t]
//! WHERE [t].[OrderID] = @p2
//! ```

use std::sync::Arc;

use indexmap::IndexMap;

use super::command::{Command, CommandKind, ComposeContext};
use super::{and_filters, base_table, effective_schema, tenant_filter};
use crate::error::{ConfigError, Result};
use crate::metadata::TableDefinition;
use crate::sql::{table_col, Insert, Query, SelectExpr};
use crate::translate::{Node, PredicateExt, Translator};
use crate::value::Value;

#[derive(Debug, Clone)]
#[must_use = "builders have no effect until composed"]
pub struct CopyCommand {
    table: Arc<TableDefinition>,
    overrides: IndexMap<String, Value>,
    filter: Option<Node>,
}

impl CopyCommand {
    pub fn new(table: Arc<TableDefinition>) -> Self {
        Self {
            table,
            overrides: IndexMap::new(),
            filter: None,
        }
    }

    /// Write `value` into `field` of every copied row.
    pub fn set(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.overrides.insert(field.to_string(), value.into());
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
        let alias = ctx.table_alias.as_str();
        let mut params = ctx.params();

        for field in self.overrides.keys() {
            let insertable = table.column(field).is_some_and(|c| !c.ignore_insert);
            if !insertable {
                return Err(ConfigError::UnknownField {
                    entity: table.entity.clone(),
                    field: field.clone(),
                }
                .into());
            }
        }

        let columns: Vec<_> = table.insertable().collect();
        if columns.is_empty() {
            return Err(ConfigError::NoColumns {
                entity: table.entity.clone(),
            }
            .into());
        }

        let select: Vec<SelectExpr> = columns
            .iter()
            .map(|c| {
                SelectExpr::new(match self.overrides.get(&c.field) {
                    Some(value) => params.bind(value.clone()),
                    None => table_col(alias, &c.name),
                })
            })
            .collect();

        let mut query = Query::new()
            .select(select)
            .from(base_table(table, ctx).with_alias(alias));

        let predicate = match &self.filter {
            Some(node) => Some(Translator::new(table, Some(alias), &mut params).predicate(node)?),
            None => None,
        };
        let tenant = tenant_filter(table, ctx, &mut params, alias);
        if let Some(condition) = and_filters(predicate, tenant) {
            query = query.filter(condition);
        }

        let sql = Insert::into(table.table.as_str())
            .schema(effective_schema(table, ctx))
            .columns(columns.iter().map(|c| c.name.as_str()))
            .from_select(query)
            .to_sql(ctx.dialect);
        Ok(Command::finish(&table.entity, sql, params, CommandKind::NonQuery))
    }
}
