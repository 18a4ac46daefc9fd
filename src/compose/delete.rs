use std::sync::Arc;

use super::command::{Command, CommandKind, ComposeContext};
use super::update::identity_filter;
use super::{and_filters, effective_schema, tenant_filter};
use crate::error::{ConfigError, Result};
use crate::metadata::{TableDefinition, ValueSource};
use crate::sql::Delete;
use crate::translate::{Node, PredicateExt, Translator};

/// A DELETE matched by a predicate or by an instance's primary key values.
///
/// A DELETE with neither is refused rather than clearing the table.
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until composed"]
pub struct DeleteCommand {
    table: Arc<TableDefinition>,
    filter: Option<Node>,
}

impl DeleteCommand {
    pub fn new(table: Arc<TableDefinition>) -> Self {
        Self {
            table,
            filter: None,
        }
    }

    pub fn filter(mut self, predicate: Node) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    /// Match the row whose primary keys equal `source`'s.
    pub fn key_from(self, source: &dyn ValueSource) -> Result<Self> {
        let predicate = identity_filter(&self.table, source)?;
        Ok(self.filter(predicate))
    }

    pub fn compose(&self, ctx: &ComposeContext) -> Result<Command> {
        let table = &self.table;
        let Some(node) = &self.filter else {
            return Err(ConfigError::UnboundedMutation {
                entity: table.entity.clone(),
                statement: "DELETE",
            }
            .into());
        };

        let mut params = ctx.params();
        let qualifier = table.table.as_str();
        let predicate = Translator::new(table, Some(qualifier), &mut params).predicate(node)?;
        let tenant = tenant_filter(table, ctx, &mut params, qualifier);

        let mut delete = Delete::from(table.table.as_str()).schema(effective_schema(table, ctx));
        if let Some(condition) = and_filters(Some(predicate), tenant) {
            delete = delete.filter(condition);
        }

        let sql = delete.to_sql(ctx.dialect);
        Ok(Command::finish(&table.entity, sql, params, CommandKind::NonQuery))
    }
}
