//! INSERT composition, including the generated-key round trip.
//!
//! A table with primary keys gets back the full inserted row, not a row
//! count. Each dialect recovers the generated keys its own way:
//!
//! | Dialect  | Idiom |
//! |----------|-------|
//! | T-SQL    | `DECLARE @inserted TABLE`, `OUTPUT INSERTED.<keys> INTO @inserted`, join back |
//! | Postgres | `INSERT ... RETURNING <columns>` |
//! | MySQL    | `INSERT`, then select where the generated key equals `LAST_INSERT_ID()` |

use std::sync::Arc;

use super::command::{Command, CommandKind, ComposeContext};
use super::{base_table, effective_schema, source_value};
use crate::error::{ConfigError, Result};
use crate::metadata::{ColumnDescriptor, TableDefinition, ValueSource};
use crate::sql::{
    raw_sql, table_col, DeclareTable, Expr, ExprExt, IdentityRetrieval, Insert, Query, SelectExpr,
    SqlDialect, TableRef,
};
use crate::translate::ParamSet;

const HOLDING_TABLE: &str = "inserted";
const HOLDING_ALIAS: &str = "i";
const STATEMENT_SEPARATOR: &str = ";\n";

/// An INSERT of one row read from a [`ValueSource`].
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until composed"]
pub struct InsertCommand {
    table: Arc<TableDefinition>,
}

impl InsertCommand {
    pub fn new(table: Arc<TableDefinition>) -> Self {
        Self { table }
    }

    pub fn compose(&self, source: &dyn ValueSource, ctx: &ComposeContext) -> Result<Command> {
        let table = &self.table;
        let dialect = ctx.dialect;
        let mut params = ctx.params();

        let columns: Vec<&ColumnDescriptor> = table.insertable().collect();
        let mut insert = Insert::into(table.table.as_str()).schema(effective_schema(table, ctx));
        if !columns.is_empty() {
            let values: Vec<Expr> = columns
                .iter()
                .map(|c| params.bind(source_value(c, source, ctx)))
                .collect();
            insert = insert
                .columns(columns.iter().map(|c| c.name.as_str()))
                .values(values);
        }

        if !table.has_primary_key() {
            let sql = insert.to_sql(dialect);
            return Ok(Command::finish(&table.entity, sql, params, CommandKind::NonQuery));
        }

        let selected: Vec<&ColumnDescriptor> = table.selectable().collect();
        if selected.is_empty() {
            return Err(ConfigError::NoSelectableColumns {
                entity: table.entity.clone(),
            }
            .into());
        }

        let sql = match dialect.identity_retrieval() {
            IdentityRetrieval::OutputInto => {
                let keys = table.primary_keys();
                let declare = keys
                    .iter()
                    .fold(DeclareTable::new(HOLDING_TABLE), |d, k| d.column(k.name.as_str(), k.field_type));
                let insert = insert.output_into(keys.iter().map(|k| k.name.as_str()), HOLDING_TABLE);

                let alias = ctx.table_alias.as_str();
                let on = keys
                    .iter()
                    .map(|k| table_col(alias, &k.name).eq(table_col(HOLDING_ALIAS, &k.name)))
                    .reduce(|acc, cond| acc.and(cond))
                    .ok_or_else(|| missing_key(table))?;
                let select_back = Query::new()
                    .select(select_list(&selected, alias))
                    .from(base_table(table, ctx).with_alias(alias))
                    .inner_join(TableRef::variable(HOLDING_TABLE).with_alias(HOLDING_ALIAS), on);

                [
                    declare.to_sql(dialect),
                    insert.to_sql(dialect),
                    select_back.to_sql(dialect),
                ]
                .join(STATEMENT_SEPARATOR)
            }

            IdentityRetrieval::Returning => insert
                .returning(selected.iter().map(|c| c.name.as_str()))
                .to_sql(dialect),

            IdentityRetrieval::LastInsertId { function } => {
                let generated = table.generated_keys();
                if generated.len() > 1 {
                    return Err(ConfigError::Unsupported {
                        dialect: dialect.name(),
                        feature: format!(
                            "{} generated keys on {} (only one is recoverable)",
                            generated.len(),
                            table.entity
                        ),
                    }
                    .into());
                }

                let alias = ctx.table_alias.as_str();
                let filter = last_insert_filter(table, source, ctx, &mut params, alias, function)?;
                let select_back = Query::new()
                    .select(select_list(&selected, alias))
                    .from(base_table(table, ctx).with_alias(alias))
                    .filter(filter);

                [insert.to_sql(dialect), select_back.to_sql(dialect)].join(STATEMENT_SEPARATOR)
            }
        };

        Ok(Command::finish(&table.entity, sql, params, CommandKind::Query))
    }
}

fn select_list(columns: &[&ColumnDescriptor], alias: &str) -> Vec<SelectExpr> {
    columns
        .iter()
        .map(|c| SelectExpr::new(table_col(alias, &c.name)))
        .collect()
}

/// Generated key against the session's last insert id, supplied keys
/// against their bound values.
fn last_insert_filter(
    table: &TableDefinition,
    source: &dyn ValueSource,
    ctx: &ComposeContext,
    params: &mut ParamSet,
    alias: &str,
    function: &str,
) -> Result<Expr> {
    table
        .primary_keys()
        .into_iter()
        .map(|key| {
            let value = if key.is_generated() {
                raw_sql(&format!("{}()", function))
            } else {
                params.bind(source_value(key, source, ctx))
            };
            table_col(alias, &key.name).eq(value)
        })
        .reduce(|acc, cond| acc.and(cond))
        .ok_or_else(|| missing_key(table))
}

fn missing_key(table: &TableDefinition) -> crate::OrmError {
    ConfigError::MissingPrimaryKey {
        entity: table.entity.clone(),
        context: "insert select-back",
    }
    .into()
}
