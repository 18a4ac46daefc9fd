//! Command composition: table definition + predicate + modifiers in,
//! `Command { sql, bindings }` out.
//!
//! # Architecture
//!
//! ```text
//! SelectCommand / InsertCommand / UpdateCommand / DeleteCommand / CopyCommand
//!        │  resolve joins (metadata::Registry)
//!        │  translate predicates (translate::Translator into one ParamSet)
//!        ▼
//! sql::Query / sql::dml::{Insert, Update, Delete, DeclareTable}
//!        │  serialize through the target Dialect
//!        ▼
//! Command { sql, bindings, kind }
//! ```
//!
//! Nothing here touches a connection. Every shape error is raised before
//! a command exists.

mod command;
mod copy;
mod delete;
mod insert;
mod select;
mod update;

pub use command::{Command, CommandKind, ComposeContext};
pub use copy::CopyCommand;
pub use delete::DeleteCommand;
pub use insert::InsertCommand;
pub use select::{Aggregate, SelectCommand, AGGREGATE_ALIAS};
pub(crate) use select::resolve_joins;
pub use update::{identity_filter, UpdateCommand};

pub use crate::translate::Binding;

use crate::metadata::{ColumnDescriptor, TableDefinition, ValueSource};
use crate::sql::{table_col, Expr, ExprExt, TableRef};
use crate::translate::ParamSet;
use crate::value::Value;

/// `qualifier.tenant = @p` when the table has a tenant column and the
/// context carries a tenant value.
fn tenant_filter(
    table: &TableDefinition,
    ctx: &ComposeContext,
    params: &mut ParamSet,
    qualifier: &str,
) -> Option<Expr> {
    let column = table.tenant_column()?;
    let tenant = ctx.tenant.clone()?;
    Some(table_col(qualifier, &column.name).eq(params.bind(tenant)))
}

/// AND two optional conditions.
fn and_filters(left: Option<Expr>, right: Option<Expr>) -> Option<Expr> {
    match (left, right) {
        (Some(l), Some(r)) => Some(l.and(r)),
        (l, r) => l.or(r),
    }
}

/// Base table reference with the effective schema.
fn base_table(table: &TableDefinition, ctx: &ComposeContext) -> TableRef {
    TableRef::new(&table.table).with_optional_schema(table.schema_or(ctx.default_schema.as_deref()))
}

fn effective_schema(table: &TableDefinition, ctx: &ComposeContext) -> Option<String> {
    table
        .schema_or(ctx.default_schema.as_deref())
        .map(String::from)
}

/// Value for `column` from the caller, with the tenant override applied.
fn source_value(
    column: &ColumnDescriptor,
    source: &dyn ValueSource,
    ctx: &ComposeContext,
) -> Value {
    if column.tenant_id {
        if let Some(tenant) = &ctx.tenant {
            return tenant.clone();
        }
    }
    source.value_of(&column.field).unwrap_or(Value::Null)
}
