//! SELECT composition with joins, projections and row modifiers.

use std::collections::HashSet;
use std::sync::Arc;

use super::command::{Command, CommandKind, ComposeContext};
use super::{and_filters, base_table, tenant_filter};
use crate::error::{ConfigError, Result};
use crate::metadata::{JoinDefinition, JoinKind, Registry, ResolvedJoin, TableDefinition};
use crate::sql::{
    avg, count_star, max, min, sum, table_col, Expr, ExprExt, OrderByExpr, Query, SelectExpr,
    SortDir, SqlDialect, TableRef,
};
use crate::translate::{Node, PredicateExt, Translator};

/// Aggregate modifier turning a SELECT into a scalar command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Aggregate {
    Count,
    Sum(String),
    Avg(String),
    Min(String),
    Max(String),
}

/// Result column alias of an aggregate command.
pub const AGGREGATE_ALIAS: &str = "value";

/// A SELECT over one entity.
///
/// ```ignore
/// let cmd = SelectCommand::new(registry.resolve::<Order>()?)
///     .filter(Order::CUSTOMER_ID.eq(5))
///     .order_by("create_date", SortDir::Desc)
///     .top(10)
///     .compose(&registry, &ctx)?;
/// ```
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until composed"]
pub struct SelectCommand {
    table: Arc<TableDefinition>,
    filter: Option<Node>,
    joins: Vec<JoinDefinition>,
    projection: Option<Vec<String>>,
    top: Option<u64>,
    distinct: bool,
    order_by: Vec<(String, SortDir)>,
    page: Option<(u64, u64)>,
    aggregate: Option<Aggregate>,
}

impl SelectCommand {
    pub fn new(table: Arc<TableDefinition>) -> Self {
        Self {
            table,
            filter: None,
            joins: Vec::new(),
            projection: None,
            top: None,
            distinct: false,
            order_by: Vec::new(),
            page: None,
            aggregate: None,
        }
    }

    /// Add a predicate, ANDed with any previous one.
    pub fn filter(mut self, predicate: Node) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(predicate),
            None => predicate,
        });
        self
    }

    pub fn filter_opt(self, predicate: Option<Node>) -> Self {
        match predicate {
            Some(p) => self.filter(p),
            None => self,
        }
    }

    /// Add a join on top of the ones the entity declares.
    pub fn join(mut self, join: JoinDefinition) -> Self {
        self.joins.push(join);
        self
    }

    pub fn joins(mut self, joins: impl IntoIterator<Item = JoinDefinition>) -> Self {
        self.joins.extend(joins);
        self
    }

    /// Select only these fields instead of every selectable column.
    pub fn project<S: AsRef<str>>(mut self, fields: impl IntoIterator<Item = S>) -> Self {
        self.projection = Some(fields.into_iter().map(|f| f.as_ref().to_string()).collect());
        self
    }

    pub fn top(mut self, n: u64) -> Self {
        self.top = Some(n);
        self
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    pub fn order_by(mut self, field: &str, dir: SortDir) -> Self {
        self.order_by.push((field.to_string(), dir));
        self
    }

    /// Skip `offset` rows, then return at most `limit`.
    pub fn page(mut self, offset: u64, limit: u64) -> Self {
        self.page = Some((offset, limit));
        self
    }

    pub fn aggregate(mut self, aggregate: Aggregate) -> Self {
        self.aggregate = Some(aggregate);
        self
    }

    pub fn count(self) -> Self {
        self.aggregate(Aggregate::Count)
    }

    pub fn table(&self) -> &Arc<TableDefinition> {
        &self.table
    }

    /// Declared plus extra joins, resolved, each correlation id once.
    pub fn resolve_joins(&self, registry: &Registry) -> Result<Vec<ResolvedJoin>> {
        resolve_joins(&self.table, &self.joins, registry)
    }

    pub fn compose(&self, registry: &Registry, ctx: &ComposeContext) -> Result<Command> {
        let table = &self.table;
        let alias = ctx.table_alias.as_str();
        let dialect = ctx.dialect;
        let mut params = ctx.params();
        self.check_row_counts()?;

        let mut query = Query::new().from(base_table(table, ctx).with_alias(alias));

        let mut select = match &self.aggregate {
            Some(aggregate) => {
                vec![self.aggregate_expr(aggregate, alias)?.alias(AGGREGATE_ALIAS)]
            }
            None => self.select_list(alias, ctx)?,
        };

        let joins = self.resolve_joins(registry)?;
        for join in &joins {
            if join.kind == JoinKind::FullOuter && !dialect.supports_full_outer_join() {
                return Err(ConfigError::Unsupported {
                    dialect: dialect.name(),
                    feature: "FULL OUTER JOIN".to_string(),
                }
                .into());
            }
            let target = TableRef::new(&join.table)
                .with_optional_schema(join.schema.as_deref().or(ctx.default_schema.as_deref()))
                .with_alias(&join.alias);
            let on = table_col(alias, &join.left_column).eq(table_col(&join.alias, &join.right_column));
            query = query.join(join.kind.join_type(), target, on);

            if self.aggregate.is_none() {
                select.extend(
                    join.columns
                        .iter()
                        .map(|c| table_col(&join.alias, &c.column).alias(&c.alias)),
                );
            }
        }
        query = query.select(select);

        let predicate = match &self.filter {
            Some(node) => Some(Translator::new(table, Some(alias), &mut params).predicate(node)?),
            None => None,
        };
        let tenant = tenant_filter(table, ctx, &mut params, alias);
        if let Some(condition) = and_filters(predicate, tenant) {
            query = query.filter(condition);
        }

        let kind = if self.aggregate.is_some() {
            CommandKind::Scalar
        } else {
            if self.distinct {
                query = query.distinct();
            }
            if let Some(n) = self.top {
                query = query.top(n);
            }
            let mut order = Vec::with_capacity(self.order_by.len());
            for (field, dir) in &self.order_by {
                let expr = self.field_expr(field, alias, ctx)?;
                order.push(match dir {
                    SortDir::Asc => OrderByExpr::asc(expr),
                    SortDir::Desc => OrderByExpr::desc(expr),
                });
            }
            query = query.order_by(order);
            if let Some((offset, limit)) = self.page {
                query = query.offset(offset).limit(limit);
            }
            CommandKind::Query
        };

        let sql = query.to_sql(dialect);
        Ok(Command::finish(&table.entity, sql, params, kind))
    }

    fn select_list(&self, alias: &str, ctx: &ComposeContext) -> Result<Vec<SelectExpr>> {
        let table = &self.table;
        let items: Vec<SelectExpr> = match &self.projection {
            Some(fields) => fields
                .iter()
                .map(|f| self.projected(f, alias, ctx))
                .collect::<Result<_>>()?,
            None => table
                .selectable()
                .map(|c| SelectExpr::new(table_col(alias, &c.name)))
                .chain(
                    table
                        .custom_columns
                        .iter()
                        .map(|c| custom_expr(&c.template, alias, ctx).alias(&c.name)),
                )
                .collect(),
        };

        if items.is_empty() {
            return Err(ConfigError::NoSelectableColumns {
                entity: table.entity.clone(),
            }
            .into());
        }
        Ok(items)
    }

    fn projected(&self, field: &str, alias: &str, ctx: &ComposeContext) -> Result<SelectExpr> {
        if let Some(column) = self.table.column(field) {
            return Ok(SelectExpr::new(table_col(alias, &column.name)));
        }
        if let Some(custom) = self.table.custom_column(field) {
            return Ok(custom_expr(&custom.template, alias, ctx).alias(&custom.name));
        }
        Err(self.unknown(field))
    }

    fn field_expr(&self, field: &str, alias: &str, ctx: &ComposeContext) -> Result<Expr> {
        if let Some(column) = self.table.column(field) {
            return Ok(table_col(alias, &column.name));
        }
        if let Some(custom) = self.table.custom_column(field) {
            return Ok(custom_expr(&custom.template, alias, ctx));
        }
        Err(self.unknown(field))
    }

    fn aggregate_expr(&self, aggregate: &Aggregate, alias: &str) -> Result<Expr> {
        let column = |field: &str| {
            self.table
                .column(field)
                .map(|c| table_col(alias, &c.name))
                .ok_or_else(|| self.unknown(field))
        };
        Ok(match aggregate {
            Aggregate::Count => count_star(),
            Aggregate::Sum(f) => sum(column(f.as_str())?),
            Aggregate::Avg(f) => avg(column(f.as_str())?),
            Aggregate::Min(f) => min(column(f.as_str())?),
            Aggregate::Max(f) => max(column(f.as_str())?),
        })
    }

    fn check_row_counts(&self) -> Result<()> {
        let counts = [
            ("TOP", self.top),
            ("OFFSET", self.page.map(|(offset, _)| offset)),
            ("LIMIT", self.page.map(|(_, limit)| limit)),
        ];
        for (modifier, value) in counts {
            if let Some(value) = value.filter(|v| i64::try_from(*v).is_err()) {
                return Err(ConfigError::RowCountOutOfRange {
                    entity: self.table.entity.clone(),
                    modifier,
                    value,
                }
                .into());
            }
        }
        Ok(())
    }

    fn unknown(&self, field: &str) -> crate::OrmError {
        ConfigError::UnknownField {
            entity: self.table.entity.clone(),
            field: field.to_string(),
        }
        .into()
    }
}

/// Custom column template with `{alias}` replaced by the quoted alias.
fn custom_expr(template: &str, alias: &str, ctx: &ComposeContext) -> Expr {
    Expr::Raw(template.replace("{alias}", &ctx.dialect.quote_identifier(alias)))
}

pub(crate) fn resolve_joins(
    table: &TableDefinition,
    extra: &[JoinDefinition],
    registry: &Registry,
) -> Result<Vec<ResolvedJoin>> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::new();
    for join in table.joins.iter().chain(extra) {
        if seen.insert(join.id()) {
            resolved.push(join.resolve(table, registry)?);
        }
    }
    Ok(resolved)
}
