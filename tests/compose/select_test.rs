//! SELECT composition across dialects.

#[path = "../support/entities.rs"]
mod entities;

use entities::{assert_parses, customer_name_join, customer_object_join, Customer, Invoice, Order, Secret};
use quarry::metadata::{JoinKind, JoinTarget};
use quarry::prelude::*;
use quarry::sql::SortDir;

fn compose(select: SelectCommand, registry: &Registry, dialect: Dialect) -> Command {
    select
        .compose(registry, &ComposeContext::new(dialect))
        .unwrap()
}

#[test]
fn test_select_with_filter_and_top() {
    let registry = Registry::new();
    let select = SelectCommand::new(registry.resolve::<Order>().unwrap())
        .filter(Order::CUSTOMER_ID.eq(5).and(Order::CREATE_DATE.is_not_null()))
        .top(10);
    let cmd = compose(select, &registry, Dialect::TSql);

    insta::assert_snapshot!(cmd.sql, @r"
    SELECT TOP (10)
      [t].[OrderID],
      [t].[CustomerID],
      [t].[CreateDate],
      [t].[OrderTypeID],
      [t].[SKU],
      [t].[Shipped]
    FROM [dbo].[Orders] AS [t]
    WHERE ([t].[CustomerID] = @p1 AND [t].[CreateDate] IS NOT NULL)
    ");
    assert_eq!(cmd.kind, CommandKind::Query);
    assert_eq!(cmd.bindings.len(), 1);
    assert_eq!(cmd.binding("p1").map(|b| &b.value), Some(&Value::I32(5)));
    assert_parses(&cmd.sql, Dialect::TSql);
}

#[test]
fn test_top_becomes_limit_outside_tsql() {
    let registry = Registry::new();
    let orders = registry.resolve::<Order>().unwrap();

    let mysql = compose(SelectCommand::new(orders.clone()).top(3), &registry, Dialect::MySql);
    assert!(mysql.sql.starts_with("SELECT\n  `t`.`OrderID`"), "{}", mysql.sql);
    assert!(mysql.sql.ends_with("\nLIMIT 3"), "{}", mysql.sql);
    assert_parses(&mysql.sql, Dialect::MySql);

    let postgres = compose(SelectCommand::new(orders).top(3), &registry, Dialect::Postgres);
    assert!(postgres.sql.contains("FROM \"dbo\".\"Orders\" AS \"t\""), "{}", postgres.sql);
    assert!(postgres.sql.ends_with("\nLIMIT 3"), "{}", postgres.sql);
    assert_parses(&postgres.sql, Dialect::Postgres);
}

#[test]
fn test_order_and_page() {
    let registry = Registry::new();
    let select = SelectCommand::new(registry.resolve::<Order>().unwrap())
        .order_by("create_date", SortDir::Desc)
        .page(20, 10);

    let tsql = compose(select.clone(), &registry, Dialect::TSql);
    assert!(
        tsql.sql.ends_with("ORDER BY [t].[CreateDate] DESC\nOFFSET 20 ROWS FETCH NEXT 10 ROWS ONLY"),
        "{}",
        tsql.sql
    );
    assert_parses(&tsql.sql, Dialect::TSql);

    let postgres = compose(select, &registry, Dialect::Postgres);
    assert!(
        postgres.sql.ends_with("ORDER BY \"t\".\"CreateDate\" DESC\nLIMIT 10 OFFSET 20"),
        "{}",
        postgres.sql
    );
    assert_parses(&postgres.sql, Dialect::Postgres);
}

#[test]
fn test_tsql_paging_without_order() {
    let registry = Registry::new();
    let select = SelectCommand::new(registry.resolve::<Customer>().unwrap()).page(0, 5);
    let cmd = compose(select, &registry, Dialect::TSql);
    assert!(cmd.sql.contains("ORDER BY (SELECT NULL)"), "{}", cmd.sql);
}

#[test]
fn test_projection() {
    let registry = Registry::new();
    let select = SelectCommand::new(registry.resolve::<Order>().unwrap())
        .project(["order_id", "sku"])
        .distinct();
    let cmd = compose(select, &registry, Dialect::TSql);
    insta::assert_snapshot!(cmd.sql, @r"
    SELECT DISTINCT
      [t].[OrderID],
      [t].[SKU]
    FROM [dbo].[Orders] AS [t]
    ");

    let unknown = SelectCommand::new(registry.resolve::<Order>().unwrap())
        .project(["missing"])
        .compose(&registry, &ComposeContext::default())
        .unwrap_err();
    assert!(matches!(unknown, OrmError::Config(ConfigError::UnknownField { .. })));
}

#[test]
fn test_empty_projection_is_fatal() {
    let registry = Registry::new();
    let err = SelectCommand::new(registry.resolve::<Secret>().unwrap())
        .compose(&registry, &ComposeContext::default())
        .unwrap_err();
    assert!(
        matches!(err, OrmError::Config(ConfigError::NoSelectableColumns { ref entity }) if entity == "Secret"),
        "{err}"
    );

    // An explicit projection of a hidden field is still allowed
    let projected = SelectCommand::new(registry.resolve::<Secret>().unwrap())
        .project(["payload"])
        .compose(&registry, &ComposeContext::default())
        .unwrap();
    assert!(projected.sql.contains("[t].[payload]"));
}

#[test]
fn test_scalar_join_projects_aliased_column() {
    let registry = Registry::new();
    let join = customer_name_join();
    let alias = join.alias();
    let select = SelectCommand::new(registry.resolve::<Order>().unwrap()).join(join);
    let cmd = compose(select, &registry, Dialect::TSql);

    assert!(
        cmd.sql.contains(&format!("  [{alias}].[Name] AS [{alias}_customer_name]")),
        "{}",
        cmd.sql
    );
    assert!(
        cmd.sql.contains(&format!(
            "LEFT OUTER JOIN [dbo].[Customers] AS [{alias}] ON [t].[CustomerID] = [{alias}].[CustomerID]"
        )),
        "{}",
        cmd.sql
    );
    assert_parses(&cmd.sql, Dialect::TSql);
}

#[test]
fn test_two_joins_to_same_target_have_distinct_aliases() {
    let registry = Registry::new();
    let first = customer_name_join();
    let second = customer_object_join();
    assert_ne!(first.id(), second.id());

    let select = SelectCommand::new(registry.resolve::<Order>().unwrap())
        .join(first.clone())
        .join(second.clone());
    let joins = select.resolve_joins(&registry).unwrap();
    assert_eq!(joins.len(), 2);

    let aliases: Vec<&str> = joins
        .iter()
        .flat_map(|j| j.columns.iter().map(|c| c.alias.as_str()))
        .collect();
    let mut unique = aliases.clone();
    unique.sort_unstable();
    unique.dedup();
    assert_eq!(unique.len(), aliases.len(), "{aliases:?}");

    // Each alias leads back to its join
    for join in &joins {
        for column in &join.columns {
            assert!(column.alias.starts_with(&format!("{}_", join.alias)));
        }
    }
    assert_eq!(joins[0].alias, first.alias());
    assert_eq!(joins[1].alias, second.alias());

    let cmd = compose(select, &registry, Dialect::Postgres);
    assert_eq!(cmd.sql.matches("LEFT OUTER JOIN \"dbo\".\"Customers\"").count(), 2);
    assert_parses(&cmd.sql, Dialect::Postgres);
}

#[test]
fn test_same_join_twice_is_deduplicated() {
    let registry = Registry::new();
    let join = customer_name_join();
    let select = SelectCommand::new(registry.resolve::<Order>().unwrap())
        .join(join.clone())
        .join(join);
    let cmd = compose(select, &registry, Dialect::TSql);
    assert_eq!(cmd.sql.matches("JOIN").count(), 1);
}

#[test]
fn test_full_outer_join_rejected_on_mysql() {
    let registry = Registry::new();
    let join = JoinDefinition::new(JoinKind::FullOuter, JoinTarget::entity::<Customer>())
        .left_key("customer_id")
        .select_into("name", "customer_name");
    let select = SelectCommand::new(registry.resolve::<Order>().unwrap()).join(join);

    let err = select
        .clone()
        .compose(&registry, &ComposeContext::new(Dialect::MySql))
        .unwrap_err();
    assert!(matches!(err, OrmError::Config(ConfigError::Unsupported { .. })), "{err}");

    let tsql = compose(select, &registry, Dialect::TSql);
    assert!(tsql.sql.contains("FULL OUTER JOIN"));
}

#[test]
fn test_raw_table_join_needs_right_key() {
    let registry = Registry::new();
    let join = JoinDefinition::inner(JoinTarget::table_in("ref", "Regions"))
        .left_key("customer_id")
        .select_into("Label", "customer_name");
    let err = SelectCommand::new(registry.resolve::<Order>().unwrap())
        .join(join)
        .compose(&registry, &ComposeContext::default())
        .unwrap_err();
    assert!(matches!(err, OrmError::Config(ConfigError::MalformedJoin { .. })), "{err}");

    let join = JoinDefinition::inner(JoinTarget::table_in("ref", "Regions"))
        .left_key("customer_id")
        .right_key("CustomerRef")
        .select_into("Label", "customer_name");
    let alias = join.alias();
    let cmd = SelectCommand::new(registry.resolve::<Order>().unwrap())
        .join(join)
        .compose(&registry, &ComposeContext::default())
        .unwrap();
    assert!(
        cmd.sql.contains(&format!(
            "INNER JOIN [ref].[Regions] AS [{alias}] ON [t].[CustomerID] = [{alias}].[CustomerRef]"
        )),
        "{}",
        cmd.sql
    );
}

#[test]
fn test_count_is_scalar() {
    let registry = Registry::new();
    let cmd = compose(
        SelectCommand::new(registry.resolve::<Order>().unwrap())
            .filter(field("shipped"))
            .order_by("sku", SortDir::Asc)
            .count(),
        &registry,
        Dialect::TSql,
    );
    insta::assert_snapshot!(cmd.sql, @r"
    SELECT
      COUNT(*) AS [value]
    FROM [dbo].[Orders] AS [t]
    WHERE [t].[Shipped] = @p1
    ");
    assert_eq!(cmd.kind, CommandKind::Scalar);
}

fn aggregate_sql(aggregate: Aggregate) -> String {
    let registry = Registry::new();
    let cmd = compose(
        SelectCommand::new(registry.resolve::<Invoice>().unwrap()).aggregate(aggregate),
        &registry,
        Dialect::TSql,
    );
    assert_eq!(cmd.kind, CommandKind::Scalar);
    assert_parses(&cmd.sql, Dialect::TSql);
    cmd.sql
}

#[test]
fn test_sum_avg_min_max() {
    insta::assert_snapshot!(aggregate_sql(Aggregate::Sum("amount".into())), @r"
    SELECT
      SUM([t].[Amount]) AS [value]
    FROM [Invoices] AS [t]
    ");
    insta::assert_snapshot!(aggregate_sql(Aggregate::Avg("amount".into())), @r"
    SELECT
      AVG([t].[Amount]) AS [value]
    FROM [Invoices] AS [t]
    ");
    insta::assert_snapshot!(aggregate_sql(Aggregate::Min("invoice_id".into())), @r"
    SELECT
      MIN([t].[InvoiceID]) AS [value]
    FROM [Invoices] AS [t]
    ");
    insta::assert_snapshot!(aggregate_sql(Aggregate::Max("invoice_id".into())), @r"
    SELECT
      MAX([t].[InvoiceID]) AS [value]
    FROM [Invoices] AS [t]
    ");
}

#[test]
fn test_aggregate_over_unknown_field() {
    let registry = Registry::new();
    let err = SelectCommand::new(registry.resolve::<Invoice>().unwrap())
        .aggregate(Aggregate::Sum("missing".into()))
        .compose(&registry, &ComposeContext::default())
        .unwrap_err();
    assert!(
        matches!(err, OrmError::Config(ConfigError::UnknownField { ref field, .. }) if field == "missing"),
        "{err}"
    );
}

#[test]
fn test_row_counts_beyond_i64_are_rejected() {
    let registry = Registry::new();
    let orders = registry.resolve::<Order>().unwrap();

    let err = SelectCommand::new(orders.clone())
        .top(u64::MAX)
        .compose(&registry, &ComposeContext::default())
        .unwrap_err();
    assert!(
        matches!(err, OrmError::Config(ConfigError::RowCountOutOfRange { modifier: "TOP", value: u64::MAX, .. })),
        "{err}"
    );

    let err = SelectCommand::new(orders.clone())
        .page(u64::MAX, 10)
        .compose(&registry, &ComposeContext::default())
        .unwrap_err();
    assert!(
        matches!(err, OrmError::Config(ConfigError::RowCountOutOfRange { modifier: "OFFSET", .. })),
        "{err}"
    );

    let largest = i64::MAX as u64;
    let cmd = compose(SelectCommand::new(orders).top(largest), &registry, Dialect::TSql);
    assert!(cmd.sql.starts_with(&format!("SELECT TOP ({largest})")), "{}", cmd.sql);
}

#[test]
fn test_raw_filter_stays_grouped_beside_tenant() {
    let registry = Registry::new();
    let ctx = ComposeContext::new(Dialect::TSql).with_tenant(3);
    let cmd = SelectCommand::new(registry.resolve::<Invoice>().unwrap())
        .filter(raw_sql("[t].[Amount] > 10 OR [t].[Amount] < 0"))
        .compose(&registry, &ctx)
        .unwrap();
    assert!(
        cmd.sql
            .ends_with("WHERE ([t].[Amount] > 10 OR [t].[Amount] < 0) AND [t].[TenantID] = @p1"),
        "{}",
        cmd.sql
    );
}

#[test]
fn test_tenant_and_custom_columns() {
    let registry = Registry::new();
    let ctx = ComposeContext::new(Dialect::TSql)
        .with_tenant(3)
        .with_default_schema("sales");
    let cmd = SelectCommand::new(registry.resolve::<Invoice>().unwrap())
        .filter(field("amount").gt(100.0))
        .compose(&registry, &ctx)
        .unwrap();

    insta::assert_snapshot!(cmd.sql, @r"
    SELECT
      [t].[InvoiceID],
      [t].[TenantID],
      [t].[Amount],
      CONCAT('INV-', [t].InvoiceID) AS [label]
    FROM [sales].[Invoices] AS [t]
    WHERE [t].[Amount] > @p1 AND [t].[TenantID] = @p2
    ");
    let values: Vec<&Value> = cmd.values().collect();
    assert_eq!(values, [&Value::F64(100.0), &Value::I32(3)]);
}

#[test]
fn test_bindings_serialize_for_logging_layers() {
    let registry = Registry::new();
    let cmd = compose(
        SelectCommand::new(registry.resolve::<Customer>().unwrap()).filter(Customer::NAME.eq("Ada")),
        &registry,
        Dialect::Postgres,
    );
    let json = serde_json::to_value(&cmd.bindings).unwrap();
    assert_eq!(json[0]["name"], "p1");
    assert_eq!(json[0]["placeholder"], "$1");
    assert_eq!(json[0]["value"], "Ada");
}
