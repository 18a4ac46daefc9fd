//! INSERT, UPDATE, DELETE and COPY composition.

#[path = "../support/entities.rs"]
mod entities;

use entities::{assert_parses, AuditEntry, Invoice, Order, OrderLine};
use indexmap::IndexMap;
use quarry::prelude::*;

fn order() -> Order {
    Order {
        order_id: 7,
        customer_id: 5,
        order_type_id: "phone".into(),
        sku: "SKU_1".into(),
        ..Order::default()
    }
}

// ============================================================================
// INSERT
// ============================================================================

#[test]
fn test_insert_tsql_round_trips_generated_key() {
    let registry = Registry::new();
    let cmd = InsertCommand::new(registry.resolve::<Order>().unwrap())
        .compose(&order(), &ComposeContext::new(Dialect::TSql))
        .unwrap();

    insta::assert_snapshot!(cmd.sql, @r"
    DECLARE @inserted TABLE ([OrderID] INT);
    INSERT INTO [dbo].[Orders] ([CustomerID], [CreateDate], [OrderTypeID], [SKU], [Shipped]) OUTPUT INSERTED.[OrderID] INTO @inserted VALUES (@p1, @p2, @p3, @p4, @p5);
    SELECT
      [t].[OrderID],
      [t].[CustomerID],
      [t].[CreateDate],
      [t].[OrderTypeID],
      [t].[SKU],
      [t].[Shipped]
    FROM [dbo].[Orders] AS [t]
    INNER JOIN @inserted AS [i] ON [t].[OrderID] = [i].[OrderID]
    ");
    assert_eq!(cmd.kind, CommandKind::Query);

    // The generated key is never sent
    let values: Vec<&Value> = cmd.values().collect();
    assert_eq!(
        values,
        [
            &Value::I32(5),
            &Value::Null,
            &Value::Text("phone".into()),
            &Value::Text("SKU_1".into()),
            &Value::Bool(false),
        ]
    );
}

#[test]
fn test_insert_postgres_returns_row() {
    let registry = Registry::new();
    let cmd = InsertCommand::new(registry.resolve::<Order>().unwrap())
        .compose(&order(), &ComposeContext::new(Dialect::Postgres))
        .unwrap();

    assert_eq!(
        cmd.sql,
        "INSERT INTO \"dbo\".\"Orders\" (\"CustomerID\", \"CreateDate\", \"OrderTypeID\", \"SKU\", \"Shipped\") \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING \"OrderID\", \"CustomerID\", \"CreateDate\", \"OrderTypeID\", \"SKU\", \"Shipped\""
    );
    assert_eq!(cmd.kind, CommandKind::Query);
    assert_parses(&cmd.sql, Dialect::Postgres);
}

#[test]
fn test_insert_mysql_selects_last_insert_id() {
    let registry = Registry::new();
    let cmd = InsertCommand::new(registry.resolve::<Order>().unwrap())
        .compose(&order(), &ComposeContext::new(Dialect::MySql))
        .unwrap();

    let statements: Vec<&str> = cmd.sql.split(";\n").collect();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].starts_with("INSERT INTO `dbo`.`Orders`"), "{}", cmd.sql);
    assert!(
        statements[1].ends_with("FROM `dbo`.`Orders` AS `t`\nWHERE `t`.`OrderID` = LAST_INSERT_ID()"),
        "{}",
        cmd.sql
    );
    assert_eq!(cmd.bindings.len(), 5);
}

#[test]
fn test_insert_mysql_supplied_composite_key() {
    let registry = Registry::new();
    let line = OrderLine {
        order_id: 7,
        line_no: 2,
        quantity: 4,
    };
    let cmd = InsertCommand::new(registry.resolve::<OrderLine>().unwrap())
        .compose(&line, &ComposeContext::new(Dialect::MySql))
        .unwrap();

    assert!(
        cmd.sql.ends_with("WHERE `t`.`OrderID` = @p4 AND `t`.`LineNo` = @p5"),
        "{}",
        cmd.sql
    );
    assert_eq!(cmd.binding("p5").map(|b| &b.value), Some(&Value::I16(2)));
    assert!(!cmd.sql.contains("LAST_INSERT_ID"));
}

#[test]
fn test_insert_without_key_is_non_query() {
    let registry = Registry::new();
    let entry = AuditEntry {
        message: "started".into(),
    };
    let cmd = InsertCommand::new(registry.resolve::<AuditEntry>().unwrap())
        .compose(&entry, &ComposeContext::default())
        .unwrap();

    assert_eq!(cmd.sql, "INSERT INTO [Audit] ([Message]) VALUES (@p1)");
    assert_eq!(cmd.kind, CommandKind::NonQuery);
    assert_parses(&cmd.sql, Dialect::TSql);
}

#[test]
fn test_insert_takes_tenant_from_context() {
    let registry = Registry::new();
    let invoice = Invoice {
        tenant: 1,
        amount: 12.5,
        ..Invoice::default()
    };
    let ctx = ComposeContext::new(Dialect::Postgres).with_tenant(9);
    let cmd = InsertCommand::new(registry.resolve::<Invoice>().unwrap())
        .compose(&invoice, &ctx)
        .unwrap();

    let values: Vec<&Value> = cmd.values().collect();
    assert_eq!(values, [&Value::I32(9), &Value::F64(12.5)]);
}

#[test]
fn test_insert_from_map() {
    let registry = Registry::new();
    let mut row: IndexMap<String, Value> = IndexMap::new();
    row.insert("message".into(), Value::Text("from map".into()));
    let cmd = InsertCommand::new(registry.resolve::<AuditEntry>().unwrap())
        .compose(&row, &ComposeContext::default())
        .unwrap();
    assert_eq!(cmd.bindings[0].value, Value::Text("from map".into()));
}

// ============================================================================
// UPDATE
// ============================================================================

#[test]
fn test_update_falls_back_to_identity() {
    let registry = Registry::new();
    let order = order();
    let cmd = UpdateCommand::new(registry.resolve::<Order>().unwrap())
        .source(&order)
        .fields(["order_type_id"])
        .compose(&ComposeContext::default())
        .unwrap();

    assert_eq!(
        cmd.sql,
        "UPDATE [dbo].[Orders]\nSET [OrderTypeID] = @p1\nWHERE [Orders].[OrderID] = @p2"
    );
    assert_eq!(cmd.bindings[0].value, Value::Text("phone".into()));
    assert_eq!(cmd.bindings[1].value, Value::I32(7));
    assert_eq!(cmd.kind, CommandKind::NonQuery);
    assert_parses(&cmd.sql, Dialect::TSql);
}

#[test]
fn test_update_every_updatable_field() {
    let registry = Registry::new();
    let order = order();
    let cmd = UpdateCommand::new(registry.resolve::<Order>().unwrap())
        .source(&order)
        .compose(&ComposeContext::new(Dialect::MySql))
        .unwrap();

    assert!(
        cmd.sql.starts_with(
            "UPDATE `dbo`.`Orders`\nSET `CustomerID` = @p1, `CreateDate` = @p2, `OrderTypeID` = @p3, `SKU` = @p4, `Shipped` = @p5\n"
        ),
        "{}",
        cmd.sql
    );
    assert!(!cmd.sql.contains("SET `OrderID`"));
    assert!(cmd.sql.ends_with("WHERE `Orders`.`OrderID` = @p6"));
}

#[test]
fn test_update_with_explicit_filter_and_values() {
    let registry = Registry::new();
    let cmd = UpdateCommand::new(registry.resolve::<Order>().unwrap())
        .set("shipped", true)
        .filter(Order::CUSTOMER_ID.eq(5))
        .compose(&ComposeContext::new(Dialect::Postgres))
        .unwrap();

    assert_eq!(
        cmd.sql,
        "UPDATE \"dbo\".\"Orders\"\nSET \"Shipped\" = $1\nWHERE \"Orders\".\"CustomerID\" = $2"
    );
    assert_parses(&cmd.sql, Dialect::Postgres);
}

#[test]
fn test_update_empty_string_binds_null() {
    let registry = Registry::new();
    let order = order();
    let cmd = UpdateCommand::new(registry.resolve::<Order>().unwrap())
        .source(&order)
        .set("sku", "")
        .fields(["sku"])
        .compose(&ComposeContext::default())
        .unwrap();
    assert_eq!(cmd.bindings[0].value, Value::Null);

    let mut keep = ComposeContext::default();
    keep.empty_string_as_null = false;
    let cmd = UpdateCommand::new(registry.resolve::<Order>().unwrap())
        .source(&order)
        .set("sku", "")
        .fields(["sku"])
        .compose(&keep)
        .unwrap();
    assert_eq!(cmd.bindings[0].value, Value::Text(String::new()));
}

#[test]
fn test_update_rejections() {
    let registry = Registry::new();
    let orders = registry.resolve::<Order>().unwrap();

    // Only ignore-on-update fields named
    let order = order();
    let err = UpdateCommand::new(orders.clone())
        .source(&order)
        .fields(["order_id"])
        .compose(&ComposeContext::default())
        .unwrap_err();
    assert!(matches!(err, OrmError::Config(ConfigError::NothingToUpdate { .. })), "{err}");

    // No predicate and no key values
    let mut partial: IndexMap<String, Value> = IndexMap::new();
    partial.insert("order_type_id".into(), Value::Text("web".into()));
    let err = UpdateCommand::new(orders.clone())
        .source(&partial)
        .compose(&ComposeContext::default())
        .unwrap_err();
    assert!(matches!(err, OrmError::Config(ConfigError::UnboundedMutation { .. })), "{err}");

    let err = UpdateCommand::new(orders.clone())
        .set("sku", "A")
        .compose(&ComposeContext::default())
        .unwrap_err();
    assert!(matches!(err, OrmError::Config(ConfigError::UnboundedMutation { .. })), "{err}");

    let err = UpdateCommand::new(orders)
        .set("nope", 1)
        .filter(Order::ORDER_ID.eq(1))
        .compose(&ComposeContext::default())
        .unwrap_err();
    assert!(matches!(err, OrmError::Config(ConfigError::UnknownField { .. })), "{err}");
}

#[test]
fn test_update_scopes_to_tenant() {
    let registry = Registry::new();
    let invoice = Invoice {
        invoice_id: 40,
        tenant: 1,
        amount: 3.0,
        label: None,
    };
    let cmd = UpdateCommand::new(registry.resolve::<Invoice>().unwrap())
        .source(&invoice)
        .compose(&ComposeContext::default().with_tenant(2))
        .unwrap();

    assert_eq!(
        cmd.sql,
        "UPDATE [Invoices]\nSET [Amount] = @p1\nWHERE [Invoices].[InvoiceID] = @p2 AND [Invoices].[TenantID] = @p3"
    );
    assert_eq!(cmd.bindings[2].value, Value::I32(2));
}

// ============================================================================
// DELETE
// ============================================================================

#[test]
fn test_delete_by_key() {
    let registry = Registry::new();
    let cmd = DeleteCommand::new(registry.resolve::<Order>().unwrap())
        .key_from(&order())
        .unwrap()
        .compose(&ComposeContext::default())
        .unwrap();

    assert_eq!(cmd.sql, "DELETE FROM [dbo].[Orders]\nWHERE [Orders].[OrderID] = @p1");
    assert_eq!(cmd.bindings[0].value, Value::I32(7));
    assert_parses(&cmd.sql, Dialect::TSql);
}

#[test]
fn test_delete_by_composite_key() {
    let registry = Registry::new();
    let line = OrderLine {
        order_id: 7,
        line_no: 3,
        quantity: 0,
    };
    let cmd = DeleteCommand::new(registry.resolve::<OrderLine>().unwrap())
        .key_from(&line)
        .unwrap()
        .compose(&ComposeContext::new(Dialect::Postgres))
        .unwrap();

    assert_eq!(
        cmd.sql,
        "DELETE FROM \"OrderLines\"\nWHERE (\"OrderLines\".\"OrderID\" = $1 AND \"OrderLines\".\"LineNo\" = $2)"
    );
}

#[test]
fn test_delete_requires_predicate() {
    let registry = Registry::new();
    let err = DeleteCommand::new(registry.resolve::<Order>().unwrap())
        .compose(&ComposeContext::default())
        .unwrap_err();
    assert!(
        matches!(err, OrmError::Config(ConfigError::UnboundedMutation { statement: "DELETE", .. })),
        "{err}"
    );

    let err = DeleteCommand::new(registry.resolve::<AuditEntry>().unwrap())
        .key_from(&AuditEntry::default())
        .unwrap_err();
    assert!(matches!(err, OrmError::Config(ConfigError::MissingPrimaryKey { .. })), "{err}");
}

// ============================================================================
// COPY
// ============================================================================

#[test]
fn test_copy_overrides_selected_columns() {
    let registry = Registry::new();
    let cmd = CopyCommand::new(registry.resolve::<Order>().unwrap())
        .set("customer_id", 8)
        .filter(Order::ORDER_ID.eq(7))
        .compose(&ComposeContext::default())
        .unwrap();

    insta::assert_snapshot!(cmd.sql, @r"
    INSERT INTO [dbo].[Orders] ([CustomerID], [CreateDate], [OrderTypeID], [SKU], [Shipped])
    SELECT
      @p1,
      [t].[CreateDate],
      [t].[OrderTypeID],
      [t].[SKU],
      [t].[Shipped]
    FROM [dbo].[Orders] AS [t]
    WHERE [t].[OrderID] = @p2
    ");
    assert_eq!(cmd.bindings[0].value, Value::I32(8));
    assert_eq!(cmd.bindings[1].value, Value::I32(7));
    assert_eq!(cmd.kind, CommandKind::NonQuery);
}

#[test]
fn test_copy_rejects_generated_override() {
    let registry = Registry::new();
    let err = CopyCommand::new(registry.resolve::<Order>().unwrap())
        .set("order_id", 1)
        .compose(&ComposeContext::default())
        .unwrap_err();
    assert!(matches!(err, OrmError::Config(ConfigError::UnknownField { .. })), "{err}");
}
