//! Registry resolution, caching and mapping validation.

#[path = "../support/entities.rs"]
mod entities;

use std::sync::Arc;
use std::thread;

use entities::{AuditEntry, Customer, Invoice, Order, OrderLine, Secret};
use quarry::metadata::JoinTarget;
use quarry::prelude::*;

#[test]
fn test_resolve_builds_definition_from_descriptor() {
    let registry = Registry::new();
    let orders = registry.resolve::<Order>().unwrap();

    assert_eq!(orders.entity, "Order");
    assert_eq!(orders.table, "Orders");
    assert_eq!(orders.schema.as_deref(), Some("dbo"));

    let names: Vec<&str> = orders.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, ["OrderID", "CustomerID", "CreateDate", "OrderTypeID", "SKU", "Shipped"]);

    let keys = orders.primary_keys();
    assert_eq!(keys.len(), 1);
    assert!(keys[0].is_generated());
    assert_eq!(orders.received_type("customer_name"), Some(FieldType::String));
    assert!(orders.is_nested("customer"));
}

#[test]
fn test_column_subsets() {
    let registry = Registry::new();
    let orders = registry.resolve::<Order>().unwrap();

    assert!(orders.insertable().all(|c| c.name != "OrderID"));
    assert!(orders.updatable().all(|c| c.name != "OrderID"));
    assert_eq!(orders.selectable().count(), 6);

    let invoices = registry.resolve::<Invoice>().unwrap();
    assert_eq!(invoices.tenant_column().map(|c| c.name.as_str()), Some("TenantID"));
    assert!(invoices.updatable().all(|c| !c.tenant_id));
    assert_eq!(invoices.custom_columns.len(), 1);
}

#[test]
fn test_defaults_for_unnamed_tables_and_columns() {
    let registry = Registry::new();
    let secret = registry.resolve::<Secret>().unwrap();
    assert_eq!(secret.table, "Secret");
    assert_eq!(secret.schema, None);
    assert_eq!(secret.column("payload").map(|c| c.name.as_str()), Some("payload"));
    assert_eq!(secret.selectable().count(), 0);
}

#[test]
fn test_resolution_is_cached() {
    let registry = Registry::new();
    assert!(registry.is_empty());

    let first = registry.resolve::<Customer>().unwrap();
    let second = registry.resolve::<Customer>().unwrap();

    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(registry.len(), 1);
    assert!(registry.contains::<Customer>());
    assert!(registry.get::<Order>().is_none());
}

#[test]
fn test_concurrent_resolution_populates_once() {
    let registry = Arc::new(Registry::new());

    let handles: Vec<_> = (0..8)
        .map(|_| {
            let registry = Arc::clone(&registry);
            thread::spawn(move || registry.resolve::<Order>().unwrap())
        })
        .collect();
    let defs: Vec<Arc<TableDefinition>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(registry.len(), 1);
    let cached = registry.get::<Order>().unwrap();
    for def in &defs {
        assert!(Arc::ptr_eq(def, &cached));
        assert_eq!(def.columns, cached.columns);
    }
}

#[test]
fn test_registries_are_independent() {
    let a = Registry::new();
    let b = Registry::new();
    a.resolve::<AuditEntry>().unwrap();
    assert!(a.contains::<AuditEntry>());
    assert!(!b.contains::<AuditEntry>());
}

#[test]
fn test_composite_keys() {
    let registry = Registry::new();
    let lines = registry.resolve::<OrderLine>().unwrap();
    let keys: Vec<&str> = lines.primary_keys().iter().map(|c| c.name.as_str()).collect();
    assert_eq!(keys, ["OrderID", "LineNo"]);
    assert!(lines.generated_keys().is_empty());
}

// ----------------------------------------------------------------------------
// Rejected mappings
// ----------------------------------------------------------------------------

#[derive(Default)]
struct Empty;

impl Entity for Empty {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("Empty").field(FieldSpec::received("only_received", FieldType::String))
    }

    fn get(&self, _field: &str) -> Option<Value> {
        None
    }

    fn set(&mut self, _field: &str, _value: Value) -> Result<(), ValueError> {
        Ok(())
    }
}

#[derive(Default)]
struct BadJoin {
    id: i32,
}

impl Entity for BadJoin {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("BadJoin")
            .field(FieldSpec::column("id", FieldType::Int32).primary_key())
            .join(
                JoinDefinition::inner(JoinTarget::entity::<Customer>())
                    .left_key("id")
                    .select_into("name", "not_declared"),
            )
    }

    fn get(&self, field: &str) -> Option<Value> {
        (field == "id").then(|| self.id.into())
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        if field == "id" {
            self.id = value.decode()?;
        }
        Ok(())
    }
}

#[test]
fn test_no_columns_is_rejected() {
    let registry = Registry::new();
    let err = registry.resolve::<Empty>().unwrap_err();
    assert!(
        matches!(err, OrmError::Config(ConfigError::NoColumns { ref entity }) if entity == "Empty"),
        "{err}"
    );
    assert!(registry.is_empty());
}

#[test]
fn test_join_to_undeclared_field_is_rejected() {
    let registry = Registry::new();
    let err = registry.resolve::<BadJoin>().unwrap_err();
    match err {
        OrmError::Config(ConfigError::MalformedJoin { entity, field, .. }) => {
            assert_eq!(entity, "BadJoin");
            assert_eq!(field, "not_declared");
        }
        other => panic!("unexpected error: {other}"),
    }
}
