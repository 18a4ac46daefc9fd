//! Fixture entities and a recording executor shared by the integration tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use chrono::NaiveDateTime;
use quarry::prelude::*;
use sqlparser::dialect::{MsSqlDialect, MySqlDialect, PostgreSqlDialect};
use sqlparser::parser::Parser;

// ============================================================================
// Customer
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Customer {
    pub customer_id: i32,
    pub name: String,
    pub region: Option<String>,
}

impl Customer {
    pub const CUSTOMER_ID: Col<i32> = Col::new("customer_id");
    pub const NAME: Col<String> = Col::new("name");
}

impl Entity for Customer {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("Customer")
            .table("Customers")
            .schema("dbo")
            .field(FieldSpec::column("customer_id", FieldType::Int32).column_name("CustomerID").identity())
            .field(FieldSpec::column("name", FieldType::String).column_name("Name"))
            .field(FieldSpec::column("region", FieldType::String).column_name("Region").nullable())
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "customer_id" => Some(self.customer_id.into()),
            "name" => Some(self.name.clone().into()),
            "region" => Some(self.region.clone().into()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "customer_id" => self.customer_id = value.decode()?,
            "name" => self.name = value.decode()?,
            "region" => self.region = value.decode()?,
            _ => {}
        }
        Ok(())
    }
}

// ============================================================================
// Order
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Order {
    pub order_id: i32,
    pub customer_id: i32,
    pub create_date: Option<NaiveDateTime>,
    pub order_type_id: String,
    pub sku: String,
    pub shipped: bool,
    pub customer_name: Option<String>,
    pub customer: Option<Customer>,
}

impl Order {
    pub const ORDER_ID: Col<i32> = Col::new("order_id");
    pub const CUSTOMER_ID: Col<i32> = Col::new("customer_id");
    pub const CREATE_DATE: Col<Option<NaiveDateTime>> = Col::new("create_date");
    pub const ORDER_TYPE_ID: Col<String> = Col::new("order_type_id");
    pub const SKU: Col<String> = Col::new("sku");
    pub const SHIPPED: Col<bool> = Col::new("shipped");
}

impl Entity for Order {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("Order")
            .table("Orders")
            .schema("dbo")
            .field(FieldSpec::column("order_id", FieldType::Int32).column_name("OrderID").identity())
            .field(FieldSpec::column("customer_id", FieldType::Int32).column_name("CustomerID"))
            .field(
                FieldSpec::column("create_date", FieldType::Timestamp)
                    .column_name("CreateDate")
                    .nullable(),
            )
            .field(FieldSpec::column("order_type_id", FieldType::String).column_name("OrderTypeID"))
            .field(FieldSpec::column("sku", FieldType::String).column_name("SKU"))
            .field(FieldSpec::column("shipped", FieldType::Bool).column_name("Shipped"))
            .field(FieldSpec::received("customer_name", FieldType::String))
            .field(FieldSpec::nested("customer"))
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "order_id" => Some(self.order_id.into()),
            "customer_id" => Some(self.customer_id.into()),
            "create_date" => Some(self.create_date.into()),
            "order_type_id" => Some(self.order_type_id.clone().into()),
            "sku" => Some(self.sku.clone().into()),
            "shipped" => Some(self.shipped.into()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "order_id" => self.order_id = value.decode()?,
            "customer_id" => self.customer_id = value.decode()?,
            "create_date" => self.create_date = value.decode()?,
            "order_type_id" => self.order_type_id = value.decode()?,
            "sku" => self.sku = value.decode()?,
            "shipped" => self.shipped = value.decode()?,
            "customer_name" => self.customer_name = value.decode()?,
            _ => {}
        }
        Ok(())
    }

    fn receive(&mut self, field: &str) -> Option<&mut dyn Hydrate> {
        match field {
            "customer" => Some(&mut self.customer),
            _ => None,
        }
    }
}

/// Joins Customer's name into `Order::customer_name`.
pub fn customer_name_join() -> JoinDefinition {
    JoinDefinition::left(quarry::metadata::JoinTarget::entity::<Customer>())
        .left_key("customer_id")
        .select_into("name", "customer_name")
}

/// Hydrates `Order::customer` with the whole Customer row.
pub fn customer_object_join() -> JoinDefinition {
    JoinDefinition::left(quarry::metadata::JoinTarget::entity::<Customer>())
        .left_key("customer_id")
        .receive_object("customer")
}

// ============================================================================
// Entities with unusual shapes
// ============================================================================

/// Every column hidden from SELECT.
#[derive(Debug, Default)]
pub struct Secret {
    pub secret_id: i32,
    pub payload: String,
}

impl Entity for Secret {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("Secret")
            .field(FieldSpec::column("secret_id", FieldType::Int32).identity().ignore_select())
            .field(FieldSpec::column("payload", FieldType::String).ignore_select())
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "secret_id" => Some(self.secret_id.into()),
            "payload" => Some(self.payload.clone().into()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "secret_id" => self.secret_id = value.decode()?,
            "payload" => self.payload = value.decode()?,
            _ => {}
        }
        Ok(())
    }
}

/// Keyless, append-only table.
#[derive(Debug, Default)]
pub struct AuditEntry {
    pub message: String,
}

impl Entity for AuditEntry {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("AuditEntry")
            .table("Audit")
            .field(FieldSpec::column("message", FieldType::String).column_name("Message"))
    }

    fn get(&self, field: &str) -> Option<Value> {
        (field == "message").then(|| self.message.clone().into())
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        if field == "message" {
            self.message = value.decode()?;
        }
        Ok(())
    }
}

/// Multi-tenant table with a computed column.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Invoice {
    pub invoice_id: i64,
    pub tenant: i32,
    pub amount: f64,
    pub label: Option<String>,
}

impl Entity for Invoice {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("Invoice")
            .table("Invoices")
            .field(FieldSpec::column("invoice_id", FieldType::Int64).column_name("InvoiceID").identity())
            .field(FieldSpec::column("tenant", FieldType::Int32).column_name("TenantID").tenant_id())
            .field(FieldSpec::column("amount", FieldType::Float64).column_name("Amount"))
            .custom("label", FieldType::String, "CONCAT('INV-', {alias}.InvoiceID)")
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "invoice_id" => Some(self.invoice_id.into()),
            "tenant" => Some(self.tenant.into()),
            "amount" => Some(self.amount.into()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "invoice_id" => self.invoice_id = value.decode()?,
            "tenant" => self.tenant = value.decode()?,
            "amount" => self.amount = value.decode()?,
            "label" => self.label = value.decode()?,
            _ => {}
        }
        Ok(())
    }
}

/// Composite key, neither part generated.
#[derive(Debug, Default)]
pub struct OrderLine {
    pub order_id: i32,
    pub line_no: i16,
    pub quantity: i32,
}

impl Entity for OrderLine {
    fn describe() -> EntityDescriptor {
        EntityDescriptor::new("OrderLine")
            .table("OrderLines")
            .field(FieldSpec::column("order_id", FieldType::Int32).column_name("OrderID").primary_key())
            .field(FieldSpec::column("line_no", FieldType::Int16).column_name("LineNo").primary_key())
            .field(FieldSpec::column("quantity", FieldType::Int32).column_name("Quantity"))
    }

    fn get(&self, field: &str) -> Option<Value> {
        match field {
            "order_id" => Some(self.order_id.into()),
            "line_no" => Some(self.line_no.into()),
            "quantity" => Some(self.quantity.into()),
            _ => None,
        }
    }

    fn set(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        match field {
            "order_id" => self.order_id = value.decode()?,
            "line_no" => self.line_no = value.decode()?,
            "quantity" => self.quantity = value.decode()?,
            _ => {}
        }
        Ok(())
    }
}

// ============================================================================
// Executor
// ============================================================================

/// Records every command and replays queued results.
#[derive(Debug, Default)]
pub struct RecordingExecutor {
    pub commands: Vec<Command>,
    pub cursors: VecDeque<MemoryCursor>,
    pub affected: VecDeque<u64>,
    pub scalars: VecDeque<Value>,
    pub fail_with: Option<String>,
}

impl RecordingExecutor {
    pub fn with_rows(cursor: MemoryCursor) -> Self {
        let mut exec = Self::default();
        exec.cursors.push_back(cursor);
        exec
    }

    pub fn last(&self) -> &Command {
        self.commands.last().expect("no command executed")
    }

    fn record(&mut self, command: &Command) -> quarry::Result<()> {
        self.commands.push(command.clone());
        match &self.fail_with {
            Some(message) => Err(OrmError::execution(message.clone())),
            None => Ok(()),
        }
    }
}

impl Executor for RecordingExecutor {
    fn query(&mut self, command: &Command) -> quarry::Result<Box<dyn RowCursor + '_>> {
        self.record(command)?;
        Ok(Box::new(self.cursors.pop_front().unwrap_or_default()))
    }

    fn execute(&mut self, command: &Command) -> quarry::Result<u64> {
        self.record(command)?;
        Ok(self.affected.pop_front().unwrap_or(1))
    }

    fn scalar(&mut self, command: &Command) -> quarry::Result<Value> {
        self.record(command)?;
        Ok(self.scalars.pop_front().unwrap_or(Value::Null))
    }
}

// ============================================================================
// SQL validation
// ============================================================================

/// Panics unless `sql` parses for `dialect`.
pub fn assert_parses(sql: &str, dialect: Dialect) {
    let parser: Box<dyn sqlparser::dialect::Dialect> = match dialect {
        Dialect::TSql => Box::new(MsSqlDialect {}),
        Dialect::MySql => Box::new(MySqlDialect {}),
        Dialect::Postgres => Box::new(PostgreSqlDialect {}),
    };
    if let Err(e) = Parser::parse_sql(&*parser, sql) {
        panic!("invalid SQL for {:?}: {}\n{}", dialect, e, sql);
    }
}
