//! The declarative surface an application implements for each mapped type.
//!
//! Instead of reflecting over attributes at runtime, a type describes itself
//! once through [`Entity::describe`] and exposes field access by name. The
//! registry turns the description into a [`TableDefinition`](super::TableDefinition).

use std::any::TypeId;
use std::fmt;

use indexmap::IndexMap;

use super::join::JoinDefinition;
use crate::sql::FieldType;
use crate::value::{Value, ValueError};

/// A type mapped to a table.
///
/// Field names used by `get`, `set` and `receive` are the names declared in
/// [`describe`](Entity::describe), not column names.
///
/// ```ignore
/// impl Entity for Order {
///     fn describe() -> EntityDescriptor {
///         EntityDescriptor::new("Order")
///             .table("Orders")
///             .field(FieldSpec::column("order_id", FieldType::Int32)
///                 .column_name("OrderID").primary_key().ignore_insert().ignore_update())
///             .field(FieldSpec::column("customer_id", FieldType::Int32).column_name("CustomerID"))
///     }
///
///     fn get(&self, field: &str) -> Option<Value> {
///         match field {
///             "order_id" => Some(self.order_id.into()),
///             "customer_id" => Some(self.customer_id.into()),
///             _ => None,
///         }
///     }
///
///     fn set(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
///         match field {
///             "order_id" => self.order_id = value.decode()?,
///             "customer_id" => self.customer_id = value.decode()?,
///             _ => {}
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Entity: Default + Send + Sync + 'static {
    /// Describe table, fields, keys and joins. Called once per registry.
    fn describe() -> EntityDescriptor;

    /// Current value of a field, `None` for unknown fields.
    fn get(&self, field: &str) -> Option<Value>;

    /// Assign a field from a value already coerced to its declared type.
    fn set(&mut self, field: &str, value: Value) -> Result<(), ValueError>;

    /// The slot receiving an object-shaped join, usually an `Option<Other>` field.
    fn receive(&mut self, field: &str) -> Option<&mut dyn Hydrate> {
        let _ = field;
        None
    }
}

/// A nested object slot filled column by column during materialization.
pub trait Hydrate {
    fn hydrate_field(&mut self, field: &str, value: Value) -> Result<(), ValueError>;
}

impl<E: Entity> Hydrate for Option<E> {
    fn hydrate_field(&mut self, field: &str, value: Value) -> Result<(), ValueError> {
        self.get_or_insert_with(E::default).set(field, value)
    }
}

/// Where UPDATE, DELETE and INSERT read caller values from.
pub trait ValueSource {
    fn value_of(&self, field: &str) -> Option<Value>;
}

impl<E: Entity> ValueSource for E {
    fn value_of(&self, field: &str) -> Option<Value> {
        self.get(field)
    }
}

impl ValueSource for IndexMap<String, Value> {
    fn value_of(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

/// Handle to an entity type, usable where generics are not (join targets).
#[derive(Clone, Copy)]
pub struct EntityRef {
    type_id: TypeId,
    type_name: &'static str,
    describe: fn() -> EntityDescriptor,
}

impl EntityRef {
    pub fn of<E: Entity>() -> Self {
        Self {
            type_id: TypeId::of::<E>(),
            type_name: std::any::type_name::<E>(),
            describe: E::describe,
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn describe(&self) -> EntityDescriptor {
        (self.describe)()
    }
}

impl PartialEq for EntityRef {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for EntityRef {}

impl fmt::Debug for EntityRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("EntityRef").field(&self.type_name).finish()
    }
}

// ============================================================================
// Descriptor
// ============================================================================

/// What a field of an entity maps to.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A persisted column of the entity's own table.
    Column,
    /// Computed column: raw SQL with `{alias}` standing for the table alias.
    Custom { template: String },
    /// Filled by a scalar join; not a column of this table.
    Received,
    /// Filled by an object-shaped join with a whole nested entity.
    Nested,
}

/// Declaration of one entity field.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct FieldSpec {
    pub name: String,
    pub column: Option<String>,
    pub kind: FieldKind,
    pub field_type: FieldType,
    pub nullable: bool,
    pub primary_key: bool,
    pub ignore_insert: bool,
    pub ignore_update: bool,
    pub ignore_select: bool,
    pub tenant_id: bool,
}

impl FieldSpec {
    fn new(name: &str, kind: FieldKind, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            column: None,
            kind,
            field_type,
            nullable: false,
            primary_key: false,
            ignore_insert: false,
            ignore_update: false,
            ignore_select: false,
            tenant_id: false,
        }
    }

    /// A persisted column.
    pub fn column(name: &str, field_type: FieldType) -> Self {
        Self::new(name, FieldKind::Column, field_type)
    }

    /// A computed column backed by a SQL template.
    pub fn custom(name: &str, field_type: FieldType, template: &str) -> Self {
        Self::new(
            name,
            FieldKind::Custom {
                template: template.into(),
            },
            field_type,
        )
        .nullable()
    }

    /// A field filled by a scalar join projection.
    pub fn received(name: &str, field_type: FieldType) -> Self {
        Self::new(name, FieldKind::Received, field_type).nullable()
    }

    /// A field filled by an object-shaped join.
    pub fn nested(name: &str) -> Self {
        // The type is never coerced for nested slots
        Self::new(name, FieldKind::Nested, FieldType::Binary).nullable()
    }

    /// Column name override. The declared field name is used otherwise.
    pub fn column_name(mut self, column: &str) -> Self {
        self.column = Some(column.into());
        self
    }

    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn ignore_insert(mut self) -> Self {
        self.ignore_insert = true;
        self
    }

    pub fn ignore_update(mut self) -> Self {
        self.ignore_update = true;
        self
    }

    pub fn ignore_select(mut self) -> Self {
        self.ignore_select = true;
        self
    }

    /// Marks the multi-tenant discriminator column.
    pub fn tenant_id(mut self) -> Self {
        self.tenant_id = true;
        self
    }

    /// Shorthand for a server-generated identity key.
    pub fn identity(self) -> Self {
        self.primary_key().ignore_insert().ignore_update()
    }

    /// The resolved column name: override first, field name otherwise.
    pub fn column_name_or_field(&self) -> &str {
        self.column.as_deref().unwrap_or(&self.name)
    }
}

/// Everything an entity declares about itself.
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until used"]
pub struct EntityDescriptor {
    pub name: String,
    pub table: Option<String>,
    pub schema: Option<String>,
    pub fields: Vec<FieldSpec>,
    pub joins: Vec<JoinDefinition>,
}

impl EntityDescriptor {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.into(),
            table: None,
            schema: None,
            fields: Vec::new(),
            joins: Vec::new(),
        }
    }

    /// Table name override. The entity name is used otherwise.
    pub fn table(mut self, table: &str) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn schema(mut self, schema: &str) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    /// Declare a computed column.
    pub fn custom(self, name: &str, field_type: FieldType, template: &str) -> Self {
        self.field(FieldSpec::custom(name, field_type, template))
    }

    pub fn join(mut self, join: JoinDefinition) -> Self {
        self.joins.push(join);
        self
    }

    pub fn joins(mut self, joins: impl IntoIterator<Item = JoinDefinition>) -> Self {
        self.joins.extend(joins);
        self
    }
}
