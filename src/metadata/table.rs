//! Resolved, immutable table definitions.

use super::entity::{EntityDescriptor, FieldKind};
use super::join::JoinDefinition;
use crate::error::ConfigError;
use crate::sql::FieldType;

/// One persisted column of a mapped table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDescriptor {
    /// Declared entity field.
    pub field: String,
    /// Column name after overrides.
    pub name: String,
    pub field_type: FieldType,
    pub nullable: bool,
    pub primary_key: bool,
    pub ignore_insert: bool,
    pub ignore_update: bool,
    pub ignore_select: bool,
    pub tenant_id: bool,
    /// Owning table.
    pub table: String,
}

impl ColumnDescriptor {
    /// A key the server fills in: primary key that is never inserted.
    pub fn is_generated(&self) -> bool {
        self.primary_key && self.ignore_insert
    }
}

/// A computed column: `template` is raw SQL where `{alias}` is replaced by
/// the quoted table alias.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomColumn {
    pub field: String,
    pub name: String,
    pub field_type: FieldType,
    pub template: String,
}

/// Everything the composer and materializer need to know about a mapped type.
#[derive(Debug, Clone)]
pub struct TableDefinition {
    pub entity: String,
    pub schema: Option<String>,
    pub table: String,
    pub columns: Vec<ColumnDescriptor>,
    pub custom_columns: Vec<CustomColumn>,
    /// Fields filled by scalar joins, with their declared types.
    pub received: Vec<(String, FieldType)>,
    /// Fields filled by object joins.
    pub nested: Vec<String>,
    pub joins: Vec<JoinDefinition>,
}

impl TableDefinition {
    /// Build and validate a definition from an entity's self-description.
    pub fn from_descriptor(descriptor: EntityDescriptor) -> Result<Self, ConfigError> {
        let EntityDescriptor {
            name,
            table,
            schema,
            fields,
            joins,
        } = descriptor;
        let table = table.unwrap_or_else(|| name.clone());

        let mut def = TableDefinition {
            entity: name,
            schema,
            table,
            columns: Vec::new(),
            custom_columns: Vec::new(),
            received: Vec::new(),
            nested: Vec::new(),
            joins: Vec::new(),
        };

        for spec in fields {
            let column_name = spec.column_name_or_field().to_string();
            match spec.kind {
                FieldKind::Column => def.columns.push(ColumnDescriptor {
                    field: spec.name,
                    name: column_name,
                    field_type: spec.field_type,
                    nullable: spec.nullable,
                    primary_key: spec.primary_key,
                    ignore_insert: spec.ignore_insert,
                    ignore_update: spec.ignore_update,
                    ignore_select: spec.ignore_select,
                    tenant_id: spec.tenant_id,
                    table: def.table.clone(),
                }),
                FieldKind::Custom { template } => def.custom_columns.push(CustomColumn {
                    field: spec.name,
                    name: column_name,
                    field_type: spec.field_type,
                    template,
                }),
                FieldKind::Received => def.received.push((spec.name, spec.field_type)),
                FieldKind::Nested => def.nested.push(spec.name),
            }
        }

        if def.columns.is_empty() {
            return Err(ConfigError::NoColumns { entity: def.entity });
        }

        for join in &joins {
            join.validate(&def)?;
        }
        def.joins = joins;

        Ok(def)
    }

    /// Column declared for `field`.
    pub fn column(&self, field: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.field == field)
    }

    /// Persisted or custom column name for `field`.
    pub fn column_name(&self, field: &str) -> Option<&str> {
        self.column(field)
            .map(|c| c.name.as_str())
            .or_else(|| self.custom_column(field).map(|c| c.name.as_str()))
    }

    pub fn custom_column(&self, field: &str) -> Option<&CustomColumn> {
        self.custom_columns.iter().find(|c| c.field == field)
    }

    pub fn received_type(&self, field: &str) -> Option<FieldType> {
        self.received
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, ty)| *ty)
    }

    pub fn is_nested(&self, field: &str) -> bool {
        self.nested.iter().any(|n| n == field)
    }

    pub fn primary_keys(&self) -> Vec<&ColumnDescriptor> {
        self.columns.iter().filter(|c| c.primary_key).collect()
    }

    pub fn has_primary_key(&self) -> bool {
        self.columns.iter().any(|c| c.primary_key)
    }

    /// Primary keys assigned by the server.
    pub fn generated_keys(&self) -> Vec<&ColumnDescriptor> {
        self.columns.iter().filter(|c| c.is_generated()).collect()
    }

    pub fn selectable(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| !c.ignore_select)
    }

    pub fn insertable(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns.iter().filter(|c| !c.ignore_insert)
    }

    pub fn updatable(&self) -> impl Iterator<Item = &ColumnDescriptor> {
        self.columns
            .iter()
            .filter(|c| !c.ignore_update && !c.primary_key && !c.tenant_id)
    }

    pub fn tenant_column(&self) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.tenant_id)
    }

    /// Effective schema: declared first, then the fallback.
    pub fn schema_or<'a>(&'a self, fallback: Option<&'a str>) -> Option<&'a str> {
        self.schema.as_deref().or(fallback)
    }
}
