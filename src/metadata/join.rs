//! Join declarations and their resolution against the registry.
//!
//! A [`JoinDefinition`] is declared once (usually inside
//! [`Entity::describe`](super::Entity::describe)) and reused by every query.
//! Its only state is a process-unique correlation id, which names the joined
//! table alias (`j7`) and prefixes every projected column (`j7_Name`), so
//! two joins against the same table never collide.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use super::entity::{Entity, EntityRef};
use super::registry::Registry;
use super::table::TableDefinition;
use crate::error::{ConfigError, Result};
use crate::sql::{FieldType, JoinType};

static NEXT_JOIN_ID: AtomicU64 = AtomicU64::new(1);

/// SQL join kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
    FullOuter,
}

impl JoinKind {
    pub fn join_type(self) -> JoinType {
        match self {
            JoinKind::Inner => JoinType::Inner,
            JoinKind::Left => JoinType::Left,
            JoinKind::Right => JoinType::Right,
            JoinKind::FullOuter => JoinType::Full,
        }
    }
}

/// The right-hand side of a join.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinTarget {
    /// A mapped entity; keys and selected fields are field names.
    Entity(EntityRef),
    /// A raw table; keys and selected fields are column names.
    Table {
        schema: Option<String>,
        table: String,
    },
}

impl JoinTarget {
    pub fn entity<E: Entity>() -> Self {
        JoinTarget::Entity(EntityRef::of::<E>())
    }

    pub fn table(table: &str) -> Self {
        JoinTarget::Table {
            schema: None,
            table: table.into(),
        }
    }

    pub fn table_in(schema: &str, table: &str) -> Self {
        JoinTarget::Table {
            schema: Some(schema.into()),
            table: table.into(),
        }
    }
}

/// What a join delivers to the left-hand entity.
#[derive(Debug, Clone, PartialEq)]
pub enum JoinShape {
    /// One right-side column into one left-side received field.
    Scalar { select: String, receive: String },
    /// Every selectable column of the right entity into a nested field.
    Object { receive: String },
}

impl JoinShape {
    pub fn receive(&self) -> &str {
        match self {
            JoinShape::Scalar { receive, .. } | JoinShape::Object { receive } => receive.as_str(),
        }
    }
}

/// A declared join.
///
/// ```ignore
/// JoinDefinition::left(JoinTarget::entity::<Customer>())
///     .left_key("customer_id")
///     .select_into("name", "customer_name")
/// ```
///
/// Cloning keeps the correlation id; build a new definition for a second,
/// independent join against the same target.
#[derive(Debug, Clone, PartialEq)]
#[must_use = "builders have no effect until used"]
pub struct JoinDefinition {
    id: u64,
    pub kind: JoinKind,
    pub target: JoinTarget,
    pub left_key: Option<String>,
    pub right_key: Option<String>,
    pub shape: Option<JoinShape>,
}

impl JoinDefinition {
    pub fn new(kind: JoinKind, target: JoinTarget) -> Self {
        Self {
            id: NEXT_JOIN_ID.fetch_add(1, Ordering::Relaxed),
            kind,
            target,
            left_key: None,
            right_key: None,
            shape: None,
        }
    }

    pub fn inner(target: JoinTarget) -> Self {
        Self::new(JoinKind::Inner, target)
    }

    pub fn left(target: JoinTarget) -> Self {
        Self::new(JoinKind::Left, target)
    }

    /// Field of the left-hand entity compared in the ON clause.
    pub fn left_key(mut self, field: &str) -> Self {
        self.left_key = Some(field.into());
        self
    }

    /// Right-hand key. Inferred from the target entity's single primary key
    /// when omitted.
    pub fn right_key(mut self, field: &str) -> Self {
        self.right_key = Some(field.into());
        self
    }

    /// Project one right-side field into a received field of the left entity.
    pub fn select_into(mut self, select: &str, receive: &str) -> Self {
        self.shape = Some(JoinShape::Scalar {
            select: select.into(),
            receive: receive.into(),
        });
        self
    }

    /// Hydrate the whole right-side entity into a nested field.
    pub fn receive_object(mut self, field: &str) -> Self {
        self.shape = Some(JoinShape::Object {
            receive: field.into(),
        });
        self
    }

    /// Process-unique correlation id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Alias of the joined table.
    pub fn alias(&self) -> String {
        format!("j{}", self.id)
    }

    fn label(&self) -> String {
        match &self.shape {
            Some(shape) => shape.receive().to_string(),
            None => self.alias(),
        }
    }

    fn malformed(&self, entity: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::MalformedJoin {
            entity: entity.into(),
            field: self.label(),
            reason: reason.into(),
        }
    }

    /// Check the declaration against the left-hand table. Needs no registry.
    pub fn validate(&self, left: &TableDefinition) -> Result<(), ConfigError> {
        let left_key = self
            .left_key
            .as_deref()
            .ok_or_else(|| self.malformed(&left.entity, "no left key declared"))?;
        if left.column(left_key).is_none() {
            return Err(self.malformed(
                &left.entity,
                format!("left key {} is not a column", left_key),
            ));
        }

        match &self.shape {
            None => Err(self.malformed(
                &left.entity,
                "neither a selected field nor a receiving object is declared",
            )),
            Some(JoinShape::Scalar { receive, .. }) => {
                if left.received_type(receive).is_none() {
                    return Err(self.malformed(
                        &left.entity,
                        format!("{} is not declared as a received field", receive),
                    ));
                }
                Ok(())
            }
            Some(JoinShape::Object { receive }) => {
                if matches!(self.target, JoinTarget::Table { .. }) {
                    return Err(self.malformed(
                        &left.entity,
                        "object joins need an entity target",
                    ));
                }
                if !left.is_nested(receive) {
                    return Err(self.malformed(
                        &left.entity,
                        format!("{} is not declared as a nested field", receive),
                    ));
                }
                Ok(())
            }
        }
    }

    /// Resolve target table, key columns and projected columns.
    pub fn resolve(&self, left: &TableDefinition, registry: &Registry) -> Result<ResolvedJoin> {
        self.validate(left)?;

        // validate() guarantees both
        let (Some(left_key), Some(shape)) = (self.left_key.as_deref(), self.shape.as_ref()) else {
            return Err(self.malformed(&left.entity, "incomplete join").into());
        };
        let left_column = left
            .column(left_key)
            .map(|c| c.name.clone())
            .ok_or_else(|| self.malformed(&left.entity, "left key is not a column"))?;

        let alias = self.alias();
        let (schema, table, target) = match &self.target {
            JoinTarget::Entity(entity) => {
                let def = registry.resolve_ref(*entity)?;
                (def.schema.clone(), def.table.clone(), Some(def))
            }
            JoinTarget::Table { schema, table } => (schema.clone(), table.clone(), None),
        };

        let right_column = match (&self.right_key, &target) {
            (Some(key), Some(def)) => def
                .column(key)
                .map(|c| c.name.clone())
                .ok_or_else(|| {
                    self.malformed(
                        &left.entity,
                        format!("right key {} is not a column of {}", key, def.entity),
                    )
                })?,
            (Some(key), None) => key.clone(),
            (None, Some(def)) => {
                let keys = def.primary_keys();
                match keys.as_slice() {
                    [only] => only.name.clone(),
                    [] => {
                        return Err(ConfigError::MissingPrimaryKey {
                            entity: def.entity.clone(),
                            context: "join key inference",
                        }
                        .into())
                    }
                    _ => {
                        return Err(self
                            .malformed(
                                &left.entity,
                                format!(
                                    "{} has a composite primary key; declare the right key",
                                    def.entity
                                ),
                            )
                            .into())
                    }
                }
            }
            (None, None) => {
                return Err(self
                    .malformed(&left.entity, "raw table targets need an explicit right key")
                    .into())
            }
        };

        let columns = match shape {
            JoinShape::Scalar { select, receive } => {
                let column = match &target {
                    Some(def) => def.column(select).map(|c| c.name.clone()).ok_or_else(|| {
                        self.malformed(
                            &left.entity,
                            format!("{} is not a column of {}", select, def.entity),
                        )
                    })?,
                    None => select.clone(),
                };
                let field_type = left
                    .received_type(receive)
                    .unwrap_or(FieldType::String);
                vec![JoinColumn {
                    alias: format!("{}_{}", alias, receive),
                    column,
                    field: receive.clone(),
                    field_type,
                }]
            }
            JoinShape::Object { .. } => target
                .as_ref()
                .map(|def| {
                    def.selectable()
                        .map(|c| JoinColumn {
                            alias: format!("{}_{}", alias, c.name),
                            column: c.name.clone(),
                            field: c.field.clone(),
                            field_type: c.field_type,
                        })
                        .collect()
                })
                .unwrap_or_default(),
        };

        Ok(ResolvedJoin {
            id: self.id,
            kind: self.kind,
            alias,
            schema,
            table,
            left_column,
            right_column,
            target,
            columns,
            receive: shape.receive().to_string(),
            object: matches!(shape, JoinShape::Object { .. }),
        })
    }
}

/// A join ready for composition and materialization.
#[derive(Debug, Clone)]
pub struct ResolvedJoin {
    pub id: u64,
    pub kind: JoinKind,
    pub alias: String,
    pub schema: Option<String>,
    pub table: String,
    pub left_column: String,
    pub right_column: String,
    pub target: Option<Arc<TableDefinition>>,
    pub columns: Vec<JoinColumn>,
    pub receive: String,
    pub object: bool,
}

/// One projected join column and where its value lands.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinColumn {
    /// Result-set alias, `j{id}_{name}`.
    pub alias: String,
    /// Column of the joined table.
    pub column: String,
    /// Receiving field: on the left entity for scalar joins, on the nested
    /// entity for object joins.
    pub field: String,
    pub field_type: FieldType,
}
