//! Process-wide cache of table definitions keyed by type.

use std::any::TypeId;
use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use super::entity::{Entity, EntityRef};
use super::table::TableDefinition;
use crate::error::Result;

/// Owns the resolved [`TableDefinition`] of every entity it has seen.
///
/// Definitions are built lazily on first use and never change afterwards.
/// Concurrent first resolutions of the same type may both build, but only
/// the first insert wins and every caller receives that same `Arc`.
#[derive(Debug, Default)]
pub struct Registry {
    tables: DashMap<TypeId, Arc<TableDefinition>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Definition for `E`, built on first use.
    pub fn resolve<E: Entity>(&self) -> Result<Arc<TableDefinition>> {
        self.resolve_ref(EntityRef::of::<E>())
    }

    /// Definition for a type-erased entity handle.
    pub fn resolve_ref(&self, entity: EntityRef) -> Result<Arc<TableDefinition>> {
        if let Some(found) = self.tables.get(&entity.type_id()) {
            return Ok(Arc::clone(found.value()));
        }

        // Build outside any shard lock: describe() is user code
        let built = Arc::new(TableDefinition::from_descriptor(entity.describe())?);

        match self.tables.entry(entity.type_id()) {
            Entry::Occupied(existing) => Ok(Arc::clone(existing.get())),
            Entry::Vacant(slot) => {
                debug!(
                    entity = %built.entity,
                    table = %built.table,
                    columns = built.columns.len(),
                    joins = built.joins.len(),
                    "registered table definition"
                );
                slot.insert(Arc::clone(&built));
                Ok(built)
            }
        }
    }

    /// Cached definition, without building.
    pub fn get<E: Entity>(&self) -> Option<Arc<TableDefinition>> {
        self.tables
            .get(&TypeId::of::<E>())
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains<E: Entity>(&self) -> bool {
        self.tables.contains_key(&TypeId::of::<E>())
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
