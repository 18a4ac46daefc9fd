//! Table metadata: what each mapped type declares and how it resolves.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  impl Entity for Order { fn describe() -> EntityDescriptor }    │
//! │    FieldSpec (column name, keys, ignore flags, tenant)          │
//! │    JoinDefinition (target, keys, scalar or object shape)        │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │ Registry::resolve::<Order>()
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Arc<TableDefinition>  (validated once, cached per TypeId)      │
//! └─────────────────────────────────────────────────────────────────┘
//!                           │ JoinDefinition::resolve(&def, &registry)
//!                           ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ResolvedJoin  (alias j{id}, ON columns, projected JoinColumns) │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Join targets are resolved when a query is composed, not when the owning
//! definition is built, so entities may join each other in cycles.

mod entity;
mod join;
mod registry;
mod table;

pub use entity::{
    Entity, EntityDescriptor, EntityRef, FieldKind, FieldSpec, Hydrate, ValueSource,
};
pub use join::{JoinColumn, JoinDefinition, JoinKind, JoinShape, JoinTarget, ResolvedJoin};
pub use registry::Registry;
pub use table::{ColumnDescriptor, CustomColumn, TableDefinition};
