//! # Quarry
//!
//! The core of a typed object-relational mapper: predicates in, parameterized
//! SQL out, rows back onto typed records.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          Entity (declared fields, keys, joins)           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [metadata::Registry]
//! ┌─────────────────────────────────────────────────────────┐
//! │        TableDefinition (cached per type, immutable)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!          ┌───────────────┴───────────────┐
//!          ▼ [translate]                   ▼ [compose]
//! ┌──────────────────────┐     ┌──────────────────────────────┐
//! │ Node -> WHERE Expr   │ ──▶ │ SELECT / INSERT / UPDATE /   │
//! │ + ParamSet bindings  │     │ DELETE via sql::dialect      │
//! └──────────────────────┘     └──────────────────────────────┘
//!                                          │
//!                                          ▼ Command { sql, bindings }
//! ┌─────────────────────────────────────────────────────────┐
//! │           Executor (connection layer, caller-owned)      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [materialize] RowCursor
//! ┌─────────────────────────────────────────────────────────┐
//! │        Typed entities (+ joined objects) / DynamicRow    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use quarry::prelude::*;
//!
//! let registry = Registry::new();
//! let orders = registry.resolve::<Order>()?;
//!
//! let command = SelectCommand::new(orders)
//!     .filter(Order::CUSTOMER_ID.eq(5).and(Order::CREATE_DATE.is_not_null()))
//!     .top(10)
//!     .compose(&registry, &ComposeContext::new(Dialect::TSql))?;
//! ```

pub mod compose;
pub mod config;
pub mod error;
pub mod materialize;
pub mod metadata;
pub mod session;
pub mod sql;
pub mod translate;
pub mod value;

pub use error::{OrmError, Result};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::compose::{
        Aggregate, Binding, Command, CommandKind, ComposeContext, CopyCommand, DeleteCommand,
        InsertCommand, SelectCommand, UpdateCommand,
    };
    pub use crate::error::{
        ConfigError, ConversionError, OrmError, Result, TranslationError,
    };
    pub use crate::materialize::{DynamicRow, Materializer, MemoryCursor, RowCursor};
    pub use crate::metadata::{
        ColumnDescriptor, Entity, EntityDescriptor, EntityRef, FieldSpec, Hydrate, JoinDefinition,
        JoinKind, Registry, TableDefinition, ValueSource,
    };
    pub use crate::session::{Executor, Session};
    pub use crate::sql::{Dialect, FieldType, SqlDialect};
    pub use crate::translate::{
        captured, field, lit, null, raw_sql, Col, Node, PredicateExt, Translator,
    };
    pub use crate::value::{FromValue, Value, ValueError};
}
