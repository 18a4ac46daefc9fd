//! Result materialization.
//!
//! Two modes over the same [`RowCursor`]:
//!
//! - [`Materializer<E>`]: typed entities, values coerced to each field's
//!   declared [`FieldType`](crate::sql::FieldType), joined sub-objects
//!   hydrated from their correlation-prefixed columns.
//! - [`materialize_dynamic`]: [`DynamicRow`]s keyed by column name.
//!
//! A value that cannot be coerced fails the whole row with a
//! [`ConversionError`](crate::error::ConversionError) naming the field; no
//! partially converted entity is returned.

mod cursor;
mod dynamic;
mod typed;

pub use cursor::{MemoryCursor, RowCursor};
pub use dynamic::{materialize_dynamic, DynamicRow};
pub use typed::Materializer;
