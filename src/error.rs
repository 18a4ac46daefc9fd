//! Error taxonomy.
//!
//! Every error here is permanent for the call that raised it: nothing in the
//! crate retries, and nothing is downgraded to an empty result.

use thiserror::Error;

use crate::config::SettingsError;
use crate::value::ValueError;

/// Top-level error returned by registry, translator, composer, materializer
/// and session operations.
#[derive(Debug, Error)]
pub enum OrmError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Translation(#[from] TranslationError),

    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Raised by the connection layer and passed through untouched.
    #[error("command execution failed: {0}")]
    Execution(#[source] Box<dyn std::error::Error + Send + Sync + 'static>),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

impl OrmError {
    /// Wrap an error coming from an [`Executor`](crate::session::Executor).
    pub fn execution(err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>) -> Self {
        OrmError::Execution(err.into())
    }
}

pub type Result<T, E = OrmError> = std::result::Result<T, E>;

/// Mapping or query-shape problems. Raised before any command executes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("entity {entity} declares no columns and no primary keys")]
    NoColumns { entity: String },

    #[error("select on {entity} would project zero columns")]
    NoSelectableColumns { entity: String },

    #[error("malformed join {field} on {entity}: {reason}")]
    MalformedJoin {
        entity: String,
        field: String,
        reason: String,
    },

    #[error("entity {entity} has no primary key ({context})")]
    MissingPrimaryKey {
        entity: String,
        context: &'static str,
    },

    #[error("entity {entity} has no field named {field}")]
    UnknownField { entity: String, field: String },

    #[error("update on {entity} has no assignable fields")]
    NothingToUpdate { entity: String },

    #[error("{statement} on {entity} needs a predicate or primary key values")]
    UnboundedMutation {
        entity: String,
        statement: &'static str,
    },

    #[error("{modifier} {value} on {entity} exceeds the largest row count a command can carry")]
    RowCountOutOfRange {
        entity: String,
        modifier: &'static str,
        value: u64,
    },

    #[error("{feature} is not supported by the {dialect} dialect")]
    Unsupported {
        dialect: &'static str,
        feature: String,
    },
}

/// A predicate used something outside the supported grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TranslationError {
    #[error("unsupported operator {operator}")]
    UnsupportedOperator { operator: String },

    #[error("unsupported method {method}")]
    UnsupportedMethod { method: String },

    #[error("{node} cannot appear as {position}")]
    UnexpectedNode {
        node: String,
        position: &'static str,
    },

    #[error("entity {entity} has no field named {field}")]
    UnknownField { entity: String, field: String },

    #[error("operator {operator} cannot compare against NULL")]
    NullOrdering { operator: String },

    #[error("{method} expects a text argument, found {found}")]
    InvalidPattern { method: String, found: String },
}

/// A cursor value could not be assigned to an entity field.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert column {column} into {entity}.{field}: {source}")]
pub struct ConversionError {
    pub entity: String,
    pub field: String,
    pub column: String,
    #[source]
    pub source: ValueError,
}
