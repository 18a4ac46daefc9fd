//! MySQL SQL dialect.
//!
//! MySQL differences from ANSI:
//! - Backtick identifier quoting (`` `name` ``)
//! - LIMIT ... OFFSET ... for pagination
//! - No RETURNING clause (use LAST_INSERT_ID())
//! - No FULL OUTER JOIN

use super::helpers;
use super::{IdentityRetrieval, SqlDialect};
use crate::sql::types::FieldType;

/// MySQL SQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_backtick(ident)
    }

    // Uses default emit_limit_offset (LIMIT ... OFFSET ...)

    fn supports_full_outer_join(&self) -> bool {
        false
    }

    fn supports_returning(&self) -> bool {
        // MySQL has no RETURNING, use LAST_INSERT_ID()
        false
    }

    fn identity_retrieval(&self) -> IdentityRetrieval {
        IdentityRetrieval::LastInsertId {
            function: "LAST_INSERT_ID",
        }
    }

    fn supports_default_values(&self) -> bool {
        false
    }

    fn emit_data_type(&self, ty: &FieldType) -> String {
        helpers::emit_data_type_mysql(ty)
    }
}
