//! T-SQL (SQL Server / Azure SQL) dialect.
//!
//! T-SQL differences that matter to the composer:
//! - Square bracket identifier quoting (`[name]`)
//! - Named `@p1` parameters
//! - TOP for simple limiting, OFFSET FETCH for paging (requires ORDER BY)
//! - OUTPUT instead of RETURNING, so generated keys go through a table variable

use super::helpers;
use super::{IdentityRetrieval, SqlDialect};
use crate::sql::token::TokenStream;
use crate::sql::types::FieldType;

/// T-SQL (SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct TSql;

impl SqlDialect for TSql {
    fn name(&self) -> &'static str {
        "tsql"
    }

    fn quote_identifier(&self, ident: &str) -> String {
        helpers::quote_bracket(ident)
    }

    fn emit_top(&self, n: u64) -> Option<TokenStream> {
        Some(helpers::emit_top_tsql(n))
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_tsql(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        true
    }

    fn supports_returning(&self) -> bool {
        // T-SQL uses OUTPUT instead of RETURNING
        false
    }

    fn identity_retrieval(&self) -> IdentityRetrieval {
        IdentityRetrieval::OutputInto
    }

    fn emit_data_type(&self, ty: &FieldType) -> String {
        helpers::emit_data_type_tsql(ty)
    }
}
