use std::collections::VecDeque;

use crate::error::Result;
use crate::value::Value;

/// Forward-only result rows, supplied by the connection layer.
pub trait RowCursor {
    /// Column names in result order.
    fn columns(&self) -> &[String];

    /// Next row, one value per column; `None` once exhausted.
    fn next_row(&mut self) -> Result<Option<Vec<Value>>>;
}

/// A cursor over rows already in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryCursor {
    columns: Vec<String>,
    rows: VecDeque<Vec<Value>>,
}

impl MemoryCursor {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>, rows: Vec<Vec<Value>>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: rows.into(),
        }
    }

    /// A cursor yielding a single scalar, as an aggregate returns.
    pub fn scalar(column: &str, value: Value) -> Self {
        Self::new([column], vec![vec![value]])
    }

    pub fn remaining(&self) -> usize {
        self.rows.len()
    }
}

impl RowCursor for MemoryCursor {
    fn columns(&self) -> &[String] {
        &self.columns
    }

    fn next_row(&mut self) -> Result<Option<Vec<Value>>> {
        Ok(self.rows.pop_front())
    }
}
