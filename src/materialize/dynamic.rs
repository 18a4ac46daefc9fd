//! Untyped projection: rows as ordered column-to-value maps.

use indexmap::IndexMap;
use serde::Serialize;

use super::cursor::RowCursor;
use crate::error::Result;
use crate::metadata::ValueSource;
use crate::value::{FromValue, Value, ValueError};

/// One row, columns in result order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DynamicRow {
    values: IndexMap<String, Value>,
}

impl DynamicRow {
    /// Value of `column`; exact match first, then ASCII case-insensitive.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column).or_else(|| {
            self.values
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(column))
                .map(|(_, v)| v)
        })
    }

    /// Decode `column` into `T`. An absent column decodes like NULL.
    pub fn decode<T: FromValue>(&self, column: &str) -> Result<T, ValueError> {
        self.get(column).cloned().unwrap_or(Value::Null).decode()
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn into_map(self) -> IndexMap<String, Value> {
        self.values
    }

    /// The row as a JSON object, for callers that forward rows untyped.
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

impl From<IndexMap<String, Value>> for DynamicRow {
    fn from(values: IndexMap<String, Value>) -> Self {
        Self { values }
    }
}

impl ValueSource for DynamicRow {
    fn value_of(&self, field: &str) -> Option<Value> {
        self.get(field).cloned()
    }
}

/// Drain `cursor` into dynamic rows. Later duplicate column names win.
pub fn materialize_dynamic(cursor: &mut dyn RowCursor) -> Result<Vec<DynamicRow>> {
    let columns = cursor.columns().to_vec();
    let mut out = Vec::new();
    while let Some(row) = cursor.next_row()? {
        let values = columns.iter().cloned().zip(row).collect::<IndexMap<_, _>>();
        out.push(DynamicRow { values });
    }
    Ok(out)
}
