//! Rows onto typed entities.

use std::marker::PhantomData;
use std::sync::Arc;

use super::cursor::RowCursor;
use crate::compose::resolve_joins;
use crate::error::{ConfigError, ConversionError, Result};
use crate::metadata::{Entity, JoinDefinition, Registry, ResolvedJoin, TableDefinition};
use crate::sql::FieldType;
use crate::value::Value;

/// Where one cursor column lands.
#[derive(Debug, Clone)]
struct Slot {
    index: usize,
    column: String,
    field: String,
    field_type: FieldType,
}

/// Column-to-field assignments for one cursor schema.
#[derive(Debug, Default)]
struct Plan {
    fields: Vec<Slot>,
    /// Per object join (index into `Materializer::joins`), its nested slots.
    nested: Vec<(usize, Vec<Slot>)>,
}

/// Builds `E` instances from cursor rows.
///
/// Columns are matched to fields by resolved column name, ignoring ASCII
/// case. Cursor columns with no field are skipped and fields with no column
/// keep their default. Object joins fill their nested field from the
/// `j{id}_` prefixed columns of that join.
pub struct Materializer<E: Entity> {
    table: Arc<TableDefinition>,
    joins: Vec<ResolvedJoin>,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> Materializer<E> {
    /// Materializer for `E` with its declared joins plus `extra_joins`.
    pub fn new(registry: &Registry, extra_joins: &[JoinDefinition]) -> Result<Self> {
        let table = registry.resolve::<E>()?;
        let joins = resolve_joins(&table, extra_joins, registry)?;
        Ok(Self {
            table,
            joins,
            _entity: PhantomData,
        })
    }

    pub fn table(&self) -> &Arc<TableDefinition> {
        &self.table
    }

    /// Every remaining row.
    pub fn materialize_all(&self, cursor: &mut dyn RowCursor) -> Result<Vec<E>> {
        let plan = self.plan(cursor.columns());
        let mut out = Vec::new();
        while let Some(row) = cursor.next_row()? {
            out.push(self.build(&plan, row)?);
        }
        Ok(out)
    }

    /// The next row only; `None` when the cursor is empty.
    pub fn materialize_one(&self, cursor: &mut dyn RowCursor) -> Result<Option<E>> {
        let plan = self.plan(cursor.columns());
        match cursor.next_row()? {
            Some(row) => Ok(Some(self.build(&plan, row)?)),
            None => Ok(None),
        }
    }

    fn plan(&self, columns: &[String]) -> Plan {
        let mut plan = Plan {
            fields: Vec::new(),
            nested: self
                .joins
                .iter()
                .enumerate()
                .filter(|(_, j)| j.object)
                .map(|(i, _)| (i, Vec::new()))
                .collect(),
        };

        for (index, name) in columns.iter().enumerate() {
            if let Some(slot) = self.base_slot(index, name) {
                plan.fields.push(slot);
                continue;
            }

            for (join_index, join) in self.joins.iter().enumerate() {
                let Some(jc) = join.columns.iter().find(|c| c.alias.eq_ignore_ascii_case(name)) else {
                    continue;
                };
                let slot = Slot {
                    index,
                    column: name.clone(),
                    field: jc.field.clone(),
                    field_type: jc.field_type,
                };
                if join.object {
                    if let Some((_, slots)) = plan.nested.iter_mut().find(|(i, _)| *i == join_index) {
                        slots.push(slot);
                    }
                } else {
                    plan.fields.push(slot);
                }
                break;
            }
        }
        plan
    }

    fn base_slot(&self, index: usize, name: &str) -> Option<Slot> {
        let slot = |field: &str, field_type: FieldType| Slot {
            index,
            column: name.to_string(),
            field: field.to_string(),
            field_type,
        };
        if let Some(c) = self.table.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)) {
            return Some(slot(&c.field, c.field_type));
        }
        self.table
            .custom_columns
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
            .map(|c| slot(&c.field, c.field_type))
    }

    fn build(&self, plan: &Plan, mut row: Vec<Value>) -> Result<E> {
        let mut entity = E::default();

        for slot in &plan.fields {
            let value = take(&mut row, slot.index);
            value
                .coerce(&slot.field_type)
                .and_then(|v| entity.set(&slot.field, v))
                .map_err(|source| conversion(&self.table.entity, slot, source))?;
        }

        for (join_index, slots) in &plan.nested {
            let values: Vec<Value> = slots.iter().map(|s| take(&mut row, s.index)).collect();
            if values.iter().all(Value::is_null) {
                continue;
            }

            let join = &self.joins[*join_index];
            let nested_entity = join
                .target
                .as_ref()
                .map(|t| t.entity.clone())
                .unwrap_or_else(|| join.table.clone());
            let receiver = entity.receive(&join.receive).ok_or_else(|| ConfigError::MalformedJoin {
                entity: self.table.entity.clone(),
                field: join.receive.clone(),
                reason: "the entity exposes no receiving slot for this field".to_string(),
            })?;

            for (slot, value) in slots.iter().zip(values) {
                value
                    .coerce(&slot.field_type)
                    .and_then(|v| receiver.hydrate_field(&slot.field, v))
                    .map_err(|source| conversion(&nested_entity, slot, source))?;
            }
        }

        Ok(entity)
    }
}

fn take(row: &mut [Value], index: usize) -> Value {
    row.get_mut(index)
        .map(|v| std::mem::replace(v, Value::Null))
        .unwrap_or(Value::Null)
}

fn conversion(entity: &str, slot: &Slot, source: crate::value::ValueError) -> ConversionError {
    ConversionError {
        entity: entity.to_string(),
        field: slot.field.clone(),
        column: slot.column.clone(),
        source,
    }
}
