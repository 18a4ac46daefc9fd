//! CRUD facade over an [`Executor`].
//!
//! A [`Session`] owns the composer settings and a connection-layer handle,
//! composes each operation against the shared [`Registry`], hands the
//! [`Command`] to the executor and materializes what comes back. Errors from
//! the executor are returned unchanged.

use std::sync::Arc;

use tracing::debug;

use crate::compose::{
    Command, CommandKind, ComposeContext, CopyCommand, DeleteCommand, InsertCommand, SelectCommand,
    UpdateCommand, AGGREGATE_ALIAS,
};
use crate::error::{ConversionError, Result};
use crate::materialize::{materialize_dynamic, DynamicRow, Materializer, RowCursor};
use crate::metadata::{Entity, JoinDefinition, Registry, TableDefinition};
use crate::translate::Node;
use crate::value::Value;

/// Runs composed commands. Implemented by the connection layer.
///
/// Parameters are bound by [`Binding::name`](crate::compose::Binding) in
/// dialects with named placeholders and by position otherwise.
pub trait Executor {
    /// Run a [`CommandKind::Query`] command.
    fn query(&mut self, command: &Command) -> Result<Box<dyn RowCursor + '_>>;

    /// Run a [`CommandKind::NonQuery`] command, returning rows affected.
    fn execute(&mut self, command: &Command) -> Result<u64>;

    /// Run a [`CommandKind::Scalar`] command.
    fn scalar(&mut self, command: &Command) -> Result<Value>;
}

impl<X: Executor + ?Sized> Executor for &mut X {
    fn query(&mut self, command: &Command) -> Result<Box<dyn RowCursor + '_>> {
        (**self).query(command)
    }

    fn execute(&mut self, command: &Command) -> Result<u64> {
        (**self).execute(command)
    }

    fn scalar(&mut self, command: &Command) -> Result<Value> {
        (**self).scalar(command)
    }
}

pub struct Session<X: Executor> {
    registry: Arc<Registry>,
    context: ComposeContext,
    executor: X,
}

impl<X: Executor> Session<X> {
    pub fn new(registry: Arc<Registry>, context: ComposeContext, executor: X) -> Self {
        Self {
            registry,
            context,
            executor,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn context(&self) -> &ComposeContext {
        &self.context
    }

    pub fn executor_mut(&mut self) -> &mut X {
        &mut self.executor
    }

    pub fn into_executor(self) -> X {
        self.executor
    }

    /// Table definition for `E`, resolved on first use.
    pub fn table<E: Entity>(&self) -> Result<Arc<TableDefinition>> {
        self.registry.resolve::<E>()
    }

    /// Every `E` matching `filter` (all rows when `None`).
    pub fn find<E: Entity>(&mut self, filter: Option<Node>) -> Result<Vec<E>> {
        self.find_with(Vec::new(), filter)
    }

    /// Like [`find`](Self::find), adding per-query joins to the declared ones.
    pub fn find_with<E: Entity>(
        &mut self,
        joins: Vec<JoinDefinition>,
        filter: Option<Node>,
    ) -> Result<Vec<E>> {
        let materializer = Materializer::<E>::new(&self.registry, &joins)?;
        let command = SelectCommand::new(materializer.table().clone())
            .joins(joins)
            .filter_opt(filter)
            .compose(&self.registry, &self.context)?;

        let mut cursor = self.run_query(&command)?;
        materializer.materialize_all(cursor.as_mut())
    }

    /// The first `E` matching `filter`, if any.
    pub fn first<E: Entity>(&mut self, filter: Option<Node>) -> Result<Option<E>> {
        let materializer = Materializer::<E>::new(&self.registry, &[])?;
        let command = SelectCommand::new(materializer.table().clone())
            .filter_opt(filter)
            .top(1)
            .compose(&self.registry, &self.context)?;

        let mut cursor = self.run_query(&command)?;
        materializer.materialize_one(cursor.as_mut())
    }

    pub fn count<E: Entity>(&mut self, filter: Option<Node>) -> Result<i64> {
        let table = self.table::<E>()?;
        let command = SelectCommand::new(table.clone())
            .filter_opt(filter)
            .count()
            .compose(&self.registry, &self.context)?;

        log_execute(&command);
        let value = self.executor.scalar(&command)?;
        let count = value.decode::<i64>().map_err(|source| ConversionError {
            entity: table.entity.clone(),
            field: AGGREGATE_ALIAS.to_string(),
            column: AGGREGATE_ALIAS.to_string(),
            source,
        })?;
        Ok(count)
    }

    /// Insert `entity`. For tables with a primary key the stored row is read
    /// back, generated keys included; keyless tables return `None`.
    pub fn insert<E: Entity>(&mut self, entity: &E) -> Result<Option<E>> {
        let table = self.table::<E>()?;
        let command = InsertCommand::new(table).compose(entity, &self.context)?;

        if command.kind == CommandKind::NonQuery {
            self.run_execute(&command)?;
            return Ok(None);
        }

        let materializer = Materializer::<E>::new(&self.registry, &[])?;
        let mut cursor = self.run_query(&command)?;
        materializer.materialize_one(cursor.as_mut())
    }

    /// Update every updatable field of `entity`, matched on its primary key.
    pub fn update<E: Entity>(&mut self, entity: &E) -> Result<u64> {
        let command = UpdateCommand::new(self.table::<E>()?)
            .source(entity)
            .compose(&self.context)?;
        self.run_execute(&command)
    }

    /// Update only `fields` of `entity`, matched on its primary key.
    pub fn update_fields<E: Entity, S: AsRef<str>>(
        &mut self,
        entity: &E,
        fields: impl IntoIterator<Item = S>,
    ) -> Result<u64> {
        let command = UpdateCommand::new(self.table::<E>()?)
            .source(entity)
            .fields(fields)
            .compose(&self.context)?;
        self.run_execute(&command)
    }

    /// Delete the row identified by `entity`'s primary key.
    pub fn delete<E: Entity>(&mut self, entity: &E) -> Result<u64> {
        let command = DeleteCommand::new(self.table::<E>()?)
            .key_from(entity)?
            .compose(&self.context)?;
        self.run_execute(&command)
    }

    pub fn delete_where<E: Entity>(&mut self, filter: Node) -> Result<u64> {
        let command = DeleteCommand::new(self.table::<E>()?)
            .filter(filter)
            .compose(&self.context)?;
        self.run_execute(&command)
    }

    /// Copy rows of `E` matching `filter`, overriding `overrides`.
    pub fn copy<E: Entity>(
        &mut self,
        filter: Node,
        overrides: impl IntoIterator<Item = (&'static str, Value)>,
    ) -> Result<u64> {
        let command = overrides
            .into_iter()
            .fold(CopyCommand::new(self.table::<E>()?), |copy, (field, value)| {
                copy.set(field, value)
            })
            .filter(filter)
            .compose(&self.context)?;
        self.run_execute(&command)
    }

    /// Run any query command and return its rows untyped.
    pub fn query_dynamic(&mut self, command: &Command) -> Result<Vec<DynamicRow>> {
        let mut cursor = self.run_query(command)?;
        materialize_dynamic(cursor.as_mut())
    }

    fn run_query(&mut self, command: &Command) -> Result<Box<dyn RowCursor + '_>> {
        log_execute(command);
        self.executor.query(command)
    }

    fn run_execute(&mut self, command: &Command) -> Result<u64> {
        log_execute(command);
        let affected = self.executor.execute(command)?;
        debug!(affected, "command executed");
        Ok(affected)
    }
}

fn log_execute(command: &Command) {
    debug!(kind = ?command.kind, bindings = command.bindings.len(), "executing command");
}
