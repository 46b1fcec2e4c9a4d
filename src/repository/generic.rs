use super::Repository;
use crate::core::{OrmError, Result, SemanticType, Value};
use crate::executor::{Statement, StatementExecutor};
use crate::mapper::EntityMapper;
use crate::metadata::{ColumnMetadata, Entity, EntityMetadata};
use log::debug;
use std::marker::PhantomData;
use std::sync::Arc;

/// Repository for one entity type, issuing statements through an injected executor.
pub struct GenericRepository<E: Entity> {
    executor: Arc<dyn StatementExecutor>,
    metadata: Arc<EntityMetadata>,
    insert_sql: String,
    find_by_id_sql: String,
    find_all_sql: String,
    delete_sql: String,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity> GenericRepository<E> {
    /// Fails with a `ConfigurationError` when `E` is not an entity.
    pub fn new(executor: Arc<dyn StatementExecutor>) -> Result<Self> {
        let metadata = E::metadata()?;

        let columns = metadata.column_names();
        let placeholders = vec!["?"; columns.len()].join(",");
        let table = &metadata.table_name;
        let pk = &metadata.primary_key.column_name;

        Ok(Self {
            insert_sql: format!(
                "INSERT INTO {} ({}) VALUES ({})",
                table,
                columns.join(","),
                placeholders
            ),
            find_by_id_sql: format!("SELECT * FROM {} WHERE {} = ?", table, pk),
            find_all_sql: format!("SELECT * FROM {}", table),
            delete_sql: format!("DELETE FROM {} WHERE {} = ?", table, pk),
            executor,
            metadata,
            _entity: PhantomData,
        })
    }

    pub fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn mapper(&self) -> EntityMapper<'_> {
        EntityMapper::new(&self.metadata)
    }

    fn query(&self, statement: Statement) -> Result<Vec<E>> {
        debug!("{} -- params: {:?}", statement.sql, statement.params);
        let result = self.executor.execute_query(&statement)?;
        let mapper = self.mapper();
        result
            .into_rows()
            .iter()
            .map(|row| mapper.from_row(row))
            .collect()
    }
}

impl<E: Entity> Repository<E> for GenericRepository<E> {
    fn save(&self, mut entity: E) -> Result<E> {
        let params = self
            .mapper()
            .to_row(&entity)?
            .into_iter()
            .map(|(_, value)| value)
            .collect();
        let statement = Statement::new(self.insert_sql.as_str())
            .with_params(params)
            .returning_generated_keys();

        debug!("{} -- params: {:?}", statement.sql, statement.params);
        let outcome = self.executor.execute_update(&statement)?;

        let pk = &self.metadata.primary_key;
        if let Some(key) = outcome.generated_keys.into_iter().next() {
            match coerce_generated_key(pk, key)? {
                Some(key) => {
                    debug!(
                        "{}.{} generated as {}",
                        self.metadata.table_name, pk.column_name, key
                    );
                    entity.set_field(&pk.field_name, key)?;
                }
                None => debug!(
                    "{}.{} is not an integer key; generated key ignored",
                    self.metadata.table_name, pk.column_name
                ),
            }
        }

        Ok(entity)
    }

    fn find_by_id(&self, id: Value) -> Result<Option<E>> {
        let statement = Statement::new(self.find_by_id_sql.as_str()).bind(id);
        debug!("{} -- params: {:?}", statement.sql, statement.params);
        let result = self.executor.execute_query(&statement)?;
        result
            .first()
            .map(|row| self.mapper().from_row(&row))
            .transpose()
    }

    fn find_all(&self) -> Result<Vec<E>> {
        self.query(Statement::new(self.find_all_sql.as_str()))
    }

    fn delete(&self, id: Value) -> Result<()> {
        let statement = Statement::new(self.delete_sql.as_str()).bind(id);
        debug!("{} -- params: {:?}", statement.sql, statement.params);
        let outcome = self.executor.execute_update(&statement)?;
        if outcome.affected_rows == 0 {
            debug!("{}: nothing to delete", self.metadata.table_name);
        }
        Ok(())
    }
}

/// Narrows a driver-reported key to the primary key's integer width.
/// Keys are only assigned back to integer primary keys.
fn coerce_generated_key(pk: &ColumnMetadata, key: Value) -> Result<Option<Value>> {
    if !pk.semantic_type.is_integer() {
        return Ok(None);
    }

    let number = key.as_i64().ok_or_else(|| {
        OrmError::MappingError(format!(
            "generated key {} for '{}' is not numeric",
            key, pk.column_name
        ))
    })?;

    if pk.semantic_type == SemanticType::Int32 && i32::try_from(number).is_err() {
        return Err(OrmError::MappingError(format!(
            "generated key {} does not fit the 32-bit column '{}'",
            number, pk.column_name
        )));
    }

    Ok(Some(Value::Integer(number)))
}
