use super::{Table, TableSchema};
use crate::core::{OrmError, Result};
use std::collections::HashMap;

/// Tables keyed by their lowercased name, so lookups ignore identifier case.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    tables: HashMap<String, Table>,
}

impl InMemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the table already existed and `if_not_exists` was set.
    pub fn create_table(&mut self, schema: TableSchema, if_not_exists: bool) -> Result<bool> {
        let key = schema.name().to_ascii_lowercase();

        if self.tables.contains_key(&key) {
            if if_not_exists {
                return Ok(false);
            }
            return Err(OrmError::ExecutionError(format!(
                "Table '{}' already exists",
                schema.name()
            )));
        }

        self.tables.insert(key, Table::new(schema));
        Ok(true)
    }

    pub fn get_table(&self, name: &str) -> Result<&Table> {
        self.tables
            .get(&name.to_ascii_lowercase())
            .ok_or_else(|| table_not_found(name))
    }

    pub fn get_table_mut(&mut self, name: &str) -> Result<&mut Table> {
        self.tables
            .get_mut(&name.to_ascii_lowercase())
            .ok_or_else(|| table_not_found(name))
    }

    pub fn table_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .tables
            .values()
            .map(|t| t.schema().name().to_string())
            .collect();
        names.sort();
        names
    }
}

fn table_not_found(name: &str) -> OrmError {
    OrmError::ExecutionError(format!("Table '{}' not found", name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::ast::{ColumnDef, DataType};

    fn schema(name: &str) -> TableSchema {
        TableSchema::new(
            name,
            vec![ColumnDef {
                name: "id".into(),
                data_type: DataType::Integer,
                nullable: false,
                primary_key: true,
            }],
        )
    }

    #[test]
    fn test_create_and_lookup_ignores_case() {
        let mut storage = InMemoryStorage::new();
        assert!(storage.create_table(schema("Users"), false).unwrap());

        assert!(storage.get_table("users").is_ok());
        assert_eq!(storage.get_table("USERS").unwrap().schema().name(), "Users");
        assert_eq!(storage.table_names(), vec!["Users".to_string()]);
    }

    #[test]
    fn test_create_existing_table() {
        let mut storage = InMemoryStorage::new();
        storage.create_table(schema("users"), false).unwrap();

        assert!(!storage.create_table(schema("users"), true).unwrap());
        assert!(storage.create_table(schema("users"), false).is_err());
        assert!(storage.get_table("missing").unwrap_err().is_execution());
    }
}
