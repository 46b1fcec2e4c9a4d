use super::{Statement, StatementExecutor, UpdateOutcome};
use crate::core::{OrmError, Result};
use crate::dialect::Dialect;
use crate::parser::SqlParserAdapter;
use crate::parser::ast;
use crate::result::QueryResult;
use crate::storage::{InMemoryStorage, TableSchema};
use log::debug;
use std::sync::Mutex;

/// In-process executor over in-memory tables.
///
/// Understands the statements this crate emits: `CREATE TABLE [IF NOT EXISTS]`
/// in the chosen dialect, `INSERT ... VALUES`, `SELECT` with `col = ?`
/// conjunctions, `UPDATE ... SET ... WHERE` and `DELETE ... WHERE`. Integer
/// primary keys inserted as NULL or 0 receive the next key.
pub struct MemoryExecutor {
    parser: SqlParserAdapter,
    dialect: Dialect,
    storage: Mutex<InMemoryStorage>,
}

impl MemoryExecutor {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            parser: SqlParserAdapter::new(dialect),
            dialect,
            storage: Mutex::new(InMemoryStorage::new()),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn table_names(&self) -> Result<Vec<String>> {
        Ok(self.storage.lock()?.table_names())
    }

    pub fn row_count(&self, table: &str) -> Result<usize> {
        Ok(self.storage.lock()?.get_table(table)?.row_count())
    }

    fn parse(&self, statement: &Statement) -> Result<ast::Statement> {
        debug!(
            "[{}] {} -- params: {:?}",
            self.dialect, statement.sql, statement.params
        );
        self.parser.parse(&statement.sql, &statement.params)
    }
}

impl StatementExecutor for MemoryExecutor {
    fn execute_update(&self, statement: &Statement) -> Result<UpdateOutcome> {
        let parsed = self.parse(statement)?;
        let mut storage = self.storage.lock()?;

        match parsed {
            ast::Statement::CreateTable(create) => {
                let schema = TableSchema::new(create.table_name, create.columns);
                let created = storage.create_table(schema, create.if_not_exists)?;
                Ok(UpdateOutcome::affected(usize::from(created)))
            }
            ast::Statement::Insert(insert) => {
                let table = storage.get_table_mut(&insert.table_name)?;
                let mut outcome = UpdateOutcome::default();
                for values in insert.values {
                    let generated = table.insert(insert.columns.as_deref(), values)?;
                    outcome.affected_rows += 1;
                    if statement.return_generated_keys
                        && let Some(key) = generated
                    {
                        outcome.generated_keys.push(key);
                    }
                }
                Ok(outcome)
            }
            ast::Statement::Update(update) => {
                let table = storage.get_table_mut(&update.table_name)?;
                let affected = table.update_where(&update.assignments, &update.selection)?;
                Ok(UpdateOutcome::affected(affected))
            }
            ast::Statement::Delete(delete) => {
                let table = storage.get_table_mut(&delete.table_name)?;
                let affected = table.delete_where(&delete.selection)?;
                Ok(UpdateOutcome::affected(affected))
            }
            ast::Statement::Query(_) => Err(OrmError::ExecutionError(
                "SELECT must be run with execute_query".to_string(),
            )),
        }
    }

    fn execute_query(&self, statement: &Statement) -> Result<QueryResult> {
        let ast::Statement::Query(query) = self.parse(statement)? else {
            return Err(OrmError::ExecutionError(
                "execute_query only runs SELECT statements".to_string(),
            ));
        };

        let storage = self.storage.lock()?;
        let table = storage.get_table(&query.table_name)?;
        let (columns, rows) = table.select(&query.projection, &query.selection)?;
        Ok(QueryResult::new(columns, rows))
    }
}
