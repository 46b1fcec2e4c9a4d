pub mod memory;

use crate::core::{Result, Value};
use crate::result::QueryResult;

pub use memory::MemoryExecutor;

/// A parameterized SQL statement with `?` positional placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
    /// Ask the executor to report keys it generated for an INSERT.
    pub return_generated_keys: bool,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
            return_generated_keys: false,
        }
    }

    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }

    pub fn with_params(mut self, params: Vec<Value>) -> Self {
        self.params = params;
        self
    }

    pub fn returning_generated_keys(mut self) -> Self {
        self.return_generated_keys = true;
        self
    }
}

/// Outcome of an INSERT, UPDATE, DELETE or DDL statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateOutcome {
    pub affected_rows: usize,
    /// Keys generated by the statement; empty unless they were requested.
    pub generated_keys: Vec<Value>,
}

impl UpdateOutcome {
    pub fn affected(affected_rows: usize) -> Self {
        Self {
            affected_rows,
            generated_keys: Vec::new(),
        }
    }
}

/// Runs statements against a database on behalf of repositories.
///
/// Implementations wrap a live connection; each call is one blocking round trip.
pub trait StatementExecutor: Send + Sync {
    fn execute_update(&self, statement: &Statement) -> Result<UpdateOutcome>;

    fn execute_query(&self, statement: &Statement) -> Result<QueryResult>;
}
