use crate::core::Value;
use crate::result::Row;

/// Rows returned by a query together with the projected column names.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl QueryResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// The row at `index` keyed by column name.
    pub fn row(&self, index: usize) -> Option<Row> {
        self.rows.get(index).map(|values| self.keyed(values))
    }

    pub fn first(&self) -> Option<Row> {
        self.row(0)
    }

    pub fn into_rows(self) -> Vec<Row> {
        let QueryResult { columns, rows } = self;
        rows.into_iter()
            .map(|values| columns.iter().cloned().zip(values).collect())
            .collect()
    }

    fn keyed(&self, values: &[Value]) -> Row {
        self.columns
            .iter()
            .cloned()
            .zip(values.iter().cloned())
            .collect()
    }
}
