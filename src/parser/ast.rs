use crate::core::Value;

/// Statements understood by the in-memory executor, with parameters already bound.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    CreateTable(CreateTableStmt),
    Insert(InsertStmt),
    Query(QueryStmt),
    Update(UpdateStmt),
    Delete(DeleteStmt),
}

/// Storage affinity of a declared column type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataType {
    Integer,
    Float,
    Text,
    Boolean,
}

impl DataType {
    /// Classifies a rendered SQL type such as `BIGINT`, `VARCHAR(64)` or `BIGSERIAL`.
    pub fn from_sql(sql_type: &str) -> Self {
        let upper = sql_type.trim().to_ascii_uppercase();
        let base = upper.split(['(', ' ']).next().unwrap_or_default();
        match base {
            "INT" | "INTEGER" | "INT2" | "INT4" | "INT8" | "BIGINT" | "SMALLINT" | "TINYINT"
            | "MEDIUMINT" | "SERIAL" | "BIGSERIAL" | "SMALLSERIAL" => Self::Integer,
            "DOUBLE" | "REAL" | "FLOAT" | "FLOAT4" | "FLOAT8" | "NUMERIC" | "DECIMAL" => {
                Self::Float
            }
            "BOOLEAN" | "BOOL" => Self::Boolean,
            _ => Self::Text,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Text => "TEXT",
            Self::Boolean => "BOOLEAN",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDef {
    pub name: String,
    pub data_type: DataType,
    pub nullable: bool,
    pub primary_key: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CreateTableStmt {
    pub table_name: String,
    pub columns: Vec<ColumnDef>,
    pub if_not_exists: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InsertStmt {
    pub table_name: String,
    /// `None` when the statement lists no columns.
    pub columns: Option<Vec<String>>,
    pub values: Vec<Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Projection {
    Wildcard,
    Columns(Vec<String>),
}

/// `column = value`; a statement's conditions are combined with AND.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryStmt {
    pub table_name: String,
    pub projection: Projection,
    pub selection: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Assignment {
    pub column: String,
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UpdateStmt {
    pub table_name: String,
    pub assignments: Vec<Assignment>,
    pub selection: Vec<Condition>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeleteStmt {
    pub table_name: String,
    pub selection: Vec<Condition>,
}
