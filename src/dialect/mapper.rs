use crate::core::SemanticType;
use crate::metadata::ColumnMetadata;

/// Translates column metadata into the SQL type names of one dialect.
pub trait TypeMapper: Send + Sync {
    fn sql_type(&self, column: &ColumnMetadata) -> String;

    /// Trailing table options placed after the closing parenthesis.
    fn table_creation_suffix(&self) -> &'static str;
}

fn varchar(length: u32) -> String {
    format!("VARCHAR({})", length)
}

pub struct MySqlMapper;

impl TypeMapper for MySqlMapper {
    fn sql_type(&self, column: &ColumnMetadata) -> String {
        match column.semantic_type {
            SemanticType::Int32 => "INT".to_string(),
            SemanticType::Int64 => "BIGINT".to_string(),
            SemanticType::Bool => "BOOLEAN".to_string(),
            SemanticType::Float64 => "DOUBLE".to_string(),
            SemanticType::Text | SemanticType::Other(_) => varchar(column.length),
        }
    }

    fn table_creation_suffix(&self) -> &'static str {
        "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
    }
}

pub struct PostgresMapper;

impl TypeMapper for PostgresMapper {
    fn sql_type(&self, column: &ColumnMetadata) -> String {
        match column.semantic_type {
            SemanticType::Int32 => "INTEGER".to_string(),
            SemanticType::Int64 => "BIGINT".to_string(),
            SemanticType::Bool => "BOOLEAN".to_string(),
            SemanticType::Float64 => "DOUBLE PRECISION".to_string(),
            SemanticType::Text | SemanticType::Other(_) => varchar(column.length),
        }
    }

    fn table_creation_suffix(&self) -> &'static str {
        ""
    }
}

/// SQLite has no length-bounded text and stores booleans as integers.
pub struct SqliteMapper;

impl TypeMapper for SqliteMapper {
    fn sql_type(&self, column: &ColumnMetadata) -> String {
        match column.semantic_type {
            SemanticType::Int32 | SemanticType::Int64 | SemanticType::Bool => "INTEGER".to_string(),
            SemanticType::Float64 => "REAL".to_string(),
            SemanticType::Text | SemanticType::Other(_) => "TEXT".to_string(),
        }
    }

    fn table_creation_suffix(&self) -> &'static str {
        ""
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::Dialect;

    fn column(semantic_type: SemanticType, length: u32) -> ColumnMetadata {
        ColumnMetadata {
            field_name: "f".to_string(),
            column_name: "f".to_string(),
            semantic_type,
            length,
            nullable: true,
            is_primary_key: false,
        }
    }

    #[test]
    fn test_type_table() {
        let expected = [
            (SemanticType::Int32, ["INT", "INT", "INTEGER", "INTEGER"]),
            (SemanticType::Int64, ["BIGINT", "BIGINT", "BIGINT", "INTEGER"]),
            (SemanticType::Bool, ["BOOLEAN", "BOOLEAN", "BOOLEAN", "INTEGER"]),
            (SemanticType::Float64, ["DOUBLE", "DOUBLE", "DOUBLE PRECISION", "REAL"]),
            (SemanticType::Text, ["VARCHAR(255)", "VARCHAR(255)", "VARCHAR(255)", "TEXT"]),
        ];

        for (semantic_type, per_dialect) in expected {
            for (dialect, sql_type) in Dialect::ALL.iter().zip(per_dialect) {
                assert_eq!(
                    dialect.type_mapper().sql_type(&column(semantic_type.clone(), 255)),
                    sql_type,
                    "{} under {}",
                    semantic_type,
                    dialect
                );
            }
        }
    }

    #[test]
    fn test_text_length_only_outside_sqlite() {
        let col = column(SemanticType::Text, 40);
        assert_eq!(MySqlMapper.sql_type(&col), "VARCHAR(40)");
        assert_eq!(PostgresMapper.sql_type(&col), "VARCHAR(40)");
        assert_eq!(SqliteMapper.sql_type(&col), "TEXT");
    }

    #[test]
    fn test_unknown_types_fall_back_to_text() {
        let col = column(SemanticType::Other("uuid".to_string()), 36);
        assert_eq!(MySqlMapper.sql_type(&col), "VARCHAR(36)");
        assert_eq!(PostgresMapper.sql_type(&col), "VARCHAR(36)");
        assert_eq!(SqliteMapper.sql_type(&col), "TEXT");
    }

    #[test]
    fn test_table_suffixes() {
        assert_eq!(
            Dialect::MariaDb.type_mapper().table_creation_suffix(),
            "ENGINE=InnoDB DEFAULT CHARSET=utf8mb4"
        );
        assert_eq!(Dialect::PostgreSql.type_mapper().table_creation_suffix(), "");
        assert_eq!(Dialect::Sqlite.type_mapper().table_creation_suffix(), "");
    }
}
