use crate::core::{OrmError, Result, SemanticType};
use crate::dialect::{Dialect, TypeMapper};
use crate::metadata::{
    ColumnMetadata, Entity, EntityDescriptor, EntityMetadata, MetadataExtractor,
};

/// Builds `CREATE TABLE IF NOT EXISTS` statements for one dialect.
pub struct SchemaGenerator {
    dialect: Dialect,
    mapper: &'static dyn TypeMapper,
}

impl SchemaGenerator {
    /// Selects the dialect by name; unknown names are a configuration error.
    pub fn new(dialect: &str) -> Result<Self> {
        Ok(Self::for_dialect(Dialect::parse(dialect)?))
    }

    pub fn for_dialect(dialect: Dialect) -> Self {
        Self {
            dialect,
            mapper: dialect.type_mapper(),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// DDL for an entity type, `None` when the type is not an entity.
    pub fn create_table_sql<E: Entity>(&self) -> Result<Option<String>> {
        self.create_table_sql_for(&E::descriptor())
    }

    pub fn create_table_sql_for(&self, descriptor: &EntityDescriptor) -> Result<Option<String>> {
        match MetadataExtractor::extract(descriptor)? {
            Some(metadata) => {
                generate_create_table(&metadata, self.dialect, self.mapper).map(Some)
            }
            None => Ok(None),
        }
    }

    pub fn create_table_sql_from_metadata(&self, metadata: &EntityMetadata) -> Result<String> {
        generate_create_table(metadata, self.dialect, self.mapper)
    }
}

/// Renders the DDL for `metadata`. The closing line is always `) <suffix>;`,
/// which reads `) ;` for dialects without table options.
///
/// ```text
/// CREATE TABLE IF NOT EXISTS users (
///   id BIGINT AUTO_INCREMENT NOT NULL,
///   name VARCHAR(64) NOT NULL,
///   PRIMARY KEY (id)
/// ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;
/// ```
pub fn generate_create_table(
    metadata: &EntityMetadata,
    dialect: Dialect,
    mapper: &dyn TypeMapper,
) -> Result<String> {
    if metadata.columns.is_empty() {
        return Err(OrmError::ConfigurationError(format!(
            "Malformed metadata for table {}: no columns",
            metadata.table_name
        )));
    }

    let primary_key = metadata
        .columns
        .iter()
        .find(|col| col.is_primary_key && col.column_name == metadata.primary_key.column_name)
        .ok_or_else(|| {
            OrmError::ConfigurationError(format!(
                "Malformed metadata for table {}: primary key '{}' is not one of its columns",
                metadata.table_name, metadata.primary_key.column_name
            ))
        })?;

    let mut lines: Vec<String> = metadata
        .columns
        .iter()
        .map(|column| column_definition(column, dialect, mapper))
        .collect();
    lines.push(format!("PRIMARY KEY ({})", primary_key.column_name));

    let mut sql = format!("CREATE TABLE IF NOT EXISTS {} (\n", metadata.table_name);
    sql.push_str(
        &lines
            .iter()
            .map(|line| format!("  {}", line))
            .collect::<Vec<_>>()
            .join(",\n"),
    );
    sql.push_str("\n) ");
    sql.push_str(mapper.table_creation_suffix());
    sql.push(';');

    Ok(sql)
}

fn column_definition(
    column: &ColumnMetadata,
    dialect: Dialect,
    mapper: &dyn TypeMapper,
) -> String {
    let sql_type = mapper.sql_type(column);
    let mut definition = format!("{} {}", column.column_name, sql_type);

    if column.is_primary_key {
        match (dialect, &column.semantic_type) {
            (Dialect::MySql | Dialect::MariaDb, SemanticType::Int32 | SemanticType::Int64) => {
                definition.push_str(" AUTO_INCREMENT");
            }
            (Dialect::PostgreSql, SemanticType::Int32 | SemanticType::Int64) => {
                let serial = if column.semantic_type == SemanticType::Int32 {
                    "SERIAL"
                } else {
                    "BIGSERIAL"
                };
                // The type token was written last; swap it in place.
                definition.truncate(definition.len() - sql_type.len());
                definition.push_str(serial);
            }
            _ => {}
        }
    }

    if !column.nullable {
        definition.push_str(" NOT NULL");
    }

    definition
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{ColumnMarker, FieldDescriptor};

    fn descriptor(pk_type: SemanticType) -> EntityDescriptor {
        EntityDescriptor::new("User")
            .entity(Some("users"))
            .field(FieldDescriptor::new("id", pk_type).primary_key())
            .field(
                FieldDescriptor::new("name", SemanticType::Text)
                    .column(ColumnMarker::default().length(64).nullable(false)),
            )
            .field(
                FieldDescriptor::new("score", SemanticType::Float64)
                    .column(ColumnMarker::default()),
            )
    }

    fn ddl(dialect: &str, pk_type: SemanticType) -> String {
        SchemaGenerator::new(dialect)
            .unwrap()
            .create_table_sql_for(&descriptor(pk_type))
            .unwrap()
            .unwrap()
    }

    #[test]
    fn test_mysql_ddl() {
        assert_eq!(
            ddl("mysql", SemanticType::Int64),
            "CREATE TABLE IF NOT EXISTS users (\n  id BIGINT AUTO_INCREMENT NOT NULL,\n  \
             name VARCHAR(64) NOT NULL,\n  score DOUBLE,\n  PRIMARY KEY (id)\n\
             ) ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;"
        );
    }

    #[test]
    fn test_mariadb_matches_mysql() {
        assert_eq!(
            ddl("mariadb", SemanticType::Int32),
            ddl("MySQL", SemanticType::Int32)
        );
    }

    #[test]
    fn test_postgres_serial_substitution() {
        let int32 = ddl("postgresql", SemanticType::Int32);
        assert!(int32.contains("  id SERIAL NOT NULL,"));
        assert!(!int32.contains("id INTEGER"));

        let int64 = ddl("postgres", SemanticType::Int64);
        assert!(int64.contains("  id BIGSERIAL NOT NULL,"));
        assert!(!int64.contains("BIGINT"));
        assert!(int64.ends_with("\n) ;"));
        assert!(int64.contains("score DOUBLE PRECISION,"));
    }

    #[test]
    fn test_sqlite_has_no_surrogate_syntax() {
        assert_eq!(
            ddl("sqlite", SemanticType::Int64),
            "CREATE TABLE IF NOT EXISTS users (\n  id INTEGER NOT NULL,\n  \
             name TEXT NOT NULL,\n  score REAL,\n  PRIMARY KEY (id)\n) ;"
        );
    }

    #[test]
    fn test_text_primary_key_gets_no_surrogate() {
        for dialect in ["mysql", "postgresql", "sqlite"] {
            let sql = ddl(dialect, SemanticType::Text);
            assert!(!sql.contains("AUTO_INCREMENT"));
            assert!(!sql.contains("SERIAL"));
        }
    }

    #[test]
    fn test_single_primary_key_clause_and_no_dangling_comma() {
        for dialect in Dialect::ALL {
            let sql = SchemaGenerator::for_dialect(dialect)
                .create_table_sql_for(&descriptor(SemanticType::Int64))
                .unwrap()
                .unwrap();
            assert_eq!(sql.matches("PRIMARY KEY (").count(), 1);
            assert!(!sql.contains(",\n)"));
            assert!(!sql.contains(", )"));
            assert!(sql.ends_with(';'));
        }
    }

    #[test]
    fn test_closing_line_keeps_separator_without_suffix() {
        for dialect in [Dialect::PostgreSql, Dialect::Sqlite] {
            let sql = SchemaGenerator::for_dialect(dialect)
                .create_table_sql_for(&descriptor(SemanticType::Int64))
                .unwrap()
                .unwrap();
            assert_eq!(sql.lines().last(), Some(") ;"));
        }
        let mysql = ddl("mysql", SemanticType::Int64);
        assert_eq!(
            mysql.lines().last(),
            Some(") ENGINE=InnoDB DEFAULT CHARSET=utf8mb4;")
        );
    }

    #[test]
    fn test_non_entity_is_not_applicable() {
        let generator = SchemaGenerator::new("sqlite").unwrap();
        let plain = EntityDescriptor::new("Plain")
            .field(FieldDescriptor::new("id", SemanticType::Int64).primary_key());
        assert_eq!(generator.create_table_sql_for(&plain).unwrap(), None);
    }

    #[test]
    fn test_unknown_dialect_rejected() {
        let err = SchemaGenerator::new("oracle").err().unwrap();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_malformed_metadata_rejected() {
        let mut metadata = MetadataExtractor::extract(&descriptor(SemanticType::Int64))
            .unwrap()
            .unwrap();
        metadata.columns.retain(|col| !col.is_primary_key);

        let err = generate_create_table(&metadata, Dialect::MySql, &crate::dialect::MySqlMapper)
            .unwrap_err();
        assert!(err.is_configuration());
    }
}
