use super::{ColumnMetadata, Entity, EntityDescriptor, EntityMetadata};
use crate::core::{OrmError, Result};
use std::any::TypeId;
use std::collections::{HashMap, HashSet};
use lazy_static::lazy_static;
use std::sync::{Arc, RwLock};

/// Length used for text columns that declare none.
pub const DEFAULT_TEXT_LENGTH: u32 = 255;

pub struct MetadataExtractor;

lazy_static! {
    static ref METADATA_CACHE: RwLock<HashMap<TypeId, Arc<EntityMetadata>>> =
        RwLock::new(HashMap::new());
}

impl MetadataExtractor {
    /// Derives table metadata from a declared configuration.
    ///
    /// Returns `Ok(None)` for descriptors without an entity marker so callers can
    /// skip non-entity types.
    pub fn extract(descriptor: &EntityDescriptor) -> Result<Option<EntityMetadata>> {
        if !descriptor.is_entity() {
            return Ok(None);
        }

        let table_name = descriptor.table_name();

        let mut columns = Vec::new();
        let mut seen = HashSet::new();

        for field in descriptor.fields.iter().filter(|field| field.participates()) {
            let marker = field.column.clone().unwrap_or_default();

            let column_name = match marker.name {
                Some(name) if !name.is_empty() => name,
                _ => field.name.clone(),
            };

            // Column names are compared the way SQL compares identifiers.
            if !seen.insert(column_name.to_ascii_lowercase()) {
                return Err(OrmError::ConfigurationError(format!(
                    "Entity {} maps column '{}' more than once",
                    descriptor.type_name, column_name
                )));
            }

            columns.push(ColumnMetadata {
                field_name: field.name.clone(),
                column_name,
                semantic_type: field.semantic_type.clone(),
                length: marker.length.unwrap_or(DEFAULT_TEXT_LENGTH),
                nullable: marker.nullable.unwrap_or(!field.primary_key),
                is_primary_key: field.primary_key,
            });
        }

        let mut primary_keys = columns.iter().filter(|col| col.is_primary_key);
        let primary_key = match (primary_keys.next(), primary_keys.next()) {
            (Some(pk), None) => pk.clone(),
            (None, _) => {
                return Err(OrmError::ConfigurationError(format!(
                    "Entity {} must have a field marked as primary key",
                    descriptor.type_name
                )));
            }
            (Some(_), Some(_)) => {
                return Err(OrmError::ConfigurationError(format!(
                    "Entity {} declares more than one primary key field",
                    descriptor.type_name
                )));
            }
        };

        Ok(Some(EntityMetadata {
            table_name,
            columns,
            primary_key,
        }))
    }

    pub fn extract_for<E: Entity>() -> Result<Option<EntityMetadata>> {
        Self::extract(&E::descriptor())
    }

    /// Metadata of `E`, extracted on first use and shared afterwards.
    ///
    /// Non-entity types are a `ConfigurationError` here and are never cached.
    pub fn cached<E: Entity>() -> Result<Arc<EntityMetadata>> {
        let key = TypeId::of::<E>();
        if let Some(metadata) = METADATA_CACHE.read()?.get(&key) {
            return Ok(Arc::clone(metadata));
        }

        let descriptor = E::descriptor();
        let metadata = Self::extract(&descriptor)?.ok_or_else(|| {
            OrmError::ConfigurationError(format!(
                "{} is not declared as an entity",
                descriptor.type_name
            ))
        })?;

        let mut cache = METADATA_CACHE.write()?;
        let entry = cache.entry(key).or_insert_with(|| Arc::new(metadata));
        Ok(Arc::clone(entry))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::SemanticType;
    use crate::metadata::{ColumnMarker, FieldDescriptor};

    fn user_descriptor() -> EntityDescriptor {
        EntityDescriptor::new("User")
            .entity(Some("users"))
            .field(FieldDescriptor::new("id", SemanticType::Int64).primary_key())
            .field(
                FieldDescriptor::new("name", SemanticType::Text)
                    .column(
                        ColumnMarker::default()
                            .name("user_name")
                            .length(64)
                            .nullable(false),
                    ),
            )
            .field(
                FieldDescriptor::new("active", SemanticType::Bool).column(ColumnMarker::default()),
            )
            .field(FieldDescriptor::new("scratch", SemanticType::Text))
    }

    #[test]
    fn test_extracts_columns_in_declaration_order() {
        let metadata = MetadataExtractor::extract(&user_descriptor()).unwrap().unwrap();

        assert_eq!(metadata.table_name, "users");
        assert_eq!(metadata.column_names(), vec!["id", "user_name", "active"]);
        assert_eq!(metadata.primary_key.column_name, "id");
        assert!(metadata.columns[0].is_primary_key);
        assert!(!metadata.columns[0].nullable);
    }

    #[test]
    fn test_column_defaults() {
        let metadata = MetadataExtractor::extract(&user_descriptor()).unwrap().unwrap();

        let name = metadata.column_for_field("name").unwrap();
        assert_eq!(name.length, 64);
        assert!(!name.nullable);

        let active = metadata.column("active").unwrap();
        assert_eq!(active.length, DEFAULT_TEXT_LENGTH);
        assert!(active.nullable);
        assert_eq!(active.field_name, "active");
    }

    #[test]
    fn test_table_name_defaults_to_type_name() {
        let descriptor = EntityDescriptor::new("Invoice")
            .entity(None)
            .field(FieldDescriptor::new("number", SemanticType::Int32).primary_key());
        let metadata = MetadataExtractor::extract(&descriptor).unwrap().unwrap();
        assert_eq!(metadata.table_name, "Invoice");
    }

    #[test]
    fn test_non_entity_is_not_applicable() {
        let descriptor = EntityDescriptor::new("Dto")
            .field(FieldDescriptor::new("id", SemanticType::Int64).primary_key());
        assert_eq!(MetadataExtractor::extract(&descriptor).unwrap(), None);
    }

    #[test]
    fn test_missing_primary_key_fails() {
        let descriptor = EntityDescriptor::new("Note")
            .entity(None)
            .field(
                FieldDescriptor::new("body", SemanticType::Text).column(ColumnMarker::default()),
            );
        let err = MetadataExtractor::extract(&descriptor).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_two_primary_keys_fail() {
        let descriptor = EntityDescriptor::new("Pair")
            .entity(None)
            .field(FieldDescriptor::new("a", SemanticType::Int64).primary_key())
            .field(FieldDescriptor::new("b", SemanticType::Int64).primary_key());
        assert!(MetadataExtractor::extract(&descriptor).unwrap_err().is_configuration());
    }

    #[test]
    fn test_duplicate_column_ignores_case() {
        let descriptor = EntityDescriptor::new("Person")
            .entity(None)
            .field(FieldDescriptor::new("id", SemanticType::Int64).primary_key())
            .field(
                FieldDescriptor::new("display", SemanticType::Text)
                    .column(ColumnMarker::default().name("Name")),
            )
            .field(
                FieldDescriptor::new("legal", SemanticType::Text)
                    .column(ColumnMarker::default().name("name")),
            );
        let err = MetadataExtractor::extract(&descriptor).unwrap_err();
        assert!(err.is_configuration());
        assert!(err.to_string().contains("more than once"));
    }

    #[test]
    fn test_explicit_nullable_primary_key_is_kept() {
        let descriptor = EntityDescriptor::new("Tag").entity(None).field(
            FieldDescriptor::new("code", SemanticType::Text)
                .primary_key()
                .column(ColumnMarker::default().nullable(true)),
        );
        let metadata = MetadataExtractor::extract(&descriptor).unwrap().unwrap();
        assert!(metadata.primary_key.nullable);
    }

    #[test]
    fn test_descriptor_from_json() {
        let json = r#"{
            "type_name": "Account",
            "entity": { "table": "accounts" },
            "fields": [
                { "name": "id", "type": "int32", "primary_key": true },
                { "name": "email", "type": "text", "column": { "length": 120, "nullable": false } },
                { "name": "balance", "type": "float64", "column": {} }
            ]
        }"#;
        let descriptor: EntityDescriptor = serde_json::from_str(json).unwrap();
        let metadata = MetadataExtractor::extract(&descriptor).unwrap().unwrap();

        assert_eq!(metadata.table_name, "accounts");
        assert_eq!(metadata.primary_key.semantic_type, SemanticType::Int32);
        assert_eq!(metadata.column("email").unwrap().length, 120);
        assert_eq!(metadata.columns.len(), 3);
    }
}
