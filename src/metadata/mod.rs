pub mod descriptor;
pub mod extractor;

use crate::core::{Result, SemanticType, Value};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub use descriptor::{ColumnMarker, EntityDescriptor, EntityMarker, FieldDescriptor};
pub use extractor::{DEFAULT_TEXT_LENGTH, MetadataExtractor};

/// Table description derived from an [`EntityDescriptor`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMetadata {
    pub table_name: String,
    /// Participating columns in declaration order, primary key included.
    pub columns: Vec<ColumnMetadata>,
    pub primary_key: ColumnMetadata,
}

impl EntityMetadata {
    pub fn column(&self, column_name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|col| col.column_name == column_name)
    }

    pub fn column_for_field(&self, field_name: &str) -> Option<&ColumnMetadata> {
        self.columns.iter().find(|col| col.field_name == field_name)
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|col| col.column_name.as_str()).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMetadata {
    pub field_name: String,
    pub column_name: String,
    pub semantic_type: SemanticType,
    /// Only meaningful for text columns.
    pub length: u32,
    pub nullable: bool,
    pub is_primary_key: bool,
}

/// A record type that can be mapped to a table.
///
/// Usually implemented with `#[derive(Entity)]`:
///
/// ```ignore
/// use relmap::Entity;
///
/// #[derive(Entity, Debug, Default, Clone, PartialEq)]
/// #[entity(table = "users")]
/// struct User {
///     #[id]
///     id: Option<i64>,
///     #[column(length = 64, nullable = false)]
///     name: String,
/// }
/// ```
pub trait Entity: Sized + Send + Sync + 'static {
    /// Declared mapping configuration.
    fn descriptor() -> EntityDescriptor;

    /// Builds a zero-valued instance that rows are mapped onto.
    fn instantiate() -> Result<Self>;

    /// Current value of a declared field, `None` for unknown field names.
    fn field_value(&self, field: &str) -> Option<Value>;

    fn set_field(&mut self, field: &str, value: Value) -> Result<()>;

    /// Extracted metadata, computed once per type; fails when the type carries
    /// no entity marker.
    fn metadata() -> Result<Arc<EntityMetadata>> {
        MetadataExtractor::cached::<Self>()
    }
}
