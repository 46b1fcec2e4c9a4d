use crate::core::SemanticType;
use serde::{Deserialize, Serialize};

/// Declared mapping configuration of a record type.
///
/// This is what `#[derive(Entity)]` emits. It can also be written by hand or
/// loaded from JSON for types that only exist at runtime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityDescriptor {
    pub type_name: String,
    /// `None` means the type is not an entity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity: Option<EntityMarker>,
    #[serde(default)]
    pub fields: Vec<FieldDescriptor>,
}

impl EntityDescriptor {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            entity: None,
            fields: Vec::new(),
        }
    }

    /// Marks the type as an entity, optionally with an explicit table name.
    pub fn entity(mut self, table: Option<&str>) -> Self {
        self.entity = Some(EntityMarker {
            table: table.map(str::to_string),
        });
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn is_entity(&self) -> bool {
        self.entity.is_some()
    }

    /// Declared table name, falling back to the type name.
    pub fn table_name(&self) -> String {
        match self.entity.as_ref().and_then(|marker| marker.table.as_deref()) {
            Some(table) if !table.is_empty() => table.to_string(),
            _ => self.type_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityMarker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub semantic_type: SemanticType,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column: Option<ColumnMarker>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, semantic_type: SemanticType) -> Self {
        Self {
            name: name.into(),
            semantic_type,
            primary_key: false,
            column: None,
        }
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn column(mut self, marker: ColumnMarker) -> Self {
        self.column = Some(marker);
        self
    }

    pub fn participates(&self) -> bool {
        self.primary_key || self.column.is_some()
    }
}

/// Per-field column options. Unset options take their defaults at extraction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnMarker {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
}

impl ColumnMarker {
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }
}
