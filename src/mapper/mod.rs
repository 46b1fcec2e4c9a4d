use crate::core::{OrmError, Result, SemanticType, Value};
use crate::metadata::{Entity, EntityMetadata};
use crate::result::Row;

/// Converts between entity instances and rows using extracted metadata.
#[derive(Debug, Clone, Copy)]
pub struct EntityMapper<'a> {
    metadata: &'a EntityMetadata,
}

impl<'a> EntityMapper<'a> {
    pub fn new(metadata: &'a EntityMetadata) -> Self {
        Self { metadata }
    }

    /// Reads every participating field, in declaration order, without coercion.
    pub fn to_row<E: Entity>(&self, entity: &E) -> Result<Vec<(String, Value)>> {
        self.metadata
            .columns
            .iter()
            .map(|column| {
                let value = entity.field_value(&column.field_name).ok_or_else(|| {
                    OrmError::MappingError(format!(
                        "{} has no readable field '{}'",
                        self.metadata.table_name, column.field_name
                    ))
                })?;
                Ok((column.column_name.clone(), value))
            })
            .collect()
    }

    /// Builds a zero-valued instance and assigns every non-null column present in `row`.
    ///
    /// Numeric values in boolean columns become `false` for zero and `true` otherwise.
    pub fn from_row<E: Entity>(&self, row: &Row) -> Result<E> {
        let mut entity = E::instantiate()?;

        for column in &self.metadata.columns {
            let Some(value) = row.get(&column.column_name) else {
                continue;
            };
            if value.is_null() {
                continue;
            }

            let value = match (&column.semantic_type, value.numeric_truth()) {
                (SemanticType::Bool, Some(truth)) => Value::Boolean(truth),
                _ => value.clone(),
            };

            entity.set_field(&column.field_name, value).map_err(|err| match err {
                OrmError::MappingError(msg) => OrmError::MappingError(format!(
                    "column '{}' of {}: {}",
                    column.column_name, self.metadata.table_name, msg
                )),
                other => other,
            })?;
        }

        Ok(entity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::ColumnType;
    use crate::metadata::{ColumnMarker, EntityDescriptor, FieldDescriptor};

    #[derive(Debug, Default, Clone, PartialEq)]
    struct Flag {
        id: i32,
        label: String,
        enabled: bool,
        weight: Option<f64>,
    }

    impl Entity for Flag {
        fn descriptor() -> EntityDescriptor {
            EntityDescriptor::new("Flag")
                .entity(Some("flags"))
                .field(FieldDescriptor::new("id", i32::semantic_type()).primary_key())
                .field(
                    FieldDescriptor::new("label", String::semantic_type())
                        .column(ColumnMarker::default().name("flag_label")),
                )
                .field(
                    FieldDescriptor::new("enabled", bool::semantic_type())
                        .column(ColumnMarker::default()),
                )
                .field(
                    FieldDescriptor::new("weight", Option::<f64>::semantic_type())
                        .column(ColumnMarker::default()),
                )
        }

        fn instantiate() -> Result<Self> {
            Ok(Self::default())
        }

        fn field_value(&self, field: &str) -> Option<Value> {
            match field {
                "id" => Some(self.id.to_value()),
                "label" => Some(self.label.to_value()),
                "enabled" => Some(self.enabled.to_value()),
                "weight" => Some(self.weight.to_value()),
                _ => None,
            }
        }

        fn set_field(&mut self, field: &str, value: Value) -> Result<()> {
            match field {
                "id" => self.id = ColumnType::from_value(value)?,
                "label" => self.label = ColumnType::from_value(value)?,
                "enabled" => self.enabled = ColumnType::from_value(value)?,
                "weight" => self.weight = ColumnType::from_value(value)?,
                other => {
                    return Err(OrmError::MappingError(format!("unknown field '{}'", other)));
                }
            }
            Ok(())
        }
    }

    fn metadata() -> EntityMetadata {
        Flag::metadata().unwrap().as_ref().clone()
    }

    #[test]
    fn test_to_row_uses_column_names_in_order() {
        let metadata = metadata();
        let flag = Flag { id: 3, label: "beta".into(), enabled: true, weight: None };
        let row = EntityMapper::new(&metadata).to_row(&flag).unwrap();

        assert_eq!(
            row,
            vec![
                ("id".to_string(), Value::Integer(3)),
                ("flag_label".to_string(), Value::Text("beta".into())),
                ("enabled".to_string(), Value::Boolean(true)),
                ("weight".to_string(), Value::Null),
            ]
        );
    }

    #[test]
    fn test_round_trip() {
        let metadata = metadata();
        let mapper = EntityMapper::new(&metadata);
        let flag = Flag { id: 9, label: "x".into(), enabled: true, weight: Some(0.25) };

        let row: Row = mapper.to_row(&flag).unwrap().into_iter().collect();
        let back: Flag = mapper.from_row(&row).unwrap();
        assert_eq!(back, flag);
    }

    #[test]
    fn test_numeric_booleans_are_coerced() {
        let metadata = metadata();
        let mapper = EntityMapper::new(&metadata);

        let off: Flag = mapper.from_row(&Row::new().with("enabled", 0i64)).unwrap();
        assert!(!off.enabled);

        let on: Flag = mapper.from_row(&Row::new().with("enabled", 42i64)).unwrap();
        assert!(on.enabled);

        let float_on: Flag = mapper.from_row(&Row::new().with("enabled", 0.5f64)).unwrap();
        assert!(float_on.enabled);
    }

    #[test]
    fn test_missing_and_null_columns_keep_zero_values() {
        let metadata = metadata();
        let row = Row::new()
            .with("id", 1i64)
            .with("flag_label", Value::Null)
            .with("unrelated", "ignored");
        let flag: Flag = EntityMapper::new(&metadata).from_row(&row).unwrap();

        assert_eq!(flag, Flag { id: 1, ..Flag::default() });
    }

    #[test]
    fn test_unassignable_value_is_mapping_error() {
        let metadata = metadata();
        let row = Row::new().with("id", "not a number");
        let err = EntityMapper::new(&metadata).from_row::<Flag>(&row).unwrap_err();

        assert!(err.is_mapping());
        assert!(err.to_string().contains("id"));
    }
}
