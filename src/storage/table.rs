use crate::core::{OrmError, Result, Value};
use crate::parser::ast::{Assignment, ColumnDef, Condition, DataType, Projection};

#[derive(Debug, Clone)]
pub struct TableSchema {
    name: String,
    columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn find_column_index(&self, name: &str) -> Option<usize> {
        self.columns
            .iter()
            .position(|c| c.name.eq_ignore_ascii_case(name))
    }

    fn primary_key_index(&self) -> Option<usize> {
        self.columns.iter().position(|c| c.primary_key)
    }
}

/// Row store for one table. Values are kept in declaration order and are
/// normalized to the column's affinity on the way in.
#[derive(Debug, Clone)]
pub struct Table {
    schema: TableSchema,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new(schema: TableSchema) -> Self {
        Self {
            schema,
            rows: Vec::new(),
        }
    }

    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Inserts one row. Returns the key assigned to an integer primary key
    /// that arrived as NULL or 0.
    pub fn insert(
        &mut self,
        columns: Option<&[String]>,
        values: Vec<Value>,
    ) -> Result<Option<Value>> {
        let mut row = vec![Value::Null; self.schema.columns.len()];

        match columns {
            Some(names) => {
                if names.len() != values.len() {
                    return Err(OrmError::ExecutionError(format!(
                        "Expected {} values, got {}",
                        names.len(),
                        values.len()
                    )));
                }
                for (name, value) in names.iter().zip(values) {
                    let idx = self.column_index(name)?;
                    row[idx] = value;
                }
            }
            None => {
                if values.len() != row.len() {
                    return Err(OrmError::ExecutionError(format!(
                        "Expected {} columns, got {}",
                        row.len(),
                        values.len()
                    )));
                }
                row = values;
            }
        }

        let generated = self.assign_generated_key(&mut row)?;
        let row = self.normalize_row(row)?;
        self.check_uniqueness(&row, None)?;
        self.rows.push(row);

        Ok(generated)
    }

    pub fn select(
        &self,
        projection: &Projection,
        conditions: &[Condition],
    ) -> Result<(Vec<String>, Vec<Vec<Value>>)> {
        let filter = self.resolve_conditions(conditions)?;

        let (columns, indices): (Vec<String>, Vec<usize>) = match projection {
            Projection::Wildcard => self
                .schema
                .columns
                .iter()
                .enumerate()
                .map(|(idx, c)| (c.name.clone(), idx))
                .unzip(),
            Projection::Columns(names) => {
                let mut columns = Vec::with_capacity(names.len());
                let mut indices = Vec::with_capacity(names.len());
                for name in names {
                    let idx = self.column_index(name)?;
                    columns.push(self.schema.columns[idx].name.clone());
                    indices.push(idx);
                }
                (columns, indices)
            }
        };

        let rows = self
            .rows
            .iter()
            .filter(|row| matches_all(row, &filter))
            .map(|row| indices.iter().map(|&idx| row[idx].clone()).collect())
            .collect();

        Ok((columns, rows))
    }

    pub fn delete_where(&mut self, conditions: &[Condition]) -> Result<usize> {
        let filter = self.resolve_conditions(conditions)?;
        let before = self.rows.len();
        self.rows.retain(|row| !matches_all(row, &filter));
        Ok(before - self.rows.len())
    }

    pub fn update_where(
        &mut self,
        assignments: &[Assignment],
        conditions: &[Condition],
    ) -> Result<usize> {
        let filter = self.resolve_conditions(conditions)?;
        let mut changes = Vec::with_capacity(assignments.len());
        for assign in assignments {
            let idx = self.column_index(&assign.column)?;
            changes.push((idx, assign.value.clone()));
        }

        let targets: Vec<usize> = self
            .rows
            .iter()
            .enumerate()
            .filter(|(_, row)| matches_all(row, &filter))
            .map(|(pos, _)| pos)
            .collect();

        let mut updated = Vec::with_capacity(targets.len());
        for &pos in &targets {
            let mut row = self.rows[pos].clone();
            for (idx, value) in &changes {
                row[*idx] = value.clone();
            }
            let row = self.normalize_row(row)?;
            self.check_uniqueness(&row, Some(pos))?;
            updated.push((pos, row));
        }

        for (pos, row) in updated {
            self.rows[pos] = row;
        }
        Ok(targets.len())
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.schema.find_column_index(name).ok_or_else(|| {
            OrmError::ExecutionError(format!(
                "Column '{}' not found in table '{}'",
                name, self.schema.name
            ))
        })
    }

    fn assign_generated_key(&self, row: &mut [Value]) -> Result<Option<Value>> {
        let Some(idx) = self.schema.primary_key_index() else {
            return Ok(None);
        };
        if self.schema.columns[idx].data_type != DataType::Integer
            || !matches!(row[idx], Value::Null | Value::Integer(0))
        {
            return Ok(None);
        }

        let next = self
            .rows
            .iter()
            .filter_map(|r| r[idx].as_i64())
            .max()
            .unwrap_or(0)
            .checked_add(1)
            .ok_or_else(|| {
                OrmError::ExecutionError(format!(
                    "generated key space exhausted for table '{}'",
                    self.schema.name
                ))
            })?;
        row[idx] = Value::Integer(next);
        Ok(Some(Value::Integer(next)))
    }

    fn normalize_row(&self, row: Vec<Value>) -> Result<Vec<Value>> {
        self.schema
            .columns
            .iter()
            .zip(row)
            .map(|(column, value)| {
                if value.is_null() {
                    if column.nullable {
                        return Ok(Value::Null);
                    }
                    return Err(OrmError::ExecutionError(format!(
                        "Constraint violation: column '{}' cannot be NULL",
                        column.name
                    )));
                }
                coerce(value, column.data_type).map_err(|value| {
                    OrmError::ExecutionError(format!(
                        "Type mismatch: column '{}' of type {} cannot store {}",
                        column.name,
                        column.data_type.name(),
                        value.type_name()
                    ))
                })
            })
            .collect()
    }

    fn check_uniqueness(&self, row: &[Value], ignore: Option<usize>) -> Result<()> {
        let Some(idx) = self.schema.primary_key_index() else {
            return Ok(());
        };
        let value = &row[idx];
        let duplicate = self
            .rows
            .iter()
            .enumerate()
            .any(|(pos, existing)| Some(pos) != ignore && &existing[idx] == value);
        if duplicate {
            return Err(OrmError::ExecutionError(format!(
                "Constraint violation: duplicate primary key {} in table '{}'",
                value, self.schema.name
            )));
        }
        Ok(())
    }

    fn resolve_conditions(&self, conditions: &[Condition]) -> Result<Vec<(usize, Value)>> {
        conditions
            .iter()
            .map(|cond| {
                let idx = self.column_index(&cond.column)?;
                let data_type = self.schema.columns[idx].data_type;
                let value = coerce(cond.value.clone(), data_type).unwrap_or_else(|v| v);
                Ok((idx, value))
            })
            .collect()
    }
}

fn matches_all(row: &[Value], filter: &[(usize, Value)]) -> bool {
    // NULL never compares equal in SQL
    filter
        .iter()
        .all(|(idx, value)| !value.is_null() && &row[*idx] == value)
}

/// Converts a value to a column's affinity, handing the value back when it
/// cannot be stored there.
fn coerce(value: Value, data_type: DataType) -> std::result::Result<Value, Value> {
    match (data_type, value) {
        (_, Value::Null) => Ok(Value::Null),
        (DataType::Integer, Value::Integer(i)) => Ok(Value::Integer(i)),
        (DataType::Integer, Value::Boolean(b)) => Ok(Value::Integer(i64::from(b))),
        (DataType::Float, Value::Float(f)) => Ok(Value::Float(f)),
        (DataType::Float, Value::Integer(i)) => Ok(Value::Float(i as f64)),
        (DataType::Boolean, Value::Boolean(b)) => Ok(Value::Boolean(b)),
        (DataType::Text, Value::Text(s)) => Ok(Value::Text(s)),
        (_, other) => Err(other),
    }
}
