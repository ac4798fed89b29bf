//! Table schemas: an ordered column list with a primary-key prefix.
//!
//! The builder lets callers declare key and value columns programmatically
//! while reusing the same validation exercised by metadata-driven flows.
//! Column ids are assigned in declaration order and are stable for the life
//! of the schema; partition configuration refers to columns by id.

use std::collections::HashMap;

use arrow_schema::DataType;
use thiserror::Error;

use crate::value::Value;

/// Stable identifier of a column within a table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ColumnId(pub u32);

impl std::fmt::Display for ColumnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for ColumnId {
    fn from(id: u32) -> Self {
        ColumnId(id)
    }
}

/// Errors raised while building a [`Schema`].
#[derive(Debug, Error)]
pub enum SchemaError {
    /// A column name was declared twice.
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),
    /// The schema declares no key columns.
    #[error("schema requires at least one key column")]
    NoKeyColumns,
    /// A key column uses a type without a composite-key encoding.
    #[error("key column {column} has unsupported key type {data_type}")]
    UnsupportedKeyType {
        /// Offending column name.
        column: String,
        /// Declared type of the column.
        data_type: DataType,
    },
}

/// A single column: stable id, name, and type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    id: ColumnId,
    name: String,
    data_type: DataType,
}

impl ColumnSchema {
    /// The column's stable id.
    pub fn id(&self) -> ColumnId {
        self.id
    }

    /// The column's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The column's declared type.
    pub fn data_type(&self) -> &DataType {
        &self.data_type
    }
}

/// An ordered column list whose first `num_key_columns` columns form the
/// primary key.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<ColumnSchema>,
    num_key_columns: usize,
    index_by_id: HashMap<ColumnId, usize>,
}

impl Schema {
    /// Number of columns in the schema.
    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    /// Number of leading columns that form the primary key.
    pub fn num_key_columns(&self) -> usize {
        self.num_key_columns
    }

    /// The column at `idx`.
    ///
    /// # Panics
    ///
    /// Panics when `idx` is out of bounds.
    pub fn column(&self, idx: usize) -> &ColumnSchema {
        &self.columns[idx]
    }

    /// The id of the column at `idx`.
    ///
    /// # Panics
    ///
    /// Panics when `idx` is out of bounds.
    pub fn column_id(&self, idx: usize) -> ColumnId {
        self.columns[idx].id
    }

    /// Index of the column with the given id.
    pub fn find_column_by_id(&self, id: ColumnId) -> Option<usize> {
        self.index_by_id.get(&id).copied()
    }

    /// The column with the given id.
    pub fn column_by_id(&self, id: ColumnId) -> Option<&ColumnSchema> {
        self.find_column_by_id(id).map(|idx| &self.columns[idx])
    }

    /// Index of the column with the given name.
    pub fn find_column(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c.name == name)
    }

    /// Iterator over all columns in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnSchema> {
        self.columns.iter()
    }
}

/// Builder for declaring a table schema.
#[derive(Debug, Default, Clone)]
pub struct SchemaBuilder {
    key_columns: Vec<(String, DataType)>,
    value_columns: Vec<(String, DataType)>,
}

impl SchemaBuilder {
    /// Start an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a primary-key column. Key columns precede value columns.
    pub fn key_column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.key_columns.push((name.into(), data_type));
        self
    }

    /// Append a non-key column.
    pub fn column(mut self, name: impl Into<String>, data_type: DataType) -> Self {
        self.value_columns.push((name.into(), data_type));
        self
    }

    /// Finalise the builder into a validated [`Schema`].
    pub fn build(self) -> Result<Schema, SchemaError> {
        if self.key_columns.is_empty() {
            return Err(SchemaError::NoKeyColumns);
        }
        for (name, data_type) in &self.key_columns {
            if !Value::is_supported_key_type(data_type) {
                return Err(SchemaError::UnsupportedKeyType {
                    column: name.clone(),
                    data_type: data_type.clone(),
                });
            }
        }

        let num_key_columns = self.key_columns.len();
        let mut columns = Vec::with_capacity(num_key_columns + self.value_columns.len());
        let mut index_by_id = HashMap::new();
        for (idx, (name, data_type)) in self
            .key_columns
            .into_iter()
            .chain(self.value_columns)
            .enumerate()
        {
            if columns.iter().any(|c: &ColumnSchema| c.name == name) {
                return Err(SchemaError::DuplicateColumn(name));
            }
            let id = ColumnId(idx as u32);
            index_by_id.insert(id, idx);
            columns.push(ColumnSchema {
                id,
                name,
                data_type,
            });
        }

        Ok(Schema {
            columns,
            num_key_columns,
            index_by_id,
        })
    }
}
