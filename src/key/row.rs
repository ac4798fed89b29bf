//! Scratch rows for key construction.

use crate::{schema::Schema, value::Value};

/// A partially filled row over a schema's key columns.
///
/// Used as scratch space while folding predicates and primary-key bounds into
/// range keys. Cells start unset; readers of a cell assert it was filled,
/// since an unset cell at encoding time is a planner bug rather than a data
/// condition.
#[derive(Debug, Clone)]
pub(crate) struct KeyRow<'a> {
    schema: &'a Schema,
    cells: Vec<Option<Value>>,
}

impl<'a> KeyRow<'a> {
    /// An empty row with one unset cell per key column.
    pub(crate) fn new(schema: &'a Schema) -> Self {
        Self {
            schema,
            cells: vec![None; schema.num_key_columns()],
        }
    }

    /// The schema this row is laid out against.
    pub(crate) fn schema(&self) -> &Schema {
        self.schema
    }

    /// Fill the cell at `idx`.
    ///
    /// # Panics
    ///
    /// Panics when `idx` is not a key column or the value's type does not
    /// match the column.
    pub(crate) fn set_cell(&mut self, idx: usize, value: Value) {
        let column = self.schema.column(idx);
        assert_eq!(
            value.data_type(),
            *column.data_type(),
            "cell value type mismatch for key column {}",
            column.name(),
        );
        self.cells[idx] = Some(value);
    }

    /// Read the cell at `idx`.
    ///
    /// # Panics
    ///
    /// Panics when the cell was never filled.
    pub(crate) fn cell(&self, idx: usize) -> &Value {
        self.cells[idx]
            .as_ref()
            .unwrap_or_else(|| panic!("key cell {idx} is unset"))
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;

    use super::KeyRow;
    use crate::{schema::SchemaBuilder, value::Value};

    #[test]
    fn set_and_read_cells() {
        let schema = SchemaBuilder::new()
            .key_column("a", DataType::Int32)
            .key_column("b", DataType::Utf8)
            .build()
            .unwrap();
        let mut row = KeyRow::new(&schema);
        row.set_cell(0, Value::Int32(7));
        row.set_cell(1, Value::from("x"));
        assert_eq!(*row.cell(0), Value::Int32(7));
        assert_eq!(*row.cell(1), Value::from("x"));
    }

    #[test]
    #[should_panic(expected = "type mismatch")]
    fn rejects_mistyped_cell() {
        let schema = SchemaBuilder::new()
            .key_column("a", DataType::Int32)
            .build()
            .unwrap();
        KeyRow::new(&schema).set_cell(0, Value::Int64(7));
    }

    #[test]
    #[should_panic(expected = "unset")]
    fn unset_cell_read_panics() {
        let schema = SchemaBuilder::new()
            .key_column("a", DataType::Int32)
            .build()
            .unwrap();
        let row = KeyRow::new(&schema);
        let _ = row.cell(0);
    }
}
