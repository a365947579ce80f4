//! Lightweight value/column containers for one materialized chunk.
//!
//! Cells keep their raw text so the output reproduces the input byte-for-byte;
//! only join keys are normalized (see `join::KeyValue`).

use serde::{Deserialize, Serialize};

use crate::schema::Schema;

/// Bytes charged per row for the positional index a loaded table carries.
pub const ROW_INDEX_BYTES: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Scalar {
    Null,
    Str(String),
}

impl Scalar {
    /// Convert one CSV field. Empty fields are missing values.
    pub fn from_field(field: &str) -> Self {
        if field.is_empty() {
            Scalar::Null
        } else {
            Scalar::Str(field.to_string())
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Scalar::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Scalar::Null => None,
            Scalar::Str(s) => Some(s),
        }
    }

    /// Estimated in-memory footprint of this cell.
    pub fn estimated_bytes(&self) -> usize {
        let heap = match self {
            Scalar::Null => 0,
            Scalar::Str(s) => s.capacity(),
        };
        std::mem::size_of::<Scalar>() + heap
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub values: Vec<Scalar>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Columnar table for one chunk or one merged batch.
///
/// A batch with columns but no values still carries its header; the writer
/// relies on that to emit the header for an empty first batch.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RowBatch {
    pub columns: Vec<Column>,
}

impl RowBatch {
    /// Empty batch with the given header.
    pub fn empty(schema: &Schema) -> Self {
        Self {
            columns: schema.columns.iter().map(Column::new).collect(),
        }
    }

    pub fn num_rows(&self) -> usize {
        self.columns.first().map(|c| c.len()).unwrap_or(0)
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.columns.iter().map(|c| c.name.clone()).collect())
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Append one row. `row` must have one value per column.
    pub fn push_row(&mut self, row: Vec<Scalar>) -> Result<(), String> {
        if row.len() != self.columns.len() {
            return Err(format!(
                "row has {} fields, expected {}",
                row.len(),
                self.columns.len()
            ));
        }
        for (col, v) in self.columns.iter_mut().zip(row) {
            col.values.push(v);
        }
        Ok(())
    }

    /// Values of row `idx`, in column order.
    pub fn row(&self, idx: usize) -> Vec<&Scalar> {
        self.columns.iter().map(|c| &c.values[idx]).collect()
    }

    /// Estimated in-memory footprint: every cell plus one index slot per row.
    pub fn estimated_bytes(&self) -> usize {
        let cells: usize = self
            .columns
            .iter()
            .flat_map(|c| c.values.iter())
            .map(Scalar::estimated_bytes)
            .sum();
        cells + self.num_rows() * ROW_INDEX_BYTES
    }
}
