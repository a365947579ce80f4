//! Output column layout of a single-key equal-join.
//!
//! Left columns come first in their original order, the key included once at
//! its left position. Right columns follow, minus the key. Non-key names
//! present on both sides are suffixed `_x` (left) and `_y` (right).

use clusterjoin_core::schema::Schema;
use clusterjoin_core::types::{Column, RowBatch, Scalar};

use crate::traits::OpError;

pub const LEFT_SUFFIX: &str = "_x";
pub const RIGHT_SUFFIX: &str = "_y";

/// Where an output column takes its value from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Source {
    Left(usize),
    Right(usize),
    /// The key: left value when the left row exists, otherwise the right one.
    Key,
}

#[derive(Debug, Clone)]
pub struct JoinLayout {
    names: Vec<String>,
    sources: Vec<Source>,
    left_key: usize,
    right_key: usize,
    left_width: usize,
    right_width: usize,
}

impl JoinLayout {
    pub fn new(left: &Schema, right: &Schema, key: &str) -> Result<Self, OpError> {
        let left_key = left.index_of(key).ok_or_else(|| OpError::MissingKey {
            key: key.to_string(),
            side: "left",
        })?;
        let right_key = right.index_of(key).ok_or_else(|| OpError::MissingKey {
            key: key.to_string(),
            side: "right",
        })?;

        let overlaps = |name: &str| name != key && left.contains(name) && right.contains(name);

        let mut names = Vec::with_capacity(left.len() + right.len().saturating_sub(1));
        let mut sources = Vec::with_capacity(names.capacity());
        for (i, name) in left.columns.iter().enumerate() {
            if i == left_key {
                names.push(name.clone());
                sources.push(Source::Key);
            } else if overlaps(name) {
                names.push(format!("{name}{LEFT_SUFFIX}"));
                sources.push(Source::Left(i));
            } else {
                names.push(name.clone());
                sources.push(Source::Left(i));
            }
        }
        for (j, name) in right.columns.iter().enumerate() {
            if j == right_key {
                continue;
            }
            if overlaps(name) {
                names.push(format!("{name}{RIGHT_SUFFIX}"));
            } else {
                names.push(name.clone());
            }
            sources.push(Source::Right(j));
        }

        Ok(Self {
            names,
            sources,
            left_key,
            right_key,
            left_width: left.len(),
            right_width: right.len(),
        })
    }

    pub fn schema(&self) -> Schema {
        Schema::new(self.names.clone())
    }

    pub fn left_key(&self) -> usize {
        self.left_key
    }

    pub fn right_key(&self) -> usize {
        self.right_key
    }

    /// Check that a chunk still has the shape the layout was built for.
    pub fn check_inputs(&self, left: &RowBatch, right: &RowBatch) -> Result<(), OpError> {
        if left.num_columns() != self.left_width || right.num_columns() != self.right_width {
            return Err(OpError::Exec(format!(
                "chunk shape changed: expected {}+{} columns, got {}+{}",
                self.left_width,
                self.right_width,
                left.num_columns(),
                right.num_columns()
            )));
        }
        Ok(())
    }

    /// Build the output rows for `pairs`. A `None` side is null-filled; the
    /// corresponding batch may then be omitted.
    pub fn materialize(
        &self,
        left: Option<&RowBatch>,
        right: Option<&RowBatch>,
        pairs: &[(Option<usize>, Option<usize>)],
    ) -> Result<RowBatch, OpError> {
        let cell = |batch: Option<&RowBatch>, col: usize, row: Option<usize>| {
            let Some(r) = row else {
                return Ok(Scalar::Null);
            };
            batch
                .and_then(|b| b.columns.get(col))
                .and_then(|c| c.values.get(r))
                .cloned()
                .ok_or_else(|| OpError::Exec(format!("row {r} of column {col} is out of range")))
        };

        let mut columns = Vec::with_capacity(self.names.len());
        for (name, source) in self.names.iter().zip(&self.sources) {
            let mut values = Vec::with_capacity(pairs.len());
            for &(l, r) in pairs {
                let v = match *source {
                    Source::Left(i) => cell(left, i, l)?,
                    Source::Right(j) => cell(right, j, r)?,
                    Source::Key => match l {
                        Some(_) => cell(left, self.left_key, l)?,
                        None => cell(right, self.right_key, r)?,
                    },
                };
                values.push(v);
            }
            columns.push(Column {
                name: name.clone(),
                values,
            });
        }
        Ok(RowBatch { columns })
    }
}
