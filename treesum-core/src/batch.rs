//! Scenario-by-node value matrices.
//!
//! A [`ValueBatch`] holds one value per scenario (row) per node (column).
//! Values are stored node-major: each node's column is a contiguous run of
//! `rows()` values, so aggregating a node is a straight vector sum over its
//! children's columns.

use crate::{Result, error::TreeSumError};

/// An m×n matrix of `f64` values, one row per scenario and one column per
/// node.
///
/// # Examples
/// ```
/// use treesum_core::ValueBatch;
///
/// let batch = ValueBatch::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])?;
/// assert_eq!(batch.shape(), (2, 3));
/// assert_eq!(batch.get(1, 0), Some(4.0));
/// assert_eq!(batch.column(2), Some(&[3.0, 6.0][..]));
/// assert_eq!(batch.row(0), Some(vec![1.0, 2.0, 3.0]));
/// # Ok::<(), treesum_core::TreeSumError>(())
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ValueBatch {
    rows: usize,
    columns: usize,
    data: Vec<f64>,
}

impl ValueBatch {
    /// Creates a batch filled with zeros.
    #[must_use]
    pub fn zeros(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            data: vec![0.0; rows.saturating_mul(columns)],
        }
    }

    /// Builds a batch from scenario rows.
    ///
    /// An empty slice yields a `0×0` batch.
    ///
    /// # Errors
    /// Returns [`TreeSumError::RaggedRows`] when a row's length differs from
    /// the first row's.
    pub fn from_rows<R: AsRef<[f64]>>(rows: &[R]) -> Result<Self> {
        let columns = rows.first().map_or(0, |row| row.as_ref().len());
        let mut batch = Self::zeros(rows.len(), columns);
        for (row_index, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != columns {
                return Err(TreeSumError::RaggedRows {
                    row: row_index,
                    len: row.len(),
                    expected: columns,
                });
            }
            for (column, &value) in row.iter().enumerate() {
                batch.set(row_index, column, value);
            }
        }
        Ok(batch)
    }

    /// Builds a batch from a flat row-major buffer (scenario after
    /// scenario).
    ///
    /// # Errors
    /// Returns [`TreeSumError::BufferLength`] when `values.len()` is not
    /// `rows * columns`.
    ///
    /// # Examples
    /// ```
    /// use treesum_core::ValueBatch;
    ///
    /// let batch = ValueBatch::from_row_major(2, 2, &[1.0, 2.0, 3.0, 4.0])?;
    /// assert_eq!(batch.column(1), Some(&[2.0, 4.0][..]));
    /// # Ok::<(), treesum_core::TreeSumError>(())
    /// ```
    pub fn from_row_major(rows: usize, columns: usize, values: &[f64]) -> Result<Self> {
        let expected = rows.saturating_mul(columns);
        if values.len() != expected {
            return Err(TreeSumError::BufferLength {
                len: values.len(),
                expected,
            });
        }
        let mut batch = Self::zeros(rows, columns);
        if columns > 0 {
            for (row_index, row) in values.chunks_exact(columns).enumerate() {
                for (column, &value) in row.iter().enumerate() {
                    batch.set(row_index, column, value);
                }
            }
        }
        Ok(batch)
    }

    /// Returns the number of scenarios.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Returns the number of nodes.
    #[must_use]
    pub fn columns(&self) -> usize {
        self.columns
    }

    /// Returns `(rows, columns)`.
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.columns)
    }

    /// Returns the value of node `column` in scenario `row`.
    #[must_use]
    pub fn get(&self, row: usize, column: usize) -> Option<f64> {
        if row >= self.rows {
            return None;
        }
        self.column(column)?.get(row).copied()
    }

    /// Overwrites a single cell; returns `false` when the cell does not exist.
    pub fn set(&mut self, row: usize, column: usize, value: f64) -> bool {
        if row >= self.rows {
            return false;
        }
        match self.column_mut(column).and_then(|values| values.get_mut(row)) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Returns every scenario's value for node `column`.
    #[must_use]
    pub fn column(&self, column: usize) -> Option<&[f64]> {
        if column >= self.columns {
            return None;
        }
        let start = column.checked_mul(self.rows)?;
        self.data.get(start..start.checked_add(self.rows)?)
    }

    /// Mutable access to node `column`'s values.
    pub fn column_mut(&mut self, column: usize) -> Option<&mut [f64]> {
        if column >= self.columns {
            return None;
        }
        let start = column.checked_mul(self.rows)?;
        let end = start.checked_add(self.rows)?;
        self.data.get_mut(start..end)
    }

    /// Returns a copy of scenario `row` across all nodes.
    #[must_use]
    pub fn row(&self, row: usize) -> Option<Vec<f64>> {
        if row >= self.rows {
            return None;
        }
        (0..self.columns)
            .map(|column| self.get(row, column))
            .collect()
    }

    /// Returns all scenarios as row vectors.
    #[must_use]
    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        (0..self.rows)
            .filter_map(|row| self.row(row))
            .collect()
    }

    /// Returns the scenario-wise mean of node `column`, or `None` when the
    /// batch has no rows or the column does not exist.
    #[must_use]
    #[expect(
        clippy::float_arithmetic,
        reason = "the mean is a floating-point reduction"
    )]
    #[expect(
        clippy::cast_precision_loss,
        reason = "row counts far below 2^52 convert exactly"
    )]
    pub fn column_mean(&self, column: usize) -> Option<f64> {
        let values = self.column(column)?;
        if values.is_empty() {
            return None;
        }
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }

    /// Splits the batch into disjoint mutable column slices, one per node.
    pub(crate) fn columns_mut(&mut self) -> Vec<&mut [f64]> {
        if self.rows == 0 {
            return (0..self.columns).map(|_| <&mut [f64]>::default()).collect();
        }
        self.data.chunks_mut(self.rows).collect()
    }
}
