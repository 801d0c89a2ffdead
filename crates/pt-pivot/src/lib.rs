#![forbid(unsafe_code)]

use std::collections::HashMap;

use pt_table::{Table, TableError};
use pt_types::Scalar;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PivotError {
    #[error(transparent)]
    Table(#[from] TableError),
}

/// A rectangular numeric matrix with row and column labels, the only shape
/// the rendering sink consumes. Row-major storage.
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledMatrix {
    row_labels: Vec<String>,
    col_labels: Vec<String>,
    values: Vec<f64>,
}

impl LabeledMatrix {
    #[must_use]
    pub fn new(row_labels: Vec<String>, col_labels: Vec<String>, fill: f64) -> Self {
        let values = vec![fill; row_labels.len() * col_labels.len()];
        Self {
            row_labels,
            col_labels,
            values,
        }
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.row_labels.len()
    }

    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.col_labels.len()
    }

    #[must_use]
    pub fn row_labels(&self) -> &[String] {
        &self.row_labels
    }

    #[must_use]
    pub fn col_labels(&self) -> &[String] {
        &self.col_labels
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.col_labels.len() + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.col_labels.len() + col] = value;
    }

    #[must_use]
    pub fn column_sums(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_cols()];
        for row in 0..self.n_rows() {
            for (col, sum) in sums.iter_mut().enumerate() {
                *sum += self.get(row, col);
            }
        }
        sums
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        let mut out = Self::new(self.col_labels.clone(), self.row_labels.clone(), 0.0);
        for row in 0..self.n_rows() {
            for col in 0..self.n_cols() {
                out.set(col, row, self.get(row, col));
            }
        }
        out
    }

    fn reorder_columns(&self, order: &[usize]) -> Self {
        let col_labels = order.iter().map(|c| self.col_labels[*c].clone()).collect();
        let mut out = Self::new(self.row_labels.clone(), col_labels, 0.0);
        for row in 0..self.n_rows() {
            for (new_col, old_col) in order.iter().enumerate() {
                out.set(row, new_col, self.get(row, *old_col));
            }
        }
        out
    }

    /// Columns by descending sum, ties keeping current order. Presentation
    /// ordering for gene prevalence and totals.
    #[must_use]
    pub fn sort_columns_by_sum_desc(&self) -> Self {
        let sums = self.column_sums();
        let mut order: Vec<usize> = (0..self.n_cols()).collect();
        order.sort_by(|a, b| {
            sums[*b].partial_cmp(&sums[*a]).unwrap_or(std::cmp::Ordering::Equal)
        });
        self.reorder_columns(&order)
    }

    #[must_use]
    pub fn sort_rows_by_label(&self) -> Self {
        let mut order: Vec<usize> = (0..self.n_rows()).collect();
        order.sort_by(|a, b| self.row_labels[*a].cmp(&self.row_labels[*b]));

        let row_labels = order.iter().map(|r| self.row_labels[*r].clone()).collect();
        let mut out = Self::new(row_labels, self.col_labels.clone(), 0.0);
        for (new_row, old_row) in order.iter().enumerate() {
            for col in 0..self.n_cols() {
                out.set(new_row, col, self.get(*old_row, col));
            }
        }
        out
    }

    #[must_use]
    pub fn sort_cols_by_label(&self) -> Self {
        let mut order: Vec<usize> = (0..self.n_cols()).collect();
        order.sort_by(|a, b| self.col_labels[*a].cmp(&self.col_labels[*b]));
        self.reorder_columns(&order)
    }

    /// Drop columns whose every value is zero (samples with no signal for
    /// the cluster at hand).
    #[must_use]
    pub fn drop_zero_columns(&self) -> Self {
        let keep: Vec<usize> = (0..self.n_cols())
            .filter(|col| (0..self.n_rows()).any(|row| self.get(row, *col) != 0.0))
            .collect();
        self.reorder_columns(&keep)
    }

    /// Counts-per-million, normalized per column. All-zero columns stay
    /// all-zero instead of going NaN.
    #[must_use]
    pub fn to_cpm(&self) -> Self {
        let sums = self.column_sums();
        let mut out = self.clone();
        for row in 0..self.n_rows() {
            for col in 0..self.n_cols() {
                let value = if sums[col] == 0.0 {
                    0.0
                } else {
                    self.get(row, col) / sums[col] * 1e6
                };
                out.set(row, col, value);
            }
        }
        out
    }

    #[must_use]
    pub fn max_value(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }
}

fn label_of(value: &Scalar) -> Option<String> {
    if value.is_missing() {
        None
    } else {
        Some(value.render())
    }
}

/// Distinct labels of a column in first-seen order, missing skipped.
fn distinct_labels(table: &Table, column: &str) -> Result<Vec<String>, PivotError> {
    let mut seen = HashMap::<String, ()>::new();
    let mut labels = Vec::new();
    for value in table.require_column(column)?.values() {
        if let Some(label) = label_of(value) {
            if seen.insert(label.clone(), ()).is_none() {
                labels.push(label);
            }
        }
    }
    Ok(labels)
}

fn positions(labels: &[String]) -> HashMap<&str, usize> {
    labels
        .iter()
        .enumerate()
        .map(|(idx, label)| (label.as_str(), idx))
        .collect()
}

/// Presence pivot: cell (i, c) is 1.0 where some row pairs index label i
/// with column label c, else `fill`. Rows with a missing index or column
/// value are skipped. Axis label order is first appearance; apply the sort
/// helpers for presentation order.
pub fn pivot_presence(
    table: &Table,
    index_col: &str,
    columns_col: &str,
    fill: f64,
) -> Result<LabeledMatrix, PivotError> {
    let row_labels = distinct_labels(table, index_col)?;
    let col_labels = distinct_labels(table, columns_col)?;
    let row_pos = positions(&row_labels);
    let col_pos = positions(&col_labels);

    let index_values = table.require_column(index_col)?.values();
    let column_values = table.require_column(columns_col)?.values();

    let mut matrix = LabeledMatrix::new(row_labels.clone(), col_labels.clone(), fill);
    for (index_value, column_value) in index_values.iter().zip(column_values) {
        let (Some(row_label), Some(col_label)) = (label_of(index_value), label_of(column_value))
        else {
            continue;
        };
        let row = row_pos[row_label.as_str()];
        let col = col_pos[col_label.as_str()];
        matrix.set(row, col, 1.0);
    }

    Ok(matrix)
}

/// Value pivot: cell (i, c) takes the value column's number for the row
/// pairing the two labels; duplicates are last-write-wins, missing values
/// leave the fill in place.
pub fn pivot_values(
    table: &Table,
    index_col: &str,
    columns_col: &str,
    value_col: &str,
    fill: f64,
) -> Result<LabeledMatrix, PivotError> {
    let row_labels = distinct_labels(table, index_col)?;
    let col_labels = distinct_labels(table, columns_col)?;
    let row_pos = positions(&row_labels);
    let col_pos = positions(&col_labels);

    let index_values = table.require_column(index_col)?.values();
    let column_values = table.require_column(columns_col)?.values();
    let cell_values = table.require_column(value_col)?.values();

    let mut matrix = LabeledMatrix::new(row_labels.clone(), col_labels.clone(), fill);
    for ((index_value, column_value), cell) in
        index_values.iter().zip(column_values).zip(cell_values)
    {
        let (Some(row_label), Some(col_label)) = (label_of(index_value), label_of(column_value))
        else {
            continue;
        };
        let Ok(value) = cell.to_f64() else { continue };
        matrix.set(row_pos[row_label.as_str()], col_pos[col_label.as_str()], value);
    }

    Ok(matrix)
}

/// Turn a counts table (one key column, remaining columns numeric samples)
/// into a matrix: rows are key labels, columns are sample names. Missing
/// counts read as zero.
pub fn matrix_from_counts(table: &Table, key_col: &str) -> Result<LabeledMatrix, PivotError> {
    let keys = table.require_column(key_col)?;
    let row_labels: Vec<String> = keys.values().iter().map(Scalar::render).collect();
    let col_labels: Vec<String> = table
        .names()
        .iter()
        .filter(|name| name.as_str() != key_col)
        .cloned()
        .collect();

    let mut matrix = LabeledMatrix::new(row_labels, col_labels.clone(), 0.0);
    for (col, name) in col_labels.iter().enumerate() {
        let column = table.require_column(name)?;
        for (row, value) in column.values().iter().enumerate() {
            matrix.set(row, col, value.to_f64().unwrap_or(0.0));
        }
    }

    Ok(matrix)
}
