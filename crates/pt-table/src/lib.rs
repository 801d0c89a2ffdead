#![forbid(unsafe_code)]

use pt_types::{DType, Scalar, common_dtype, infer_dtype};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("column {name:?} not found")]
    UnknownColumn { name: String },
    #[error("duplicate column name {name:?}")]
    DuplicateColumn { name: String },
    #[error("column {name:?} has {column_len} values but the table has {table_len} rows")]
    LengthMismatch {
        name: String,
        column_len: usize,
        table_len: usize,
    },
    #[error("row {row} has {got} fields, expected {expected}")]
    RowWidth {
        row: usize,
        expected: usize,
        got: usize,
    },
    #[error("cannot concatenate: table {position} has columns {found:?}, expected {expected:?}")]
    ConcatShape {
        position: usize,
        expected: Vec<String>,
        found: Vec<String>,
    },
    #[error("column {name:?} has dtype {found:?}, incompatible with expected {expected:?}")]
    SchemaDtype {
        name: String,
        expected: DType,
        found: DType,
    },
}

/// A uniform run of scalars with an inferred dtype. Mixed string/numeric
/// content infers as Utf8 rather than failing; delimited files give no
/// stronger guarantee.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    dtype: DType,
    values: Vec<Scalar>,
}

impl Column {
    #[must_use]
    pub fn from_values(values: Vec<Scalar>) -> Self {
        let dtype = infer_dtype(&values);
        Self { dtype, values }
    }

    #[must_use]
    pub fn dtype(&self) -> DType {
        self.dtype
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn values(&self) -> &[Scalar] {
        &self.values
    }

    #[must_use]
    pub fn value(&self, idx: usize) -> Option<&Scalar> {
        self.values.get(idx)
    }
}

/// An ordered set of named columns of equal length. Column order and row
/// order are both significant: they survive loading, joining, grouping and
/// writing unless a sort is explicitly requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    names: Vec<String>,
    columns: Vec<Column>,
}

impl Table {
    pub fn new(names: Vec<String>, columns: Vec<Column>) -> Result<Self, TableError> {
        for (idx, name) in names.iter().enumerate() {
            if names[..idx].contains(name) {
                return Err(TableError::DuplicateColumn { name: name.clone() });
            }
        }

        let table_len = columns.first().map_or(0, Column::len);
        for (name, column) in names.iter().zip(&columns) {
            if column.len() != table_len {
                return Err(TableError::LengthMismatch {
                    name: name.clone(),
                    column_len: column.len(),
                    table_len,
                });
            }
        }

        Ok(Self { names, columns })
    }

    /// Build a table from row-major data, checking every row's width.
    pub fn from_rows(names: Vec<String>, rows: Vec<Vec<Scalar>>) -> Result<Self, TableError> {
        let width = names.len();
        let mut buffers: Vec<Vec<Scalar>> = (0..width).map(|_| Vec::with_capacity(rows.len())).collect();

        for (row_idx, row) in rows.into_iter().enumerate() {
            if row.len() != width {
                return Err(TableError::RowWidth {
                    row: row_idx,
                    expected: width,
                    got: row.len(),
                });
            }
            for (buffer, value) in buffers.iter_mut().zip(row) {
                buffer.push(value);
            }
        }

        let columns = buffers.into_iter().map(Column::from_values).collect();
        Self::new(names, columns)
    }

    #[must_use]
    pub fn empty(names: Vec<String>) -> Self {
        let columns = names.iter().map(|_| Column::from_values(Vec::new())).collect();
        Self { names, columns }
    }

    #[must_use]
    pub fn n_rows(&self) -> usize {
        self.columns.first().map_or(0, Column::len)
    }

    #[must_use]
    pub fn n_cols(&self) -> usize {
        self.names.len()
    }

    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    #[must_use]
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.column_index(name).map(|idx| &self.columns[idx])
    }

    #[must_use]
    pub fn column_at(&self, idx: usize) -> Option<&Column> {
        self.columns.get(idx)
    }

    pub fn require_column(&self, name: &str) -> Result<&Column, TableError> {
        self.column(name).ok_or_else(|| TableError::UnknownColumn {
            name: name.to_owned(),
        })
    }

    /// Clone one row in column order.
    #[must_use]
    pub fn row(&self, idx: usize) -> Vec<Scalar> {
        self.columns
            .iter()
            .map(|column| column.value(idx).cloned().unwrap_or(Scalar::Missing))
            .collect()
    }

    /// Subset and reorder columns. Unlisted columns are dropped.
    pub fn select(&self, names: &[&str]) -> Result<Self, TableError> {
        let mut out_names = Vec::with_capacity(names.len());
        let mut out_columns = Vec::with_capacity(names.len());
        for name in names {
            let idx = self.column_index(name).ok_or_else(|| TableError::UnknownColumn {
                name: (*name).to_owned(),
            })?;
            out_names.push(self.names[idx].clone());
            out_columns.push(self.columns[idx].clone());
        }
        Self::new(out_names, out_columns)
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<Self, TableError> {
        let idx = self.column_index(from).ok_or_else(|| TableError::UnknownColumn {
            name: from.to_owned(),
        })?;
        if from != to && self.names.contains(&to.to_owned()) {
            return Err(TableError::DuplicateColumn { name: to.to_owned() });
        }
        let mut names = self.names.clone();
        names[idx] = to.to_owned();
        Self::new(names, self.columns.clone())
    }

    /// Append a column. The name must be fresh and the length must match.
    pub fn with_column(&self, name: &str, column: Column) -> Result<Self, TableError> {
        if self.names.iter().any(|n| n == name) {
            return Err(TableError::DuplicateColumn { name: name.to_owned() });
        }
        let mut names = self.names.clone();
        let mut columns = self.columns.clone();
        names.push(name.to_owned());
        columns.push(column);
        Self::new(names, columns)
    }

    /// Append a column holding one repeated value (e.g. a cluster label
    /// derived from a file name).
    pub fn with_constant(&self, name: &str, value: Scalar) -> Result<Self, TableError> {
        let column = Column::from_values(vec![value; self.n_rows()]);
        self.with_column(name, column)
    }

    pub fn drop_column(&self, name: &str) -> Result<Self, TableError> {
        let idx = self.column_index(name).ok_or_else(|| TableError::UnknownColumn {
            name: name.to_owned(),
        })?;
        let mut names = self.names.clone();
        let mut columns = self.columns.clone();
        names.remove(idx);
        columns.remove(idx);
        Self::new(names, columns)
    }

    /// Materialize the listed row indices, in the given order.
    #[must_use]
    pub fn take_rows(&self, indices: &[usize]) -> Self {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                Column::from_values(
                    indices
                        .iter()
                        .map(|idx| column.value(*idx).cloned().unwrap_or(Scalar::Missing))
                        .collect(),
                )
            })
            .collect();
        Self {
            names: self.names.clone(),
            columns,
        }
    }

    /// Keep rows whose value in `column` satisfies the predicate.
    pub fn filter_by<F>(&self, column: &str, keep: F) -> Result<Self, TableError>
    where
        F: Fn(&Scalar) -> bool,
    {
        let target = self.require_column(column)?;
        let indices: Vec<usize> = target
            .values()
            .iter()
            .enumerate()
            .filter_map(|(idx, value)| keep(value).then_some(idx))
            .collect();
        Ok(self.take_rows(&indices))
    }

    /// Stack tables with identical column sets, preserving input order.
    pub fn concat(tables: &[Self]) -> Result<Self, TableError> {
        let Some(first) = tables.first() else {
            return Ok(Self::empty(Vec::new()));
        };

        let mut buffers: Vec<Vec<Scalar>> = first
            .columns
            .iter()
            .map(|column| column.values().to_vec())
            .collect();

        for (position, table) in tables.iter().enumerate().skip(1) {
            if table.names != first.names {
                return Err(TableError::ConcatShape {
                    position,
                    expected: first.names.clone(),
                    found: table.names.clone(),
                });
            }
            for (buffer, column) in buffers.iter_mut().zip(&table.columns) {
                buffer.extend(column.values().iter().cloned());
            }
        }

        let columns = buffers.into_iter().map(Column::from_values).collect();
        Self::new(first.names.clone(), columns)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSpec {
    pub name: String,
    pub dtype: Option<DType>,
}

/// Explicit per-stage input schema, checked right after load instead of
/// letting a missing column surface as a panic three joins later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schema {
    columns: Vec<ColumnSpec>,
}

impl Schema {
    #[must_use]
    pub fn new(columns: Vec<ColumnSpec>) -> Self {
        Self { columns }
    }

    /// Presence-only schema from column names.
    #[must_use]
    pub fn of(names: &[&str]) -> Self {
        Self {
            columns: names
                .iter()
                .map(|name| ColumnSpec {
                    name: (*name).to_owned(),
                    dtype: None,
                })
                .collect(),
        }
    }

    #[must_use]
    pub fn with_dtype(mut self, name: &str, dtype: DType) -> Self {
        for spec in &mut self.columns {
            if spec.name == name {
                spec.dtype = Some(dtype);
            }
        }
        self
    }

    pub fn validate(&self, table: &Table) -> Result<(), TableError> {
        for spec in &self.columns {
            let column = table.require_column(&spec.name)?;
            if let Some(expected) = spec.dtype {
                // A column of only missing values satisfies any expectation.
                if common_dtype(column.dtype(), expected).is_err() {
                    return Err(TableError::SchemaDtype {
                        name: spec.name.clone(),
                        expected,
                        found: column.dtype(),
                    });
                }
            }
        }
        Ok(())
    }
}

/// Logical-field to physical-column mapping resolved once from a header,
/// replacing ad-hoc substring scans over column names. Sample columns in
/// coverage tables carry suffixes like `" Read Count"`; the logical name is
/// the physical name with the suffix removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMap {
    entries: Vec<(String, String)>,
}

impl ColumnMap {
    #[must_use]
    pub fn from_suffix(names: &[String], suffix: &str) -> Self {
        let entries = names
            .iter()
            .filter_map(|name| {
                name.strip_suffix(suffix)
                    .map(|logical| (logical.to_owned(), name.clone()))
            })
            .collect();
        Self { entries }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn physical_names(&self) -> Vec<&str> {
        self.entries.iter().map(|(_, physical)| physical.as_str()).collect()
    }

    /// Select the mapped physical columns (after any leading key columns)
    /// and rename them to their logical names.
    pub fn extract(&self, table: &Table, leading: &[&str]) -> Result<Table, TableError> {
        let mut selected: Vec<&str> = leading.to_vec();
        selected.extend(self.physical_names());
        let mut out = table.select(&selected)?;
        for (logical, physical) in &self.entries {
            out = out.rename(physical, logical)?;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use pt_types::{DType, Scalar};

    use super::{Column, ColumnMap, Schema, Table, TableError};

    fn gene_table() -> Table {
        Table::from_rows(
            vec!["gene".into(), "length".into()],
            vec![
                vec!["g1".into(), Scalar::Int64(120)],
                vec!["g2".into(), Scalar::Int64(90)],
            ],
        )
        .expect("table")
    }

    #[test]
    fn select_reorders_and_drops() {
        let out = gene_table().select(&["length"]).expect("select");
        assert_eq!(out.names(), &["length".to_owned()]);
        assert_eq!(out.n_rows(), 2);
    }

    #[test]
    fn select_unknown_column_fails() {
        let err = gene_table().select(&["cluster"]).expect_err("must fail");
        assert!(matches!(err, TableError::UnknownColumn { .. }));
    }

    #[test]
    fn from_rows_rejects_ragged_rows() {
        let err = Table::from_rows(
            vec!["a".into(), "b".into()],
            vec![vec![Scalar::Int64(1)]],
        )
        .expect_err("ragged");
        assert!(matches!(err, TableError::RowWidth { row: 0, expected: 2, got: 1 }));
    }

    #[test]
    fn concat_preserves_row_order() {
        let first = gene_table();
        let second = Table::from_rows(
            vec!["gene".into(), "length".into()],
            vec![vec!["g3".into(), Scalar::Int64(40)]],
        )
        .expect("table");

        let out = Table::concat(&[first, second]).expect("concat");
        assert_eq!(out.n_rows(), 3);
        assert_eq!(
            out.column("gene").expect("gene").values()[2],
            Scalar::Utf8("g3".into())
        );
    }

    #[test]
    fn schema_checks_presence_and_dtype() {
        let schema = Schema::of(&["gene", "length"]).with_dtype("length", DType::Float64);
        schema.validate(&gene_table()).expect("int satisfies float");

        let missing = Schema::of(&["cluster"]);
        assert!(missing.validate(&gene_table()).is_err());
    }

    #[test]
    fn column_map_resolves_suffixed_samples() {
        let table = Table::from_rows(
            vec![
                "Contig".into(),
                "s1 Read Count".into(),
                "s1 Covered Bases".into(),
            ],
            vec![vec!["c1".into(), Scalar::Int64(7), Scalar::Int64(300)]],
        )
        .expect("table");

        let map = ColumnMap::from_suffix(table.names(), " Read Count");
        assert_eq!(map.len(), 1);

        let out = map.extract(&table, &["Contig"]).expect("extract");
        assert_eq!(out.names(), &["Contig".to_owned(), "s1".to_owned()]);
        assert_eq!(out.column("s1").expect("s1").values(), &[Scalar::Int64(7)]);
    }

    #[test]
    fn with_constant_fills_every_row() {
        let out = gene_table()
            .with_constant("cluster", "cluster1".into())
            .expect("constant");
        assert_eq!(
            out.column("cluster").expect("cluster").values(),
            &[Scalar::Utf8("cluster1".into()), Scalar::Utf8("cluster1".into())]
        );
    }

    #[test]
    fn filter_by_keeps_matching_rows_in_order() {
        let out = gene_table()
            .filter_by("length", |v| matches!(v, Scalar::Int64(n) if *n > 100))
            .expect("filter");
        assert_eq!(out.n_rows(), 1);
        assert_eq!(out.row(0)[0], Scalar::Utf8("g1".into()));
    }

    #[test]
    fn empty_concat_column_dtype_is_null() {
        let column = Column::from_values(Vec::new());
        assert_eq!(column.dtype(), DType::Null);
    }
}
