#![forbid(unsafe_code)]

use std::fs::File;
use std::io::{BufRead, BufReader, Read, Write};
use std::path::Path;

use csv::{ReaderBuilder, WriterBuilder};
use pt_table::{Table, TableError};
use pt_types::{Scalar, parse_field};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delimiter {
    Comma,
    Tab,
    /// One or more whitespace characters, as emitted by annotation search
    /// tools. Read-only: the writer has no sensible inverse for it.
    Whitespace,
}

impl Delimiter {
    fn as_byte(self) -> Option<u8> {
        match self {
            Self::Comma => Some(b','),
            Self::Tab => Some(b'\t'),
            Self::Whitespace => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum IoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("input has no header row and no column names were provided")]
    MissingColumnNames,
    #[error("input produced no columns")]
    NoColumns,
    #[error("record {record} has {got} fields, expected {expected}")]
    FieldCount {
        record: usize,
        expected: usize,
        got: usize,
    },
    #[error("record {record} has {got} fields, but column index {index} was requested")]
    ColumnIndex {
        record: usize,
        index: usize,
        got: usize,
    },
    #[error("the whitespace delimiter is read-only")]
    WhitespaceWrite,
}

#[derive(Debug, Clone)]
pub struct ReadOptions {
    pub delimiter: Delimiter,
    pub has_headers: bool,
    /// Positional column names for headerless input. When headers are
    /// present they win and this list is ignored.
    pub names: Option<Vec<String>>,
    /// Physical column indices to retain, paired positionally with `names`.
    pub usecols: Option<Vec<usize>>,
    /// Lines starting with this byte are skipped before parsing.
    pub comment: Option<u8>,
}

impl Default for ReadOptions {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            has_headers: true,
            names: None,
            usecols: None,
            comment: None,
        }
    }
}

impl ReadOptions {
    #[must_use]
    pub fn csv() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tsv() -> Self {
        Self {
            delimiter: Delimiter::Tab,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn headerless(mut self, names: &[&str]) -> Self {
        self.has_headers = false;
        self.names = Some(names.iter().map(|n| (*n).to_owned()).collect());
        self
    }

    #[must_use]
    pub fn usecols(mut self, indices: &[usize]) -> Self {
        self.usecols = Some(indices.to_vec());
        self
    }

    #[must_use]
    pub fn comment(mut self, prefix: u8) -> Self {
        self.comment = Some(prefix);
        self
    }
}

#[derive(Debug, Clone)]
pub struct WriteOptions {
    pub delimiter: Delimiter,
    /// Column order for the output; a subset or reordering of the table's
    /// columns. Unlisted columns are dropped. `None` writes all columns in
    /// table order.
    pub columns: Option<Vec<String>>,
    pub write_header: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            delimiter: Delimiter::Comma,
            columns: None,
            write_header: true,
        }
    }
}

impl WriteOptions {
    #[must_use]
    pub fn csv() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn tsv() -> Self {
        Self {
            delimiter: Delimiter::Tab,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn columns(mut self, names: &[&str]) -> Self {
        self.columns = Some(names.iter().map(|n| (*n).to_owned()).collect());
        self
    }

    #[must_use]
    pub fn no_header(mut self) -> Self {
        self.write_header = false;
        self
    }
}

pub fn read_table(path: impl AsRef<Path>, options: &ReadOptions) -> Result<Table, IoError> {
    let file = File::open(path)?;
    read_table_from(BufReader::new(file), options)
}

pub fn read_table_from<R: Read>(reader: R, options: &ReadOptions) -> Result<Table, IoError> {
    match options.delimiter.as_byte() {
        Some(delimiter) => read_delimited(reader, delimiter, options),
        None => read_whitespace(BufReader::new(reader), options),
    }
}

fn read_delimited<R: Read>(
    reader: R,
    delimiter: u8,
    options: &ReadOptions,
) -> Result<Table, IoError> {
    // Headers are handled here rather than by the csv crate so that
    // `usecols` applies uniformly to the header record and data records.
    let mut csv_reader = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .comment(options.comment)
        .flexible(true)
        .from_reader(reader);

    let mut names: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<Scalar>> = Vec::new();

    for (record_idx, record) in csv_reader.records().enumerate() {
        let record = record?;
        let fields: Vec<&str> = record.iter().collect();

        if options.has_headers && names.is_none() {
            let header = project(&fields, options.usecols.as_deref(), record_idx)?;
            names = Some(header.into_iter().map(str::to_owned).collect());
            continue;
        }

        let expected = expected_width(&names, options);
        let projected = project(&fields, options.usecols.as_deref(), record_idx)?;
        if let Some(expected) = expected {
            if projected.len() != expected {
                return Err(IoError::FieldCount {
                    record: record_idx,
                    expected,
                    got: projected.len(),
                });
            }
        }

        rows.push(projected.into_iter().map(parse_field).collect());
    }

    finish(names, options, rows)
}

fn read_whitespace<R: BufRead>(reader: R, options: &ReadOptions) -> Result<Table, IoError> {
    let mut names: Option<Vec<String>> = None;
    let mut rows: Vec<Vec<Scalar>> = Vec::new();
    let mut record_idx = 0usize;

    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        if let Some(prefix) = options.comment {
            if line.as_bytes().first() == Some(&prefix) {
                continue;
            }
        }

        let fields: Vec<&str> = line.split_whitespace().collect();

        if options.has_headers && names.is_none() {
            let header = project(&fields, options.usecols.as_deref(), record_idx)?;
            names = Some(header.into_iter().map(str::to_owned).collect());
            record_idx += 1;
            continue;
        }

        let expected = expected_width(&names, options);
        let projected = project(&fields, options.usecols.as_deref(), record_idx)?;
        if let Some(expected) = expected {
            if projected.len() != expected {
                return Err(IoError::FieldCount {
                    record: record_idx,
                    expected,
                    got: projected.len(),
                });
            }
        }

        rows.push(projected.into_iter().map(parse_field).collect());
        record_idx += 1;
    }

    finish(names, options, rows)
}

/// Apply `usecols` to one record. Without `usecols` the record passes
/// through whole; with it, every requested index must exist.
fn project<'a>(
    fields: &[&'a str],
    usecols: Option<&[usize]>,
    record_idx: usize,
) -> Result<Vec<&'a str>, IoError> {
    match usecols {
        None => Ok(fields.to_vec()),
        Some(indices) => indices
            .iter()
            .map(|idx| {
                fields.get(*idx).copied().ok_or(IoError::ColumnIndex {
                    record: record_idx,
                    index: *idx,
                    got: fields.len(),
                })
            })
            .collect(),
    }
}

fn expected_width(names: &Option<Vec<String>>, options: &ReadOptions) -> Option<usize> {
    names
        .as_ref()
        .or(options.names.as_ref())
        .map(Vec::len)
        // Rows under `usecols` are width-checked by projection instead;
        // annotation tables carry ragged free-text tails.
        .filter(|_| options.usecols.is_none())
}

fn finish(
    header_names: Option<Vec<String>>,
    options: &ReadOptions,
    rows: Vec<Vec<Scalar>>,
) -> Result<Table, IoError> {
    let names = match header_names.or_else(|| options.names.clone()) {
        Some(names) => names,
        None => return Err(IoError::MissingColumnNames),
    };
    if names.is_empty() {
        return Err(IoError::NoColumns);
    }

    Ok(Table::from_rows(names, rows)?)
}

pub fn write_table(
    path: impl AsRef<Path>,
    table: &Table,
    options: &WriteOptions,
) -> Result<(), IoError> {
    let file = File::create(path)?;
    write_table_to(file, table, options)
}

pub fn write_table_to<W: Write>(
    writer: W,
    table: &Table,
    options: &WriteOptions,
) -> Result<(), IoError> {
    let Some(delimiter) = options.delimiter.as_byte() else {
        return Err(IoError::WhitespaceWrite);
    };

    let selected = match &options.columns {
        Some(columns) => {
            let names: Vec<&str> = columns.iter().map(String::as_str).collect();
            table.select(&names)?
        }
        None => table.clone(),
    };

    let mut csv_writer = WriterBuilder::new().delimiter(delimiter).from_writer(writer);

    if options.write_header {
        csv_writer.write_record(selected.names())?;
    }

    for row_idx in 0..selected.n_rows() {
        let row: Vec<String> = selected.row(row_idx).iter().map(Scalar::render).collect();
        csv_writer.write_record(&row)?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn write_table_string(table: &Table, options: &WriteOptions) -> Result<String, IoError> {
    let mut buffer = Vec::new();
    write_table_to(&mut buffer, table, options)?;
    Ok(String::from_utf8(buffer)?)
}

#[cfg(test)]
mod tests {
    use pt_types::Scalar;

    use super::{
        IoError, ReadOptions, WriteOptions, read_table_from, write_table_string,
    };

    #[test]
    fn csv_round_trip_preserves_values() {
        let input = "gene,length,ko_e\ng1,120,1e-7\ng2,90,\n";
        let table = read_table_from(input.as_bytes(), &ReadOptions::csv()).expect("read");

        assert_eq!(
            table.column("ko_e").expect("ko_e").values(),
            &[Scalar::Float64(1e-7), Scalar::Missing]
        );

        let out = write_table_string(&table, &WriteOptions::csv()).expect("write");
        assert_eq!(out, input);
    }

    #[test]
    fn headerless_tab_input_takes_positional_names() {
        let input = "ref1\tg1\nref1\tg2\n";
        let options = ReadOptions::tsv().headerless(&["reference", "all"]);
        let table = read_table_from(input.as_bytes(), &options).expect("read");

        assert_eq!(table.names(), &["reference".to_owned(), "all".to_owned()]);
        assert_eq!(table.n_rows(), 2);
    }

    #[test]
    fn whitespace_input_skips_comments_and_selects_positions() {
        let input = "# header comment\n\
                     ko1  desc  q1  x  1e-3  extra words here\n\
                     ko2  desc  q1  x  1e-7\n";
        let options = ReadOptions {
            delimiter: super::Delimiter::Whitespace,
            ..ReadOptions::default()
        }
        .headerless(&["ko_id", "query", "evalue"])
        .usecols(&[0, 2, 4])
        .comment(b'#');

        let table = read_table_from(input.as_bytes(), &options).expect("read");
        assert_eq!(table.n_rows(), 2);
        assert_eq!(
            table.column("evalue").expect("evalue").values(),
            &[Scalar::Float64(1e-3), Scalar::Float64(1e-7)]
        );
    }

    #[test]
    fn ragged_record_is_a_parse_error() {
        let input = "gene,length\ng1,120\ng2\n";
        let err = read_table_from(input.as_bytes(), &ReadOptions::csv()).expect_err("ragged");
        assert!(matches!(err, IoError::FieldCount { record: 2, expected: 2, got: 1 }));
    }

    #[test]
    fn usecols_index_past_record_width_fails() {
        let input = "a b\n";
        let options = ReadOptions {
            delimiter: super::Delimiter::Whitespace,
            ..ReadOptions::default()
        }
        .headerless(&["x"])
        .usecols(&[4]);

        let err = read_table_from(input.as_bytes(), &options).expect_err("short record");
        assert!(matches!(err, IoError::ColumnIndex { index: 4, .. }));
    }

    #[test]
    fn writer_respects_column_order_and_header_flag() {
        let input = "gene,length,cluster\ng1,120,c1\n";
        let table = read_table_from(input.as_bytes(), &ReadOptions::csv()).expect("read");

        let out = write_table_string(
            &table,
            &WriteOptions::tsv().columns(&["cluster", "gene"]),
        )
        .expect("write");
        assert_eq!(out, "cluster\tgene\nc1\tg1\n");

        let bare = write_table_string(
            &table,
            &WriteOptions::csv().columns(&["gene"]).no_header(),
        )
        .expect("write");
        assert_eq!(bare, "g1\n");
    }
}
