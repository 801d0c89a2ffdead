#![forbid(unsafe_code)]

use std::collections::HashMap;

use pt_table::{Table, TableError};
use pt_types::{KeyScalar, Scalar};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinKind {
    Inner,
    Left,
    Right,
}

#[derive(Debug, Error)]
pub enum JoinError {
    #[error(transparent)]
    Table(#[from] TableError),
    #[error("left side has {left} key columns, right side has {right}")]
    KeyArity { left: usize, right: usize },
    #[error("at least one key column is required")]
    NoKeys,
}

/// Where each output column takes its value from.
enum ColumnSource {
    /// Join-key column present on both sides under the same name: driving
    /// side's value, falling back to the other side.
    SharedKey { left: usize, right: usize },
    /// Non-key column present on both sides: the right-hand value wins
    /// (rename before merging to keep both).
    RightWins { right: usize },
    LeftOnly { left: usize },
    RightOnly { right: usize },
}

/// Relational join of two tables on one or more key columns.
///
/// The driving side (left for `Inner`/`Left`, right for `Right`) is iterated
/// in input order; duplicate keys produce the full cross-product, with match
/// order following the indexed side's input order. Unmatched driving rows
/// under `Left`/`Right` emit exactly one row with the other side's columns
/// set to missing; `Inner` drops them.
pub fn join(
    left: &Table,
    right: &Table,
    left_keys: &[&str],
    right_keys: &[&str],
    kind: JoinKind,
) -> Result<Table, JoinError> {
    if left_keys.is_empty() || right_keys.is_empty() {
        return Err(JoinError::NoKeys);
    }
    if left_keys.len() != right_keys.len() {
        return Err(JoinError::KeyArity {
            left: left_keys.len(),
            right: right_keys.len(),
        });
    }

    let left_key_columns: Vec<_> = left_keys
        .iter()
        .map(|name| left.require_column(name))
        .collect::<Result<_, _>>()?;
    let right_key_columns: Vec<_> = right_keys
        .iter()
        .map(|name| right.require_column(name))
        .collect::<Result<_, _>>()?;

    let (names, plan) = column_plan(left, right, left_keys, right_keys);

    // Multimap from composite key to row positions on the non-driving side.
    let pairs: Vec<(Option<usize>, Option<usize>)> = match kind {
        JoinKind::Inner | JoinKind::Left => {
            let mut index = HashMap::<Vec<KeyScalar<'_>>, Vec<usize>>::new();
            for pos in 0..right.n_rows() {
                index.entry(key_at(&right_key_columns, pos)).or_default().push(pos);
            }

            let mut out = Vec::new();
            for left_pos in 0..left.n_rows() {
                match index.get(&key_at(&left_key_columns, left_pos)) {
                    Some(matches) => {
                        for right_pos in matches {
                            out.push((Some(left_pos), Some(*right_pos)));
                        }
                    }
                    None => {
                        if matches!(kind, JoinKind::Left) {
                            out.push((Some(left_pos), None));
                        }
                    }
                }
            }
            out
        }
        JoinKind::Right => {
            let mut index = HashMap::<Vec<KeyScalar<'_>>, Vec<usize>>::new();
            for pos in 0..left.n_rows() {
                index.entry(key_at(&left_key_columns, pos)).or_default().push(pos);
            }

            let mut out = Vec::new();
            for right_pos in 0..right.n_rows() {
                match index.get(&key_at(&right_key_columns, right_pos)) {
                    Some(matches) => {
                        for left_pos in matches {
                            out.push((Some(*left_pos), Some(right_pos)));
                        }
                    }
                    None => out.push((None, Some(right_pos))),
                }
            }
            out
        }
    };

    let mut rows = Vec::with_capacity(pairs.len());
    for (left_pos, right_pos) in pairs {
        let mut row = Vec::with_capacity(plan.len());
        for source in &plan {
            row.push(resolve(source, left, right, left_pos, right_pos));
        }
        rows.push(row);
    }

    Ok(Table::from_rows(names, rows)?)
}

fn key_at<'a>(columns: &[&'a pt_table::Column], pos: usize) -> Vec<KeyScalar<'a>> {
    columns
        .iter()
        .map(|column| {
            column
                .value(pos)
                .map_or(KeyScalar::Missing, KeyScalar::from_scalar)
        })
        .collect()
}

fn column_plan(
    left: &Table,
    right: &Table,
    left_keys: &[&str],
    right_keys: &[&str],
) -> (Vec<String>, Vec<ColumnSource>) {
    let mut names = Vec::new();
    let mut plan = Vec::new();

    for (left_idx, name) in left.names().iter().enumerate() {
        let source = match right.column_index(name) {
            Some(right_idx) => {
                let shared_key =
                    left_keys.contains(&name.as_str()) && right_keys.contains(&name.as_str());
                if shared_key {
                    ColumnSource::SharedKey {
                        left: left_idx,
                        right: right_idx,
                    }
                } else {
                    ColumnSource::RightWins { right: right_idx }
                }
            }
            None => ColumnSource::LeftOnly { left: left_idx },
        };
        names.push(name.clone());
        plan.push(source);
    }

    for (right_idx, name) in right.names().iter().enumerate() {
        if left.column_index(name).is_none() {
            names.push(name.clone());
            plan.push(ColumnSource::RightOnly { right: right_idx });
        }
    }

    (names, plan)
}

fn resolve(
    source: &ColumnSource,
    left: &Table,
    right: &Table,
    left_pos: Option<usize>,
    right_pos: Option<usize>,
) -> Scalar {
    let left_value = |idx: usize| {
        left_pos
            .and_then(|pos| left.column_at(idx)?.value(pos))
            .cloned()
            .unwrap_or(Scalar::Missing)
    };
    let right_value = |idx: usize| {
        right_pos
            .and_then(|pos| right.column_at(idx)?.value(pos))
            .cloned()
            .unwrap_or(Scalar::Missing)
    };

    match source {
        ColumnSource::SharedKey { left, right } => {
            let value = left_value(*left);
            if value.is_missing() && left_pos.is_none() {
                right_value(*right)
            } else {
                value
            }
        }
        ColumnSource::RightWins { right } => right_value(*right),
        ColumnSource::LeftOnly { left } => left_value(*left),
        ColumnSource::RightOnly { right } => right_value(*right),
    }
}
