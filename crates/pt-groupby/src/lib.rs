#![forbid(unsafe_code)]

use std::collections::HashMap;

use pt_table::{Column, Table, TableError};
use pt_types::{KeyScalar, Scalar};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reducer {
    /// Sum of non-missing values; missing contributes nothing. An
    /// all-missing group sums to 0.0.
    Sum,
    /// Count of non-missing values.
    Count,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupOrder {
    /// First appearance of the group key in the input.
    #[default]
    FirstSeen,
    /// Row total descending, first-appearance tiebreak. Presentation
    /// ordering for prevalence tables.
    TotalDescending,
}

#[derive(Debug, Error)]
pub enum GroupByError {
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Partition rows by the group column and reduce each value column
/// independently. One output row per distinct key, missing included as its
/// own group; the group column comes first, value columns keep their given
/// order.
pub fn aggregate(
    table: &Table,
    group_by: &str,
    value_columns: &[&str],
    reducer: Reducer,
    order: GroupOrder,
) -> Result<Table, GroupByError> {
    let keys = table.require_column(group_by)?;
    let values: Vec<&Column> = value_columns
        .iter()
        .map(|name| table.require_column(name))
        .collect::<Result<_, _>>()?;

    // Stable partition: group ids in first-seen order.
    let mut group_of_key = HashMap::<KeyScalar<'_>, usize>::new();
    let mut group_labels = Vec::<Scalar>::new();
    let mut group_rows = Vec::<Vec<usize>>::new();

    for (row, key) in keys.values().iter().enumerate() {
        let key_id = KeyScalar::from_scalar(key);
        let group = *group_of_key.entry(key_id).or_insert_with(|| {
            group_labels.push(key.clone());
            group_rows.push(Vec::new());
            group_labels.len() - 1
        });
        group_rows[group].push(row);
    }

    let mut reduced: Vec<Vec<Scalar>> = Vec::with_capacity(values.len());
    for column in &values {
        let mut out = Vec::with_capacity(group_rows.len());
        for rows in &group_rows {
            out.push(reduce(column, rows, reducer));
        }
        reduced.push(out);
    }

    let group_order = match order {
        GroupOrder::FirstSeen => (0..group_labels.len()).collect::<Vec<_>>(),
        GroupOrder::TotalDescending => {
            let totals: Vec<f64> = (0..group_labels.len())
                .map(|group| {
                    reduced
                        .iter()
                        .map(|column| column[group].to_f64().unwrap_or(0.0))
                        .sum()
                })
                .collect();
            let mut indices: Vec<usize> = (0..group_labels.len()).collect();
            // sort_by is stable, so equal totals keep first-seen order.
            indices.sort_by(|a, b| {
                totals[*b].partial_cmp(&totals[*a]).unwrap_or(std::cmp::Ordering::Equal)
            });
            indices
        }
    };

    let mut names = vec![group_by.to_owned()];
    let mut columns = vec![Column::from_values(
        group_order.iter().map(|g| group_labels[*g].clone()).collect(),
    )];
    for (name, column) in value_columns.iter().zip(reduced) {
        names.push((*name).to_owned());
        columns.push(Column::from_values(
            group_order.iter().map(|g| column[*g].clone()).collect(),
        ));
    }

    Ok(Table::new(names, columns)?)
}

fn reduce(column: &Column, rows: &[usize], reducer: Reducer) -> Scalar {
    match reducer {
        Reducer::Sum => {
            let mut sum = 0.0;
            for row in rows {
                if let Some(value) = column.value(*row) {
                    if !value.is_missing() {
                        if let Ok(v) = value.to_f64() {
                            sum += v;
                        }
                    }
                }
            }
            Scalar::Float64(sum)
        }
        Reducer::Count => {
            let count = rows
                .iter()
                .filter(|row| column.value(**row).is_some_and(|v| !v.is_missing()))
                .count();
            Scalar::Int64(count as i64)
        }
    }
}

/// Pick, per group, the whole input row holding the numerically smallest
/// non-missing value in `value_column`. Ties keep the earliest row; groups
/// whose value column is entirely missing are dropped (unparseable e-values
/// exclude their rows rather than erroring). Output rows follow first
/// appearance of the group key. Idempotent: one row per group in, same rows
/// out.
pub fn select_min(
    table: &Table,
    group_by: &str,
    value_column: &str,
) -> Result<Table, GroupByError> {
    let keys = table.require_column(group_by)?;
    let values = table.require_column(value_column)?;

    // Slots are allocated in first-seen key order, which is also the
    // output row order.
    let mut best_of_key = HashMap::<KeyScalar<'_>, usize>::new();
    let mut best_rows = Vec::<Option<(usize, f64)>>::new();

    for (row, key) in keys.values().iter().enumerate() {
        let key_id = KeyScalar::from_scalar(key);
        let slot = match best_of_key.get(&key_id) {
            Some(slot) => *slot,
            None => {
                best_of_key.insert(key_id, best_rows.len());
                best_rows.push(None);
                best_rows.len() - 1
            }
        };

        let Some(value) = values.value(row) else { continue };
        if value.is_missing() {
            continue;
        }
        let Ok(v) = value.to_f64() else { continue };

        match best_rows[slot] {
            // Strict less-than keeps the first occurrence on ties.
            Some((_, best)) if v >= best => {}
            _ => best_rows[slot] = Some((row, v)),
        }
    }

    let winners: Vec<usize> = best_rows.into_iter().flatten().map(|(row, _)| row).collect();
    Ok(table.take_rows(&winners))
}
