#![forbid(unsafe_code)]

use pt_table::{Column, Table, TableError};
use pt_types::Scalar;
use thiserror::Error;

/// One deterministic rewrite of a key value. Rules exist to reconcile
/// upstream naming schemes before a join: a genome id that carries a file
/// extension in one table but not another, a numeric cluster id that must
/// match a string-typed key, a contig name that embeds its genome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    /// Remove the suffix when present; no-op otherwise.
    StripSuffix(String),
    /// Replace every occurrence of a substring.
    Replace { from: String, to: String },
    /// Prepend a fixed tag. Applied unconditionally, so run it once.
    Prefix(String),
    /// Split on a separator and keep the field at `index`; values with too
    /// few fields are left untouched.
    SplitKeep { sep: char, index: usize },
}

impl Rule {
    #[must_use]
    pub fn strip_suffix(suffix: &str) -> Self {
        Self::StripSuffix(suffix.to_owned())
    }

    #[must_use]
    pub fn replace(from: &str, to: &str) -> Self {
        Self::Replace {
            from: from.to_owned(),
            to: to.to_owned(),
        }
    }

    #[must_use]
    pub fn prefix(tag: &str) -> Self {
        Self::Prefix(tag.to_owned())
    }

    fn apply(&self, value: &str) -> String {
        match self {
            Self::StripSuffix(suffix) => value.strip_suffix(suffix.as_str()).unwrap_or(value).to_owned(),
            Self::Replace { from, to } => value.replace(from.as_str(), to.as_str()),
            Self::Prefix(tag) => format!("{tag}{value}"),
            Self::SplitKeep { sep, index } => value
                .split(*sep)
                .nth(*index)
                .unwrap_or(value)
                .to_owned(),
        }
    }
}

#[derive(Debug, Error)]
pub enum NormalizeError {
    #[error(transparent)]
    Table(#[from] TableError),
}

/// Rewrite one column through an ordered rule list, leaving every other
/// column untouched. Missing values pass through; numeric values are
/// stringified first (cluster ids arrive as integers and leave as
/// prefix-tagged strings).
pub fn normalize_column(
    table: &Table,
    column: &str,
    rules: &[Rule],
) -> Result<Table, NormalizeError> {
    let target = table.require_column(column)?;

    let rewritten: Vec<Scalar> = target
        .values()
        .iter()
        .map(|value| {
            if value.is_missing() {
                return Scalar::Missing;
            }
            let mut text = match value {
                Scalar::Utf8(v) => v.clone(),
                other => other.render(),
            };
            for rule in rules {
                text = rule.apply(&text);
            }
            Scalar::Utf8(text)
        })
        .collect();

    let out = table
        .drop_column(column)?
        .with_column(column, Column::from_values(rewritten))?;

    // with_column appends, so restore the original column order.
    let names: Vec<&str> = table.names().iter().map(String::as_str).collect();
    Ok(out.select(&names)?)
}

/// Derive a new column from an existing one without touching the source,
/// e.g. `genome` extracted from `Contig`.
pub fn derive_column(
    table: &Table,
    source: &str,
    target: &str,
    rules: &[Rule],
) -> Result<Table, NormalizeError> {
    let derived = normalize_column(table, source, rules)?;
    let values = derived.require_column(source)?.values().to_vec();
    Ok(table.with_column(target, Column::from_values(values))?)
}

#[cfg(test)]
mod tests {
    use pt_table::Table;
    use pt_types::Scalar;

    use super::{Rule, derive_column, normalize_column};

    fn cluster_table() -> Table {
        Table::from_rows(
            vec!["genome".into(), "secondary_cluster".into()],
            vec![
                vec!["strainA.fna".into(), Scalar::Int64(1)],
                vec!["strainB".into(), Scalar::Int64(2)],
                vec![Scalar::Missing, Scalar::Int64(1)],
            ],
        )
        .expect("table")
    }

    #[test]
    fn strip_suffix_is_idempotent() {
        let rules = [Rule::strip_suffix(".fna")];
        let once = normalize_column(&cluster_table(), "genome", &rules).expect("once");
        let twice = normalize_column(&once, "genome", &rules).expect("twice");
        assert_eq!(once, twice);
        assert_eq!(
            once.column("genome").expect("genome").values()[0],
            Scalar::Utf8("strainA".into())
        );
    }

    #[test]
    fn prefix_tags_numeric_cluster_ids() {
        let out = normalize_column(&cluster_table(), "secondary_cluster", &[Rule::prefix("cluster")])
            .expect("prefix");
        assert_eq!(
            out.column("secondary_cluster").expect("col").values()[1],
            Scalar::Utf8("cluster2".into())
        );
        // Column order is unchanged.
        assert_eq!(out.names(), cluster_table().names());
    }

    #[test]
    fn missing_values_pass_through() {
        let out = normalize_column(&cluster_table(), "genome", &[Rule::strip_suffix(".fna")])
            .expect("normalize");
        assert_eq!(out.column("genome").expect("genome").values()[2], Scalar::Missing);
    }

    #[test]
    fn split_keep_extracts_genome_from_contig() {
        let table = Table::from_rows(
            vec!["Contig".into()],
            vec![vec!["strain:1@contig_7".into()]],
        )
        .expect("table");

        let out = derive_column(
            &table,
            "Contig",
            "genome",
            &[
                Rule::SplitKeep { sep: '@', index: 0 },
                Rule::replace(":", "_"),
            ],
        )
        .expect("derive");

        assert_eq!(
            out.column("genome").expect("genome").values(),
            &[Scalar::Utf8("strain_1".into())]
        );
        assert_eq!(
            out.column("Contig").expect("contig").values(),
            &[Scalar::Utf8("strain:1@contig_7".into())]
        );
    }
}
