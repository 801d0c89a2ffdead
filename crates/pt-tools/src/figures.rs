use std::collections::HashSet;
use std::path::Path;

use log::info;
use pt_groupby::{GroupOrder, Reducer, aggregate};
use pt_io::{ReadOptions, read_table};
use pt_join::{JoinKind, join};
use pt_pivot::{LabeledMatrix, matrix_from_counts, pivot_presence};
use pt_render::{ColorRamp, FigurePage, write_document};
use pt_table::{Column, Schema, Table};
use pt_types::Scalar;

use crate::{ToolError, stem_label};

fn member_list_options() -> ReadOptions {
    ReadOptions::tsv().headerless(&["reference", "all"])
}

/// Presence matrix of genomes (rows) against reference genes (columns) for
/// one cluster member list, built by joining member genes onto the
/// genome/gene membership table.
fn presence_matrix(genomes: &Table, genes: &Table) -> Result<LabeledMatrix, ToolError> {
    let merged = join(genes, genomes, &["all"], &["gene"], JoinKind::Left)?;
    Ok(pivot_presence(&merged, "genome", "reference", 0.0)?.sort_rows_by_label())
}

/// Single-page presence heatmap for one member list.
pub fn figure_pangenome_reference(
    genomes_file: &Path,
    genes_file: &Path,
    output: &Path,
) -> Result<(), ToolError> {
    let genomes = read_table(genomes_file, &ReadOptions::csv())?;
    Schema::of(&["genome", "gene"]).validate(&genomes)?;

    let genes = read_table(genes_file, &member_list_options())?;
    let matrix = presence_matrix(&genomes, &genes)?.sort_cols_by_label();

    let page = FigurePage::Heatmap {
        title: stem_label(genes_file),
        matrix,
        ramp: ColorRamp::YellowBlue,
        bar: None,
    };
    write_document(output, &[page])?;
    Ok(())
}

/// One page per member list: gene prevalence barplot over a presence
/// heatmap, genes ordered by prevalence descending.
pub fn figure_pangenome_genes(
    genomes_file: &Path,
    genes_files: &[&Path],
    output: &Path,
) -> Result<(), ToolError> {
    if genes_files.is_empty() {
        return Err(ToolError::NoInputs);
    }

    let genomes = read_table(genomes_file, &ReadOptions::csv())?;
    Schema::of(&["genome", "gene"]).validate(&genomes)?;

    let mut pages = Vec::with_capacity(genes_files.len());
    for genes_file in genes_files {
        let genes = read_table(genes_file, &member_list_options())?;
        let matrix = presence_matrix(&genomes, &genes)?.sort_columns_by_sum_desc();
        let prevalence = matrix.column_sums();

        pages.push(FigurePage::Heatmap {
            title: stem_label(genes_file),
            matrix,
            ramp: ColorRamp::YellowBlue,
            bar: Some(prevalence),
        });
    }

    info!("rendering {} presence pages", pages.len());
    write_document(output, &pages)?;
    Ok(())
}

fn distinct_cluster_labels(clusters: &Table) -> Result<Vec<String>, ToolError> {
    let mut seen = HashSet::new();
    let mut labels = Vec::new();
    for value in clusters.require_column("cluster")?.values() {
        if value.is_missing() {
            continue;
        }
        let label = value.render();
        if seen.insert(label.clone()) {
            labels.push(label);
        }
    }
    Ok(labels)
}

/// One page per cluster: per-gene total-counts barplot over a CPM heatmap
/// (samples as rows), genes ordered by total counts descending.
pub fn figure_pangenome_counts(
    clusters_file: &Path,
    counts_file: &Path,
    output: &Path,
) -> Result<(), ToolError> {
    let clusters = read_table(clusters_file, &ReadOptions::csv())?;
    let counts = read_table(counts_file, &ReadOptions::csv())?;
    Schema::of(&["gene", "cluster"]).validate(&clusters)?;
    Schema::of(&["gene"]).validate(&counts)?;

    let mut pages = Vec::new();
    for cluster in distinct_cluster_labels(&clusters)? {
        let members: HashSet<String> = clusters
            .filter_by("cluster", |value| value.render() == cluster)?
            .require_column("gene")?
            .values()
            .iter()
            .map(Scalar::render)
            .collect();

        let cluster_counts = counts.filter_by("gene", |value| members.contains(&value.render()))?;

        // Samples with no signal for this cluster would flatline the CPM
        // scaling, so they go first.
        let matrix = matrix_from_counts(&cluster_counts, "gene")?
            .drop_zero_columns()
            .to_cpm()
            .transpose()
            .sort_columns_by_sum_desc();
        let totals = matrix.column_sums();

        pages.push(FigurePage::Heatmap {
            title: format!("Cluster: {cluster}"),
            matrix,
            ramp: ColorRamp::Greens,
            bar: Some(totals),
        });
    }

    info!("rendering {} cluster count pages", pages.len());
    write_document(output, &pages)?;
    Ok(())
}

/// Copy `source` into `target` wherever `target` is missing (KO ids fall
/// back to the bare gene name).
fn fill_missing_from(table: &Table, target: &str, source: &str) -> Result<Table, ToolError> {
    let target_values = table.require_column(target)?.values();
    let source_values = table.require_column(source)?.values();

    let filled: Vec<Scalar> = target_values
        .iter()
        .zip(source_values)
        .map(|(value, fallback)| {
            if value.is_missing() {
                fallback.clone()
            } else {
                value.clone()
            }
        })
        .collect();

    let out = table
        .drop_column(target)?
        .with_column(target, Column::from_values(filled))?;
    let names: Vec<&str> = table.names().iter().map(String::as_str).collect();
    Ok(out.select(&names)?)
}

/// KEGG presence heatmap across genomes, followed by one bar page per
/// member list counting member genes per reference, labeled by KO id where
/// one exists.
pub fn figure_pangenome_kegg(
    genomes_file: &Path,
    cluster_info_file: &Path,
    genes_files: &[&Path],
    output: &Path,
) -> Result<(), ToolError> {
    let genomes = read_table(genomes_file, &ReadOptions::csv())?;
    let cluster_info = read_table(cluster_info_file, &ReadOptions::csv())?;
    Schema::of(&["genome", "gene"]).validate(&genomes)?;
    Schema::of(&["cluster", "gene", "length", "ko_id", "ko_e"]).validate(&cluster_info)?;

    let annotations = cluster_info.select(&["cluster", "gene", "length", "ko_id", "ko_e"])?;
    let expanded = join(&genomes, &annotations, &["gene"], &["gene"], JoinKind::Left)?;
    let expanded = fill_missing_from(&expanded, "ko_id", "gene")?;

    let matrix = pivot_presence(&expanded, "ko_id", "genome", 0.0)?
        .sort_rows_by_label()
        .sort_cols_by_label();
    let mut pages = vec![FigurePage::Heatmap {
        title: "KEGG ID presence across genomes".to_owned(),
        matrix,
        ramp: ColorRamp::YellowBlue,
        bar: None,
    }];

    for genes_file in genes_files {
        let genes = read_table(genes_file, &member_list_options())?;

        // Member genes per reference, labeled by the reference's KO id. The
        // per-gene annotation table keeps this one row per reference; the
        // genome-expanded table would duplicate bars.
        let sizes = aggregate(&genes, "reference", &["all"], Reducer::Count, GroupOrder::FirstSeen)?;
        let labeled = join(&sizes, &annotations, &["reference"], &["gene"], JoinKind::Left)?;
        let labeled = fill_missing_from(&labeled, "ko_id", "reference")?;

        let labels: Vec<String> = labeled
            .require_column("ko_id")?
            .values()
            .iter()
            .map(Scalar::render)
            .collect();
        let values: Vec<f64> = labeled
            .require_column("all")?
            .values()
            .iter()
            .map(|value| value.to_f64().unwrap_or(0.0))
            .collect();

        pages.push(FigurePage::Bars {
            title: stem_label(genes_file),
            labels,
            values,
        });
    }

    write_document(output, &pages)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use pt_table::Table;
    use pt_types::Scalar;

    use super::fill_missing_from;

    #[test]
    fn missing_ko_ids_fall_back_to_the_gene_label() {
        let table = Table::from_rows(
            vec!["gene".into(), "ko_id".into()],
            vec![
                vec!["g1".into(), "K00001".into()],
                vec!["g2".into(), Scalar::Missing],
            ],
        )
        .expect("table");

        let out = fill_missing_from(&table, "ko_id", "gene").expect("fill");
        // Present annotations are kept; only the gap takes the gene label.
        assert_eq!(
            out.column("ko_id").expect("ko").values(),
            &[Scalar::Utf8("K00001".into()), Scalar::Utf8("g2".into())]
        );
        assert_eq!(out.names(), table.names());
    }
}
