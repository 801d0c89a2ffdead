use std::path::Path;

use log::info;
use pt_groupby::{GroupOrder, Reducer, aggregate};
use pt_io::{ReadOptions, WriteOptions, read_table, write_table};
use pt_join::{JoinKind, join};
use pt_normalize::{Rule, derive_column, normalize_column};
use pt_table::{ColumnMap, Schema, Table};

use crate::{ToolError, name_without_suffix};

/// Inner-join cluster assignments onto a counts table and sum every sample
/// column per cluster. Genes without a counts row drop out; clusters keep
/// their first-appearance order.
pub fn summarize_clusters(cluster_info: &Table, counts: &Table) -> Result<Table, ToolError> {
    Schema::of(&["gene", "cluster"]).validate(cluster_info)?;
    Schema::of(&["gene"]).validate(counts)?;

    // Every counts column after the leading gene key is a sample.
    let sample_columns: Vec<&str> = counts
        .names()
        .iter()
        .skip(1)
        .map(String::as_str)
        .collect();

    let merged = join(cluster_info, counts, &["gene"], &["gene"], JoinKind::Inner)?;
    let summary = aggregate(
        &merged,
        "cluster",
        &sample_columns,
        Reducer::Sum,
        GroupOrder::FirstSeen,
    )?;
    Ok(summary)
}

pub fn aggregate_by_cluster(
    cluster_file: &Path,
    counts_file: &Path,
    output: &Path,
) -> Result<(), ToolError> {
    let cluster_info = read_table(cluster_file, &ReadOptions::csv())?;
    let counts = read_table(counts_file, &ReadOptions::csv())?;

    let summary = summarize_clusters(&cluster_info, &counts)?;
    info!(
        "summed {} genes into {} clusters",
        counts.n_rows(),
        summary.n_rows()
    );
    write_table(output, &summary, &WriteOptions::csv())?;
    Ok(())
}

/// Stack headerless two-column cluster member lists into one table, tagging
/// each row with the cluster label taken from its file name.
pub fn concatenate_clusters(inputs: &[&Path], output: &Path) -> Result<(), ToolError> {
    if inputs.is_empty() {
        return Err(ToolError::NoInputs);
    }

    let options = ReadOptions::tsv().headerless(&["reference", "all"]);
    let mut parts = Vec::with_capacity(inputs.len());
    for path in inputs {
        let table = read_table(path, &options)?;
        let label = name_without_suffix(path, ".tsv");
        parts.push(table.with_constant("cluster", label.into())?);
    }

    let merged = Table::concat(&parts)?;
    write_table(output, &merged, &WriteOptions::tsv())?;
    Ok(())
}

/// Split a coverage table into per-metric tables. Sample columns are found
/// by suffix once, at the header; the shared `Contig` key becomes `gene` in
/// both outputs with values untouched.
pub fn separate_coverm(
    input: &Path,
    reads_output: &Path,
    bases_output: &Path,
) -> Result<(), ToolError> {
    let coverage = read_table(input, &ReadOptions::tsv())?;
    Schema::of(&["Contig"]).validate(&coverage)?;

    for (suffix, output) in [(" Read Count", reads_output), (" Covered Bases", bases_output)] {
        let map = ColumnMap::from_suffix(coverage.names(), suffix);
        info!("{} sample columns matched {suffix:?}", map.len());
        let table = map.extract(&coverage, &["Contig"])?.rename("Contig", "gene")?;
        write_table(output, &table, &WriteOptions::tsv())?;
    }

    Ok(())
}

/// Which side drives the genome/cluster merge. The upstream pipeline has
/// conflicting variants of this stage that disagree on join direction and
/// on which table owns `length`, so both are surfaced here instead of
/// hard-coding one variant.
#[derive(Debug, Clone, Copy)]
pub struct InfoOptions {
    pub join_kind: JoinKind,
}

impl Default for InfoOptions {
    fn default() -> Self {
        Self {
            join_kind: JoinKind::Left,
        }
    }
}

/// Assemble the per-gene pangenome summary: genome membership, secondary
/// cluster, gene length and KO annotation, joined over three keys in turn.
pub fn pangenome_info(
    cdb_file: &Path,
    genomes_file: &Path,
    lengths_file: &Path,
    kofams_file: &Path,
    output: &Path,
    options: InfoOptions,
) -> Result<(), ToolError> {
    let cdb = read_table(cdb_file, &ReadOptions::csv())?;
    let genomes = read_table(genomes_file, &ReadOptions::csv())?;
    let lengths = read_table(lengths_file, &ReadOptions::csv())?;
    let kofams = read_table(kofams_file, &ReadOptions::csv())?;

    Schema::of(&["genome", "secondary_cluster"]).validate(&cdb)?;
    Schema::of(&["genome", "gene", "contig"]).validate(&genomes)?;
    Schema::of(&["contig", "length"]).validate(&lengths)?;
    Schema::of(&["gene", "ko_id", "ko_e"]).validate(&kofams)?;

    // Genome ids in the clustering table carry the assembly extension;
    // cluster ids arrive as bare integers.
    let cdb = normalize_column(&cdb, "genome", &[Rule::strip_suffix(".fna")])?;
    let cdb = normalize_column(&cdb, "secondary_cluster", &[Rule::prefix("cluster")])?;

    let clusters = cdb.select(&["genome", "secondary_cluster"])?;
    let merged = join(&genomes, &clusters, &["genome"], &["genome"], options.join_kind)?;
    let merged = join(&merged, &lengths, &["contig"], &["contig"], JoinKind::Left)?;
    let merged = merged.rename("secondary_cluster", "cluster")?;
    let merged = join(&merged, &kofams, &["gene"], &["gene"], JoinKind::Left)?;

    let final_table = merged.select(&["cluster", "genome", "gene", "length", "ko_id", "ko_e"])?;
    write_table(output, &final_table, &WriteOptions::csv())?;
    Ok(())
}

/// Contig-level pangenome structure: derive the genome from each contig
/// name, attach the primary cluster, and emit the canonical
/// cluster/genome/gene/length table.
pub fn pangenome_structure(
    cdb_file: &Path,
    contig_lengths_file: &Path,
    output: &Path,
) -> Result<(), ToolError> {
    let cdb = read_table(cdb_file, &ReadOptions::csv())?;
    let contig_lengths = read_table(contig_lengths_file, &ReadOptions::csv())?;

    Schema::of(&["genome", "primary_cluster"]).validate(&cdb)?;
    Schema::of(&["Contig", "Length"]).validate(&contig_lengths)?;

    // Contig names embed their genome as `<genome>@<contig>`, with `:`
    // standing in for `_` upstream.
    let contig_lengths = derive_column(
        &contig_lengths,
        "Contig",
        "genome",
        &[Rule::SplitKeep { sep: '@', index: 0 }, Rule::replace(":", "_")],
    )?;
    let cdb = normalize_column(&cdb, "genome", &[Rule::strip_suffix(".fna")])?;
    let cdb = normalize_column(&cdb, "primary_cluster", &[Rule::prefix("cluster")])?;

    let clusters = cdb.select(&["genome", "primary_cluster"])?;
    let merged = join(
        &contig_lengths,
        &clusters,
        &["genome"],
        &["genome"],
        JoinKind::Left,
    )?;

    let merged = merged
        .rename("primary_cluster", "cluster")?
        .rename("Length", "length")?
        .rename("Contig", "gene")?;

    let final_table = merged.select(&["cluster", "genome", "gene", "length"])?;
    write_table(output, &final_table, &WriteOptions::csv())?;
    Ok(())
}
