#![forbid(unsafe_code)]

//! Pipeline stages of the pantab pangenome toolkit.
//!
//! Every stage is a library function over file paths so the binaries stay
//! thin and the stages stay testable. Stages share one control flow: load
//! delimited tables, normalize join keys, join, aggregate, write. Nothing
//! persists between invocations except the output files.

use std::path::Path;

use pt_fasta::FastaError;
use pt_groupby::GroupByError;
use pt_io::IoError;
use pt_join::JoinError;
use pt_normalize::NormalizeError;
use pt_pivot::PivotError;
use pt_render::RenderError;
use pt_table::TableError;
use thiserror::Error;

mod annotate;
mod figures;
mod merge;
mod sequence;

pub use annotate::{KO_EVALUE_MAX, select_ko};
pub use figures::{
    figure_pangenome_counts, figure_pangenome_genes, figure_pangenome_kegg,
    figure_pangenome_reference,
};
pub use merge::{
    InfoOptions, aggregate_by_cluster, concatenate_clusters, pangenome_info,
    pangenome_structure, separate_coverm, summarize_clusters,
};
pub use sequence::{gene_lengths, genome_contig_table, translate_genes};

#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Io(#[from] IoError),
    #[error(transparent)]
    Table(#[from] TableError),
    #[error(transparent)]
    Normalize(#[from] NormalizeError),
    #[error(transparent)]
    Join(#[from] JoinError),
    #[error(transparent)]
    GroupBy(#[from] GroupByError),
    #[error(transparent)]
    Pivot(#[from] PivotError),
    #[error(transparent)]
    Fasta(#[from] FastaError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error("no input files given")]
    NoInputs,
}

/// File name without its last extension; labels for clusters and figure
/// pages come from the file the data arrived in.
#[must_use]
pub fn stem_label(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}

/// File name with a known suffix removed (`strainA.fna` -> `strainA`);
/// names without the suffix pass through whole.
#[must_use]
pub fn name_without_suffix(path: &Path, suffix: &str) -> String {
    let name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned());
    name.strip_suffix(suffix).unwrap_or(&name).to_owned()
}
