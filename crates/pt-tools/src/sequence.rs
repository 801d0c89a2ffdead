use std::path::Path;

use log::info;
use pt_fasta::{Record, read_fasta, write_fasta};
use pt_io::{WriteOptions, write_table};
use pt_table::Table;
use pt_types::Scalar;

use crate::{ToolError, name_without_suffix};

/// One row per FASTA record: `gene, length`.
pub fn gene_lengths(input: &Path, output: &Path) -> Result<(), ToolError> {
    let records = read_fasta(input)?;

    let rows = records
        .iter()
        .map(|record| {
            vec![
                Scalar::Utf8(record.id.clone()),
                Scalar::Int64(record.len() as i64),
            ]
        })
        .collect();
    let table = Table::from_rows(vec!["gene".into(), "length".into()], rows)?;

    write_table(output, &table, &WriteOptions::csv())?;
    Ok(())
}

/// One row per contig across all input assemblies: `genome, contig`, with
/// the genome name taken from the file name minus its `.fna` extension.
pub fn genome_contig_table(inputs: &[&Path], output: &Path) -> Result<(), ToolError> {
    if inputs.is_empty() {
        return Err(ToolError::NoInputs);
    }

    let mut rows = Vec::new();
    for path in inputs {
        let genome = name_without_suffix(path, ".fna");
        for record in read_fasta(path)? {
            rows.push(vec![Scalar::Utf8(genome.clone()), Scalar::Utf8(record.id)]);
        }
    }
    info!("collected {} contigs from {} assemblies", rows.len(), inputs.len());

    let table = Table::from_rows(vec!["genome".into(), "contig".into()], rows)?;
    write_table(output, &table, &WriteOptions::csv())?;
    Ok(())
}

/// Translate every coding sequence to amino acids, stopping at the first
/// stop codon. Headers keep their ids and lose their descriptions.
pub fn translate_genes(input: &Path, output: &Path) -> Result<(), ToolError> {
    let records = read_fasta(input)?;

    let translated: Vec<Record> = records
        .into_iter()
        .map(|record| Record {
            id: record.id,
            desc: String::new(),
            seq: pt_fasta::translate_to_stop(&record.seq),
        })
        .collect();

    write_fasta(output, &translated)?;
    Ok(())
}
