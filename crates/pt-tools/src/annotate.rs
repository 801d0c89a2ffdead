use std::path::Path;

use log::info;
use pt_groupby::select_min;
use pt_io::{Delimiter, ReadOptions, WriteOptions, read_table, write_table};
use pt_table::Column;
use pt_types::coerce_numeric;

use crate::ToolError;

/// Annotations weaker than this e-value are discarded after per-query
/// selection.
pub const KO_EVALUE_MAX: f64 = 1e-5;

/// Reduce a raw KO annotation hit table to one best hit per query gene.
///
/// The input is whitespace-delimited with `#` comment lines and positional
/// columns {0: ko_id, 2: query, 4: evalue}. Unparseable e-values exclude
/// their rows rather than erroring; queries whose best hit exceeds
/// [`KO_EVALUE_MAX`] are dropped.
pub fn select_ko(input: &Path, output: &Path) -> Result<(), ToolError> {
    let options = ReadOptions {
        delimiter: Delimiter::Whitespace,
        ..ReadOptions::default()
    }
    .headerless(&["ko_id", "query", "evalue"])
    .usecols(&[0, 2, 4])
    .comment(b'#');

    let hits = read_table(input, &options)?;

    // Coerce e-values up front so the minimum selection sees numbers or
    // missing, never strings.
    let evalues = Column::from_values(
        hits.require_column("evalue")?
            .values()
            .iter()
            .map(coerce_numeric)
            .collect(),
    );
    let hits = hits.drop_column("evalue")?.with_column("evalue", evalues)?;

    let best = select_min(&hits, "query", "evalue")?;
    let kept = best.filter_by("evalue", |value| {
        matches!(value.to_f64(), Ok(v) if v <= KO_EVALUE_MAX)
    })?;
    info!(
        "kept {} of {} best hits under e-value {KO_EVALUE_MAX:e}",
        kept.n_rows(),
        best.n_rows()
    );

    let out = kept.rename("query", "gene")?.rename("evalue", "ko_e")?;
    write_table(
        output,
        &out,
        &WriteOptions::tsv().columns(&["gene", "ko_id", "ko_e"]),
    )?;
    Ok(())
}
