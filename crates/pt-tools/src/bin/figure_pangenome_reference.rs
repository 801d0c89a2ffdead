#![forbid(unsafe_code)]

use std::path::Path;
use std::process::ExitCode;

use log::error;
use pt_tools::figure_pangenome_reference;

const USAGE: &str = "usage: figure-pangenome-reference <genomes.csv> <genes.tsv> <out.svg>";

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [genomes, genes, out] = args.as_slice() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match figure_pangenome_reference(Path::new(genomes), Path::new(genes), Path::new(out)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("figure-pangenome-reference: {err}");
            ExitCode::FAILURE
        }
    }
}
