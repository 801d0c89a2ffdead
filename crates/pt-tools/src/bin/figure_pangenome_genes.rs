#![forbid(unsafe_code)]

use std::path::Path;
use std::process::ExitCode;

use log::error;
use pt_tools::figure_pangenome_genes;

const USAGE: &str = "usage: figure-pangenome-genes <genomes.csv> <genes.tsv>... <out.svg>";

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((out, rest)) = args.split_last() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    let Some((genomes, genes)) = rest.split_first() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    if genes.is_empty() {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    }

    let genes: Vec<&Path> = genes.iter().map(Path::new).collect();
    match figure_pangenome_genes(Path::new(genomes), &genes, Path::new(out)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("figure-pangenome-genes: {err}");
            ExitCode::FAILURE
        }
    }
}
