#![forbid(unsafe_code)]

use std::path::Path;
use std::process::ExitCode;

use log::error;
use pt_tools::figure_pangenome_kegg;

const USAGE: &str =
    "usage: figure-pangenome-kegg <genomes.csv> <cluster_info.csv> <genes.tsv>... <out.svg>";

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.len() < 4 {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    }
    let genomes = Path::new(&args[0]);
    let cluster_info = Path::new(&args[1]);
    let out = Path::new(&args[args.len() - 1]);
    let genes: Vec<&Path> = args[2..args.len() - 1].iter().map(Path::new).collect();

    match figure_pangenome_kegg(genomes, cluster_info, &genes, out) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("figure-pangenome-kegg: {err}");
            ExitCode::FAILURE
        }
    }
}
