#![forbid(unsafe_code)]

use std::path::Path;
use std::process::ExitCode;

use log::error;
use pt_tools::gene_lengths;

const USAGE: &str = "usage: gene-lengths <genes.fna> <out.csv>";

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [genes, out] = args.as_slice() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match gene_lengths(Path::new(genes), Path::new(out)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("gene-lengths: {err}");
            ExitCode::FAILURE
        }
    }
}
