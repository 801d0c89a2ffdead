#![forbid(unsafe_code)]

use std::path::Path;
use std::process::ExitCode;

use log::error;
use pt_tools::figure_pangenome_counts;

const USAGE: &str = "usage: figure-pangenome-counts <clusters.csv> <counts.csv> <out.svg>";

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [clusters, counts, out] = args.as_slice() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match figure_pangenome_counts(Path::new(clusters), Path::new(counts), Path::new(out)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("figure-pangenome-counts: {err}");
            ExitCode::FAILURE
        }
    }
}
