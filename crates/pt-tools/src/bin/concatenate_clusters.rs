#![forbid(unsafe_code)]

use std::path::Path;
use std::process::ExitCode;

use log::error;
use pt_tools::concatenate_clusters;

const USAGE: &str = "usage: concatenate-clusters <cluster.tsv>... <out.tsv>";

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some((out, inputs)) = args.split_last() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };
    if inputs.is_empty() {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    }

    let inputs: Vec<&Path> = inputs.iter().map(Path::new).collect();
    match concatenate_clusters(&inputs, Path::new(out)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("concatenate-clusters: {err}");
            ExitCode::FAILURE
        }
    }
}
