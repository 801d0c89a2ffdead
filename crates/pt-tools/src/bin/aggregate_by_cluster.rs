#![forbid(unsafe_code)]

use std::path::Path;
use std::process::ExitCode;

use log::error;
use pt_tools::aggregate_by_cluster;

const USAGE: &str = "usage: aggregate-by-cluster <cluster_info.csv> <counts.csv> <out.csv>";

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [cluster_info, counts, out] = args.as_slice() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match aggregate_by_cluster(Path::new(cluster_info), Path::new(counts), Path::new(out)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("aggregate-by-cluster: {err}");
            ExitCode::FAILURE
        }
    }
}
