#![forbid(unsafe_code)]

use std::path::Path;
use std::process::ExitCode;

use log::error;
use pt_tools::separate_coverm;

const USAGE: &str = "usage: separate-coverm <coverage.tsv> <reads_out.tsv> <bases_out.tsv>";

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [coverage, reads_out, bases_out] = args.as_slice() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match separate_coverm(Path::new(coverage), Path::new(reads_out), Path::new(bases_out)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("separate-coverm: {err}");
            ExitCode::FAILURE
        }
    }
}
