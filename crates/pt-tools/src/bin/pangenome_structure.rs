#![forbid(unsafe_code)]

use std::path::Path;
use std::process::ExitCode;

use log::error;
use pt_tools::pangenome_structure;

const USAGE: &str = "usage: pangenome-structure <cdb.csv> <contig_lengths.csv> <out.csv>";

fn main() -> ExitCode {
    env_logger::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let [cdb, contig_lengths, out] = args.as_slice() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match pangenome_structure(Path::new(cdb), Path::new(contig_lengths), Path::new(out)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("pangenome-structure: {err}");
            ExitCode::FAILURE
        }
    }
}
