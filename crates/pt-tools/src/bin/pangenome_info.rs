#![forbid(unsafe_code)]

use std::path::Path;
use std::process::ExitCode;

use log::error;
use pt_tools::{InfoOptions, pangenome_info};

const USAGE: &str =
    "usage: pangenome-info [--join left|right] <cdb.csv> <genomes.csv> <lengths.csv> <kofams.csv> <out.csv>";

fn main() -> ExitCode {
    env_logger::init();

    let mut options = InfoOptions::default();
    let mut positional = Vec::new();

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        if arg == "--join" {
            let Some(value) = args.next() else {
                eprintln!("{USAGE}");
                return ExitCode::from(2);
            };
            options.join_kind = match value.as_str() {
                "left" => pt_join::JoinKind::Left,
                "right" => pt_join::JoinKind::Right,
                _ => {
                    eprintln!("{USAGE}");
                    return ExitCode::from(2);
                }
            };
        } else {
            positional.push(arg);
        }
    }

    let [cdb, genomes, lengths, kofams, out] = positional.as_slice() else {
        eprintln!("{USAGE}");
        return ExitCode::from(2);
    };

    match pangenome_info(
        Path::new(cdb),
        Path::new(genomes),
        Path::new(lengths),
        Path::new(kofams),
        Path::new(out),
        options,
    ) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("pangenome-info: {err}");
            ExitCode::FAILURE
        }
    }
}
