//! Storyline - check, publish and graph branching stories

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = storyline_cli::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
