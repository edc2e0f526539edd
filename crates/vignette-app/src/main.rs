//! Vignette CLI entry point.

use clap::Parser;
use std::process;
use vignette_app::Args;

fn main() {
    env_logger::init();
    let args = Args::parse();
    log::debug!("Parsed arguments: {:?}", args);

    if let Err(err) = vignette_app::run(&args) {
        log::error!("{}", err);
        eprintln!("error: {}", err);
        process::exit(1);
    }
}
