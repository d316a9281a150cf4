mod cli;
mod logging;

use clap::Parser;
use std::process;

fn main() {
    let cli = cli::Cli::parse();
    logging::initialize(&cli.log_level, cli.log_format);

    if let Err(err) = cli::run(cli) {
        eprintln!("Error: {err:#}");
        process::exit(1);
    }
}
