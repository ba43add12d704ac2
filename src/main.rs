#![forbid(unsafe_code)]

//! svcmon: systemd unit dashboard CLI entry point.

use clap::Parser;
use colored::Colorize;

mod cli_app;

fn main() {
    let args = cli_app::Cli::parse();
    if let Err(e) = cli_app::run(&args) {
        eprintln!("{} {e}", "svcmon:".red().bold());
        std::process::exit(e.exit_code());
    }
}
