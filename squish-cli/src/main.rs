// squish-cli/src/main.rs
//
// Entry point of the `squish` binary: parse arguments, set up logging,
// dispatch to the subcommand and map failures to exit code 1.

use clap::Parser;
use console::style;
use squish_cli::{Cli, Commands, logging, run_check, run_compress, run_probe};
use std::process;

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    let result = match cli.command {
        Commands::Compress(args) => run_compress(args, cli.json),
        Commands::Probe(args) => run_probe(args, cli.json),
        Commands::Check(args) => run_check(args, cli.json),
    };

    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        for cause in e.chain().skip(1) {
            eprintln!("  {} {}", style("Caused by:").red(), cause);
        }
        process::exit(1);
    }
}
