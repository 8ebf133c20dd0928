mod cli;
mod commands;

use cli::{Cli, Commands};
use commands::{generate, levels};
use tracing_subscriber::EnvFilter;

/// Install the log subscriber; `RUST_LOG` wins over the verbosity flag.
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn,mapforge=info",
        1 => "info,mapforge=debug",
        _ => "debug,mapforge=trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub fn run() -> anyhow::Result<()> {
    use clap::Parser;

    let cli = Cli::parse();
    init_logging(cli.verbose);
    match &cli.command {
        Commands::Generate(args) => generate::run(&cli, args),
        Commands::Levels(args) => levels::run(&cli, args),
    }
}

fn main() -> anyhow::Result<()> { run() }
