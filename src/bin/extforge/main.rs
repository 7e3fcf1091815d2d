//! extforge CLI - builds CMake-based native Python extensions

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Commands};

fn main() {
    if let Err(e) = run() {
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    // Parse CLI
    let cli = Cli::parse();

    // Set up logging
    let filter = if cli.global.verbose {
        EnvFilter::new("extforge=debug")
    } else {
        EnvFilter::new("extforge=info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    // Execute command
    match cli.command {
        Commands::BuildExt(args) => commands::build_ext::execute(&cli.global, args),
        Commands::Develop(args) => commands::develop::execute(&cli.global, args),
        Commands::Clean(args) => commands::clean::execute(&cli.global, args),
    }
}
