//! pagekit CLI - build configuration layer for multi-page static sites.
//!
//! Provides commands for:
//! - `build`: Validate `pagekit.toml`, empty the output directory and render all entry pages

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::BuildArgs;
use error::CliError;
use output::Output;

/// pagekit - static site build configuration.
#[derive(Parser)]
#[command(name = "pagekit", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and build the site.
    Build(BuildArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let verbose = matches!(&cli.command, Commands::Build(args) if args.verbose);
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Build(args) => args.execute(),
    };

    if let Err(err) = result {
        report_error(&output, &err);
        std::process::exit(1);
    }
}

/// Print an error, listing every validation failure on its own line.
fn report_error(output: &Output, err: &CliError) {
    let errors = err.validation_errors();
    if errors.is_empty() {
        output.error(&format!("Error: {err}"));
        return;
    }

    output.error(&format!(
        "Error: configuration invalid ({} error(s))",
        errors.len()
    ));
    for error in errors {
        output.error(&format!("  - {error}"));
    }
}
