//! modup - Dependency updater CLI for module-graph projects
//!
//! Scans ES module imports, import maps, and the lockfile for outdated
//! jsr/npm/remote dependencies, then reports, writes, or commits updates.

use clap::Parser;
use modup::cli::CliArgs;
use modup::orchestrator::Orchestrator;
use modup::output::{create_formatter, OutputConfig};
use std::io::{self, Write};
use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    let args = CliArgs::parse();

    match run(args).await {
        Ok(exit_code) => exit_code,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Main application logic
async fn run(args: CliArgs) -> anyhow::Result<ExitCode> {
    if args.verbose {
        eprintln!("modup v{}", env!("CARGO_PKG_VERSION"));
        eprintln!("Root: {}", args.root.display());
    }

    let orchestrator = Orchestrator::new(args.clone());
    let report = orchestrator.run().await?;

    let output_config = OutputConfig::from_cli(args.json, args.verbose, args.quiet);
    let formatter = create_formatter(output_config);

    let mut stdout = io::stdout().lock();
    formatter.format(&report, &mut stdout)?;
    stdout.flush()?;

    if report.failures.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        // Partial success - some requirements could not be resolved
        Ok(ExitCode::from(2))
    }
}
