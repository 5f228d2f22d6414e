//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `planning_export` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - User-facing output formatting

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use planning_export::config::{Cli, Command};
use planning_export::initialization::init_logger_with;
use planning_export::{run_export, run_server};

#[tokio::main]
async fn main() -> Result<()> {
    // Backend credentials usually live in .env; fall back to the one next to the binary.
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let cli = Cli::parse();

    init_logger_with(cli.log_level.clone().into(), cli.log_format.clone())
        .context("Failed to initialize logger")?;

    let config = match cli.config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("planning_export error: {}", e);
            process::exit(2);
        }
    };

    match &cli.command {
        Command::Export(args) => match run_export(config, args).await {
            Ok(report) => {
                // Keep stdout clean when the artifact itself went there.
                match &report.path {
                    Some(path) => println!(
                        "✅ Exported {} row{} from {} table{} to {} in {:.1}s",
                        report.total_rows,
                        if report.total_rows == 1 { "" } else { "s" },
                        report.tables.len(),
                        if report.tables.len() == 1 { "" } else { "s" },
                        path.display(),
                        report.elapsed_seconds
                    ),
                    None => eprintln!(
                        "Exported {} rows as {} in {:.1}s",
                        report.total_rows, report.filename, report.elapsed_seconds
                    ),
                }
                Ok(())
            }
            Err(e) => {
                eprintln!("planning_export error: {:#}", e);
                process::exit(1);
            }
        },
        Command::Serve(args) => {
            let serve = match args.serve_config() {
                Ok(serve) => serve,
                Err(e) => {
                    eprintln!("planning_export error: {}", e);
                    process::exit(2);
                }
            };
            if let Err(e) = run_server(config, serve).await {
                eprintln!("planning_export error: {:#}", e);
                process::exit(1);
            }
            Ok(())
        }
    }
}
