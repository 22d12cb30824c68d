// varwatch - main.rs
//
// CLI entry point. Handles:
// 1. Argument parsing
// 2. Configuration loading
// 3. Logging initialisation (debug mode support)
// 4. Dispatch to the monitor / extractor / linker
//
// Process exit codes are owned here, not by the core: 0 for success and
// no-data runs, 1 for timeouts, missing dictionaries, and errors.

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use varwatch::app::config::{load_config, AppConfig};
use varwatch::app::monitor::{Monitor, MonitorOutcome};
use varwatch::app::workspace::RenameProbe;
use varwatch::util::constants;
use varwatch::util::error::{Result, VarwatchError};
use varwatch::{core, util};

/// varwatch - watches a static analyser's log output and extracts the
/// variable data dictionary.
#[derive(Parser, Debug)]
#[command(name = "varwatch", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to config.toml (defaults to ./config.toml when present).
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch a running analysis and extract the variable table when the
    /// log completes.
    Monitor {
        /// Directory the variable table is written into.
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },

    /// Extract the variable table once from an existing log file.
    Extract {
        /// Path of the log file to parse.
        #[arg(short = 'l', long = "log")]
        log: PathBuf,

        /// Directory the variable table is written into.
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },

    /// Cross-reference an extracted variable table against a C source file
    /// and attach source comments.
    Link {
        /// Path of the C source file.
        #[arg(short = 's', long = "source")]
        source: PathBuf,

        /// Path of the extracted variable table CSV.
        #[arg(short = 't', long = "table")]
        table: PathBuf,

        /// Directory the linked table is written into.
        #[arg(short = 'o', long = "output")]
        output: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    // Config must load before logging so the [logging] level can apply;
    // warnings are replayed once the subscriber is up.
    let (config, config_warnings) = load_config(cli.config.as_deref());
    util::logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = constants::APP_VERSION,
        debug = cli.debug,
        "varwatch starting"
    );
    for warning in &config_warnings {
        tracing::warn!("{warning}");
    }

    let code = match run(cli.command, config) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!(error = %e, "Run failed");
            eprintln!("Error: {e}");
            1
        }
    };
    std::process::exit(code);
}

fn run(command: Command, config: AppConfig) -> Result<i32> {
    match command {
        Command::Monitor { output } => {
            let mut monitor = Monitor::new(config, output, Box::new(RenameProbe));
            match monitor.run()? {
                MonitorOutcome::Completed { output, variables } => {
                    println!(
                        "Extracted {variables} variable(s) to {}",
                        output.display()
                    );
                    Ok(0)
                }
                MonitorOutcome::NoData => {
                    eprintln!("Analysis completed without variable declarations; no table written");
                    Ok(0)
                }
                MonitorOutcome::TimedOut { waited_secs } => {
                    eprintln!("No running analysis found after {waited_secs}s");
                    Ok(1)
                }
            }
        }

        Command::Extract { log, output } => {
            let content = std::fs::read_to_string(&log).map_err(|e| VarwatchError::Io {
                path: log.clone(),
                operation: "reading log file",
                source: e,
            })?;
            let lines: Vec<&str> = content.lines().collect();

            match core::extract::extract(&lines)? {
                Some(extraction) if !extraction.table.is_empty() => {
                    std::fs::create_dir_all(&output).map_err(|e| VarwatchError::Io {
                        path: output.clone(),
                        operation: "creating output directory",
                        source: e,
                    })?;
                    let path = output.join(constants::OUTPUT_FILE_NAME);
                    let count = core::export::write_table_file(&extraction.table, &path)?;
                    println!("Extracted {count} variable(s) to {}", path.display());
                    Ok(0)
                }
                _ => {
                    eprintln!(
                        "No complete data dictionary in '{}'; no table written",
                        log.display()
                    );
                    Ok(1)
                }
            }
        }

        Command::Link {
            source,
            table,
            output,
        } => {
            let summary = core::link::link(&source, &table, &output)?;
            println!(
                "Linked {}/{} variable(s) to {}",
                summary.linked,
                summary.variables,
                summary.output.display()
            );
            Ok(0)
        }
    }
}
