//! Hex Tactics - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tactics_core::math::Fixed;
use tactics_tools::simulate::{self, SimulationOptions};
use tactics_tools::validate;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "tactics-tools")]
#[command(about = "Development tools for Hex Tactics")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate scenario files
    Validate {
        /// Scenario file or directory of scenarios
        #[arg(default_value = "assets/scenarios")]
        path: PathBuf,
    },
    /// Play a scenario headless with idle player characters
    Simulate {
        /// Scenario file
        path: PathBuf,
        /// Enemy phases to play
        #[arg(long, default_value_t = 3)]
        rounds: u32,
        /// Seconds per tick
        #[arg(long, default_value_t = 0.1)]
        dt: f64,
        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Validate { path } => {
            tracing::info!("Validating scenarios in: {}", path.display());
            match validate::validate_path(&path) {
                Ok(report) => {
                    for file in &report.files {
                        for error in &file.errors {
                            tracing::error!("{}: {error}", file.path.display());
                        }
                    }
                    if !report.is_ok() {
                        tracing::error!(
                            "Validation failed: {} problem(s) in {} file(s)",
                            report.error_count(),
                            report.files.len()
                        );
                        std::process::exit(1);
                    }
                    tracing::info!("Validation passed ({} file(s))", report.files.len());
                }
                Err(e) => {
                    tracing::error!("Validation failed: {e}");
                    std::process::exit(1);
                }
            }
        }
        Commands::Simulate {
            path,
            rounds,
            dt,
            json,
        } => {
            let options = SimulationOptions {
                rounds,
                dt: Fixed::from_num(dt.max(0.001)),
                ..SimulationOptions::default()
            };
            let result = validate::load_scenario(&path)
                .and_then(|scenario| simulate::run(&scenario, options));
            let summary = match result {
                Ok(summary) => summary,
                Err(e) => {
                    tracing::error!("Simulation failed: {e}");
                    std::process::exit(1);
                }
            };

            for event in &summary.events {
                if json {
                    match serde_json::to_string(event) {
                        Ok(line) => println!("{line}"),
                        Err(e) => {
                            tracing::error!("Cannot encode event: {e}");
                            std::process::exit(1);
                        }
                    }
                } else {
                    println!("{event:?}");
                }
            }
            println!(
                "{}: {} round(s), {} tick(s), {} player(s) and {} enemy(ies) alive",
                summary.scenario,
                summary.rounds_played,
                summary.ticks,
                summary.players_alive,
                summary.enemies_alive
            );
        }
    }
}
