//! boardlink CLI
//!
//! Host-side tools around the board connection orchestrator:
//! - Serial port and board enumeration
//! - Inspection and cleanup of the shared connection state
//! - A live autoconnect monitor
//! - Global and per-project configuration

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use boardlink::commands;

#[derive(Parser)]
#[command(name = "boardlink")]
#[command(author, version, about = "Microcontroller board connection manager")]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List serial ports
    Ports {
        /// Only show recognised boards
        #[arg(short, long)]
        boards: bool,
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Inspect or reset the connection state shared between windows
    State {
        /// Path to the state file (defaults to the data directory)
        #[arg(long)]
        path: Option<PathBuf>,

        #[command(subcommand)]
        action: StateAction,
    },

    /// Watch for boards plugged in over USB
    Watch {
        /// Path to the state file (defaults to the data directory)
        #[arg(long)]
        state_path: Option<PathBuf>,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum StateAction {
    /// List claimed boards
    List {
        /// Print the raw records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Remove one claim, or all of them
    Clear {
        /// Board address to release
        address: Option<String>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show current configuration
    Show,
    /// Get specific config value
    Get { key: String },
    /// Set config value
    Set { key: String, value: String },
    /// Create a configuration file
    Init {
        /// Overwrite an existing global config
        #[arg(short, long)]
        force: bool,
        /// Create the project config in this directory instead
        #[arg(short, long)]
        project: Option<PathBuf>,
    },
    /// Show config file path
    Path,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .init();

    let config = cli.config.as_ref();

    match cli.command {
        Commands::Ports { boards, json } => {
            commands::ports_command(config, boards, json).await?;
        }

        Commands::State { path, action } => match action {
            StateAction::List { json } => {
                commands::state_list(config, path.as_ref(), json)?;
            }
            StateAction::Clear { address } => {
                commands::state_clear(path.as_ref(), address.as_deref())?;
            }
        },

        Commands::Watch { state_path } => {
            let cancel = CancellationToken::new();

            let cancel_clone = cancel.clone();
            tokio::spawn(async move {
                match tokio::signal::ctrl_c().await {
                    Ok(()) => {
                        tracing::info!("Received Ctrl+C, stopping...");
                        cancel_clone.cancel();
                    }
                    Err(e) => tracing::warn!("Failed to listen for Ctrl+C: {}", e),
                }
            });

            commands::watch_command(config, state_path.as_ref(), cancel).await?;
        }

        Commands::Config { action } => match action {
            ConfigAction::Show => {
                commands::config_show(config)?;
            }
            ConfigAction::Get { key } => {
                commands::config_get(config, &key)?;
            }
            ConfigAction::Set { key, value } => {
                commands::config_set(config, &key, &value)?;
            }
            ConfigAction::Init { force, project } => match project {
                Some(project) => commands::config_init_project(config, &project)?,
                None => commands::config_init(config, force)?,
            },
            ConfigAction::Path => {
                commands::config_path(config);
            }
        },
    }

    Ok(())
}
