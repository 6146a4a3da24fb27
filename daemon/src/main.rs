//! Agora daemon — replays moderation governance command journals.

mod config;
mod script;

use std::fs::File;
use std::io::{self, BufReader};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use agora_governance::GovernanceFacade;
use agora_nullables::NullClock;
use agora_types::AccountId;
use agora_utils::{format_duration, init_logging, LogFormat};

use crate::config::DaemonConfig;
use crate::script::ReplayFacade;

#[derive(Parser)]
#[command(name = "agora-daemon", about = "Agora moderation governance daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "AGORA_CONFIG")]
    config: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "AGORA_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "AGORA_LOG_FORMAT")]
    log_format: Option<String>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run a JSON-lines command journal and print every event as JSON.
    Replay {
        /// Journal file; "-" reads standard input.
        #[arg(long = "script", default_value = "-")]
        journal: String,

        /// Start from a saved state instead of the configured genesis.
        #[arg(long)]
        resume: Option<PathBuf>,

        /// Write the final state here when the journal is done.
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Print the effective governance parameters as JSON.
    Params,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match cli.config {
        Some(ref path) => DaemonConfig::from_toml_file(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.log_level = level;
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }

    let format: LogFormat = config
        .log_format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;
    init_logging(format, &config.log_level);
    if let Some(ref path) = cli.config {
        tracing::info!("Loaded config from {}", path.display());
    }

    let params = config.effective_params()?;

    match cli.command {
        Command::Params => {
            println!("{}", serde_json::to_string_pretty(&params)?);
        }
        Command::Replay {
            journal,
            resume,
            save,
        } => {
            let clock = Arc::new(NullClock::new(config.start_time));
            let facade: ReplayFacade = match resume {
                Some(path) => {
                    let bytes = std::fs::read(&path)
                        .with_context(|| format!("reading state {}", path.display()))?;
                    let facade = GovernanceFacade::load_state(&bytes, clock)?;
                    if facade.params()? != params {
                        tracing::warn!("saved state carries its own parameters; config ignored");
                    }
                    facade
                }
                None => {
                    let facade = GovernanceFacade::new(params, clock)?;
                    for allocation in &config.genesis {
                        let account = AccountId::parse(&allocation.account)?;
                        facade.mint(&account, allocation.amount as u128)?;
                    }
                    facade
                }
            };
            let started = facade.now();

            let stdout = io::stdout().lock();
            let summary = if journal == "-" {
                script::replay(&facade, io::stdin().lock(), stdout)?
            } else {
                let file =
                    File::open(&journal).with_context(|| format!("opening journal {journal}"))?;
                script::replay(&facade, BufReader::new(file), stdout)?
            };

            let elapsed = started.elapsed_since(facade.now());
            tracing::info!(
                commands = summary.commands,
                rejected = summary.rejected,
                simulated = %format_duration(elapsed),
                "journal complete"
            );

            if let Some(path) = save {
                let bytes = facade.save_state()?;
                std::fs::write(&path, bytes)
                    .with_context(|| format!("writing state {}", path.display()))?;
                tracing::info!("Saved state to {}", path.display());
            }
        }
    }

    Ok(())
}
