use std::path::PathBuf;

use clap::{Parser, Subcommand};
use relacs::{EngineContext, EngineSettings};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "relacs", about = "Closed-loop electrophysiology acquisition and stimulation core")]
struct Cli {
    /// Path to the settings file (falls back to defaults if absent).
    #[arg(long, env = "RELACS_SETTINGS_FILE", default_value = "relacs.toml")]
    settings: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Bootstraps a simulated engine and runs a macro file through it.
    Run {
        /// Path to the macro file. Overrides `macros_file` from settings.
        #[arg(long)]
        macros: Option<PathBuf>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let settings = match EngineSettings::load(&cli.settings) {
        Ok(settings) => settings,
        Err(err) => {
            error!(%err, "failed to load settings, using defaults");
            EngineSettings::default()
        }
    };

    match cli.command {
        Command::Run { macros } => {
            let macros_path = macros.unwrap_or_else(|| settings.macros_file.clone());
            let mut context = match EngineContext::bootstrap(&settings) {
                Ok(context) => context,
                Err(err) => {
                    error!(%err, "failed to bootstrap engine context");
                    std::process::exit(1);
                }
            };
            match context.run_macro_file(&macros_path) {
                Ok(executed) => info!(count = executed.len(), "macro file run to completion"),
                Err(err) => {
                    error!(%err, path = %macros_path.display(), "macro run failed");
                    std::process::exit(1);
                }
            }
        }
    }
}
