//! # Summa CLI (`summa`)
//!
//! Starts the summarization relay.
//!
//! ## Usage
//!
//! ```bash
//! summa --config ./config/summa.toml serve
//! summa check-config
//! ```
//!
//! Settings are read from the TOML file (if present), then from the
//! environment: `PORT`, `GEMINI_API_KEY`, `GEMINI_MODEL`. A `.env` file in
//! the working directory is loaded first.

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use summa_relay::{config, server};

/// Summa: summarize text and documents through a remote language model.
#[derive(Parser)]
#[command(name = "summa", version, about)]
struct Cli {
    /// Path to configuration file (TOML). Optional; defaults apply when absent.
    #[arg(long, global = true, default_value = "./config/summa.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP relay (default).
    Serve {
        /// Override `[server].bind`, e.g. `127.0.0.1:8080`.
        #[arg(long)]
        bind: Option<String>,
    },
    /// Validate configuration and print the effective settings.
    CheckConfig,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "summa_relay=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    let mut cfg = config::load_config(&cli.config)?;

    match cli.command.unwrap_or(Commands::Serve { bind: None }) {
        Commands::Serve { bind } => {
            if let Some(bind) = bind {
                cfg.server.bind = bind;
                cfg.validate().context("invalid --bind")?;
            }
            server::run_server(&cfg).await?;
        }
        Commands::CheckConfig => {
            print!("{}", cfg.redacted_summary());
            println!("\nConfiguration OK.");
        }
    }

    Ok(())
}
