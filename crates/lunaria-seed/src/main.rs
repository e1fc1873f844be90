//! Lunaria Seed entry point.
//!
//! Two subcommands:
//!
//! - `register` – creates `seed.toml` with a fresh seed id.
//! - `announce` – loads `seed.toml` and broadcasts the seed's identity on the
//!   discovery port until Ctrl-C.
//!
//! Photo capture and the photo HTTP API run as separate processes.

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use lunaria_seed::application::register_seed::{register, RegistrationRequest};
use lunaria_seed::infrastructure::announcer::{AnnouncerConfig, SeedAnnouncer};
use lunaria_seed::infrastructure::storage::config::{
    load_config, save_config, SeedConfig, DEFAULT_CONFIG_FILE,
};

/// Lunaria seed: register this device and announce it on the LAN.
#[derive(Debug, Parser)]
#[command(name = "lunaria-seed", version, about)]
struct Cli {
    /// Path of the seed configuration file.
    #[arg(long, env = "LUNARIA_SEED_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Register a new seed and write its configuration file.
    Register {
        /// Plant name, e.g. "Kitchen Basil".
        #[arg(long)]
        name: String,
        /// Location label, e.g. "Kitchen".
        #[arg(long, default_value = "")]
        location: String,
        /// Owner label.
        #[arg(long, default_value = "")]
        owner: String,
        /// Port of the photo HTTP API.
        #[arg(long)]
        port: Option<u16>,
        /// Directory the capture job writes photos into.
        #[arg(long)]
        photos_dir: Option<PathBuf>,
        /// Replace an existing registration (the seed gets a new id).
        #[arg(long)]
        force: bool,
    },
    /// Broadcast this seed's identity until interrupted.
    Announce {
        /// Override the configured announcement interval.
        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialise structured logging.  Level is overridden by `RUST_LOG`.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Register {
            name,
            location,
            owner,
            port,
            photos_dir,
            force,
        } => {
            if cli.config.exists() && !force {
                anyhow::bail!(
                    "{} already exists; pass --force to re-register this seed",
                    cli.config.display()
                );
            }
            let registration = register(RegistrationRequest {
                name,
                location,
                owner,
                port,
                photos_dir,
            })?;
            let config = SeedConfig::from_registration(registration);
            save_config(&cli.config, &config)
                .with_context(|| format!("writing {}", cli.config.display()))?;
            info!(
                "seed registered with id {} ({})",
                config.seed.seed_id,
                cli.config.display()
            );
        }
        Command::Announce { interval_secs } => {
            let mut config = load_config(&cli.config)?;
            if let Some(secs) = interval_secs {
                config.announce.interval_secs = secs;
            }
            run_announcer(&config).await?;
        }
    }
    Ok(())
}

async fn run_announcer(config: &SeedConfig) -> anyhow::Result<()> {
    if !config.seed.expose_api {
        warn!("photo API is disabled for this seed; clients will see it but cannot sync");
    }

    let target = config.announce.target()?;
    let mut announcer = SeedAnnouncer::bind(AnnouncerConfig {
        interval: config.announce.interval()?,
        ..Default::default()
    })
    .await
    .context("opening announcer socket")?;
    announcer.start(config.identity(), target)?;

    info!("Lunaria seed announcing.  Press Ctrl-C to exit.");
    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;

    info!("shutdown signal received");
    announcer.close();
    Ok(())
}
