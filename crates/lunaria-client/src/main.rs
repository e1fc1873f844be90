//! Lunaria Client entry point.
//!
//! ```text
//! main()
//!  └─ load client.toml, init tracing
//!  └─ subcommand
//!       ├─ discover  -> DiscoverSeedsUseCase (listener, then scanner)
//!       ├─ sync      -> SyncPhotosUseCase against an explicit URL
//!       ├─ pull      -> discover, select one seed, sync from it
//!       └─ init      -> write a default client.toml
//! ```

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use lunaria_client::application::discover_seeds::{select_seed, DiscoverSeedsUseCase};
use lunaria_client::application::sync_photos::{SyncPhotosUseCase, SyncTarget};
use lunaria_client::infrastructure::http::{HttpProber, SeedApiClient};
use lunaria_client::infrastructure::network::enumerator::{
    DefaultRouteEnumerator, NetworkEnumerator, StaticNetwork,
};
use lunaria_client::infrastructure::network::listener::UdpAnnouncementListener;
use lunaria_client::infrastructure::network::scanner::ActiveScanner;
use lunaria_client::infrastructure::storage::config::{
    config_file_path, load_config, save_config, ClientConfig,
};
use lunaria_core::DiscoveredSeed;

/// Lunaria client: find seeds on the LAN and archive their photos.
#[derive(Debug, Parser)]
#[command(name = "lunaria-client", version, about)]
struct Cli {
    /// Path of the client configuration file (defaults to the platform
    /// config directory).
    #[arg(long, env = "LUNARIA_CLIENT_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// List the seeds reachable on the local network.
    Discover {
        /// Budget of the whole discovery session.
        #[arg(long)]
        timeout_ms: Option<u64>,
    },
    /// Download a seed's photos from an explicit API URL.
    Sync {
        /// Seed API base URL, e.g. http://192.168.1.40:4269
        #[arg(long)]
        url: String,
        #[command(flatten)]
        opts: SyncOpts,
    },
    /// Discover seeds, pick one by id or name, and download its photos.
    Pull {
        /// Seed id (`seed-xxxxxxxx`) or unique name.
        #[arg(long)]
        seed: String,
        #[arg(long)]
        timeout_ms: Option<u64>,
        #[command(flatten)]
        opts: SyncOpts,
    },
    /// Write a configuration file with every default filled in.
    Init {
        /// Replace an existing file.
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, clap::Args)]
struct SyncOpts {
    /// Local download directory.
    #[arg(long)]
    dir: Option<PathBuf>,
    /// Re-download files that already exist locally.
    #[arg(long)]
    overwrite: bool,
    /// Maximum concurrent downloads.
    #[arg(long)]
    concurrency: Option<usize>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config_path = match cli.config {
        Some(path) => path,
        None => config_file_path()?,
    };
    let config = load_config(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    // Initialise structured logging.  `RUST_LOG` wins over the config file.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.client.log_level)),
        )
        .init();

    match cli.command {
        Command::Discover { timeout_ms } => {
            let seeds = discover(&config, timeout_ms).await?;
            print_seeds(&seeds);
        }
        Command::Sync { url, opts } => {
            run_sync(&config, &url, opts).await?;
        }
        Command::Pull {
            seed,
            timeout_ms,
            opts,
        } => {
            let seeds = discover(&config, timeout_ms).await?;
            let chosen = select_seed(&seeds, &seed)?;
            info!(
                "selected seed {} ({}) at {}",
                chosen.identity.name,
                chosen.seed_id(),
                chosen.address
            );
            run_sync(&config, &chosen.base_url(), opts).await?;
        }
        Command::Init { force } => {
            if config_path.exists() && !force {
                anyhow::bail!(
                    "{} already exists; pass --force to overwrite it",
                    config_path.display()
                );
            }
            save_config(&config_path, &ClientConfig::default())
                .with_context(|| format!("writing {}", config_path.display()))?;
            info!("wrote {}", config_path.display());
        }
    }
    Ok(())
}

async fn discover(config: &ClientConfig, timeout_ms: Option<u64>) -> anyhow::Result<Vec<DiscoveredSeed>> {
    let listener = UdpAnnouncementListener::new(config.discovery.listen_addr()?);

    let enumerator: Box<dyn NetworkEnumerator> = match config.scan.network_override()? {
        Some(network) => Box::new(StaticNetwork(network)),
        None => Box::new(DefaultRouteEnumerator),
    };
    let prober = HttpProber::new(
        config.scan.api_port,
        config.scan.probe_timeout()?,
        config.scan.connect_timeout(),
    );
    let scanner = ActiveScanner::new(enumerator, config.scan.fallback()?, prober);

    let total = timeout_ms
        .map(Duration::from_millis)
        .unwrap_or_else(|| config.discovery.total_timeout());
    Ok(DiscoverSeedsUseCase::new(listener, scanner).discover(total).await)
}

async fn run_sync(config: &ClientConfig, url: &str, opts: SyncOpts) -> anyhow::Result<()> {
    let target = SyncTarget::new(
        url,
        opts.dir.unwrap_or_else(|| config.sync.download_dir.clone()),
        opts.overwrite || config.sync.overwrite,
    )?;
    let source = SeedApiClient::for_target(&target, config.scan.connect_timeout())?
        .with_request_timeout(config.sync.request_timeout()?)
        .with_idle_timeout(config.sync.idle_timeout()?);
    let use_case = SyncPhotosUseCase::new(source)
        .with_concurrency(opts.concurrency.unwrap_or(config.sync.concurrency));

    let report = use_case.sync(&target).await?;
    println!(
        "{} downloaded, {} skipped -> {}",
        report.downloaded,
        report.skipped,
        target.local_dir.display()
    );
    Ok(())
}

fn print_seeds(seeds: &[DiscoveredSeed]) {
    if seeds.is_empty() {
        println!("no seeds found");
        return;
    }
    for (i, seed) in seeds.iter().enumerate() {
        let id = &seed.identity;
        println!(
            "{}. {} [{}] at {}:{}  location: {}  owner: {}",
            i + 1,
            id.name,
            id.seed_id,
            seed.address,
            id.port,
            id.location,
            id.owner
        );
    }
}
