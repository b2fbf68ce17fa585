use clap::{Parser, Subcommand};
use federation_scanner::config::{AppConfig, load_config};
use federation_scanner::export::write_address_points;
use federation_scanner::federation::LiveNetwork;
use federation_scanner::geo::{geo_scan, slice_lines};
use federation_scanner::record::RECORD_LINE_HEADER;
use federation_scanner::scan::scan;
use federation_scanner::source::{
    CandidateSet, load_destinations, load_hostnames_file, load_shodan_entries, load_shodan_file,
};
use federation_scanner::{ProbeClient, Prober, RecordStore};
use rustls::crypto::{self, CryptoProvider};
use std::path::PathBuf;
use std::process::exit;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Discover and fingerprint Matrix federation servers.
#[derive(Debug, Parser)]
#[command(name = "federation-scanner", version, about, long_about = None)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(long, default_value = "config.yaml", global = true)]
    config: PathBuf,

    /// Override the worker count of the selected command.
    #[arg(long, global = true)]
    workers: Option<usize>,

    /// Override `data_directory`.
    #[arg(long = "data-dir", global = true)]
    data_dir: Option<PathBuf>,

    /// Override `destinations.limit`.
    #[arg(long, global = true)]
    limit: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Resolve every candidate hostname and store the federation servers found.
    Resolve,
    /// Probe Shodan hits on the federation port and export their coordinates.
    Geo {
        /// Only handle one fixed-size slice of the export.
        #[arg(long)]
        slice: Option<usize>,
    },
    /// Probe a single candidate and print the record as JSON.
    Probe { candidate: String },
}

fn initialize_standard_tracing() {
    let default_directives = "federation_scanner=info,hyper=warn,sea_orm=warn";
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    let registry = tracing_subscriber::registry().with(env_filter);
    let layer = fmt::layer().with_target(true).with_level(true);

    registry.with(layer).init();
}

fn load_config_or_exit(cli: &Cli) -> AppConfig {
    let mut config = match load_config(&cli.config) {
        Ok(config) => config,
        Err(e) => {
            error!(error = %e, path = %cli.config.display(), "invalid configuration");
            exit(1);
        }
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_directory = data_dir.clone();
    }
    if let Some(limit) = cli.limit {
        config.destinations.limit = Some(limit);
    }
    if let Some(workers) = cli.workers {
        config.settings.hs_workers = workers;
        config.settings.shodan_workers = workers;
    }
    if let Err(e) = config.validate() {
        error!(error = %e, "invalid configuration");
        exit(1);
    }
    config
}

fn live_network() -> color_eyre::Result<LiveNetwork> {
    LiveNetwork::from_system()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to build DNS resolver: {e}"))
}

async fn gather_candidates(config: &AppConfig) -> color_eyre::Result<CandidateSet> {
    let mut candidates = CandidateSet::new();

    let hostnames_path = config.hostnames_path();
    match load_hostnames_file(&hostnames_path)? {
        Some(hostnames) => {
            let added = candidates.extend(hostnames);
            info!(added, path = %hostnames_path.display(), "loaded hostnames file");
        }
        None => warn!(path = %hostnames_path.display(), "hostnames file not found"),
    }

    let shodan_path = config.shodan_path();
    if let Some(ips) = load_shodan_file(&shodan_path)? {
        let added = candidates.extend(ips);
        info!(added, path = %shodan_path.display(), "loaded Shodan export");
    }

    if config.destinations.enabled
        && let Some(database_url) = config.destinations.database_url.as_deref()
        && let Some(destinations) =
            load_destinations(database_url, config.destinations.limit).await?
    {
        let added = candidates.extend(destinations);
        info!(added, "loaded federation destinations");
    }

    Ok(candidates)
}

async fn run_resolve(config: &AppConfig) -> color_eyre::Result<()> {
    let candidates = gather_candidates(config).await?;
    if candidates.is_empty() {
        println!("No hostnames found");
        exit(1);
    }

    let database_path = config.database_path();
    let store = match RecordStore::open(&database_path).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, path = %database_path.display(), "failed to open record store");
            exit(1);
        }
    };

    let prober = Arc::new(ProbeClient::new(live_network()?));
    let records = scan(prober, candidates, config.settings.hs_workers).await;

    if config.settings.debug {
        info!("{RECORD_LINE_HEADER}");
        for record in &records {
            info!("{}", record.to_line());
        }
    }

    store.upsert_all(&records).await?;
    store.purge_ip_duplicates().await?;
    info!(stored = store.count().await?, "resolve finished");
    Ok(())
}

async fn run_geo(config: &AppConfig, slice: Option<usize>) -> color_eyre::Result<()> {
    let shodan_path = config.shodan_path();
    let Some(mut entries) = load_shodan_entries(&shodan_path)? else {
        error!(path = %shodan_path.display(), "Shodan file does not exist");
        exit(1);
    };
    if let Some(index) = slice {
        entries = slice_lines(entries, index);
        info!(slice = index, entries = entries.len(), "processing export slice");
    }

    let points = geo_scan(entries, config.settings.shodan_workers).await;
    write_address_points(&config.web_data_path(), &points)?;
    Ok(())
}

async fn run_probe(candidate: &str) -> color_eyre::Result<()> {
    let prober = ProbeClient::new(live_network()?);
    match prober.probe(candidate).await {
        Some(record) => println!("{}", serde_json::to_string_pretty(&record)?),
        None => println!("{candidate}: not a federation server"),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> color_eyre::eyre::Result<()> {
    color_eyre::install()?;
    dotenvy::dotenv().ok();
    initialize_standard_tracing();

    if CryptoProvider::install_default(crypto::ring::default_provider()).is_err() {
        warn!("a rustls crypto provider was already installed");
    }

    let cli = Cli::parse();
    let config = load_config_or_exit(&cli);

    match &cli.command {
        Command::Resolve => run_resolve(&config).await,
        Command::Geo { slice } => run_geo(&config, *slice).await,
        Command::Probe { candidate } => run_probe(candidate).await,
    }
}
