use std::path::Path;
use std::sync::Arc;

use clap::Parser;
use nodenexus_dashboard::dashboard::{self, DashboardConfig};
use nodenexus_dashboard::view_state::{FileStorage, KeyValueStore, MemoryStorage, ScopedStorage};
use tracing::{error, info, warn};
use tracing_appender::rolling;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<String>,
}

fn init_logging(log_dir: &Path) {
    // Log to a file: JSON format, daily rotation
    let file_appender = rolling::daily(log_dir, "server-list.log");
    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .json();

    // stdout carries the rendered list, so human-readable logs go to stderr
    let stderr_layer = fmt::layer().with_writer(std::io::stderr);

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer)
        .init();
}

fn open_storage(config: &DashboardConfig) -> ScopedStorage {
    let device: Arc<dyn KeyValueStore> = match FileStorage::open(config.device_storage_path()) {
        Ok(storage) => Arc::new(storage),
        Err(e) => {
            warn!(error = %e, "Device storage unavailable, layout preference will not survive restarts.");
            Arc::new(MemoryStorage::new())
        }
    };
    // Session scope lives as long as the process.
    ScopedStorage::new(Arc::new(MemoryStorage::new()), device)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let args = Args::parse();

    let config = match DashboardConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load dashboard configuration: {e}");
            return Err(e.into());
        }
    };

    init_logging(&config.log_dir);
    info!(
        version = env!("CARGO_PKG_VERSION"),
        snapshot = %config.snapshot_path.display(),
        "Starting server list."
    );
    rust_i18n::set_locale(&config.locale);

    let storage = open_storage(&config);
    if let Err(e) = dashboard::run(config, storage).await {
        error!(error = %e, "Server list stopped with an error.");
        return Err(e.into());
    }
    info!("Server list stopped.");
    Ok(())
}
