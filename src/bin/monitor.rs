use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use system_monitor::{
    actors::Scheduler,
    config::{Config, StorageConfig, read_config_file},
    sampler::SystemSampler,
    service::MonitorService,
    storage::{MemoryBackend, StorageBackend, TimeoutBackend},
};
use tracing::{info, level_filters::LevelFilter, trace};
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Clone, Parser)]
struct Args {
    /// Config file (built-in defaults apply without one)
    #[arg(short)]
    file: Option<PathBuf>,
}

fn init() {
    let filter = filter::Targets::new().with_targets(vec![
        ("system_monitor", LevelFilter::DEBUG),
        ("monitor", LevelFilter::TRACE),
        ("tower_http", LevelFilter::INFO),
    ]);
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .compact()
                .with_ansi(false),
        )
        .with(filter)
        .init();
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<dyn StorageBackend>> {
    let backend: Arc<dyn StorageBackend> = match &config.storage {
        StorageConfig::None => {
            info!("using in-memory storage, nothing is persisted");
            Arc::new(MemoryBackend::new())
        }
        #[cfg(feature = "storage-sqlite")]
        StorageConfig::Sqlite { path, .. } => Arc::new(
            system_monitor::storage::sqlite::SqliteBackend::new(path)
                .await
                .with_context(|| format!("failed to open database {}", path.display()))?,
        ),
        #[cfg(not(feature = "storage-sqlite"))]
        StorageConfig::Sqlite { .. } => {
            anyhow::bail!("sqlite storage requested but the storage-sqlite feature is disabled")
        }
    };

    Ok(Arc::new(TimeoutBackend::new(
        backend,
        config.scheduler.store_timeout(),
    )))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    init();
    let args = Args::parse();
    trace!("started with args: {args:?}");

    let config = match &args.file {
        Some(path) => read_config_file(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => Config::default(),
    };

    let thresholds = Arc::new(config.threshold_table()?);
    let store = open_store(&config).await?;
    let sampler = Arc::new(SystemSampler::new());

    let service = Arc::new(
        MonitorService::new(thresholds, store.clone(), sampler)
            .with_sampler_timeout(config.scheduler.sampler_timeout()),
    );
    let scheduler = Arc::new(Scheduler::new(service.clone(), config.scheduler_options()));

    scheduler.start().await;

    #[cfg(feature = "api")]
    {
        use system_monitor::api::{ApiServerConfig, ApiState, spawn_api_server};

        let state = ApiState::new(service.clone(), scheduler.clone());
        spawn_api_server(ApiServerConfig::from(&config.api), state).await?;
    }

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;
    info!("shutting down");

    scheduler.stop().await;
    store.close().await?;

    Ok(())
}
