mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Result, anyhow};
use clap::Parser;
use scicloud_core::SciCloudConfig;
use scicloud_core::store::{EventStore, FileStore, MemoryStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::state::AppState;

const DEFAULT_PORT: u16 = 4096;

#[derive(Parser)]
#[command(name = "scicloud-server")]
#[command(about = "Serve scicloud calendar events over HTTP")]
struct Args {
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    port: u16,

    /// Keep events in memory only
    #[arg(long)]
    ephemeral: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing()?;

    let config = SciCloudConfig::load()?;
    let store: Arc<dyn EventStore> = if args.ephemeral {
        info!("using in-memory event store");
        Arc::new(MemoryStore::new())
    } else {
        Arc::new(FileStore::open(&config.data_path())?)
    };

    let state = AppState::new(store, config.clock()?, config.layout);
    let app = routes::app(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    info!("scicloud-server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn init_tracing() -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .map_err(|e| anyhow!("invalid RUST_LOG / log filter: {e}"))?;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();

    Ok(())
}
