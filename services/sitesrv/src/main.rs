//! sitesrv binary entry point.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use sitesrv::app_state::AppState;
use sitesrv::bootstrap;
use sitesrv::config::SiteConfig;
use sitesrv::device::resolver::DriverCatalog;
use sitesrv::device::store::DeviceStore;
use sitesrv::push::PushEvent;
use sitesrv::routes;

#[derive(Parser, Debug)]
#[command(name = "sitesrv", about = "AmpFlow charging site service")]
struct Args {
    /// Path to the site configuration file
    #[arg(short, long, default_value = "ampflow.yaml", env = "AMPFLOW_CONFIG")]
    config: String,

    /// Log level when RUST_LOG is unset (overrides the config file)
    #[arg(long)]
    log_level: Option<String>,

    /// Database path (overrides the config file)
    #[arg(long)]
    database: Option<String>,

    /// Validate the configuration, run the bootstrap and exit
    #[arg(long)]
    validate: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = SiteConfig::load(&args.config)?;

    let level = args.log_level.clone().unwrap_or_else(|| config.log.clone());
    ampflow_common::logging::init(&level)?;

    info!(config = %args.config, "starting sitesrv");

    let db_path = args
        .database
        .clone()
        .unwrap_or_else(|| config.database.path.clone());
    let client = ampflow_common::SqliteClient::new(&db_path).await?;
    let store = DeviceStore::new(client.pool().clone());
    store.init_schema().await?;

    let catalog = DriverCatalog::with_builtin();
    let system = bootstrap::configure_site(&config, &store, &catalog).await?;

    if args.validate {
        info!("configuration valid");
        return Ok(());
    }

    let interval = Duration::from_secs(config.interval.max(1));
    let site = system.site.clone();
    let message_tx = system.message_tx.clone();

    let state = Arc::new(AppState::new(system, store));
    let router = routes::create_router(state.clone());

    let _ = message_tx
        .send(PushEvent::new("start").with_value("site", state.site.title()))
        .await;

    let addr = config.network.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, uri = %config.network.uri(), "listening");

    let site_task = tokio::spawn(async move { site.run(interval).await });

    axum::serve(listener, router)
        .with_graceful_shutdown(ampflow_common::shutdown::wait_for_shutdown())
        .await?;

    site_task.abort();
    info!("sitesrv stopped");
    Ok(())
}
