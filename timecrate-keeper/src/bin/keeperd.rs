//! keeperd: runs one timecrate keeper.
//!
//! Usage: `keeperd [config.json]`. Every field can also be set through
//! `TIMECRATE_KEEPER_*` environment variables; `RUST_LOG` controls logging.

use anyhow::Context;
use std::path::PathBuf;
use std::sync::Arc;
use timecrate_keeper::{HttpAuthority, Keeper, KeeperConfig, ShareStore, server};
use tokio::net::TcpListener;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .try_init();

    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = KeeperConfig::load(config_path.as_deref()).context("loading keeper config")?;

    let store = ShareStore::open(&config.store_path)
        .with_context(|| format!("opening share store {}", config.store_path.display()))?;
    let authority = HttpAuthority::new(&config.authority_base_url, config.authority_timeout())?;
    let keeper = Arc::new(Keeper::new(
        config.keeper_id.clone(),
        store,
        Arc::new(authority),
    ));

    let listener = TcpListener::bind(&config.listen_addr)
        .await
        .with_context(|| format!("binding {}", config.listen_addr))?;
    info!(
        "keeper {} listening on {} ({} shares in custody)",
        config.keeper_id,
        config.listen_addr,
        keeper.share_count().await?
    );

    server::serve(listener, keeper, async {
        let _ = tokio::signal::ctrl_c().await;
        info!("shutting down");
    })
    .await?;
    Ok(())
}
