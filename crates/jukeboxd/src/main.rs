//! jukeboxd — serves a catalog of MP3 files over TCP.
//!
//! Usage: jukeboxd [port]
//!
//! The port argument overrides the config file and environment. The catalog
//! and media directory come from configuration, see `jukebox_core::config`.

use anyhow::{Context, Result};

use jukebox_core::config::{parse_port, JukeboxConfig};
use jukebox_services::{Catalog, Listener, MediaStore, SongLibrary};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    if let Err(e) = JukeboxConfig::write_default_if_missing() {
        tracing::warn!(error = %e, "failed to write default config");
    }
    let mut config = JukeboxConfig::load().context("failed to load config")?;

    if let Some(arg) = std::env::args().nth(1) {
        config.network.port = parse_port(&arg).context("invalid port argument")?;
    }

    tracing::info!(
        host = %config.network.host,
        port = config.network.port,
        catalog = %config.storage.catalog_path.display(),
        media = %config.storage.media_dir.display(),
        "jukeboxd starting"
    );

    let library = SongLibrary::new(
        Catalog::new(&config.storage.catalog_path),
        MediaStore::new(&config.storage.media_dir),
    );
    if !config.storage.catalog_path.exists() {
        tracing::warn!(
            path = %config.storage.catalog_path.display(),
            "catalog file not found; listings will be empty"
        );
    }

    let listener = Listener::start(&config.network.host, config.network.port, library)
        .await
        .context("failed to start listener")?;

    // ── Shutdown channel ─────────────────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = tokio::sync::broadcast::channel::<()>(1);

    {
        let shutdown = shutdown_tx.clone();
        tokio::spawn(async move {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("shutdown signal received");
            let _ = shutdown.send(());
        });
    }

    if let Err(e) = listener.run(shutdown_rx).await {
        tracing::error!(error = %e, "stopping the server");
        return Err(e).context("listener failed");
    }

    tracing::info!("jukeboxd stopped");
    Ok(())
}
