//! jukebox integration test harness.
//!
//! Each test starts its own server on an ephemeral loopback port, backed by a
//! scratch catalog and media directory under the system temp dir:
//!
//!   cargo test --test integration
//!
//! Servers are stopped and scratch directories removed when the
//! `TestServer` is dropped.

mod isolation;
mod scenarios;

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use jukebox_core::client::Client;
use jukebox_services::{Catalog, Listener, MediaStore, ServerError, SongLibrary};

// ── Harness ───────────────────────────────────────────────────────────────────

pub type TcpClient = Client<OwnedReadHalf, OwnedWriteHalf>;

/// A running server plus the directory it serves from.
pub struct TestServer {
    pub addr: SocketAddr,
    pub root: PathBuf,
    shutdown: broadcast::Sender<()>,
    task: Option<JoinHandle<Result<(), ServerError>>>,
}

impl TestServer {
    /// Write `catalog` and `songs` into a fresh directory and start serving it.
    pub async fn start(tag: &str, catalog: &[&str], songs: &[(&str, &[u8])]) -> Result<Self> {
        let root = std::env::temp_dir().join(format!("jukebox-it-{tag}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&root);
        let media = root.join("songDatabase");
        std::fs::create_dir_all(&media).context("failed to create media dir")?;

        let mut text = catalog.join("\n");
        text.push('\n');
        std::fs::write(root.join("record.txt"), text).context("failed to write catalog")?;
        for (name, bytes) in songs {
            std::fs::write(media.join(name), bytes)
                .with_context(|| format!("failed to write {name}"))?;
        }

        let library = SongLibrary::new(Catalog::new(root.join("record.txt")), MediaStore::new(media));
        let listener = Listener::start("127.0.0.1", 0, library).await?;
        let addr = listener.local_addr()?;

        let (shutdown, rx) = broadcast::channel(1);
        let task = tokio::spawn(listener.run(rx));

        Ok(Self {
            addr,
            root,
            shutdown,
            task: Some(task),
        })
    }

    pub async fn client(&self) -> Result<TcpClient> {
        Client::connect(self.addr)
            .await
            .with_context(|| format!("failed to connect to {}", self.addr))
    }

    /// Stop accepting and wait for the accept loop to exit.
    pub async fn stop(mut self) -> Result<()> {
        let _ = self.shutdown.send(());
        if let Some(task) = self.task.take() {
            task.await.context("listener task panicked")??;
        }
        Ok(())
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        let _ = std::fs::remove_dir_all(&self.root);
    }
}

/// Deterministic file contents that are not all the same byte.
pub fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 7 % 256) as u8).collect()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_server_starts_and_stops() {
    let server = TestServer::start("startstop", &[], &[]).await.unwrap();
    let addr = server.addr;
    assert_ne!(addr.port(), 0);
    server.stop().await.unwrap();
    assert!(Client::connect(addr).await.is_err());
}
