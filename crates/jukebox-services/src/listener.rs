//! Accept loop. One spawned task per connection, nothing shared between them
//! except the read-only song library.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;

use jukebox_core::config::validate_port;

use crate::error::ServerError;
use crate::handler::{ConnectionHandler, HandlerExit};
use crate::storage::SongLibrary;

pub struct Listener {
    socket: TcpListener,
    library: Arc<SongLibrary>,
}

impl Listener {
    /// Validate the port and bind. A negative or out-of-range port is a
    /// configuration error and nothing is bound.
    pub async fn start(host: &str, port: i64, library: SongLibrary) -> Result<Self, ServerError> {
        let port = validate_port(port)?;
        let socket = TcpListener::bind((host, port))
            .await
            .map_err(ServerError::Transport)?;
        let addr = socket.local_addr().map_err(ServerError::Transport)?;
        tracing::info!(%addr, "listening");
        Ok(Self {
            socket,
            library: Arc::new(library),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr, ServerError> {
        self.socket.local_addr().map_err(ServerError::Transport)
    }

    /// Accept until shutdown or an accept failure.
    ///
    /// An accept failure closes the listening socket and is returned as
    /// `ServerError::Transport`. Handlers already running are left alone.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) -> Result<(), ServerError> {
        loop {
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("listener shutting down");
                    return Ok(());
                }

                result = self.socket.accept() => match result {
                    Ok((stream, peer)) => {
                        tracing::info!(%peer, "connection accepted");
                        self.spawn_handler(stream, peer);
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "accept failed, closing listener");
                        drop(self.socket);
                        return Err(ServerError::Transport(e));
                    }
                },
            }
        }
    }

    /// Fire-and-forget. A second task watches the handler so that errors and
    /// panics are logged rather than lost.
    fn spawn_handler(&self, stream: TcpStream, peer: SocketAddr) {
        let (reader, writer) = stream.into_split();
        let handler = ConnectionHandler::new(peer.to_string(), reader, writer, self.library.clone());
        let task = tokio::spawn(handler.run());

        tokio::spawn(async move {
            match task.await {
                Ok(Ok(HandlerExit::PeerClosed)) => {
                    tracing::info!(%peer, "connection closed by peer");
                }
                Ok(Ok(HandlerExit::ConnectionLost)) => {
                    tracing::info!(%peer, "connection lost");
                }
                Ok(Err(e)) => {
                    tracing::warn!(%peer, error = %e, "connection terminated");
                }
                Err(e) => {
                    tracing::error!(%peer, error = %e, "connection handler panicked");
                }
            }
        });
    }
}
