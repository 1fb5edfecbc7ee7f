//! Per-connection request loop.
//!
//! A `ConnectionHandler` owns both halves of one connection plus their frame
//! buffers. It decodes one request at a time and answers it completely
//! before reading the next:
//!
//! ```text
//! AwaitingRequest ──request──▶ Dispatching ──response sent──▶ AwaitingRequest
//!        │                          │
//!        └── peer closed / decode ──┴── connection lost ──▶ Terminated
//! ```
//!
//! There is no read timeout: a peer that stops mid-frame parks the handler
//! until the socket is closed.

use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncWrite};

use jukebox_core::catalog::CatalogEntry;
use jukebox_core::codec::{EncodeError, FrameReader, FrameWriter};
use jukebox_core::wire::{Message, Request, WireError};

use crate::error::ServerError;
use crate::storage::SongLibrary;
use crate::transfer;

/// Why a handler stopped without a protocol error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerExit {
    /// The peer closed the stream between requests.
    PeerClosed,
    /// A response write failed because the connection is gone.
    ConnectionLost,
}

enum State {
    AwaitingRequest,
    Dispatching(Request),
    Terminated,
}

pub struct ConnectionHandler<R, W> {
    peer: String,
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
    library: Arc<SongLibrary>,
    state: State,
}

impl<R, W> ConnectionHandler<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(peer: impl Into<String>, reader: R, writer: W, library: Arc<SongLibrary>) -> Self {
        Self {
            peer: peer.into(),
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
            library,
            state: State::AwaitingRequest,
        }
    }

    /// Serve requests until the connection ends.
    ///
    /// Returns `Err(ServerError::ProtocolDecode)` when the peer sent something
    /// that is not a well-formed request. Either way the connection is
    /// released when `self` drops.
    pub async fn run(mut self) -> Result<HandlerExit, ServerError> {
        loop {
            match std::mem::replace(&mut self.state, State::Terminated) {
                State::AwaitingRequest => match self.receive_request().await? {
                    Some(request) => self.state = State::Dispatching(request),
                    None => return Ok(HandlerExit::PeerClosed),
                },
                State::Dispatching(request) => {
                    let result = match request {
                        Request::ListCatalog => self.handle_list_catalog().await,
                        Request::DownloadSong { artist, song } => {
                            self.handle_download(&artist, &song).await
                        }
                    };
                    match result {
                        Ok(()) => self.state = State::AwaitingRequest,
                        Err(e) if e.is_connection_lost() => {
                            tracing::info!(peer = %self.peer, error = %e, "connection lost mid-response");
                            return Ok(HandlerExit::ConnectionLost);
                        }
                        Err(e) => {
                            tracing::warn!(peer = %self.peer, error = %e, "response abandoned");
                            self.state = State::AwaitingRequest;
                        }
                    }
                }
                State::Terminated => return Ok(HandlerExit::ConnectionLost),
            }
        }
    }

    /// Block until one complete request frame arrives.
    ///
    /// `Ok(None)` means the peer closed cleanly between requests.
    pub async fn receive_request(&mut self) -> Result<Option<Request>, ServerError> {
        match self.reader.read_message().await? {
            Some(Message::Request(request)) => {
                tracing::debug!(peer = %self.peer, ?request, "request received");
                Ok(Some(request))
            }
            Some(other) => Err(ServerError::ProtocolDecode(
                WireError::UnexpectedKind(other.kind()).into(),
            )),
            None => Ok(None),
        }
    }

    /// Catalog header, one formatted line per catalog entry, end marker.
    ///
    /// A catalog that cannot be opened or read to the end produces a
    /// truncated listing; the end marker is still sent.
    pub async fn handle_list_catalog(&mut self) -> Result<(), ServerError> {
        self.writer.send(&Message::CatalogHeader).await?;

        let mut sent = 0usize;
        match self.library.catalog().open().await {
            Ok(mut lines) => loop {
                let line = match lines.next_line().await {
                    Ok(Some(line)) => line,
                    Ok(None) => break,
                    Err(e) => {
                        tracing::warn!(peer = %self.peer, error = %e, sent, "catalog read failed, listing truncated");
                        break;
                    }
                };
                let Some(entry) = CatalogEntry::parse(&line) else {
                    tracing::warn!(peer = %self.peer, line = %line, "skipping malformed catalog line");
                    continue;
                };
                match self
                    .writer
                    .send(&Message::ListingEntry(entry.listing_line()))
                    .await
                {
                    Ok(()) => sent += 1,
                    Err(EncodeError::Wire(e)) => {
                        tracing::warn!(peer = %self.peer, error = %e, "skipping unencodable catalog line");
                    }
                    Err(e) => return Err(e.into()),
                }
            },
            Err(e) => {
                tracing::warn!(peer = %self.peer, error = %e, "catalog unavailable, sending empty listing");
            }
        }

        self.writer.send(&Message::EndOfListing).await?;
        tracing::debug!(peer = %self.peer, entries = sent, "catalog listing sent");
        Ok(())
    }

    /// File header, then the file in chunks; or the not-found header alone.
    pub async fn handle_download(&mut self, artist: &str, song: &str) -> Result<(), ServerError> {
        match self.library.fetch(artist, song).await {
            Some(data) => {
                let report = transfer::send_file(&mut self.writer, artist, song, data).await?;
                tracing::info!(
                    peer = %self.peer,
                    artist,
                    song,
                    bytes = report.bytes,
                    chunks = report.chunks,
                    "song sent"
                );
            }
            None => {
                transfer::send_not_found(&mut self.writer).await?;
                tracing::info!(peer = %self.peer, artist, song, "song not found");
            }
        }
        Ok(())
    }
}
