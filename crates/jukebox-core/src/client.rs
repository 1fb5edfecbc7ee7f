//! Client side of the jukebox protocol.
//!
//! Works over any async byte stream; `Client::connect` is the TCP shortcut.

use bytes::Bytes;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{TcpStream, ToSocketAddrs};

use crate::codec::{DecodeError, EncodeError, FrameReader, FrameWriter};
use crate::wire::{FileHeader, Message, MessageKind, Request};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("failed to connect: {0}")]
    Connect(std::io::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("server closed the connection")]
    Closed,

    #[error("expected {expected}, got {got:?}")]
    Unexpected {
        expected: &'static str,
        got: MessageKind,
    },

    #[error("server sent {received} bytes for a {expected}-byte file")]
    Overrun { expected: u64, received: u64 },
}

/// A completed download: the header plus every chunk in arrival order.
#[derive(Debug, Clone)]
pub struct Download {
    pub header: FileHeader,
    pub chunks: Vec<Bytes>,
}

impl Download {
    /// Reassemble the file contents.
    pub fn bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.header.size.max(0) as usize);
        for chunk in &self.chunks {
            out.extend_from_slice(chunk);
        }
        out
    }
}

pub struct Client<R, W> {
    reader: FrameReader<R>,
    writer: FrameWriter<W>,
}

impl Client<OwnedReadHalf, OwnedWriteHalf> {
    pub async fn connect(addr: impl ToSocketAddrs) -> Result<Self, ClientError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(ClientError::Connect)?;
        let (r, w) = stream.into_split();
        Ok(Self::new(r, w))
    }
}

impl<R, W> Client<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: FrameReader::new(reader),
            writer: FrameWriter::new(writer),
        }
    }

    /// Request the catalog and collect every listing line up to the end marker.
    pub async fn list_catalog(&mut self) -> Result<Vec<String>, ClientError> {
        self.writer
            .send(&Message::Request(Request::ListCatalog))
            .await?;

        match self.next().await? {
            Message::CatalogHeader => {}
            other => return Err(unexpected("catalog header", &other)),
        }

        let mut lines = Vec::new();
        loop {
            match self.next().await? {
                Message::ListingEntry(line) => lines.push(line),
                Message::EndOfListing => return Ok(lines),
                other => return Err(unexpected("listing entry", &other)),
            }
        }
    }

    /// Request one song and read its chunks until `size` bytes have arrived.
    pub async fn download(&mut self, artist: &str, song: &str) -> Result<Download, ClientError> {
        self.writer
            .send(&Message::Request(Request::DownloadSong {
                artist: artist.to_string(),
                song: song.to_string(),
            }))
            .await?;

        let header = match self.next().await? {
            Message::FileHeader(h) => h,
            other => return Err(unexpected("file header", &other)),
        };

        let mut chunks = Vec::new();
        if header.found {
            let expected = header.size as u64;
            let mut received = 0u64;
            while received < expected {
                match self.next().await? {
                    Message::Chunk(data) => {
                        received += data.len() as u64;
                        chunks.push(data);
                    }
                    other => return Err(unexpected("chunk", &other)),
                }
            }
            if received > expected {
                return Err(ClientError::Overrun { expected, received });
            }
        }

        Ok(Download { header, chunks })
    }

    /// Close the write side so the server sees a clean end of stream.
    pub async fn close(mut self) -> Result<(), ClientError> {
        self.writer
            .shutdown()
            .await
            .map_err(|e| ClientError::Encode(EncodeError::Io(e)))
    }

    async fn next(&mut self) -> Result<Message, ClientError> {
        self.reader.read_message().await?.ok_or(ClientError::Closed)
    }
}

fn unexpected(expected: &'static str, got: &Message) -> ClientError {
    ClientError::Unexpected {
        expected,
        got: got.kind(),
    }
}
