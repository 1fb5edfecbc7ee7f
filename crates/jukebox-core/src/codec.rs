//! Frame I/O over any async byte stream.
//!
//! `FrameReader` and `FrameWriter` own one half of a connection each and keep
//! a reusable buffer, so a connection is read and written without per-frame
//! allocation beyond the payload itself.

use std::io;

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use zerocopy::FromBytes;

use crate::wire::{FrameHeader, Message, WireError, FRAME_HEADER_LEN};

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("connection closed mid-frame after {0} bytes")]
    Truncated(usize),

    #[error("read failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Wire(#[from] WireError),
}

#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
    #[error("write failed: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Wire(#[from] WireError),
}

pub struct FrameReader<R> {
    inner: R,
    buf: BytesMut,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
        }
    }

    /// Read one complete frame.
    ///
    /// Returns `Ok(None)` when the peer closed the stream cleanly on a frame
    /// boundary. A close anywhere inside a frame is `DecodeError::Truncated`.
    pub async fn read_message(&mut self) -> Result<Option<Message>, DecodeError> {
        let mut raw = [0u8; FRAME_HEADER_LEN];
        let n = read_full(&mut self.inner, &mut raw).await?;
        if n == 0 {
            return Ok(None);
        }
        if n < FRAME_HEADER_LEN {
            return Err(DecodeError::Truncated(n));
        }

        let header = FrameHeader::read_from(&raw[..]).ok_or(DecodeError::Truncated(n))?;
        let (kind, len) = header.validate()?;

        self.buf.clear();
        self.buf.resize(len, 0);
        let got = read_full(&mut self.inner, &mut self.buf[..]).await?;
        if got < len {
            return Err(DecodeError::Truncated(FRAME_HEADER_LEN + got));
        }

        let payload = self.buf.split().freeze();
        Ok(Some(Message::decode(kind, payload)?))
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

pub struct FrameWriter<W> {
    inner: W,
    buf: BytesMut,
}

impl<W: AsyncWrite + Unpin> FrameWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            buf: BytesMut::new(),
        }
    }

    /// Encode and write one frame, flushing before returning.
    pub async fn send(&mut self, msg: &Message) -> Result<(), EncodeError> {
        self.buf.clear();
        msg.encode(&mut self.buf)?;
        self.inner.write_all(&self.buf).await?;
        self.inner.flush().await?;
        Ok(())
    }

    pub async fn shutdown(&mut self) -> io::Result<()> {
        self.inner.shutdown().await
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

/// Fill `buf` unless EOF comes first. Returns the number of bytes read.
async fn read_full<R: AsyncRead + Unpin>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    Ok(filled)
}
