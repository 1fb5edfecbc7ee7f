//! Chunked file transfer.
//!
//! A file goes out as a `FileHeader` followed by its bytes in `CHUNK_SIZE`
//! slices, in file order. A file whose length is an exact multiple of
//! `CHUNK_SIZE` ends on a full chunk; an empty file sends no chunks at all.

use bytes::Bytes;
use tokio::io::AsyncWrite;

use jukebox_core::codec::FrameWriter;
use jukebox_core::wire::{FileHeader, Message, CHUNK_SIZE};

use crate::error::ServerError;

/// Number of chunks a file of `len` bytes is split into.
pub fn chunk_count(len: usize) -> usize {
    len.div_ceil(CHUNK_SIZE)
}

/// Split file contents into wire chunks without copying.
pub fn split_chunks(data: &Bytes) -> impl Iterator<Item = Bytes> + '_ {
    (0..data.len())
        .step_by(CHUNK_SIZE)
        .map(move |start| data.slice(start..(start + CHUNK_SIZE).min(data.len())))
}

/// Outcome of a successful transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferReport {
    pub bytes: usize,
    pub chunks: usize,
}

/// Send the header for a found song, then every chunk.
///
/// Stops at the first failed write; chunks after it are never sent.
pub async fn send_file<W>(
    writer: &mut FrameWriter<W>,
    artist: &str,
    song: &str,
    data: Bytes,
) -> Result<TransferReport, ServerError>
where
    W: AsyncWrite + Unpin,
{
    let header = FileHeader::found(artist, song, data.len() as u64);
    writer.send(&Message::FileHeader(header)).await?;

    let mut chunks = 0;
    for chunk in split_chunks(&data) {
        writer.send(&Message::Chunk(chunk)).await?;
        chunks += 1;
    }

    Ok(TransferReport {
        bytes: data.len(),
        chunks,
    })
}

/// Send the canonical "not found" header. No chunks follow.
pub async fn send_not_found<W>(writer: &mut FrameWriter<W>) -> Result<(), ServerError>
where
    W: AsyncWrite + Unpin,
{
    writer
        .send(&Message::FileHeader(FileHeader::not_found()))
        .await?;
    Ok(())
}
