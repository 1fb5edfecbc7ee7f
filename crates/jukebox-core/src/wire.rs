//! Jukebox wire format — every message exchanged between client and server.
//!
//! Each message travels as one frame: a fixed 8-byte header followed by a
//! payload of `length` bytes. The header layout is part of the protocol;
//! bump `WIRE_VERSION` if anything in this module changes shape.
//!
//! ```text
//! +-------+---------+------+-------+---------------------+----------+
//! | magic | version | kind | flags | length (u32 BE)     | payload  |
//! | 0x4A  | 0x01    | u8   | 0x00  |                     |          |
//! +-------+---------+------+-------+---------------------+----------+
//! ```
//!
//! Strings inside payloads are a big-endian u16 byte count followed by
//! UTF-8 bytes. Booleans are a single byte, 0 or 1.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use static_assertions::assert_eq_size;
use zerocopy::byteorder::{BigEndian, U32};
use zerocopy::{AsBytes, FromBytes, FromZeroes};

// ── Frame Header ─────────────────────────────────────────────────────────────

/// Precedes every payload on the wire.
///
/// The receiver validates the header completely before allocating or reading
/// a single payload byte, so an oversized or foreign frame is rejected early.
///
/// Wire size: 8 bytes.
#[derive(Debug, Clone, AsBytes, FromBytes, FromZeroes)]
#[repr(C, packed)]
pub struct FrameHeader {
    /// Always `MAGIC`. Catches misaligned reads and non-jukebox peers.
    pub magic: u8,

    /// Wire format version. Currently 0x01.
    pub version: u8,

    /// Message discriminator, see [`MessageKind`].
    pub kind: u8,

    /// Reserved, must be zero.
    pub flags: u8,

    /// Payload length in bytes, not including this header.
    pub length: U32<BigEndian>,
}

assert_eq_size!(FrameHeader, [u8; 8]);

impl FrameHeader {
    pub fn new(kind: MessageKind, length: usize) -> Result<Self, WireError> {
        if length > MAX_PAYLOAD {
            return Err(WireError::PayloadTooLarge(length));
        }
        Ok(Self {
            magic: MAGIC,
            version: WIRE_VERSION,
            kind: kind.into(),
            flags: 0,
            length: U32::new(length as u32),
        })
    }

    /// Check every header field and return the message kind and payload length.
    pub fn validate(&self) -> Result<(MessageKind, usize), WireError> {
        if self.magic != MAGIC {
            return Err(WireError::BadMagic(self.magic));
        }
        if self.version != WIRE_VERSION {
            return Err(WireError::UnknownVersion(self.version));
        }
        if self.flags != 0 {
            return Err(WireError::ReservedFlagsSet(self.flags));
        }
        let kind = MessageKind::try_from(self.kind)?;
        let length = self.length.get() as usize;
        if length > MAX_PAYLOAD {
            return Err(WireError::PayloadTooLarge(length));
        }
        Ok((kind, length))
    }
}

// ── Message Kind ──────────────────────────────────────────────────────────────

/// Frame discriminator carried in `FrameHeader.kind`.
///
/// 0x01..0x0F are client → server, 0x10.. are server → client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageKind {
    Request = 0x01,
    CatalogHeader = 0x10,
    FileHeader = 0x11,
    Chunk = 0x12,
    ListingEntry = 0x13,
    EndOfListing = 0x14,
}

impl TryFrom<u8> for MessageKind {
    type Error = WireError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0x01 => Ok(MessageKind::Request),
            0x10 => Ok(MessageKind::CatalogHeader),
            0x11 => Ok(MessageKind::FileHeader),
            0x12 => Ok(MessageKind::Chunk),
            0x13 => Ok(MessageKind::ListingEntry),
            0x14 => Ok(MessageKind::EndOfListing),
            other => Err(WireError::UnknownKind(other)),
        }
    }
}

impl From<MessageKind> for u8 {
    fn from(k: MessageKind) -> u8 {
        k as u8
    }
}

// ── Messages ──────────────────────────────────────────────────────────────────

/// A client request. One per protocol exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    ListCatalog,
    DownloadSong { artist: String, song: String },
}

/// First message of a download response.
///
/// `found == false` always carries `size == -1` and empty names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    pub found: bool,
    pub artist: String,
    pub song: String,
    pub size: i64,
}

impl FileHeader {
    pub fn found(artist: &str, song: &str, size: u64) -> Self {
        Self {
            found: true,
            artist: artist.to_string(),
            song: song.to_string(),
            size: size as i64,
        }
    }

    pub fn not_found() -> Self {
        Self {
            found: false,
            artist: String::new(),
            song: String::new(),
            size: -1,
        }
    }
}

/// Everything that can travel in a frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Message {
    Request(Request),
    /// A catalog listing follows.
    CatalogHeader,
    FileHeader(FileHeader),
    /// One slice of a file, 1 to `CHUNK_SIZE` bytes.
    Chunk(Bytes),
    /// One formatted catalog line: `* "<song>" by: <artist>`.
    ListingEntry(String),
    /// Terminates a listing. Carries no payload, so it can never be confused
    /// with a listing entry.
    EndOfListing,
}

impl Message {
    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Request(_) => MessageKind::Request,
            Message::CatalogHeader => MessageKind::CatalogHeader,
            Message::FileHeader(_) => MessageKind::FileHeader,
            Message::Chunk(_) => MessageKind::Chunk,
            Message::ListingEntry(_) => MessageKind::ListingEntry,
            Message::EndOfListing => MessageKind::EndOfListing,
        }
    }

    /// Append one complete frame (header + payload) to `dst`.
    ///
    /// On error `dst` is left exactly as it was.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), WireError> {
        let start = dst.len();
        dst.put_bytes(0, FRAME_HEADER_LEN);

        let result = self.encode_payload(dst).and_then(|()| {
            FrameHeader::new(self.kind(), dst.len() - start - FRAME_HEADER_LEN)
        });

        match result {
            Ok(header) => {
                dst[start..start + FRAME_HEADER_LEN].copy_from_slice(header.as_bytes());
                Ok(())
            }
            Err(e) => {
                dst.truncate(start);
                Err(e)
            }
        }
    }

    fn encode_payload(&self, dst: &mut BytesMut) -> Result<(), WireError> {
        match self {
            Message::Request(Request::ListCatalog) => {
                dst.put_u8(0);
                put_string(dst, "")?;
                put_string(dst, "")?;
            }
            Message::Request(Request::DownloadSong { artist, song }) => {
                dst.put_u8(1);
                put_string(dst, artist)?;
                put_string(dst, song)?;
            }
            Message::FileHeader(h) => {
                dst.put_u8(h.found as u8);
                dst.put_i64(h.size);
                put_string(dst, &h.artist)?;
                put_string(dst, &h.song)?;
            }
            Message::Chunk(data) => {
                if data.is_empty() {
                    return Err(WireError::EmptyChunk);
                }
                if data.len() > CHUNK_SIZE {
                    return Err(WireError::ChunkTooLarge(data.len()));
                }
                dst.put_slice(data);
            }
            Message::ListingEntry(line) => dst.put_slice(line.as_bytes()),
            Message::CatalogHeader | Message::EndOfListing => {}
        }
        Ok(())
    }

    /// Decode a payload whose header has already been validated.
    pub fn decode(kind: MessageKind, mut payload: Bytes) -> Result<Self, WireError> {
        let message = match kind {
            MessageKind::Request => {
                let is_download = take_bool(&mut payload, "is_download")?;
                let artist = take_string(&mut payload, "artist")?;
                let song = take_string(&mut payload, "song")?;
                if is_download {
                    Message::Request(Request::DownloadSong { artist, song })
                } else {
                    Message::Request(Request::ListCatalog)
                }
            }
            MessageKind::FileHeader => {
                let found = take_bool(&mut payload, "found")?;
                if payload.remaining() < 8 {
                    return Err(WireError::Truncated("size"));
                }
                let size = payload.get_i64();
                let artist = take_string(&mut payload, "artist")?;
                let song = take_string(&mut payload, "song")?;
                let consistent = if found {
                    size >= 0
                } else {
                    size == -1 && artist.is_empty() && song.is_empty()
                };
                if !consistent {
                    return Err(WireError::InconsistentFileHeader { found, size });
                }
                Message::FileHeader(FileHeader {
                    found,
                    artist,
                    song,
                    size,
                })
            }
            MessageKind::Chunk => {
                if payload.is_empty() {
                    return Err(WireError::EmptyChunk);
                }
                if payload.len() > CHUNK_SIZE {
                    return Err(WireError::ChunkTooLarge(payload.len()));
                }
                return Ok(Message::Chunk(payload));
            }
            MessageKind::ListingEntry => {
                let line = String::from_utf8(payload.to_vec())
                    .map_err(|_| WireError::InvalidUtf8("listing entry"))?;
                return Ok(Message::ListingEntry(line));
            }
            MessageKind::CatalogHeader => Message::CatalogHeader,
            MessageKind::EndOfListing => Message::EndOfListing,
        };

        if payload.has_remaining() {
            return Err(WireError::TrailingBytes {
                kind,
                extra: payload.remaining(),
            });
        }
        Ok(message)
    }
}

// ── Payload primitives ────────────────────────────────────────────────────────

fn put_string(dst: &mut BytesMut, s: &str) -> Result<(), WireError> {
    let len = u16::try_from(s.len()).map_err(|_| WireError::StringTooLong(s.len()))?;
    dst.put_u16(len);
    dst.put_slice(s.as_bytes());
    Ok(())
}

fn take_bool(buf: &mut Bytes, field: &'static str) -> Result<bool, WireError> {
    if !buf.has_remaining() {
        return Err(WireError::Truncated(field));
    }
    match buf.get_u8() {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(WireError::InvalidBool { field, value: other }),
    }
}

fn take_string(buf: &mut Bytes, field: &'static str) -> Result<String, WireError> {
    if buf.remaining() < 2 {
        return Err(WireError::Truncated(field));
    }
    let len = buf.get_u16() as usize;
    if buf.remaining() < len {
        return Err(WireError::Truncated(field));
    }
    let raw = buf.split_to(len);
    String::from_utf8(raw.to_vec()).map_err(|_| WireError::InvalidUtf8(field))
}

// ── Constants ─────────────────────────────────────────────────────────────────

/// First byte of every frame ('J').
pub const MAGIC: u8 = 0x4A;

/// Current wire format version.
pub const WIRE_VERSION: u8 = 0x01;

/// Size of `FrameHeader` on the wire.
pub const FRAME_HEADER_LEN: usize = std::mem::size_of::<FrameHeader>();

/// Largest payload a receiver will accept.
pub const MAX_PAYLOAD: usize = 64 * 1024;

/// Largest file slice carried by one `Chunk` message.
pub const CHUNK_SIZE: usize = 1000;

// ── Errors ────────────────────────────────────────────────────────────────────

/// Errors that can arise when interpreting wire-format data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("bad magic byte: 0x{0:02x}")]
    BadMagic(u8),

    #[error("unknown wire version: 0x{0:02x}")]
    UnknownVersion(u8),

    #[error("unknown message kind: 0x{0:02x}")]
    UnknownKind(u8),

    #[error("unexpected {0:?} frame")]
    UnexpectedKind(MessageKind),

    #[error("reserved flags are non-zero: 0x{0:02x}")]
    ReservedFlagsSet(u8),

    #[error("payload length {0} exceeds maximum {}", MAX_PAYLOAD)]
    PayloadTooLarge(usize),

    #[error("chunk of {0} bytes exceeds maximum {}", CHUNK_SIZE)]
    ChunkTooLarge(usize),

    #[error("chunk carries no bytes")]
    EmptyChunk,

    #[error("string of {0} bytes does not fit a u16 length")]
    StringTooLong(usize),

    #[error("payload truncated while reading {0}")]
    Truncated(&'static str),

    #[error("{field} is not a boolean: 0x{value:02x}")]
    InvalidBool { field: &'static str, value: u8 },

    #[error("{0} is not valid UTF-8")]
    InvalidUtf8(&'static str),

    #[error("{extra} unexpected trailing bytes in {kind:?} payload")]
    TrailingBytes { kind: MessageKind, extra: usize },

    #[error("file header found={found} with size {size}")]
    InconsistentFileHeader { found: bool, size: i64 },
}

// ── Tests ─────────────────────────────────────────────────────────────────────
