//! jukebox-core — wire format, framing, catalog format, configuration and
//! the client side of the protocol. The server crates depend on this one.

pub mod catalog;
pub mod client;
pub mod codec;
pub mod config;
pub mod wire;

pub use catalog::CatalogEntry;
pub use codec::{DecodeError, EncodeError, FrameReader, FrameWriter};
pub use wire::{FileHeader, Message, MessageKind, Request, WireError};
