//! Server error taxonomy.
//!
//! Which layer recovers from what:
//!   Configuration, Transport    → fatal to the listener / process
//!   ProtocolDecode              → fatal to one connection
//!   StorageRead                 → recovered as "not found" or a truncated listing
//!   TransportWrite, Encode      → the current response is abandoned

use std::path::PathBuf;

use jukebox_core::codec::{DecodeError, EncodeError};
use jukebox_core::config::ConfigError;
use jukebox_core::wire::WireError;

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("listening socket failed: {0}")]
    Transport(#[source] std::io::Error),

    #[error("protocol decode error: {0}")]
    ProtocolDecode(#[from] DecodeError),

    #[error("failed to read {}: {source}", path.display())]
    StorageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("write failed mid-response: {0}")]
    TransportWrite(#[source] std::io::Error),

    #[error("failed to encode response: {0}")]
    Encode(#[source] WireError),
}

impl From<EncodeError> for ServerError {
    fn from(e: EncodeError) -> Self {
        match e {
            EncodeError::Io(e) => ServerError::TransportWrite(e),
            EncodeError::Wire(e) => ServerError::Encode(e),
        }
    }
}

impl ServerError {
    /// True when the peer is gone and no further frame can be exchanged.
    pub fn is_connection_lost(&self) -> bool {
        use std::io::ErrorKind::*;
        match self {
            ServerError::TransportWrite(e) => matches!(
                e.kind(),
                BrokenPipe | ConnectionReset | ConnectionAborted | NotConnected | UnexpectedEof | WriteZero
            ),
            _ => false,
        }
    }
}
