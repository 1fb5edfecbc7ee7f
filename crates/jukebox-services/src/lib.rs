//! jukebox-services — the server half of the protocol: storage access,
//! chunked transfer, per-connection handling and the accept loop.

pub mod error;
pub mod handler;
pub mod listener;
pub mod storage;
pub mod transfer;

pub use error::ServerError;
pub use handler::{ConnectionHandler, HandlerExit};
pub use listener::Listener;
pub use storage::{Catalog, MediaStore, SongLibrary};
