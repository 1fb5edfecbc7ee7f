//! Read-only access to the catalog file and the media directory.
//!
//! Nothing here caches: every lookup opens the catalog again, so edits made
//! to the file on disk are visible to the next request.

use std::path::{Path, PathBuf};

use bytes::Bytes;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};

use jukebox_core::catalog;

use crate::error::ServerError;

pub struct Catalog {
    path: PathBuf,
}

impl Catalog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Scan the catalog for an exact line match.
    pub async fn contains(&self, file_name: &str) -> Result<bool, ServerError> {
        let mut lines = self.open().await?;
        while let Some(line) = lines.next_line().await? {
            if line.trim_end_matches('\r') == file_name {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Open the catalog for a front-to-back read.
    pub async fn open(&self) -> Result<CatalogLines, ServerError> {
        let file = File::open(&self.path)
            .await
            .map_err(|source| ServerError::StorageRead {
                path: self.path.clone(),
                source,
            })?;
        Ok(CatalogLines {
            path: self.path.clone(),
            lines: BufReader::new(file).lines(),
        })
    }
}

/// An open catalog. The file is closed when this is dropped.
pub struct CatalogLines {
    path: PathBuf,
    lines: Lines<BufReader<File>>,
}

impl CatalogLines {
    pub async fn next_line(&mut self) -> Result<Option<String>, ServerError> {
        self.lines
            .next_line()
            .await
            .map_err(|source| ServerError::StorageRead {
                path: self.path.clone(),
                source,
            })
    }
}

pub struct MediaStore {
    root: PathBuf,
}

impl MediaStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Read a whole media file.
    pub async fn read(&self, file_name: &str) -> Result<Bytes, ServerError> {
        let path = self.root.join(file_name);
        tokio::fs::read(&path)
            .await
            .map(Bytes::from)
            .map_err(|source| ServerError::StorageRead { path, source })
    }
}

/// The catalog and the media directory together.
pub struct SongLibrary {
    catalog: Catalog,
    media: MediaStore,
}

impl SongLibrary {
    pub fn new(catalog: Catalog, media: MediaStore) -> Self {
        Self { catalog, media }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Look a song up and read it.
    ///
    /// `None` covers every "not found" case: absent from the catalog,
    /// catalog unreadable, or media file unreadable. The latter two are logged.
    pub async fn fetch(&self, artist: &str, song: &str) -> Option<Bytes> {
        let file_name = catalog::file_name(artist, song);

        match self.catalog.contains(&file_name).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::debug!(file_name = %file_name, "song not in catalog");
                return None;
            }
            Err(e) => {
                tracing::warn!(error = %e, file_name = %file_name, "catalog unreadable, treating as not found");
                return None;
            }
        }

        match self.media.read(&file_name).await {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!(error = %e, file_name = %file_name, "media file unreadable, treating as not found");
                None
            }
        }
    }
}
