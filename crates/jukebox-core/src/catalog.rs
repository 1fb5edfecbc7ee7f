//! Catalog line format.
//!
//! Each catalog line names one media file: `<Artist> - <Song>.mp3`. The same
//! string is the file's name inside the media directory.
//!
//! Parsing splits on the first `" - "`. An artist whose name itself contains
//! `" - "` is therefore mis-parsed: `"A - B - C.mp3"` yields artist `"A"` and
//! song `"B - C"`. There is no way to tell the two readings apart from the
//! line alone, so the ambiguity is kept and covered by a test.

/// Separator between artist and song in a catalog line.
pub const SEPARATOR: &str = " - ";

/// Extension every media file carries.
pub const MEDIA_EXTENSION: &str = ".mp3";

/// Build the catalog line / media file name for a song.
pub fn file_name(artist: &str, song: &str) -> String {
    format!("{artist}{SEPARATOR}{song}{MEDIA_EXTENSION}")
}

/// One parsed catalog line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub artist: String,
    pub song: String,
}

impl CatalogEntry {
    /// Parse a catalog line. Returns `None` when the line lacks the
    /// separator or the extension.
    pub fn parse(line: &str) -> Option<Self> {
        let line = line.trim_end_matches('\r');
        let stem = line.strip_suffix(MEDIA_EXTENSION)?;
        let (artist, song) = stem.split_once(SEPARATOR)?;
        Some(Self {
            artist: artist.to_string(),
            song: song.to_string(),
        })
    }

    pub fn file_name(&self) -> String {
        file_name(&self.artist, &self.song)
    }

    /// Human-readable listing line sent to clients.
    pub fn listing_line(&self) -> String {
        format!("* \"{}\" by: {}", self.song, self.artist)
    }
}
