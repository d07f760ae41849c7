//! Audio metadata tagging.
//!
//! Embeds track metadata (artist, album, index, year, source link) into
//! downloaded files. Tagging problems are reported but never fail or corrupt
//! the download itself.

use lofty::config::WriteOptions;
use lofty::file::TaggedFileExt;
use lofty::tag::{Accessor, ItemKey, TagExt};
use std::path::Path;
use tracing::{debug, warn};

use crate::error::Result;

/// Metadata to embed in a downloaded audio file.
#[derive(Debug, Clone, Default)]
pub struct TagData {
    /// Track title.
    pub title: Option<String>,
    /// Track artist.
    pub artist: Option<String>,
    /// Album title.
    pub album: Option<String>,
    /// Album artist.
    pub album_artist: Option<String>,
    /// 1-based track number.
    pub track_number: Option<u32>,
    /// Release year.
    pub year: Option<u32>,
    /// Comment, used for the source page link.
    pub comment: Option<String>,
}

impl TagData {
    /// Create new empty tag data.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set title.
    pub fn with_title<S: Into<String>>(mut self, title: S) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set artist.
    pub fn with_artist<S: Into<String>>(mut self, artist: S) -> Self {
        self.artist = Some(artist.into());
        self
    }

    /// Set album.
    pub fn with_album<S: Into<String>>(mut self, album: S) -> Self {
        self.album = Some(album.into());
        self
    }

    /// Set album artist.
    pub fn with_album_artist<S: Into<String>>(mut self, album_artist: S) -> Self {
        self.album_artist = Some(album_artist.into());
        self
    }

    /// Set track number.
    pub fn with_track(mut self, number: u32) -> Self {
        self.track_number = Some(number);
        self
    }

    /// Set year.
    pub fn with_year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    /// Set comment.
    pub fn with_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.comment = Some(comment.into());
        self
    }
}

/// Write metadata to an audio file.
///
/// A file that cannot be read or written for tagging is left untouched; the
/// audio payload is never deleted or corrupted by a tag failure.
pub fn write_metadata<P: AsRef<Path>>(path: P, data: &TagData) -> Result<()> {
    let path = path.as_ref();
    debug!("Writing metadata to: {}", path.display());

    let mut tagged_file = match lofty::read_from_path(path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Could not read file for tagging: {}", e);
            return Ok(());
        }
    };

    if tagged_file.primary_tag().is_none() {
        let tag_type = tagged_file.primary_tag_type();
        tagged_file.insert_tag(lofty::tag::Tag::new(tag_type));
    }

    let Some(tag) = tagged_file.primary_tag_mut() else {
        warn!("No tag container available for {}", path.display());
        return Ok(());
    };

    if let Some(title) = &data.title {
        tag.set_title(title.clone());
    }

    if let Some(artist) = &data.artist {
        tag.set_artist(artist.clone());
    }

    if let Some(album) = &data.album {
        tag.set_album(album.clone());
    }

    if let Some(album_artist) = &data.album_artist {
        tag.insert_text(ItemKey::AlbumArtist, album_artist.clone());
    }

    if let Some(track) = data.track_number {
        tag.set_track(track);
    }

    if let Some(year) = data.year {
        if year > 0 {
            tag.set_year(year);
        }
    }

    if let Some(comment) = &data.comment {
        tag.set_comment(comment.clone());
    }

    if let Err(e) = tag.save_to_path(path, WriteOptions::default()) {
        warn!("Failed to save tags to {}: {}", path.display(), e);
    } else {
        debug!("Successfully wrote metadata to {}", path.display());
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_data_builder() {
        let data = TagData::new()
            .with_title("Test Song")
            .with_artist("Test Artist")
            .with_album("Test Album")
            .with_track(3)
            .with_year(2016)
            .with_comment("Visit https://artist.bandcamp.com");

        assert_eq!(data.title, Some("Test Song".to_string()));
        assert_eq!(data.artist, Some("Test Artist".to_string()));
        assert_eq!(data.album, Some("Test Album".to_string()));
        assert_eq!(data.track_number, Some(3));
        assert_eq!(data.year, Some(2016));
        assert_eq!(
            data.comment,
            Some("Visit https://artist.bandcamp.com".to_string())
        );
    }

    #[test]
    fn test_tagging_missing_file_is_not_fatal() {
        let data = TagData::new().with_title("x");
        assert!(write_metadata("/nonexistent/path/file.mp3", &data).is_ok());
    }

    #[test]
    fn test_album_artist_field() {
        let data = TagData::new().with_album_artist("Band");
        assert_eq!(data.album_artist, Some("Band".to_string()));
    }
}
