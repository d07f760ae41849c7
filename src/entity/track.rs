//! Single track resolver.

use std::path::PathBuf;

use tracing::{debug, warn};

use crate::client::HttpClient;
use crate::config::Config;
use crate::download::{download_file, DownloadOptions, DownloadOutcome};
use crate::entity::{art_extension, EntityState};
use crate::error::{CampdownError, Result};
use crate::naming::{format_track_name, sanitize_filename, short_track_name};
use crate::page::{base_url, classify, resolve_url, valid_url, PageKind};
use crate::scrape;
use crate::tagging::{self, TagData};

/// Resolver for a single Bandcamp track page.
///
/// The base entity of the crate: albums and discographies resolve their
/// children down to tracks, and tracks drive the file downloader.
#[derive(Debug)]
pub struct Track {
    url: String,
    output: PathBuf,
    config: Config,
    state: EntityState,

    // Fixed by a parent album before prepare, extracted from the page
    // otherwise.
    album: Option<String>,
    album_artist: Option<String>,
    index: Option<u32>,

    title: String,
    artist: String,
    release_year: Option<String>,
    art_url: Option<String>,
    media_url: Option<String>,

    // Artwork is downloaded per track only for standalone and loose tracks;
    // album tracks share the album cover instead.
    art_enabled: bool,

    // Pre-supplied page content, consumed by prepare.
    content: Option<String>,
}

impl Track {
    /// Create a track resolver for a URL.
    pub fn new(url: impl Into<String>, output: impl Into<PathBuf>, config: Config) -> Self {
        let art_enabled = config.art_enabled;

        Self {
            url: url.into(),
            output: output.into(),
            config,
            state: EntityState::Unprepared,
            album: None,
            album_artist: None,
            index: None,
            title: String::new(),
            artist: String::new(),
            release_year: None,
            art_url: None,
            media_url: None,
            art_enabled,
            content: None,
        }
    }

    /// Create a track owned by an album, with fixed album fields and index.
    pub(crate) fn for_album(
        url: String,
        output: PathBuf,
        config: Config,
        album: String,
        album_artist: String,
        index: u32,
    ) -> Self {
        let mut track = Self::new(url, output, config);
        track.album = Some(album);
        track.album_artist = Some(album_artist);
        track.index = Some(index);
        track.art_enabled = false;
        track
    }

    /// Supply already-fetched page content, skipping the prepare request.
    pub fn with_content(mut self, content: String) -> Self {
        self.content = Some(content);
        self
    }

    /// Source URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Track title, available once prepared.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Artist name, available once prepared.
    pub fn artist(&self) -> &str {
        &self.artist
    }

    /// 1-based album index, when owned by an album.
    pub fn index(&self) -> Option<u32> {
        self.index
    }

    /// Resolved media URL, available once prepared.
    pub fn media_url(&self) -> Option<&str> {
        self.media_url.as_deref()
    }

    /// Lifecycle state.
    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Resolve the track's metadata and media URL.
    ///
    /// Returns `Ok(false)` when the track cannot be downloaded: invalid URL,
    /// unreachable page, or no streamable media. The last case is common
    /// (purchase-gated tracks) and expected, not an error.
    pub async fn prepare(&mut self, client: &HttpClient) -> Result<bool> {
        if !valid_url(&self.url) {
            warn!("not a valid URL: {}", self.url);
            if self.config.verbose {
                println!("The supplied URL is not a valid URL.");
            }
            self.state = EntityState::Failed;
            return Ok(false);
        }

        let content = match self.content.take() {
            Some(content) => content,
            None => {
                let page = client.get_page(&self.url).await?;

                if !page.is_ok() {
                    warn!("status {} fetching {}", page.status, self.url);
                    if self.config.verbose {
                        println!(
                            "An error occurred while trying to access your supplied URL. Status code: {}",
                            page.status
                        );
                    }
                    self.state = EntityState::Failed;
                    return Ok(false);
                }

                page.body
            }
        };

        if classify(&content) != Some(PageKind::Track) {
            warn!("{} is not a track page", self.url);
        }

        let reference = match scrape::extract_media_reference(&content) {
            Some(reference) => reference,
            None => {
                debug!("no streamable media for {}", self.url);
                self.state = EntityState::Failed;
                return Ok(false);
            }
        };

        if reference.artist.is_empty() {
            warn!("failed to prepare the band/artist title for {}", self.url);
        }

        self.title = sanitize_filename(&reference.title);
        self.artist = sanitize_filename(&reference.artist);

        if self.album.is_none() {
            self.album = reference.album.map(|album| sanitize_filename(&album));
        }

        self.release_year = reference.release_year;
        self.art_url = reference.artwork_url.map(|art| match base_url(&self.url) {
            Some(base) => resolve_url(&art, &base),
            None => art,
        });
        self.media_url = Some(reference.media_url);

        self.state = EntityState::Prepared;
        Ok(true)
    }

    /// Download the audio file, tag it and optionally fetch the artwork.
    ///
    /// A failed audio transfer is reported, not raised; artwork failures are
    /// independent of the audio outcome.
    pub async fn download(&self, client: &HttpClient) -> Result<()> {
        let media_url = match (self.state, &self.media_url) {
            (EntityState::Prepared, Some(url)) => url.clone(),
            _ => return Err(CampdownError::NotPrepared(self.url.clone())),
        };

        if self.album.is_none() && self.config.verbose {
            println!("\nWriting file to {}", self.output.display());
        }

        let album = self.album.as_deref().unwrap_or("");

        let name = if self.config.short {
            short_track_name(&self.title, self.index)
        } else {
            format_track_name(&self.title, &self.artist, album, self.index)
        };

        let filename = sanitize_filename(&format!("{}.mp3", name));
        let options = DownloadOptions::from_config(&self.config);

        let outcome = download_file(client, &media_url, &self.output, &filename, &options).await?;

        if outcome.is_failure() {
            if self.config.verbose {
                println!("\nFailed to download the file ({:?}).", outcome);
            }
            return Ok(());
        }

        if self.config.tag_enabled {
            let mut data = TagData::new();

            // A title that embeds "Artist - Track" provides both frames.
            if let Some((head, tail)) = self.title.split_once(" - ") {
                data = data.with_artist(head).with_title(tail);
            } else {
                data = data.with_title(self.title.clone()).with_artist(self.artist.clone());
            }

            if let Some(album) = &self.album {
                data = data.with_album(album.clone());
            }

            if let Some(index) = self.index {
                data = data.with_track(index);
            }

            if let Some(year) = self
                .release_year
                .as_deref()
                .and_then(|year| year.parse::<u32>().ok())
            {
                data = data.with_year(year);
            }

            let album_artist = self
                .album_artist
                .clone()
                .filter(|artist| !artist.is_empty())
                .unwrap_or_else(|| self.artist.clone());
            data = data.with_album_artist(album_artist);

            if let Some(base) = base_url(&self.url) {
                data = data.with_comment(format!("Visit {}", base));
            }

            let _ = tagging::write_metadata(self.output.join(&filename), &data);
        }

        if self.art_enabled {
            if let Some(art_url) = &self.art_url {
                let art_name = sanitize_filename(&format!("{}.{}", name, art_extension(art_url)));

                // Artwork failures never block the audio outcome.
                match download_file(client, art_url, &self.output, &art_name, &options).await {
                    Ok(DownloadOutcome::Success) => {
                        if self.config.verbose {
                            println!("\nSaved track art to {}", self.output.join(&art_name).display());
                        }
                    }
                    Ok(DownloadOutcome::AlreadyPresent) => {
                        if self.config.verbose {
                            println!("\nArtwork already found.");
                        }
                    }
                    Ok(outcome) => {
                        if self.config.verbose {
                            println!("\nFailed to download the artwork ({:?}).", outcome);
                        }
                    }
                    Err(error) => {
                        warn!("failed to download artwork {}: {}", art_url, error);
                        if self.config.verbose {
                            println!("\nFailed to download the artwork ({}).", error);
                        }
                    }
                }
            }
        }

        Ok(())
    }
}
