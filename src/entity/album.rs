//! Album resolver.

use std::path::PathBuf;

use tracing::warn;

use crate::client::HttpClient;
use crate::config::Config;
use crate::download::{download_file, DownloadOptions, DownloadOutcome};
use crate::entity::{art_extension, strike, EntityState, Track};
use crate::error::{CampdownError, Result};
use crate::naming::sanitize_filename;
use crate::page::{base_url, classify, resolve_url, valid_url, PageKind};
use crate::scrape;

/// Resolver for a Bandcamp album page.
///
/// `prepare()` resolves the album's own metadata and creates the album
/// directory; `fetch()` walks the embedded track table and prepares a track
/// queue; `download()` transfers the queue in table order and fetches the
/// cover once.
#[derive(Debug)]
pub struct Album {
    url: String,
    output: PathBuf,
    config: Config,
    state: EntityState,

    title: String,
    artist: String,
    base_url: Option<String>,
    art_url: Option<String>,

    queue: Vec<Track>,
    content: Option<String>,
}

impl Album {
    /// Create an album resolver for a URL. The album directory is created
    /// below `output` during prepare.
    pub fn new(url: impl Into<String>, output: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            url: url.into(),
            output: output.into(),
            config,
            state: EntityState::Unprepared,
            title: String::new(),
            artist: String::new(),
            base_url: None,
            art_url: None,
            queue: Vec::new(),
            content: None,
        }
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

    /// Album title, available once prepared.
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Album artist, available once prepared.
    pub fn artist(&self) -> &str {
        &self.artist
    }

    /// Output directory; below the caller's root after prepare.
    pub fn output(&self) -> &PathBuf {
        &self.output
    }

    /// Prepared track queue, in track table order.
    pub fn queue(&self) -> &[Track] {
        &self.queue
    }

    /// Lifecycle state.
    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Resolve album metadata and create the album output directory.
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

        if classify(&content) != Some(PageKind::Album) {
            warn!("{} is not an album page", self.url);
            if self.config.verbose {
                println!("The supplied URL is not an album page.");
            }
            self.state = EntityState::Failed;
            return Ok(false);
        }

        let (title, artist) = match scrape::page_meta_title(&content) {
            Some(meta) => meta,
            None => {
                warn!("no title metadata on {}", self.url);
                self.state = EntityState::Failed;
                return Ok(false);
            }
        };

        let artist = scrape::normalize_artist(artist, &content);
        if artist.is_empty() {
            warn!("failed to prepare the band/artist title for {}", self.url);
        }

        self.title = sanitize_filename(&title);
        self.artist = sanitize_filename(&artist);

        self.output = self.output.join(format!("{} - {}", self.artist, self.title));
        tokio::fs::create_dir_all(&self.output).await?;

        self.base_url = base_url(&self.url);
        self.art_url = scrape::artwork_url(&content).map(|art| match &self.base_url {
            Some(base) => resolve_url(&art, base),
            None => art,
        });

        self.content = Some(content);
        self.state = EntityState::Prepared;
        Ok(true)
    }

    /// Walk the track table and prepare the track queue.
    ///
    /// Each discovered link becomes a [`Track`] with a sequential 1-based
    /// index; a track that fails to prepare is struck from the listing and
    /// excluded without affecting its siblings.
    pub async fn fetch(&mut self, client: &HttpClient) -> Result<()> {
        if self.state != EntityState::Prepared {
            return Err(CampdownError::NotPrepared(self.url.clone()));
        }

        let content = match self.content.take() {
            Some(content) => content,
            None => return Err(CampdownError::NotPrepared(self.url.clone())),
        };

        let base = match &self.base_url {
            Some(base) => base.clone(),
            None => return Err(CampdownError::InvalidUrl(self.url.clone())),
        };

        if self.config.verbose {
            println!("\nListing found tracks");
        }

        let mut index = 0;

        for name in scrape::album_track_paths(&content) {
            index += 1;

            let url = format!("{}/track/{}", base, name);
            let mut track = Track::for_album(
                url,
                self.output.clone(),
                self.config.clone(),
                self.title.clone(),
                self.artist.clone(),
                index,
            );

            match track.prepare(client).await {
                Ok(true) => {
                    if self.config.verbose {
                        println!("{}. {}", index, track.url());
                    }
                    self.queue.push(track);
                }
                Ok(false) => {
                    if self.config.verbose {
                        println!("{}", strike(&format!("{}. {}", index, track.url())));
                    }
                }
                Err(error) => {
                    warn!("failed to prepare {}: {}", track.url(), error);
                    if self.config.verbose {
                        println!("{}", strike(&format!("{}. {}", index, track.url())));
                    }
                }
            }
        }

        Ok(())
    }

    /// Download every queued track in order, then the album cover.
    pub async fn download(&self, client: &HttpClient) -> Result<()> {
        if self.state != EntityState::Prepared {
            return Err(CampdownError::NotPrepared(self.url.clone()));
        }

        if self.config.verbose {
            println!("\nWriting album to {}", self.output.display());
        }

        for track in &self.queue {
            if let Err(error) = track.download(client).await {
                warn!("failed to download {}: {}", track.url(), error);
            }
        }

        if self.config.art_enabled {
            if let Some(art_url) = &self.art_url {
                let name = format!("cover.{}", art_extension(art_url));
                let options = DownloadOptions::from_config(&self.config);

                // Artwork failures never block the downloaded tracks.
                match download_file(client, art_url, &self.output, &name, &options).await {
                    Ok(DownloadOutcome::Success) => {
                        if self.config.verbose {
                            println!("\nSaved album art to {}", self.output.join(&name).display());
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
