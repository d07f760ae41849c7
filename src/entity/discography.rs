//! Discography resolver.

use std::path::PathBuf;

use tracing::warn;

use crate::client::HttpClient;
use crate::config::Config;
use crate::entity::{strike, Album, DiscographyItem, EntityState, Track};
use crate::error::{CampdownError, Result};
use crate::naming::sanitize_filename;
use crate::page::{base_url, classify, valid_url, PageKind};
use crate::scrape;

/// Resolver for an artist discography page.
///
/// `prepare()` discovers album and track links and builds a mixed queue,
/// albums before tracks, in discovery order. Children are resolved either
/// up front (`fetch()` then `download()`) or interleaved per entity
/// (`fetch_download()`), which avoids resolving an entire large discography
/// before the first byte is written.
#[derive(Debug)]
pub struct Discography {
    url: String,
    output: PathBuf,
    config: Config,
    state: EntityState,

    artist: String,
    base_url: Option<String>,

    queue: Vec<DiscographyItem>,
    content: Option<String>,
}

impl Discography {
    /// Create a discography resolver for a URL. The artist directory is
    /// created below `output` during prepare.
    pub fn new(url: impl Into<String>, output: impl Into<PathBuf>, config: Config) -> Self {
        Self {
            url: url.into(),
            output: output.into(),
            config,
            state: EntityState::Unprepared,
            artist: String::new(),
            base_url: None,
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

    /// Artist name, available once prepared.
    pub fn artist(&self) -> &str {
        &self.artist
    }

    /// Discovered child queue, albums before tracks in discovery order.
    pub fn queue(&self) -> &[DiscographyItem] {
        &self.queue
    }

    /// Lifecycle state.
    pub fn state(&self) -> EntityState {
        self.state
    }

    /// Resolve the artist name, create the artist directory and discover
    /// album and track links into the child queue.
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

        if classify(&content) != Some(PageKind::Discography) {
            warn!("{} is not a discography page", self.url);
        }

        let base = match base_url(&self.url) {
            Some(base) => base,
            None => {
                warn!("could not derive a base URL from {}", self.url);
                self.state = EntityState::Failed;
                return Ok(false);
            }
        };

        let artist = scrape::string_between(&content, r#"<meta name="Description" content=""#, r#"">"#)
            .map(|meta| {
                let meta = scrape::decode_entities(meta.trim());
                match meta.split_once(".\n") {
                    Some((artist, _)) => artist.to_string(),
                    None => meta,
                }
            })
            .unwrap_or_default();

        if !artist.is_empty() {
            self.output = self.output.join(sanitize_filename(&artist));
            tokio::fs::create_dir_all(&self.output).await?;

            if self.config.verbose {
                println!("\nSet \"{}\" as the working directory.", self.output.display());
            }
        }

        self.artist = sanitize_filename(&artist);
        self.base_url = Some(base.clone());

        let (albums, tracks) = scrape::discography_links(&content, &base);

        if self.config.verbose {
            println!("\nListing found discography content");
        }

        for url in albums {
            if self.config.verbose {
                println!("{}", url);
            }
            self.queue.push(DiscographyItem::Album(Album::new(
                url,
                self.output.clone(),
                self.config.clone(),
            )));
        }

        for url in tracks {
            if self.config.verbose {
                println!("{}", url);
            }
            self.queue.push(DiscographyItem::Track(Track::new(
                url,
                self.output.clone(),
                self.config.clone(),
            )));
        }

        self.state = EntityState::Prepared;
        Ok(true)
    }

    /// Prepare every queued child (and fetch album track queues).
    ///
    /// Children that fail to prepare are struck from the listing and removed
    /// from the queue; siblings are unaffected.
    pub async fn fetch(&mut self, client: &HttpClient) -> Result<()> {
        if self.state != EntityState::Prepared {
            return Err(CampdownError::NotPrepared(self.url.clone()));
        }

        let mut kept = Vec::new();

        for mut item in std::mem::take(&mut self.queue) {
            if self.resolve_item(&mut item, client).await {
                kept.push(item);
            } else if self.config.verbose {
                println!("{}", strike(item.url()));
            }
        }

        self.queue = kept;
        Ok(())
    }

    /// Download every resolved child in queue order.
    pub async fn download(&self, client: &HttpClient) -> Result<()> {
        if self.state != EntityState::Prepared {
            return Err(CampdownError::NotPrepared(self.url.clone()));
        }

        for item in &self.queue {
            self.download_item(item, client).await;
        }

        Ok(())
    }

    /// Interleave resolution and download per child.
    ///
    /// Each entity runs its full prepare → fetch → download chain before the
    /// next one is touched, so large discographies start producing files
    /// immediately. Failed children are struck and dropped.
    pub async fn fetch_download(&mut self, client: &HttpClient) -> Result<()> {
        if self.state != EntityState::Prepared {
            return Err(CampdownError::NotPrepared(self.url.clone()));
        }

        let mut kept = Vec::new();

        for mut item in std::mem::take(&mut self.queue) {
            if self.resolve_item(&mut item, client).await {
                self.download_item(&item, client).await;
                kept.push(item);
            } else if self.config.verbose {
                println!("{}", strike(item.url()));
            }
        }

        self.queue = kept;
        Ok(())
    }

    /// Prepare one child, fetching album tracks as well. Transport errors
    /// count as a failed child, not an aborted run.
    async fn resolve_item(&self, item: &mut DiscographyItem, client: &HttpClient) -> bool {
        match item {
            DiscographyItem::Track(track) => match track.prepare(client).await {
                Ok(prepared) => prepared,
                Err(error) => {
                    warn!("failed to prepare {}: {}", track.url(), error);
                    false
                }
            },
            DiscographyItem::Album(album) => {
                match album.prepare(client).await {
                    Ok(true) => {}
                    Ok(false) => return false,
                    Err(error) => {
                        warn!("failed to prepare {}: {}", album.url(), error);
                        return false;
                    }
                }

                match album.fetch(client).await {
                    Ok(()) => true,
                    Err(error) => {
                        warn!("failed to fetch {}: {}", album.url(), error);
                        false
                    }
                }
            }
        }
    }

    async fn download_item(&self, item: &DiscographyItem, client: &HttpClient) {
        match item {
            DiscographyItem::Track(track) => {
                if self.config.verbose {
                    println!("\nDownloading track \"{}\"", track.title());
                }
                if let Err(error) = track.download(client).await {
                    warn!("failed to download {}: {}", track.url(), error);
                }
            }
            DiscographyItem::Album(album) => {
                if self.config.verbose {
                    println!("\nDownloading album \"{}\"", album.title());
                }
                if let Err(error) = album.download(client).await {
                    warn!("failed to download {}: {}", album.url(), error);
                }
            }
        }
    }
}
