//! Top-level downloader interface.
//!
//! Fetches the supplied URL once, classifies the page, and drives the
//! matching entity resolver through its prepare/fetch/download protocol.

use tracing::info;

use crate::client::HttpClient;
use crate::config::Config;
use crate::entity::{Album, Discography, Track};
use crate::error::{CampdownError, Result};
use crate::page::{classify, valid_url, PageKind};

/// Main Campdown interface.
///
/// # Example
///
/// ```rust,no_run
/// use campdown::{Campdown, Config};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = Config {
///         output: "downloads".into(),
///         ..Config::default()
///     };
///
///     Campdown::new(config)
///         .run("https://artist.bandcamp.com/album/record")
///         .await?;
///
///     Ok(())
/// }
/// ```
#[derive(Debug)]
pub struct Campdown {
    config: Config,
    client: HttpClient,
}

impl Campdown {
    /// Create a downloader with the given configuration.
    pub fn new(config: Config) -> Self {
        let client = HttpClient::new(config.timeout_secs);
        Self { config, client }
    }

    /// Access the run configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Analyse a Bandcamp URL and download whatever it points at.
    ///
    /// Only a failure of the root URL itself is an error; failures of
    /// individual children are isolated inside the resolvers.
    pub async fn run(&self, url: &str) -> Result<()> {
        if !valid_url(url) {
            return Err(CampdownError::InvalidUrl(url.to_string()));
        }

        let page = self.client.get_page(url).await?;
        if !page.is_ok() {
            return Err(CampdownError::BadStatus(page.status));
        }

        match classify(&page.body) {
            Some(PageKind::Track) => {
                info!("detected track page: {}", url);
                if self.config.verbose {
                    println!("\nDetected Bandcamp track.");
                }

                let mut track = Track::new(url, &self.config.output, self.config.clone())
                    .with_content(page.body);

                if track.prepare(&self.client).await? {
                    track.download(&self.client).await?;

                    if self.config.verbose {
                        println!("\nFinished track download. Downloader complete.");
                    }
                } else if self.config.verbose {
                    println!(
                        "\nThe track you are trying to download is not publicly available. Consider purchasing it if you want it."
                    );
                }

                Ok(())
            }
            Some(PageKind::Album) => {
                info!("detected album page: {}", url);
                if self.config.verbose {
                    println!("\nDetected Bandcamp album.");
                }

                let mut album = Album::new(url, &self.config.output, self.config.clone())
                    .with_content(page.body);

                if album.prepare(&self.client).await? {
                    album.fetch(&self.client).await?;
                    album.download(&self.client).await?;
                }

                if self.config.verbose {
                    println!("\nFinished album download. Downloader complete.");
                }

                Ok(())
            }
            Some(PageKind::Discography) => {
                info!("detected discography page: {}", url);
                if self.config.verbose {
                    println!("\nDetected Bandcamp discography page.");
                }

                let mut discography =
                    Discography::new(url, &self.config.output, self.config.clone())
                        .with_content(page.body);

                if discography.prepare(&self.client).await? {
                    discography.fetch_download(&self.client).await?;
                }

                if self.config.verbose {
                    println!("\nFinished discography download. Downloader complete.");
                }

                Ok(())
            }
            None => Err(CampdownError::UnrecognizedPage),
        }
    }
}
