//! # Campdown
//!
//! A Rust library and command line tool for downloading tracks, albums and
//! discographies from Bandcamp, with metadata tags and artwork.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use campdown::{Campdown, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config {
//!         output: "downloads".into(),
//!         ..Config::default()
//!     };
//!
//!     // Works for track, album and discography URLs alike.
//!     Campdown::new(config)
//!         .run("https://artist.bandcamp.com/album/record")
//!         .await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Track, album and discography pages** are detected automatically and
//!   resolved recursively down to individual media files
//! - **Resilient transfers**: streamed chunked downloads with
//!   content-length verification, retry with backoff, and no partial files
//!   left behind
//! - **Metadata tags and artwork** written alongside the audio
//!
//! ## Low-Level APIs
//!
//! For more control, the building blocks are public:
//!
//! - [`Track`], [`Album`], [`Discography`] - entity resolvers with the
//!   prepare/fetch/download protocol
//! - [`download_file`] - the resilient file downloader
//! - [`classify`] - the page classifier

mod campdown;
pub mod client;
pub mod config;
pub mod download;
pub mod entity;
pub mod error;
pub mod naming;
pub mod page;
pub mod scrape;
pub mod tagging;

// Main interface (recommended)
pub use campdown::Campdown;
pub use config::Config;

// Building blocks
pub use client::HttpClient;
pub use download::{confidence, download_file, DownloadOptions, DownloadOutcome};
pub use entity::{Album, Discography, DiscographyItem, EntityState, Track};
pub use error::{CampdownError, Result};
pub use page::{classify, PageKind};
pub use scrape::MediaReference;
