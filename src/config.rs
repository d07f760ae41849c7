//! Runtime configuration shared by the downloader and the entity resolvers.
//!
//! There is no global state; a [`Config`] is passed explicitly through every
//! constructor that needs one.

use std::path::PathBuf;

/// Settings controlling a Campdown run.
#[derive(Debug, Clone)]
pub struct Config {
    /// Output root directory. Entity resolvers create subdirectories below it.
    pub output: PathBuf,
    /// Print status messages, listings and progress bars.
    pub verbose: bool,
    /// Omit artist and album fields from downloaded track filenames.
    pub short: bool,
    /// Download page artwork alongside the audio files.
    pub art_enabled: bool,
    /// Write metadata tags into downloaded audio files.
    pub tag_enabled: bool,
    /// Seconds to sleep between failed transfer attempts.
    pub sleep_secs: u64,
    /// Connect/read timeout for requests, in seconds.
    pub timeout_secs: u64,
    /// Number of retries after the initial attempt of a transfer.
    pub max_retries: u32,
    /// Retry a 503 response like a timeout. Bandcamp uses 503 for
    /// rate-limiting, so this is on by default.
    pub retry_rate_limited: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            output: PathBuf::from("."),
            verbose: true,
            short: false,
            art_enabled: true,
            tag_enabled: true,
            sleep_secs: 30,
            timeout_secs: 3,
            max_retries: 2,
            retry_rate_limited: true,
        }
    }
}
