//! Resilient chunked file downloader.
//!
//! Streams a media URL to disk, verifies completeness against the declared
//! `content-length` with a percentage confidence margin, and retries
//! transient failures (timeouts, connection errors, mid-transfer drops and
//! optionally 503 rate limiting) with a fixed backoff sleep. Partial files
//! never survive: a drop guard removes them on failure and on cancellation.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use indicatif::{ProgressBar, ProgressStyle};
use reqwest::header::CONTENT_LENGTH;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

use crate::client::HttpClient;
use crate::error::Result;

/// Margin, as a fraction of the remote size, by which a local file may fall
/// short of the declared `content-length` and still count as complete.
/// Metadata tagging can shift file sizes slightly after the fact, and a few
/// bytes of length mismatch are not a meaningful corruption signal.
pub const CONFIDENCE_PERCENTAGE: f64 = 0.01;

/// Outcome of a single file download.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DownloadOutcome {
    /// File was transferred and verified.
    Success,
    /// A file of matching size already exists at the destination.
    AlreadyPresent,
    /// A retryable failure: timeout, connection error, rate limiting, or an
    /// undersized transfer. Converted to [`DownloadOutcome::FatalError`]
    /// once retries are exhausted.
    TransientError(u16),
    /// A non-retryable failure carrying the HTTP status code, or 0 when no
    /// usable response was obtained at all.
    FatalError(u16),
}

impl DownloadOutcome {
    /// Whether the outcome left no usable file behind.
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            DownloadOutcome::TransientError(_) | DownloadOutcome::FatalError(_)
        )
    }
}

/// Options controlling a single [`download_file`] call.
#[derive(Debug, Clone)]
pub struct DownloadOptions {
    /// Skip the existing-file check and always transfer.
    pub force: bool,
    /// Print status lines and a progress bar.
    pub verbose: bool,
    /// Seconds to sleep between failed attempts.
    pub sleep_secs: u64,
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Treat a 503 response as transient instead of fatal.
    pub retry_rate_limited: bool,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            force: false,
            verbose: false,
            sleep_secs: 30,
            max_retries: 2,
            retry_rate_limited: true,
        }
    }
}

impl DownloadOptions {
    /// Build options from a run configuration.
    pub fn from_config(config: &crate::config::Config) -> Self {
        Self {
            force: false,
            verbose: config.verbose,
            sleep_secs: config.sleep_secs,
            max_retries: config.max_retries,
            retry_rate_limited: config.retry_rate_limited,
        }
    }
}

/// Completion confidence of a local file against the declared remote size.
///
/// Negative when the local file is short by more than the margin; zero or
/// positive means the file counts as complete.
pub fn confidence(remote_length: u64, local_length: u64) -> f64 {
    -(remote_length as f64 - (local_length as f64 + remote_length as f64 * CONFIDENCE_PERCENTAGE))
}

/// Classify a non-200 status code under the retry policy.
fn status_outcome(status: u16, options: &DownloadOptions) -> DownloadOutcome {
    if status == 503 && options.retry_rate_limited {
        DownloadOutcome::TransientError(status)
    } else {
        DownloadOutcome::FatalError(status)
    }
}

/// Whether a request error is worth retrying.
fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}

/// Removes the file at `path` when dropped, unless defused by [`keep`].
///
/// Covers failed transfers and task cancellation (Ctrl-C) alike, so no
/// partial file is ever left at the destination.
///
/// [`keep`]: PartialGuard::keep
struct PartialGuard {
    path: PathBuf,
    armed: bool,
}

impl PartialGuard {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            armed: true,
        }
    }

    fn keep(mut self) {
        self.armed = false;
    }
}

impl Drop for PartialGuard {
    fn drop(&mut self) {
        if self.armed {
            let _ = std::fs::remove_file(&self.path);
        }
    }
}

/// Result of one request acquisition attempt.
enum Acquired {
    Response(reqwest::Response),
    Failed(DownloadOutcome),
}

/// Issue the GET request, retrying transient failures with backoff.
///
/// The retry counter is shared with the caller so request retries and
/// transfer retries draw from the same budget within a phase.
async fn acquire(
    client: &HttpClient,
    url: &str,
    options: &DownloadOptions,
    retries: &mut u32,
) -> Result<Acquired> {
    loop {
        match client.inner().get(url).send().await {
            Ok(response) => {
                let status = response.status().as_u16();

                if status == 200 {
                    return Ok(Acquired::Response(response));
                }

                match status_outcome(status, options) {
                    DownloadOutcome::TransientError(_) if *retries < options.max_retries => {
                        *retries += 1;
                        backoff(
                            &format!("503 Service Unavailable. Attempting {} of {} retries.", retries, options.max_retries),
                            options,
                        )
                        .await;
                    }
                    DownloadOutcome::TransientError(_) => {
                        // Out of retries; keep the status so rate-limit
                        // exhaustion is distinguishable from a dead link.
                        return Ok(Acquired::Failed(DownloadOutcome::FatalError(status)));
                    }
                    outcome => {
                        if options.verbose {
                            println!("Request error {}", status);
                        }
                        return Ok(Acquired::Failed(outcome));
                    }
                }
            }
            Err(error) if is_transient(&error) => {
                if *retries < options.max_retries {
                    *retries += 1;
                    backoff(
                        &format!("Connection failed. Attempting {} of {} retries.", retries, options.max_retries),
                        options,
                    )
                    .await;
                } else {
                    return Ok(Acquired::Failed(DownloadOutcome::FatalError(0)));
                }
            }
            Err(error) => return Err(error.into()),
        }
    }
}

async fn backoff(message: &str, options: &DownloadOptions) {
    warn!("{}", message);

    if options.verbose {
        println!("{}", message);
        println!("Waiting for {} seconds ...", options.sleep_secs);
    }

    tokio::time::sleep(Duration::from_secs(options.sleep_secs)).await;
}

/// Download a file from `url` into `output` under `name`.
///
/// `output` must exist and `name` must already be sanitized for the host
/// filesystem. Transport-level failures and undersized transfers are
/// retried from scratch up to `max_retries` times; on total failure the
/// partial file is removed and `FatalError` is returned. A pre-existing
/// file whose size is within the confidence margin of the remote size short-
/// circuits to `AlreadyPresent` without transferring.
pub async fn download_file(
    client: &HttpClient,
    url: &str,
    output: &Path,
    name: &str,
    options: &DownloadOptions,
) -> Result<DownloadOutcome> {
    if options.verbose {
        println!("\nDownloading: {}", name);
    }

    let destination = output.join(name);

    // Phase one: obtain an initial response.
    let mut retries = 0;
    let response = match acquire(client, url, options, &mut retries).await? {
        Acquired::Response(response) => response,
        Acquired::Failed(outcome) => return Ok(outcome),
    };

    // Completion cannot be verified without a declared length.
    let remote_length = match response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
    {
        Some(length) => length,
        None => {
            if options.verbose {
                println!("Request does not contain an entry for the content length.");
            }
            return Ok(DownloadOutcome::FatalError(0));
        }
    };

    if !options.force && destination.is_file() {
        let local_length = tokio::fs::metadata(&destination).await?.len();

        if confidence(remote_length, local_length) < 0.0 {
            if options.verbose {
                println!("File already found but the file size does not match up. Re-downloading.");
            }
        } else {
            if options.verbose {
                println!("File already found. Skipping download.");
            }
            return Ok(DownloadOutcome::AlreadyPresent);
        }
    }

    // Phase two: stream the body, verifying and retrying from scratch.
    let mut retries = 0;
    let mut pending = Some(response);

    loop {
        let response = match pending.take() {
            Some(response) => response,
            None => match acquire(client, url, options, &mut retries).await? {
                Acquired::Response(response) => response,
                Acquired::Failed(outcome) => return Ok(outcome),
            },
        };

        let guard = PartialGuard::new(&destination);
        let mut file = File::create(&destination).await?;
        let mut stream = response.bytes_stream();

        let progress = if options.verbose {
            let bar = ProgressBar::new(remote_length);
            bar.set_style(
                ProgressStyle::with_template("[{bar:50}] {bytes} / {total_bytes}")
                    .expect("static progress template")
                    .progress_chars("=> "),
            );
            Some(bar)
        } else {
            None
        };

        let mut written: u64 = 0;
        let mut interrupted = false;

        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(bytes) => {
                    file.write_all(&bytes).await?;
                    written += bytes.len() as u64;

                    if let Some(bar) = &progress {
                        bar.set_position(written.min(remote_length));
                    }
                }
                Err(error) => {
                    debug!("transfer interrupted: {}", error);
                    interrupted = true;
                    break;
                }
            }
        }

        file.flush().await?;
        drop(file);

        if let Some(bar) = &progress {
            bar.finish_and_clear();
        }

        if !interrupted && confidence(remote_length, written) >= 0.0 {
            guard.keep();
            debug!("downloaded {} bytes to {}", written, destination.display());
            return Ok(DownloadOutcome::Success);
        }

        // The transfer came up short of the declared length.
        if retries < options.max_retries {
            retries += 1;
            backoff(
                &format!("The download didn't complete. Attempting {} of {} retries.", retries, options.max_retries),
                options,
            )
            .await;
            // The guard drops here and removes the partial file before the
            // next attempt rewrites it.
            continue;
        }

        if options.verbose {
            println!("Connection timed out or interrupted.");
        }

        return Ok(DownloadOutcome::FatalError(0));
    }
}
