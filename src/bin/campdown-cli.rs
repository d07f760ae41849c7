use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use campdown::{Campdown, Config};

#[derive(Parser)]
#[command(name = "campdown")]
#[command(about = "Command line Bandcamp downloader", long_about = None)]
struct Cli {
    /// Bandcamp track, album or discography URL
    url: String,

    /// Output folder to work in
    #[arg(short, long, default_value = ".", env = "CAMPDOWN_OUTPUT")]
    output: PathBuf,

    /// Hide status messages and progress output
    #[arg(short, long)]
    quiet: bool,

    /// Keep output filenames short (omit artist and album fields)
    #[arg(short, long)]
    short: bool,

    /// Skip downloading artwork
    #[arg(long)]
    no_art: bool,

    /// Skip writing metadata tags
    #[arg(long)]
    no_id3: bool,

    /// Seconds to sleep between failed requests
    #[arg(long, default_value_t = 30)]
    sleep: u64,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 3)]
    timeout: u64,

    /// Request retries before giving up on a file
    #[arg(long, default_value_t = 2)]
    retries: u32,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = Config {
        output: cli.output,
        verbose: !cli.quiet,
        short: cli.short,
        art_enabled: !cli.no_art,
        tag_enabled: !cli.no_id3,
        sleep_secs: cli.sleep,
        timeout_secs: cli.timeout,
        max_retries: cli.retries,
        retry_rate_limited: true,
    };

    let quiet = cli.quiet;
    let downloader = Campdown::new(config);

    // Cancelling the run drops any in-flight transfer, whose guard removes
    // the partially written file.
    tokio::select! {
        result = downloader.run(&cli.url) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("{}", error);
                ExitCode::FAILURE
            }
        },
        _ = tokio::signal::ctrl_c() => {
            if !quiet {
                println!("\nInterrupt caught. Exiting program...");
            }
            ExitCode::from(2)
        }
    }
}
