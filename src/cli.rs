//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use postgrab_core::config::DEFAULT_MAX_DOWNLOADS;
use postgrab_core::{ExtractorConfig, RetryPolicy};

/// Extract the text and media of a single post.
///
/// Prints the extraction result as JSON on stdout. With `--download`, the
/// resolved media is fetched and written to the output directory.
#[derive(Parser, Debug)]
#[command(name = "postgrab")]
#[command(author, version, about)]
pub struct Args {
    /// Post URL to extract
    pub post_url: String,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long)]
    pub quiet: bool,

    /// Also download the resolved media
    #[arg(long)]
    pub download: bool,

    /// Directory downloaded media is written to
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// Maximum media items downloaded (1-40)
    #[arg(long, default_value_t = DEFAULT_MAX_DOWNLOADS as u8, value_parser = clap::value_parser!(u8).range(1..=40))]
    pub max_downloads: u8,

    /// Per-request timeout in seconds for pages and media (1-120)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..=120))]
    pub timeout: Option<u64>,

    /// Make a single extraction attempt
    #[arg(long)]
    pub no_retry: bool,
}

impl Args {
    /// Applies command-line overrides on top of `config`.
    pub fn apply(&self, mut config: ExtractorConfig) -> ExtractorConfig {
        config.max_downloads = usize::from(self.max_downloads);
        if let Some(secs) = self.timeout {
            config.fetch_timeout = Duration::from_secs(secs);
            config.download_timeout = Duration::from_secs(secs);
        }
        if self.no_retry {
            config.retry = RetryPolicy::no_retry();
        }
        config
    }

    /// Default log filter when `RUST_LOG` is unset.
    pub fn default_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}
