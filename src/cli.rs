//! Command-line interface definitions for Tech Radar.
//!
//! Secrets are not taken on the command line; they come from the
//! environment (see [`crate::config`]). Everything here has a default so a
//! scheduler can run the binary with no arguments.

use crate::api::{DEFAULT_BASE_URL, DEFAULT_MODEL};
use crate::profile::DEFAULT_PROFILE;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the Tech Radar digest.
///
/// # Examples
///
/// ```sh
/// # Default profile, send the email
/// tech_radar
///
/// # Korean industry profile, keep a copy of the HTML and a JSON archive
/// tech_radar --profile kr-industry --html-output digest.html --json-output-dir ./archive
///
/// # Render without sending
/// tech_radar --dry-run --html-output /tmp/preview.html
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Built-in profile to run (tech-radar, kr-industry)
    #[arg(short, long, env = "TECH_RADAR_PROFILE", default_value = DEFAULT_PROFILE)]
    pub profile: String,

    /// YAML profile file; overrides --profile
    #[arg(long, env = "TECH_RADAR_PROFILE_FILE")]
    pub profile_file: Option<PathBuf>,

    /// Override the profile's per-keyword article cap
    #[arg(long)]
    pub max_per_keyword: Option<usize>,

    /// Override the profile's recency window, in days
    #[arg(long)]
    pub window_days: Option<u32>,

    /// Chat model used for summaries
    #[arg(long, env = "OPENAI_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub api_base_url: String,

    /// Retries per summarization call (0 = single attempt)
    #[arg(long, default_value_t = 0)]
    pub llm_retries: usize,

    /// SMTP submission host
    #[arg(long, env = "SMTP_HOST", default_value = "smtp.gmail.com")]
    pub smtp_host: String,

    /// SMTP submission port (STARTTLS)
    #[arg(long, env = "SMTP_PORT", default_value_t = 587)]
    pub smtp_port: u16,

    /// Keywords processed at once; output order is unaffected
    #[arg(long, default_value_t = 1)]
    pub concurrency: usize,

    /// Build the digest but do not send email
    #[arg(long)]
    pub dry_run: bool,

    /// Also write the rendered HTML to this file
    #[arg(long)]
    pub html_output: Option<PathBuf>,

    /// Archive the digest as JSON under this directory
    #[arg(short, long)]
    pub json_output_dir: Option<String>,
}
