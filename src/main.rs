//! # Tech Radar
//!
//! A scheduled news digest: searches Google News for each keyword of a
//! profile, keeps the articles published in the last week, asks an
//! OpenAI-compatible LLM for a short summary and a researcher-oriented
//! insight on each one, and emails the result as a single HTML page.
//!
//! ## Usage
//!
//! ```sh
//! OPENAI_API_KEY=... EMAIL_USER=... EMAIL_PASS=... EMAIL_TO=... tech_radar
//! tech_radar --profile kr-industry
//! tech_radar --dry-run --html-output preview.html
//! ```
//!
//! ## Architecture
//!
//! The application runs one linear pass and exits:
//! 1. **Fetching**: Search the feed for each keyword, in profile order
//! 2. **Filtering**: Keep entries inside the recency window, up to the per-keyword cap
//! 3. **Summarizing**: One LLM call per surviving article
//! 4. **Delivery**: Render the digest and send it, unless nothing was found

use chrono::{Local, Utc};
use clap::Parser;
use std::error::Error;
use std::time::Duration;
use tracing::{debug, error, info, instrument, warn};
use tracing_subscriber::{EnvFilter, fmt as tfmt};

mod api;
mod cli;
mod config;
mod filter;
mod mailer;
mod models;
mod outputs;
mod pipeline;
mod profile;
mod scrapers;
mod summarizer;
mod utils;

use api::{OpenAiChat, RetryAsk};
use cli::Cli;
use config::{ConfigError, EMAIL_USER, Secrets};
use mailer::{DryRunMailer, Mailer, SmtpMailer};
use outputs::json;
use pipeline::{Pipeline, RunOutcome};
use profile::{DigestProfile, ProfileError};
use scrapers::google_news::GoogleNewsFetcher;
use summarizer::LlmSummarizer;

/// Resolve the profile from the CLI: a YAML file wins over a built-in name,
/// then per-run overrides are applied.
fn resolve_profile(args: &Cli) -> Result<DigestProfile, ProfileError> {
    let mut profile = match &args.profile_file {
        Some(path) => DigestProfile::load(path)?,
        None => DigestProfile::builtin(&args.profile)?,
    };
    if let Some(cap) = args.max_per_keyword {
        profile.max_per_keyword = cap;
    }
    if let Some(days) = args.window_days {
        profile.window_days = days;
    }
    profile.validated()
}

#[tokio::main]
#[instrument]
async fn main() -> Result<(), Box<dyn Error>> {
    // .env has to be in the environment before clap resolves `env` fallbacks.
    let dotenv = dotenvy::dotenv();

    // --- Tracing init ---
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tfmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .init();

    let start_time = std::time::Instant::now();
    info!("tech_radar starting up");
    match &dotenv {
        Ok(path) => debug!(path = %path.display(), "Loaded .env"),
        Err(e) => debug!(error = %e, "No .env loaded"),
    }

    // Parse CLI
    let args = Cli::parse();
    debug!(?args, "Parsed CLI arguments");

    // ---- Profile & secrets (fail fast, before any network call) ----
    let profile = match resolve_profile(&args) {
        Ok(profile) => profile,
        Err(e) => {
            error!(error = %e, "Invalid profile");
            return Err(e.into());
        }
    };
    info!(
        profile = %profile.name,
        keywords = profile.keywords.len(),
        max_per_keyword = profile.max_per_keyword,
        window_days = profile.window_days,
        "Profile resolved"
    );

    let secrets = match Secrets::from_env(!args.dry_run, &profile.sender_name) {
        Ok(secrets) => secrets,
        Err(e) => {
            error!(error = %e, "Configuration error");
            return Err(e.into());
        }
    };

    // ---- Components ----
    let fetcher = GoogleNewsFetcher::new(profile.locale.clone())?;
    let chat = OpenAiChat::new(
        secrets.openai_api_key.clone(),
        args.model.clone(),
        &args.api_base_url,
    )?;
    info!(model = chat.model(), retries = args.llm_retries, "LLM client ready");
    let summarizer = LlmSummarizer::new(
        RetryAsk::new(chat, args.llm_retries, Duration::from_secs(1)),
        &profile,
    );

    let mailer = match (args.dry_run, secrets.mail) {
        (true, _) => Mailer::DryRun(DryRunMailer),
        (false, Some(mail)) => Mailer::Smtp(SmtpMailer::new(mail, &args.smtp_host, args.smtp_port)),
        (false, None) => return Err(ConfigError::Missing(EMAIL_USER).into()),
    };

    // ---- Run ----
    let local_now = Local::now();
    let generated_at = Utc::now();
    let date = local_now.date_naive();

    let pipeline = Pipeline::new(&profile, fetcher, summarizer, mailer, *local_now.offset())
        .with_concurrency(args.concurrency);
    let report = pipeline.run(generated_at, date).await;

    // ---- Optional outputs ----
    if let (Some(path), Some(document)) = (&args.html_output, &report.document) {
        match tokio::fs::write(path, document).await {
            Ok(()) => info!(path = %path.display(), "Wrote HTML digest"),
            Err(e) => error!(path = %path.display(), error = %e, "Failed writing HTML digest"),
        }
    }

    if let Some(dir) = &args.json_output_dir {
        if let Err(e) = json::write_digest(&report.digest, &profile.name, date, generated_at, dir).await {
            error!(error = %e, "Failed to write JSON archive");
        }
    }

    match &report.outcome {
        RunOutcome::Sent => info!(
            subject = report.subject.as_deref().unwrap_or_default(),
            sections = report.digest.sections.len(),
            articles = report.digest.article_count(),
            "Digest sent"
        ),
        RunOutcome::NoNews => info!("No new articles found; nothing sent"),
        RunOutcome::SendFailed(reason) => warn!(%reason, "Digest was not delivered"),
    }

    let elapsed = start_time.elapsed();
    info!(
        ?elapsed,
        secs = elapsed.as_secs(),
        millis = elapsed.subsec_millis(),
        "Execution complete"
    );

    Ok(())
}
