//! Google News RSS search.
//!
//! Each keyword is turned into a search URL on
//! `https://news.google.com/rss/search` with the profile's locale
//! parameters. The response is an RSS 2.0 document whose items carry a
//! title, a link and an RFC 2822 `pubDate`.
//!
//! # URL Pattern
//!
//! ```text
//! https://news.google.com/rss/search?q=Direct+Air+Capture&hl=en-US&gl=US&ceid=US%3Aen
//! ```

use crate::models::{Article, Published};
use crate::profile::Locale;
use crate::scrapers::FetchFeed;
use crate::utils::truncate_for_log;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::error::Error;
use std::time::{Duration, Instant};
use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

const SEARCH_URL: &str = "https://news.google.com/rss/search";

#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("feed returned status {status}: {body}")]
    Status { status: u16, body: String },
    #[error("feed is not valid RSS: {0}")]
    Xml(#[from] quick_xml::DeError),
    #[error("invalid search URL: {0}")]
    Url(#[from] url::ParseError),
}

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    items: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
}

/// Build the search feed URL for `keyword`.
///
/// Spaces in the keyword become `+`; everything else that is not URL-safe
/// is percent-encoded.
pub fn search_url(keyword: &str, locale: &Locale) -> Result<Url, FeedError> {
    let query = keyword.split_whitespace().collect::<Vec<_>>().join(" ");
    let url = Url::parse_with_params(
        SEARCH_URL,
        &[
            ("q", query.as_str()),
            ("hl", locale.hl.as_str()),
            ("gl", locale.gl.as_str()),
            ("ceid", locale.ceid.as_str()),
        ],
    )?;
    Ok(url)
}

/// Parse an RSS document into articles, keeping feed order.
///
/// Items without a title or link are skipped. A missing or unparseable
/// `pubDate` yields [`Published::Unknown`].
pub fn parse_feed(xml: &str) -> Result<Vec<Article>, FeedError> {
    let rss: Rss = quick_xml::de::from_str(xml)?;
    let articles = rss
        .channel
        .items
        .into_iter()
        .filter_map(|item| {
            let title = item.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty());
            let link = item.link.map(|l| l.trim().to_string()).filter(|l| !l.is_empty());
            match (title, link) {
                (Some(title), Some(link)) => {
                    let published = item
                        .pub_date
                        .as_deref()
                        .map(parse_pub_date)
                        .unwrap_or(Published::Unknown);
                    Some(Article::new(title, link, published))
                }
                (title, link) => {
                    debug!(?title, ?link, "Skipping feed item without title or link");
                    None
                }
            }
        })
        .collect();
    Ok(articles)
}

/// RSS dates are RFC 2822; some feeds use RFC 3339 instead.
fn parse_pub_date(raw: &str) -> Published {
    let raw = raw.trim();
    DateTime::parse_from_rfc2822(raw)
        .or_else(|_| DateTime::parse_from_rfc3339(raw))
        .map(|dt| Published::At(dt.with_timezone(&Utc)))
        .unwrap_or_else(|e| {
            debug!(raw, error = %e, "Unparseable pubDate");
            Published::Unknown
        })
}

/// Fetches search results from Google News for a fixed locale.
#[derive(Debug, Clone)]
pub struct GoogleNewsFetcher {
    client: Client,
    locale: Locale,
}

impl GoogleNewsFetcher {
    pub fn new(locale: Locale) -> Result<Self, FeedError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(concat!("tech_radar/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, locale })
    }

    #[instrument(level = "info", skip(self))]
    async fn fetch_feed(&self, keyword: &str) -> Result<Vec<Article>, FeedError> {
        let url = search_url(keyword, &self.locale)?;
        let t0 = Instant::now();

        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            return Err(FeedError::Status {
                status: status.as_u16(),
                body: truncate_for_log(&body, 200),
            });
        }

        let articles = parse_feed(&body)?;
        info!(
            %url,
            count = articles.len(),
            elapsed_ms = t0.elapsed().as_millis() as u64,
            "Fetched search feed"
        );
        Ok(articles)
    }
}

impl FetchFeed for GoogleNewsFetcher {
    async fn fetch(&self, keyword: &str) -> Result<Vec<Article>, Box<dyn Error>> {
        Ok(self.fetch_feed(keyword).await?)
    }
}
