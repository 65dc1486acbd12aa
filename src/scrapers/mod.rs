//! News feed fetchers.
//!
//! A fetcher turns a keyword into the list of feed entries for that keyword,
//! in the order the feed lists them. Filtering by date happens later, in
//! [`crate::filter`].
//!
//! # Supported Sources
//!
//! | Source | Module | Method | Notes |
//! |--------|--------|--------|-------|
//! | Google News | [`google_news`] | RSS search | Locale set per profile |

pub mod google_news;

use crate::models::Article;
use std::error::Error;

/// Retrieves the feed entries for a keyword.
pub trait FetchFeed {
    async fn fetch(&self, keyword: &str) -> Result<Vec<Article>, Box<dyn Error>>;
}
