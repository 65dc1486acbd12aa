//! Data models for feed articles, their annotations, and the assembled digest.
//!
//! This module defines the core data structures used throughout the application:
//! - [`Article`]: A feed entry with its title, link and publish time
//! - [`Annotation`]: The summary/insight pair produced by the LLM
//! - [`Digest`]: Ordered keyword sections ready for rendering and sending
//!
//! Everything here is built once per run and discarded after the digest is sent.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Prefix written into [`Annotation::summary`] when the LLM call fails.
pub const SUMMARY_FAILED: &str = "요약 실패";

/// When a feed entry was published.
///
/// Feeds do not always carry a parseable date; those entries are kept as
/// [`Published::Unknown`] and handled by the recency filter's undated policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Published {
    At(DateTime<Utc>),
    Unknown,
}

/// A single news entry as parsed from the search feed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    /// The headline as published by the feed.
    pub title: String,
    /// The article URL. Articles have no identity beyond this link.
    pub link: String,
    /// Publish time from the feed entry, if any.
    pub published: Published,
}

impl Article {
    pub fn new(title: impl Into<String>, link: impl Into<String>, published: Published) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            published,
        }
    }
}

/// The LLM-derived summary and optional insight for an [`Article`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    /// Short summary of the article, or the failure marker.
    pub summary: String,
    /// One-sentence takeaway for the target audience.
    pub insight: Option<String>,
}

impl Annotation {
    /// Build an annotation, treating a blank insight as absent.
    pub fn new(summary: impl Into<String>, insight: Option<String>) -> Self {
        let insight = insight
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        Self {
            summary: summary.into().trim().to_string(),
            insight,
        }
    }

    /// The annotation used in place of a summary when the LLM call failed.
    pub fn failed(reason: impl std::fmt::Display) -> Self {
        Self {
            summary: format!("{SUMMARY_FAILED}: {reason}"),
            insight: None,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.summary.starts_with(SUMMARY_FAILED)
    }
}

/// An article paired with its annotation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestEntry {
    pub article: Article,
    pub annotation: Annotation,
}

/// All entries collected for one keyword.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigestSection {
    pub keyword: String,
    pub entries: Vec<DigestEntry>,
}

/// The per-run aggregation of keyword sections, in keyword order.
///
/// Sections are only ever added with at least one entry, so a non-empty
/// digest always means some news was found.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Digest {
    pub sections: Vec<DigestSection>,
}

impl Digest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section for `keyword`. Empty sections are dropped.
    pub fn push_section(&mut self, keyword: impl Into<String>, entries: Vec<DigestEntry>) {
        if entries.is_empty() {
            return;
        }
        self.sections.push(DigestSection {
            keyword: keyword.into(),
            entries,
        });
    }

    /// True when no keyword produced any article.
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    pub fn article_count(&self) -> usize {
        self.sections.iter().map(|s| s.entries.len()).sum()
    }

    pub fn failed_count(&self) -> usize {
        self.sections
            .iter()
            .flat_map(|s| &s.entries)
            .filter(|e| e.annotation.is_failure())
            .count()
    }
}
