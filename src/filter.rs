//! Recency filtering of feed entries.

use crate::models::{Article, Published};
use crate::profile::UndatedPolicy;
use chrono::{DateTime, Duration, Utc};
use tracing::debug;

/// Keeps entries published within a trailing window, up to a per-keyword cap.
#[derive(Debug, Clone, Copy)]
pub struct RecencyFilter {
    window: Duration,
    max_count: usize,
    undated: UndatedPolicy,
}

impl RecencyFilter {
    pub fn new(window_days: u32, max_count: usize, undated: UndatedPolicy) -> Self {
        Self {
            window: Duration::days(i64::from(window_days)),
            max_count,
            undated,
        }
    }

    /// Walk `entries` in feed order and return the accepted ones.
    ///
    /// A dated entry is accepted when `now - published <= window`, so an entry
    /// exactly one window old still makes it in. Iteration stops as soon as
    /// `max_count` entries have been accepted; rejected entries do not count.
    pub fn filter(&self, entries: Vec<Article>, now: DateTime<Utc>) -> Vec<Article> {
        let mut accepted = Vec::with_capacity(self.max_count);
        if self.max_count == 0 {
            return accepted;
        }

        for article in entries {
            let keep = match article.published {
                Published::At(published) => now.signed_duration_since(published) <= self.window,
                Published::Unknown => match self.undated {
                    UndatedPolicy::Admit => true,
                    UndatedPolicy::Reject => false,
                },
            };

            if !keep {
                debug!(title = %article.title, "Entry outside recency window");
                continue;
            }

            accepted.push(article);
            if accepted.len() >= self.max_count {
                break;
            }
        }
        accepted
    }
}
