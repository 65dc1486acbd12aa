//! The fetch → filter → summarize → render → send pipeline.
//!
//! One [`Pipeline::run`] is one digest. Keywords are processed in profile
//! order; failures are contained at the smallest unit that failed (a feed
//! error empties one keyword, a summarization error marks one article, a
//! send error is reported in the [`RunReport`]) so the run always finishes.

use crate::filter::RecencyFilter;
use crate::mailer::SendDigest;
use crate::models::{Digest, DigestEntry};
use crate::outputs::html::DigestRenderer;
use crate::profile::DigestProfile;
use crate::scrapers::FetchFeed;
use crate::summarizer::Summarize;
use chrono::{DateTime, FixedOffset, NaiveDate, Utc};
use futures::stream::{self, StreamExt};
use tracing::{error, info, instrument, warn};

/// How a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The digest was handed to the mailer successfully.
    Sent,
    /// No keyword produced an article, so nothing was sent.
    NoNews,
    /// Sending failed; the reason is the mailer's error message.
    SendFailed(String),
}

/// Everything a run produced.
#[derive(Debug)]
pub struct RunReport {
    pub digest: Digest,
    pub subject: Option<String>,
    /// The rendered document, present whenever the digest was non-empty.
    pub document: Option<String>,
    pub outcome: RunOutcome,
}

pub struct Pipeline<'a, F, S, M> {
    profile: &'a DigestProfile,
    fetcher: F,
    summarizer: S,
    mailer: M,
    filter: RecencyFilter,
    renderer: DigestRenderer<'a>,
    concurrency: usize,
}

impl<'a, F, S, M> Pipeline<'a, F, S, M>
where
    F: FetchFeed,
    S: Summarize,
    M: SendDigest,
{
    /// `offset` is the local offset used to print article dates.
    pub fn new(
        profile: &'a DigestProfile,
        fetcher: F,
        summarizer: S,
        mailer: M,
        offset: FixedOffset,
    ) -> Self {
        Self {
            profile,
            fetcher,
            summarizer,
            mailer,
            filter: RecencyFilter::new(profile.window_days, profile.max_per_keyword, profile.undated),
            renderer: DigestRenderer::new(profile, offset),
            concurrency: 1,
        }
    }

    /// Process up to `n` keywords at a time. Output order is unaffected.
    pub fn with_concurrency(mut self, n: usize) -> Self {
        self.concurrency = n.max(1);
        self
    }

    /// Fetch, filter and annotate the articles for one keyword.
    #[instrument(level = "info", skip(self, now))]
    async fn collect_keyword(&self, keyword: &str, now: DateTime<Utc>) -> Vec<DigestEntry> {
        info!("Searching news");
        let entries = match self.fetcher.fetch(keyword).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Feed fetch failed; treating keyword as empty");
                return Vec::new();
            }
        };

        let examined = entries.len();
        let articles = self.filter.filter(entries, now);
        info!(examined, kept = articles.len(), "Filtered feed entries");

        let mut collected = Vec::with_capacity(articles.len());
        for article in articles {
            let annotation = self.summarizer.summarize(&article.title, &article.link).await;
            collected.push(DigestEntry {
                article,
                annotation,
            });
        }
        collected
    }

    /// Build the digest for every keyword, in keyword order.
    pub async fn collect(&self, now: DateTime<Utc>) -> Digest {
        let results: Vec<(&String, Vec<DigestEntry>)> = stream::iter(&self.profile.keywords)
            .map(|keyword| async move { (keyword, self.collect_keyword(keyword, now).await) })
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut digest = Digest::new();
        for (keyword, entries) in results {
            digest.push_section(keyword.as_str(), entries);
        }
        digest
    }

    /// Run the whole pipeline once. An empty digest is never sent.
    #[instrument(level = "info", skip_all, fields(profile = %self.profile.name))]
    pub async fn run(&self, now: DateTime<Utc>, date: NaiveDate) -> RunReport {
        let digest = self.collect(now).await;
        info!(
            sections = digest.sections.len(),
            articles = digest.article_count(),
            failed_summaries = digest.failed_count(),
            "Digest assembled"
        );

        if digest.is_empty() {
            info!("No new articles for any keyword; not sending");
            return RunReport {
                digest,
                subject: None,
                document: None,
                outcome: RunOutcome::NoNews,
            };
        }

        let document = self.renderer.render(&digest, date);
        let subject = self.renderer.subject(date);
        let outcome = match self.mailer.send(&subject, &document).await {
            Ok(()) => {
                info!(%subject, "Digest delivered");
                RunOutcome::Sent
            }
            Err(e) => {
                error!(%subject, error = %e, "Failed to send digest");
                RunOutcome::SendFailed(e.to_string())
            }
        };

        RunReport {
            digest,
            subject: Some(subject),
            document: Some(document),
            outcome,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Annotation, Article, Published};
    use chrono::{Duration, TimeZone};
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::error::Error;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 19, 9, 0, 0).unwrap()
    }

    fn today() -> NaiveDate {
        now().date_naive()
    }

    fn utc() -> FixedOffset {
        FixedOffset::east_opt(0).unwrap()
    }

    fn article(title: &str, age: Duration) -> Article {
        Article::new(
            title,
            format!("https://example.com/{}", title.replace(' ', "-")),
            Published::At(now() - age),
        )
    }

    #[derive(Default)]
    struct FakeFeed {
        feeds: HashMap<String, Result<Vec<Article>, String>>,
        delays_ms: HashMap<String, u64>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeFeed {
        fn with(mut self, keyword: &str, articles: Vec<Article>) -> Self {
            self.feeds.insert(keyword.to_string(), Ok(articles));
            self
        }

        fn failing(mut self, keyword: &str) -> Self {
            self.feeds
                .insert(keyword.to_string(), Err("connection reset".to_string()));
            self
        }

        fn delayed(mut self, keyword: &str, ms: u64) -> Self {
            self.delays_ms.insert(keyword.to_string(), ms);
            self
        }
    }

    impl FetchFeed for FakeFeed {
        async fn fetch(&self, keyword: &str) -> Result<Vec<Article>, Box<dyn Error>> {
            self.calls.borrow_mut().push(keyword.to_string());
            if let Some(ms) = self.delays_ms.get(keyword) {
                tokio::time::sleep(std::time::Duration::from_millis(*ms)).await;
            }
            match self.feeds.get(keyword) {
                Some(Ok(articles)) => Ok(articles.clone()),
                Some(Err(e)) => Err(e.clone().into()),
                None => Ok(Vec::new()),
            }
        }
    }

    /// Fails for any title containing "broken".
    #[derive(Default)]
    struct FakeSummarizer {
        calls: RefCell<Vec<String>>,
    }

    impl Summarize for FakeSummarizer {
        async fn summarize(&self, title: &str, _link: &str) -> Annotation {
            self.calls.borrow_mut().push(title.to_string());
            if title.contains("broken") {
                Annotation::failed("429 Too Many Requests")
            } else {
                Annotation::new(format!("summary of {title}"), Some("insight".to_string()))
            }
        }
    }

    #[derive(Default)]
    struct FakeMailer {
        fail: bool,
        sent: RefCell<Vec<(String, String)>>,
    }

    impl SendDigest for FakeMailer {
        async fn send(&self, subject: &str, html: &str) -> Result<(), Box<dyn Error>> {
            self.sent
                .borrow_mut()
                .push((subject.to_string(), html.to_string()));
            if self.fail {
                return Err("535 authentication failed".into());
            }
            Ok(())
        }
    }

    fn profile(keywords: &[&str], cap: usize) -> DigestProfile {
        let mut profile = DigestProfile::tech_radar();
        profile.keywords = keywords.iter().map(|k| k.to_string()).collect();
        profile.max_per_keyword = cap;
        profile
    }

    #[tokio::test]
    async fn test_end_to_end_single_keyword() {
        let profile = profile(&["Foo"], 2);
        let feed = FakeFeed::default().with(
            "Foo",
            vec![
                article("today", Duration::hours(1)),
                article("ten days ago", Duration::days(10)),
            ],
        );
        let pipeline = Pipeline::new(
            &profile,
            feed,
            FakeSummarizer::default(),
            FakeMailer::default(),
            utc(),
        );

        let report = pipeline.run(now(), today()).await;

        assert_eq!(report.outcome, RunOutcome::Sent);
        assert_eq!(report.digest.sections.len(), 1);
        assert_eq!(report.digest.sections[0].keyword, "Foo");
        assert_eq!(report.digest.sections[0].entries.len(), 1);
        assert_eq!(report.digest.sections[0].entries[0].article.title, "today");

        let sent = pipeline.mailer.sent.borrow();
        assert_eq!(sent.len(), 1);
        assert!(!sent[0].1.is_empty());
        assert!(sent[0].1.contains("summary of today"));
        assert!(!sent[0].1.contains("ten days ago"));
        assert_eq!(sent[0].0, "[Tech Radar] 2025년 10월 19일 신기술 및 산업 동향");
    }

    #[tokio::test]
    async fn test_no_articles_means_no_send() {
        let profile = profile(&["Foo", "Bar"], 2);
        let feed = FakeFeed::default().with("Foo", vec![article("stale", Duration::days(30))]);
        let pipeline = Pipeline::new(
            &profile,
            feed,
            FakeSummarizer::default(),
            FakeMailer::default(),
            utc(),
        );

        let report = pipeline.run(now(), today()).await;

        assert_eq!(report.outcome, RunOutcome::NoNews);
        assert!(report.digest.is_empty());
        assert!(report.document.is_none());
        assert!(pipeline.mailer.sent.borrow().is_empty());
        assert!(pipeline.summarizer.calls.borrow().is_empty());
    }

    #[tokio::test]
    async fn test_empty_keywords_are_omitted() {
        let profile = profile(&["Empty", "Full"], 2);
        let feed = FakeFeed::default().with("Full", vec![article("fresh", Duration::days(1))]);
        let pipeline = Pipeline::new(
            &profile,
            feed,
            FakeSummarizer::default(),
            FakeMailer::default(),
            utc(),
        );

        let report = pipeline.run(now(), today()).await;

        assert_eq!(report.digest.sections.len(), 1);
        assert_eq!(report.digest.sections[0].keyword, "Full");
        let document = report.document.unwrap();
        assert!(!document.contains(">Empty<"));
    }

    #[tokio::test]
    async fn test_cap_is_never_exceeded() {
        let profile = profile(&["Foo"], 3);
        let articles = (0..8)
            .map(|i| article(&format!("story {i}"), Duration::hours(i)))
            .collect();
        let feed = FakeFeed::default().with("Foo", articles);
        let pipeline = Pipeline::new(
            &profile,
            feed,
            FakeSummarizer::default(),
            FakeMailer::default(),
            utc(),
        );

        let report = pipeline.run(now(), today()).await;

        assert_eq!(report.digest.sections[0].entries.len(), 3);
        assert_eq!(pipeline.summarizer.calls.borrow().len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_failure_does_not_abort_run() {
        let profile = profile(&["Down", "Up"], 2);
        let feed = FakeFeed::default()
            .failing("Down")
            .with("Up", vec![article("fine", Duration::hours(2))]);
        let pipeline = Pipeline::new(
            &profile,
            feed,
            FakeSummarizer::default(),
            FakeMailer::default(),
            utc(),
        );

        let report = pipeline.run(now(), today()).await;

        assert_eq!(report.outcome, RunOutcome::Sent);
        assert_eq!(*pipeline.fetcher.calls.borrow(), vec!["Down", "Up"]);
        assert_eq!(report.digest.sections.len(), 1);
        assert_eq!(report.digest.sections[0].keyword, "Up");
    }

    #[tokio::test]
    async fn test_summarizer_failure_keeps_other_articles() {
        let profile = profile(&["Foo"], 2);
        let feed = FakeFeed::default().with(
            "Foo",
            vec![
                article("broken story", Duration::hours(1)),
                article("good story", Duration::hours(2)),
            ],
        );
        let pipeline = Pipeline::new(
            &profile,
            feed,
            FakeSummarizer::default(),
            FakeMailer::default(),
            utc(),
        );

        let report = pipeline.run(now(), today()).await;

        assert_eq!(report.outcome, RunOutcome::Sent);
        assert_eq!(report.digest.failed_count(), 1);
        let sent = pipeline.mailer.sent.borrow();
        assert!(sent[0].1.contains("요약 실패: 429 Too Many Requests"));
        assert!(sent[0].1.contains("summary of good story"));
    }

    #[tokio::test]
    async fn test_send_failure_is_reported_not_raised() {
        let profile = profile(&["Foo"], 2);
        let feed = FakeFeed::default().with("Foo", vec![article("fresh", Duration::hours(1))]);
        let mailer = FakeMailer {
            fail: true,
            ..Default::default()
        };
        let pipeline = Pipeline::new(&profile, feed, FakeSummarizer::default(), mailer, utc());

        let report = pipeline.run(now(), today()).await;

        assert_eq!(
            report.outcome,
            RunOutcome::SendFailed("535 authentication failed".to_string())
        );
        assert!(report.document.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_keywords_keep_profile_order() {
        let profile = profile(&["Slow", "Medium", "Fast"], 2);
        let feed = FakeFeed::default()
            .with("Slow", vec![article("s", Duration::hours(1))])
            .with("Medium", vec![article("m", Duration::hours(1))])
            .with("Fast", vec![article("f", Duration::hours(1))])
            .delayed("Slow", 40)
            .delayed("Medium", 20);
        let pipeline = Pipeline::new(
            &profile,
            feed,
            FakeSummarizer::default(),
            FakeMailer::default(),
            utc(),
        )
        .with_concurrency(3);

        let digest = pipeline.collect(now()).await;

        let order: Vec<&str> = digest.sections.iter().map(|s| s.keyword.as_str()).collect();
        assert_eq!(order, vec!["Slow", "Medium", "Fast"]);
    }
}
