//! Article annotation through the LLM.
//!
//! The summarizer asks for a JSON object with `summary` and `insight`
//! fields. Models do not always comply, so replies are parsed leniently:
//! first as JSON (optionally wrapped in a Markdown code fence), then with
//! the labelled plain-text format
//!
//! ```text
//! 요약: <summary>
//! 인사이트: <insight>
//! ```
//!
//! A failed call never propagates; it becomes an [`Annotation`] carrying the
//! failure marker so the rest of the digest can still be sent.

use crate::api::{AskAsync, ChatMessage};
use crate::models::Annotation;
use crate::profile::DigestProfile;
use crate::utils::truncate_for_log;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

/// Delimiter between summary and insight in plain-text replies.
pub const INSIGHT_LABEL: &str = "인사이트:";

/// The `요약:` label at the start of a plain-text reply, bold or not.
static LEADING_SUMMARY_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(?:\*\*)?\s*요약\s*[:：]\s*(?:\*\*)?\s*").unwrap());

static CODE_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^\s*```(?:json)?\s*(.*?)\s*```\s*$").unwrap());

/// Produces an [`Annotation`] for an article. Never fails.
pub trait Summarize {
    async fn summarize(&self, title: &str, link: &str) -> Annotation;
}

#[derive(Debug, Deserialize)]
struct StructuredAnnotation {
    #[serde(alias = "요약")]
    summary: String,
    #[serde(default, alias = "인사이트")]
    insight: Option<String>,
}

/// [`Summarize`] implementation backed by any [`AskAsync`] chat client.
#[derive(Debug)]
pub struct LlmSummarizer<A> {
    api: A,
    persona: String,
    audience: String,
    language: String,
}

impl<A> LlmSummarizer<A>
where
    A: AskAsync<Response = String>,
{
    pub fn new(api: A, profile: &DigestProfile) -> Self {
        Self {
            api,
            persona: profile.persona.clone(),
            audience: profile.audience.clone(),
            language: profile.language.clone(),
        }
    }

    /// The system persona followed by the per-article prompt.
    pub fn messages(&self, title: &str, link: &str) -> Vec<ChatMessage> {
        let prompt = format!(
            r#"Article Title: {title}
Link: {link}

Please analyze this technical article.
1. Summarize the core technology or finding in 2 lines ({language}).
2. Provide 1 sentence of insight for {audience} ({language}).

Respond with a JSON object with exactly two string fields:
{{"summary": "<summary in {language}>", "insight": "<insight in {language}>"}}"#,
            language = self.language,
            audience = self.audience,
        );
        vec![ChatMessage::system(self.persona.as_str()), ChatMessage::user(prompt)]
    }
}

impl<A> Summarize for LlmSummarizer<A>
where
    A: AskAsync<Response = String>,
{
    #[instrument(level = "info", skip_all, fields(%link))]
    async fn summarize(&self, title: &str, link: &str) -> Annotation {
        match self.api.ask(&self.messages(title, link)).await {
            Ok(reply) => {
                debug!(reply = %truncate_for_log(&reply, 300), "Model reply");
                parse_annotation(&reply)
            }
            Err(e) => {
                warn!(%title, error = %e, "Summarization failed; using failure marker");
                Annotation::failed(e)
            }
        }
    }
}

/// Parse a model reply into an [`Annotation`].
///
/// A JSON object without a `summary` field is reported as a failure rather
/// than shown to readers as raw JSON.
pub fn parse_annotation(reply: &str) -> Annotation {
    let body = CODE_FENCE
        .captures(reply)
        .and_then(|c| c.get(1))
        .map_or(reply, |m| m.as_str());

    match serde_json::from_str::<serde_json::Value>(body) {
        Ok(value @ serde_json::Value::Object(_)) => {
            match serde_json::from_value::<StructuredAnnotation>(value) {
                Ok(structured) => Annotation::new(structured.summary, structured.insight),
                Err(e) => {
                    warn!(error = %e, reply = %truncate_for_log(body, 200), "JSON reply has no summary");
                    Annotation::failed("unexpected JSON reply")
                }
            }
        }
        _ => parse_labelled(reply),
    }
}

/// Split a `요약: ... 인사이트: ...` reply at the insight delimiter.
///
/// Without the delimiter the whole reply is the summary.
pub fn parse_labelled(reply: &str) -> Annotation {
    match reply.split_once(INSIGHT_LABEL) {
        Some((before, after)) => Annotation::new(
            strip_summary_label(before).trim_end_matches(['*', ' ', '\n', '\r', '\t']),
            Some(after.trim_start_matches(['*', ' ']).to_string()),
        ),
        None => Annotation::new(strip_summary_label(reply), None),
    }
}

fn strip_summary_label(text: &str) -> &str {
    match LEADING_SUMMARY_LABEL.find(text) {
        Some(m) => &text[m.end()..],
        None => text.trim_start(),
    }
}
