//! JSON archive of a run's digest.
//!
//! # Output Structure
//!
//! Files are organized by date with one file per profile:
//! ```text
//! json_output_dir/
//! └── 2025-10-19/
//!     ├── tech-radar.json
//!     └── kr-industry.json
//! ```
//!
//! A second run on the same day for the same profile overwrites the file.

use crate::models::Digest;
use crate::utils::ensure_writable_dir;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::error::Error;
use tokio::fs;
use tracing::{info, instrument};

#[derive(Debug, Serialize)]
struct DigestArchive<'a> {
    profile: &'a str,
    date: NaiveDate,
    generated_at: DateTime<Utc>,
    article_count: usize,
    digest: &'a Digest,
}

/// Write `digest` to `{json_output_dir}/{date}/{profile}.json` and return the path.
#[instrument(level = "info", skip_all, fields(json_output_dir = %json_output_dir, profile = %profile))]
pub async fn write_digest(
    digest: &Digest,
    profile: &str,
    date: NaiveDate,
    generated_at: DateTime<Utc>,
    json_output_dir: &str,
) -> Result<String, Box<dyn Error>> {
    let archive = DigestArchive {
        profile,
        date,
        generated_at,
        article_count: digest.article_count(),
        digest,
    };
    let json = serde_json::to_string_pretty(&archive)?;

    let full_json_dir = format!("{}/{}", json_output_dir.trim_end_matches('/'), date);
    ensure_writable_dir(&full_json_dir).await?;

    let output_json_filename = format!("{}/{}.json", full_json_dir, profile);
    fs::write(&output_json_filename, json).await?;
    info!(path = %output_json_filename, "Wrote digest archive");

    Ok(output_json_filename)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Annotation, Article, DigestEntry, Published};
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_write_digest_layout_and_content() {
        let base = std::env::temp_dir().join(format!("tech_radar_json_{}", std::process::id()));
        let mut digest = Digest::new();
        digest.push_section(
            "Carbon Dots",
            vec![DigestEntry {
                article: Article::new("Dots", "https://example.com/d", Published::Unknown),
                annotation: Annotation::new("요약", Some("인사이트".to_string())),
            }],
        );
        let date = NaiveDate::from_ymd_opt(2025, 10, 19).unwrap();
        let generated_at = Utc.with_ymd_and_hms(2025, 10, 19, 0, 5, 0).unwrap();

        let path = write_digest(&digest, "tech-radar", date, generated_at, base.to_str().unwrap())
            .await
            .unwrap();
        assert!(path.ends_with("2025-10-19/tech-radar.json"));

        let written = std::fs::read_to_string(&path).unwrap();
        let value: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(value["profile"], "tech-radar");
        assert_eq!(value["date"], "2025-10-19");
        assert_eq!(value["article_count"], 1);
        assert_eq!(value["digest"]["sections"][0]["keyword"], "Carbon Dots");
        assert_eq!(
            value["digest"]["sections"][0]["entries"][0]["annotation"]["insight"],
            "인사이트"
        );

        let _ = std::fs::remove_dir_all(&base);
    }
}
