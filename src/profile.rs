//! Digest profiles.
//!
//! A profile is everything that distinguishes one digest from another: the
//! keyword list, the feed locale, the per-keyword cap, the recency window,
//! the prompt audience, and the look of the rendered email. Two profiles are
//! built in; custom ones can be loaded from YAML, with any missing field
//! falling back to the `tech-radar` defaults.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Name of the profile used when none is given.
pub const DEFAULT_PROFILE: &str = "tech-radar";

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("unknown profile '{0}' (available: tech-radar, kr-industry)")]
    Unknown(String),
    #[error("failed to read profile file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse profile file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid profile: {0}")]
    Invalid(String),
}

/// Locale parameters passed to the news search feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Locale {
    /// Interface language, e.g. `en-US`.
    pub hl: String,
    /// Region, e.g. `US`.
    pub gl: String,
    /// Edition id, e.g. `US:en`.
    pub ceid: String,
}

/// What the recency filter does with entries that have no parseable date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UndatedPolicy {
    /// Keep them. Search feeds list recent items first, so an undated entry
    /// near the top is usually fresh.
    #[default]
    Admit,
    /// Drop them.
    Reject,
}

/// Colours used by the HTML renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub accent: String,
    pub accent_dark: String,
    pub tint: String,
    pub tint_border: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DigestProfile {
    pub name: String,
    /// Search terms, in rendering order.
    pub keywords: Vec<String>,
    pub locale: Locale,
    pub max_per_keyword: usize,
    pub window_days: u32,
    pub undated: UndatedPolicy,

    /// System message sent with every summarization request.
    pub persona: String,
    /// Who the insight sentence is written for.
    pub audience: String,
    /// Language the model should answer in.
    pub language: String,

    /// Display name used in the `From` header.
    pub sender_name: String,
    pub subject_prefix: String,
    pub subject_title: String,
    pub title: String,
    pub tagline: String,
    pub badge: String,
    /// `strftime` format for the digest date.
    pub date_format: String,
    pub footer: Vec<String>,
    pub theme: Theme,
}

impl Default for DigestProfile {
    fn default() -> Self {
        Self::tech_radar()
    }
}

impl DigestProfile {
    /// Emerging chemistry and materials technologies, searched on the US English edition.
    pub fn tech_radar() -> Self {
        Self {
            name: "tech-radar".to_string(),
            keywords: to_strings(&[
                // IUPAC 2025 emerging technologies
                "Xolography",
                "Single-Atom Catalysis",
                "Nanochain Biosensor",
                "Carbon Dots",
                "Synthetic Cells",
                "Thermogelling Polymers",
                "Electrochemical CO2 Capture",
                "Multimodal Foundation Models Science",
                "Direct Air Capture",
                "Additive Manufacturing",
                // industry and research trends
                "Sustainable Green Chemistry",
                "AI-driven Drug Discovery",
                "Solid-state Battery Materials",
                "Semiconductor Specialty Chemicals",
                "CCUS Technology",
            ]),
            locale: Locale {
                hl: "en-US".to_string(),
                gl: "US".to_string(),
                ceid: "US:en".to_string(),
            },
            max_per_keyword: 2,
            window_days: 7,
            undated: UndatedPolicy::Admit,
            persona: "You are an expert researcher in chemistry and advanced materials.".to_string(),
            audience: "a chemical engineering/material science researcher".to_string(),
            language: "Korean".to_string(),
            sender_name: "POSTECH Tech Radar".to_string(),
            subject_prefix: "[Tech Radar]".to_string(),
            subject_title: "신기술 및 산업 동향".to_string(),
            title: "Chemistry & Tech Trends".to_string(),
            tagline: "IUPAC 2025 Emerging Tech & Industry".to_string(),
            badge: "TREND".to_string(),
            date_format: "%Y년 %m월 %d일".to_string(),
            footer: to_strings(&["Powered by OpenAI & Google News", "© Tech Radar Bot"]),
            theme: Theme {
                accent: "#C80150".to_string(),
                accent_dark: "#8A0030".to_string(),
                tint: "#FEF2F5".to_string(),
                tint_border: "#FADADD".to_string(),
            },
        }
    }

    /// Domestic materials industry coverage, searched on the Korean edition.
    pub fn kr_industry() -> Self {
        Self {
            name: "kr-industry".to_string(),
            keywords: to_strings(&[
                "이차전지 소재",
                "반도체 소재",
                "수소 경제",
                "탄소중립 기술",
                "바이오 플라스틱",
                "폐배터리 재활용",
                "석유화학 구조조정",
                "첨단소재 국산화",
            ]),
            locale: Locale {
                hl: "ko".to_string(),
                gl: "KR".to_string(),
                ceid: "KR:ko".to_string(),
            },
            max_per_keyword: 3,
            window_days: 7,
            undated: UndatedPolicy::Admit,
            persona: "You are an industry analyst covering the Korean chemical and materials sector."
                .to_string(),
            audience: "a materials engineer working in Korean industry".to_string(),
            language: "Korean".to_string(),
            sender_name: "Industry Watch".to_string(),
            subject_prefix: "[Industry Watch]".to_string(),
            subject_title: "국내 소재·산업 동향".to_string(),
            title: "Korea Materials Industry Watch".to_string(),
            tagline: "국내 소재·화학 산업 주간 브리핑".to_string(),
            badge: "INDUSTRY".to_string(),
            date_format: "%Y년 %m월 %d일".to_string(),
            footer: to_strings(&["Powered by OpenAI & Google News"]),
            theme: Theme {
                accent: "#0B3D91".to_string(),
                accent_dark: "#062458".to_string(),
                tint: "#EEF3FB".to_string(),
                tint_border: "#D4E0F5".to_string(),
            },
        }
    }

    /// Look up a built-in profile by name.
    pub fn builtin(name: &str) -> Result<Self, ProfileError> {
        match name {
            "tech-radar" => Ok(Self::tech_radar()),
            "kr-industry" => Ok(Self::kr_industry()),
            other => Err(ProfileError::Unknown(other.to_string())),
        }
    }

    /// Parse a profile from YAML. Missing fields take the `tech-radar` values.
    pub fn from_yaml(yaml: &str, origin: &str) -> Result<Self, ProfileError> {
        let profile: Self = serde_yaml::from_str(yaml).map_err(|source| ProfileError::Parse {
            path: origin.to_string(),
            source,
        })?;
        profile.validated()
    }

    pub fn load(path: &Path) -> Result<Self, ProfileError> {
        let origin = path.display().to_string();
        let yaml = std::fs::read_to_string(path).map_err(|source| ProfileError::Read {
            path: origin.clone(),
            source,
        })?;
        let profile = Self::from_yaml(&yaml, &origin)?;
        info!(path = %origin, name = %profile.name, keywords = profile.keywords.len(), "Loaded profile file");
        Ok(profile)
    }

    /// Check invariants and drop duplicate keywords, keeping the first occurrence.
    pub fn validated(mut self) -> Result<Self, ProfileError> {
        let before = self.keywords.len();
        self.keywords = self
            .keywords
            .into_iter()
            .map(|k| k.trim().to_string())
            .filter(|k| !k.is_empty())
            .unique()
            .collect();
        if self.keywords.len() != before {
            warn!(
                profile = %self.name,
                dropped = before - self.keywords.len(),
                "Dropped blank or duplicate keywords"
            );
        }

        let name = self.name.trim();
        if name.is_empty() || name.starts_with('.') || name.contains(['/', '\\']) {
            return Err(ProfileError::Invalid(format!(
                "profile name {:?} must be a plain file name",
                self.name
            )));
        }

        if self.keywords.is_empty() {
            return Err(ProfileError::Invalid("at least one keyword is required".to_string()));
        }
        if self.max_per_keyword == 0 {
            return Err(ProfileError::Invalid("max_per_keyword must be at least 1".to_string()));
        }
        if self.window_days == 0 {
            return Err(ProfileError::Invalid("window_days must be at least 1".to_string()));
        }
        Ok(self)
    }
}

fn to_strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_profiles() {
        let radar = DigestProfile::builtin("tech-radar").unwrap();
        assert_eq!(radar.max_per_keyword, 2);
        assert_eq!(radar.keywords.len(), 15);
        assert_eq!(radar.keywords[0], "Xolography");
        assert_eq!(radar.locale.ceid, "US:en");

        let industry = DigestProfile::builtin("kr-industry").unwrap();
        assert_eq!(industry.max_per_keyword, 3);
        assert_eq!(industry.locale.gl, "KR");
        assert_ne!(industry.theme, radar.theme);
    }

    #[test]
    fn test_unknown_profile() {
        let err = DigestProfile::builtin("weekly").unwrap_err();
        assert!(matches!(err, ProfileError::Unknown(ref n) if n == "weekly"));
    }

    #[test]
    fn test_yaml_partial_profile_uses_defaults() {
        let yaml = r#"
name: polymers
keywords:
  - Vitrimers
  - Covalent Adaptable Networks
max_per_keyword: 4
undated: reject
"#;
        let profile = DigestProfile::from_yaml(yaml, "inline").unwrap();
        assert_eq!(profile.name, "polymers");
        assert_eq!(profile.keywords, vec!["Vitrimers", "Covalent Adaptable Networks"]);
        assert_eq!(profile.max_per_keyword, 4);
        assert_eq!(profile.undated, UndatedPolicy::Reject);
        assert_eq!(profile.window_days, 7);
        assert_eq!(profile.locale.hl, "en-US");
    }

    #[test]
    fn test_validation_dedupes_keywords() {
        let mut profile = DigestProfile::tech_radar();
        profile.keywords = to_strings(&["Carbon Dots", " Carbon Dots ", "", "Direct Air Capture"]);
        let profile = profile.validated().unwrap();
        assert_eq!(profile.keywords, vec!["Carbon Dots", "Direct Air Capture"]);
    }

    #[test]
    fn test_validation_rejects_zero_cap() {
        let yaml = "max_per_keyword: 0\n";
        let err = DigestProfile::from_yaml(yaml, "inline").unwrap_err();
        assert!(matches!(err, ProfileError::Invalid(_)));
    }

    #[test]
    fn test_validation_rejects_empty_keywords() {
        let yaml = "keywords: []\n";
        let err = DigestProfile::from_yaml(yaml, "inline").unwrap_err();
        assert!(matches!(err, ProfileError::Invalid(_)));
    }

    #[test]
    fn test_validation_rejects_path_like_names() {
        for name in ["../escape", "a/b", "a\\b", ".hidden", "  "] {
            let mut profile = DigestProfile::tech_radar();
            profile.name = name.to_string();
            assert!(
                matches!(profile.validated(), Err(ProfileError::Invalid(_))),
                "name {name:?} should be rejected"
            );
        }

        let err = DigestProfile::from_yaml("name: ../x\n", "inline").unwrap_err();
        assert!(matches!(err, ProfileError::Invalid(_)));
    }

    #[test]
    fn test_invalid_yaml() {
        let err = DigestProfile::from_yaml("keywords: [unterminated", "broken.yaml").unwrap_err();
        assert!(err.to_string().contains("broken.yaml"));
    }
}
