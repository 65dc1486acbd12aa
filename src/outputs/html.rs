//! HTML rendering of the digest email.
//!
//! The document is a single self-contained page with inline CSS, since most
//! mail clients ignore external stylesheets. Colours come from the profile
//! theme; every string that came from the feed or the model is escaped.

use crate::models::{Digest, DigestEntry, DigestSection, Published};
use crate::profile::DigestProfile;
use crate::utils::escape_html;
use chrono::{FixedOffset, NaiveDate};

/// Shown instead of a publish date for undated articles.
pub const UNKNOWN_DATE: &str = "Recent";

/// Renders a [`Digest`] with a profile's copy and theme.
#[derive(Debug, Clone)]
pub struct DigestRenderer<'a> {
    profile: &'a DigestProfile,
    /// Offset used to print article publish dates.
    offset: FixedOffset,
}

impl<'a> DigestRenderer<'a> {
    pub fn new(profile: &'a DigestProfile, offset: FixedOffset) -> Self {
        Self { profile, offset }
    }

    /// The digest date in the profile's format, e.g. `2025년 10월 19일`.
    pub fn format_date(&self, date: NaiveDate) -> String {
        date.format(&self.profile.date_format).to_string()
    }

    /// `"<prefix> <date> <title>"`.
    pub fn subject(&self, date: NaiveDate) -> String {
        format!(
            "{} {} {}",
            self.profile.subject_prefix,
            self.format_date(date),
            self.profile.subject_title
        )
    }

    /// Render the whole document. Sections without entries are skipped.
    pub fn render(&self, digest: &Digest, date: NaiveDate) -> String {
        let mut html = self.head();

        html.push_str("<body>\n<div class=\"container\">\n");
        html.push_str("  <div class=\"header\">\n");
        html.push_str(&format!("    <h1>{}</h1>\n", escape_html(&self.profile.title)));
        html.push_str(&format!(
            "    <p>{} | {}</p>\n",
            escape_html(&self.format_date(date)),
            escape_html(&self.profile.tagline)
        ));
        html.push_str("  </div>\n");

        html.push_str("  <div class=\"content\">\n");
        for section in digest.sections.iter().filter(|s| !s.entries.is_empty()) {
            html.push_str(&self.section(section));
        }
        html.push_str("  </div>\n");

        html.push_str("  <div class=\"footer\">\n");
        for line in &self.profile.footer {
            html.push_str(&format!("    <p>{}</p>\n", escape_html(line)));
        }
        html.push_str("  </div>\n</div>\n</body>\n</html>\n");
        html
    }

    fn head(&self) -> String {
        let theme = &self.profile.theme;
        format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="UTF-8">
<title>{title}</title>
<style>
  body {{ font-family: 'Apple SD Gothic Neo', 'Malgun Gothic', 'Helvetica Neue', sans-serif; background-color: #F2F4F6; margin: 0; padding: 0; }}
  .container {{ max-width: 650px; margin: 30px auto; background-color: #ffffff; border-radius: 12px; overflow: hidden; box-shadow: 0 10px 25px rgba(0,0,0,0.05); }}
  .header {{ background: linear-gradient(135deg, {accent} 0%, {accent_dark} 100%); color: #ffffff; padding: 40px 30px; }}
  .header h1 {{ margin: 0; font-size: 24px; font-weight: 800; }}
  .header p {{ margin: 8px 0 0; font-size: 14px; font-weight: 300; opacity: 0.9; }}
  .content {{ padding: 30px; }}
  .keyword-section {{ margin-bottom: 35px; }}
  .keyword-header {{ display: flex; align-items: center; margin-bottom: 12px; border-bottom: 2px solid {accent}; padding-bottom: 8px; }}
  .keyword-badge {{ background-color: {accent}; color: white; padding: 3px 8px; border-radius: 4px; font-size: 11px; font-weight: bold; margin-right: 10px; text-transform: uppercase; }}
  .keyword-title {{ color: {accent}; font-size: 16px; font-weight: 700; }}
  .article-card {{ background-color: #ffffff; margin-bottom: 20px; }}
  .article-title {{ font-size: 17px; font-weight: 700; color: #222; text-decoration: none; display: block; line-height: 1.4; margin-bottom: 5px; }}
  .article-title:hover {{ color: {accent}; text-decoration: underline; }}
  .article-meta {{ font-size: 12px; color: #888; margin-bottom: 10px; display: block; }}
  .summary-box {{ background-color: #FAFAFA; border-left: 3px solid {accent}; padding: 12px 15px; font-size: 14px; line-height: 1.6; color: #333; }}
  .insight-box {{ margin-top: 10px; background-color: {tint}; border: 1px solid {tint_border}; padding: 10px 12px; border-radius: 6px; font-size: 13px; color: #555; display: flex; }}
  .insight-icon {{ margin-right: 8px; }}
  .insight-label {{ font-weight: bold; color: {accent}; font-size: 11px; margin-right: 5px; }}
  .footer {{ background-color: #f2f4f6; text-align: center; padding: 30px; font-size: 12px; color: #999; }}
</style>
</head>
"#,
            title = escape_html(&self.profile.title),
            accent = theme.accent,
            accent_dark = theme.accent_dark,
            tint = theme.tint,
            tint_border = theme.tint_border,
        )
    }

    fn section(&self, section: &DigestSection) -> String {
        let mut html = String::new();
        html.push_str("    <div class=\"keyword-section\">\n");
        html.push_str("      <div class=\"keyword-header\">\n");
        html.push_str(&format!(
            "        <span class=\"keyword-badge\">{}</span>\n",
            escape_html(&self.profile.badge)
        ));
        html.push_str(&format!(
            "        <span class=\"keyword-title\">{}</span>\n",
            escape_html(&section.keyword)
        ));
        html.push_str("      </div>\n");
        for entry in &section.entries {
            html.push_str(&self.entry(entry));
        }
        html.push_str("    </div>\n");
        html
    }

    fn entry(&self, entry: &DigestEntry) -> String {
        let article = &entry.article;
        let annotation = &entry.annotation;

        let mut html = String::new();
        html.push_str("      <div class=\"article-card\">\n");
        html.push_str(&format!(
            "        <a href=\"{}\" class=\"article-title\">{}</a>\n",
            escape_html(&article.link),
            escape_html(&article.title)
        ));
        html.push_str(&format!(
            "        <span class=\"article-meta\">{}</span>\n",
            self.published_label(article.published)
        ));
        html.push_str("        <div class=\"summary-box\">\n");
        html.push_str(&format!("          {}\n", escape_html(&annotation.summary)));
        if let Some(insight) = &annotation.insight {
            html.push_str("          <div class=\"insight-box\">\n");
            html.push_str("            <span class=\"insight-icon\">💡</span>\n");
            html.push_str(&format!(
                "            <div><span class=\"insight-label\">INSIGHT</span>{}</div>\n",
                escape_html(insight)
            ));
            html.push_str("          </div>\n");
        }
        html.push_str("        </div>\n      </div>\n");
        html
    }

    fn published_label(&self, published: Published) -> String {
        match published {
            Published::At(dt) => dt.with_timezone(&self.offset).format("%Y.%m.%d").to_string(),
            Published::Unknown => UNKNOWN_DATE.to_string(),
        }
    }
}
