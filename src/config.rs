//! Secrets and mail settings.
//!
//! Four settings come from the process environment. `main` loads a `.env`
//! file from the working directory before anything else reads it:
//!
//! | Variable | Used by |
//! |----------|---------|
//! | `OPENAI_API_KEY` | summarizer |
//! | `EMAIL_USER` | mailer (login and sender address) |
//! | `EMAIL_PASS` | mailer |
//! | `EMAIL_TO` | mailer (recipient) |
//!
//! They are read once at startup, before any network call, and a missing
//! value is a hard error.

use lettre::Address;
use std::fmt;
use thiserror::Error;

pub const OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const EMAIL_USER: &str = "EMAIL_USER";
pub const EMAIL_PASS: &str = "EMAIL_PASS";
pub const EMAIL_TO: &str = "EMAIL_TO";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is not set (export it or add it to .env)")]
    Missing(&'static str),
    #[error("{var} is not a valid email address: {source}")]
    InvalidAddress {
        var: &'static str,
        #[source]
        source: lettre::address::AddressError,
    },
}

/// Settings the SMTP mailer needs.
#[derive(Clone)]
pub struct MailSettings {
    pub username: String,
    pub password: String,
    pub from: Address,
    pub to: Address,
    /// Display name for the `From` header.
    pub sender_name: String,
}

impl fmt::Debug for MailSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MailSettings")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("from", &self.from)
            .field("to", &self.to)
            .field("sender_name", &self.sender_name)
            .finish()
    }
}

/// Credentials resolved at startup.
#[derive(Clone)]
pub struct Secrets {
    pub openai_api_key: String,
    /// Absent only in dry-run mode.
    pub mail: Option<MailSettings>,
}

impl fmt::Debug for Secrets {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Secrets")
            .field("openai_api_key", &"<redacted>")
            .field("mail", &self.mail)
            .finish()
    }
}

impl Secrets {
    /// Read the process environment.
    pub fn from_env(require_mail: bool, sender_name: &str) -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok(), require_mail, sender_name)
    }

    /// Resolve settings through `lookup`. Blank values count as missing.
    pub fn from_lookup<F>(lookup: F, require_mail: bool, sender_name: &str) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &'static str| -> Result<String, ConfigError> {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let openai_api_key = get(OPENAI_API_KEY)?;
        let mail = if require_mail {
            let username = get(EMAIL_USER)?;
            let password = get(EMAIL_PASS)?;
            let to = get(EMAIL_TO)?;
            let from = parse_address(EMAIL_USER, &username)?;
            let to = parse_address(EMAIL_TO, &to)?;
            Some(MailSettings {
                username,
                password,
                from,
                to,
                sender_name: sender_name.to_string(),
            })
        } else {
            None
        };

        Ok(Self {
            openai_api_key,
            mail,
        })
    }
}

fn parse_address(var: &'static str, value: &str) -> Result<Address, ConfigError> {
    value
        .parse::<Address>()
        .map_err(|source| ConfigError::InvalidAddress { var, source })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn full() -> HashMap<String, String> {
        env(&[
            (OPENAI_API_KEY, "sk-test"),
            (EMAIL_USER, "radar@example.com"),
            (EMAIL_PASS, "app-password"),
            (EMAIL_TO, "reader@example.org"),
        ])
    }

    #[test]
    fn test_all_settings_present() {
        let vars = full();
        let secrets = Secrets::from_lookup(|k| vars.get(k).cloned(), true, "Tech Radar").unwrap();
        assert_eq!(secrets.openai_api_key, "sk-test");
        let mail = secrets.mail.unwrap();
        assert_eq!(mail.to.to_string(), "reader@example.org");
        assert_eq!(mail.sender_name, "Tech Radar");
    }

    #[test]
    fn test_missing_setting_is_reported_by_name() {
        let mut vars = full();
        vars.remove(EMAIL_PASS);
        let err = Secrets::from_lookup(|k| vars.get(k).cloned(), true, "x").unwrap_err();
        assert!(matches!(err, ConfigError::Missing(EMAIL_PASS)));
        assert!(err.to_string().contains("EMAIL_PASS"));
    }

    #[test]
    fn test_blank_setting_counts_as_missing() {
        let mut vars = full();
        vars.insert(OPENAI_API_KEY.to_string(), "   ".to_string());
        let err = Secrets::from_lookup(|k| vars.get(k).cloned(), true, "x").unwrap_err();
        assert!(matches!(err, ConfigError::Missing(OPENAI_API_KEY)));
    }

    #[test]
    fn test_invalid_recipient() {
        let mut vars = full();
        vars.insert(EMAIL_TO.to_string(), "not-an-address".to_string());
        let err = Secrets::from_lookup(|k| vars.get(k).cloned(), true, "x").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidAddress { var: EMAIL_TO, .. }));
    }

    #[test]
    fn test_dry_run_only_needs_api_key() {
        let vars = env(&[(OPENAI_API_KEY, "sk-test")]);
        let secrets = Secrets::from_lookup(|k| vars.get(k).cloned(), false, "x").unwrap();
        assert!(secrets.mail.is_none());
    }

    #[test]
    fn test_debug_redacts_secrets() {
        let vars = full();
        let secrets = Secrets::from_lookup(|k| vars.get(k).cloned(), true, "x").unwrap();
        let printed = format!("{secrets:?}");
        assert!(!printed.contains("sk-test"));
        assert!(!printed.contains("app-password"));
    }
}
