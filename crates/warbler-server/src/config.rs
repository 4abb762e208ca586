use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use chrono::TimeDelta;

/// Placeholder session secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &["change-me-to-a-random-string", "dev-secret-change-me"];

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub db_path: PathBuf,
    pub session_secret: String,
    pub session_ttl: TimeDelta,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, so parsing can be tested without touching the process env.
    pub fn from_lookup(get: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let session_secret = get("WARBLER_SESSION_SECRET").unwrap_or_default();
        if session_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&session_secret.as_str()) {
            bail!("WARBLER_SESSION_SECRET is unset or still a placeholder");
        }

        let port = get("WARBLER_PORT")
            .unwrap_or_else(|| "5000".into())
            .parse()
            .context("WARBLER_PORT must be a port number")?;

        let session_days: i64 = get("WARBLER_SESSION_DAYS")
            .unwrap_or_else(|| "7".into())
            .parse()
            .context("WARBLER_SESSION_DAYS must be a whole number of days")?;
        if session_days <= 0 {
            bail!("WARBLER_SESSION_DAYS must be at least 1");
        }
        let session_ttl = TimeDelta::try_days(session_days)
            .context("WARBLER_SESSION_DAYS is out of range")?;

        Ok(Self {
            host: get("WARBLER_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            db_path: get("WARBLER_DB_PATH")
                .unwrap_or_else(|| "warbler.db".into())
                .into(),
            session_secret,
            session_ttl,
        })
    }
}
