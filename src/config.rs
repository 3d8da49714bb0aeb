use std::path::PathBuf;

use crate::error::ConfigError;

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from_email: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub media_root: PathBuf,
    pub assets_root: PathBuf,
    /// `None` runs the demo mailer, which only logs.
    pub smtp: Option<SmtpConfig>,
    pub queue_capacity: usize,
    /// Finished delivery statuses kept for polling.
    pub status_retention: usize,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup; `from_env` passes the process environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = parse_or(&lookup, "PORT", 8080u16)?;
        let media_root = PathBuf::from(lookup("MEDIA_ROOT").unwrap_or_else(|| "media".to_string()));
        let assets_root = lookup("ASSETS_ROOT").map(PathBuf::from).unwrap_or_else(|| media_root.clone());
        let queue_capacity = parse_or(&lookup, "DELIVERY_QUEUE_CAPACITY", 100usize)?;
        if queue_capacity == 0 {
            return Err(ConfigError::Invalid { key: "DELIVERY_QUEUE_CAPACITY", value: "0".into() });
        }
        let status_retention = parse_or(&lookup, "DELIVERY_STATUS_RETENTION", 1000usize)?;

        let smtp = match lookup("SMTP_HOST").filter(|h| !h.trim().is_empty()) {
            Some(host) => Some(SmtpConfig {
                host,
                port: parse_or(&lookup, "SMTP_PORT", 587u16)?,
                username: lookup("SMTP_USERNAME"),
                password: lookup("SMTP_PASSWORD"),
                from_email: lookup("DEFAULT_FROM_EMAIL").ok_or(ConfigError::Missing("DEFAULT_FROM_EMAIL"))?,
            }),
            None => None,
        };

        Ok(Self { host, port, media_root, assets_root, smtp, queue_capacity, status_retention })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
        None => Ok(default),
    }
}
