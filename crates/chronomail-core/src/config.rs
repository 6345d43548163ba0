//! Runtime settings for the dispatcher, the store and the SMTP transport.
//!
//! Every field has a default so a partial (or empty) TOML table is valid.
//! `validate` is called once at startup by the app builder.

use std::path::PathBuf;
use std::time::Duration;

use lettre::message::Mailbox;
use serde::{Deserialize, Serialize};

use crate::domain::RetryPolicy;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("dispatcher.interval_secs must be greater than 0")]
    ZeroInterval,

    #[error("dispatcher.max_retries must be at least 1")]
    ZeroRetries,

    #[error("dispatcher.concurrency must be at least 1")]
    ZeroConcurrency,

    #[error("smtp.from `{from}` is not a valid mailbox: {reason}")]
    InvalidFrom { from: String, reason: String },

    #[error("smtp.host must not be empty")]
    MissingSmtpHost,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub interval_secs: u64,
    pub max_retries: u32,
    pub concurrency: usize,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            max_retries: RetryPolicy::DEFAULT_MAX_ATTEMPTS,
            concurrency: 1,
        }
    }
}

impl DispatcherConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.max_retries)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.interval_secs == 0 {
            return Err(ConfigError::ZeroInterval);
        }
        if self.max_retries == 0 {
            return Err(ConfigError::ZeroRetries);
        }
        if self.concurrency == 0 {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON snapshot file. `None` keeps everything in memory.
    pub snapshot_path: Option<PathBuf>,
}

/// How the SMTP connection is secured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TlsMode {
    /// Plain text. Local relays and test servers only.
    None,
    /// Upgrade with STARTTLS (usually port 587).
    #[default]
    Starttls,
    /// TLS from the first byte (usually port 465).
    Wrapper,
}

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub tls: TlsMode,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
    pub timeout_secs: u64,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 587,
            tls: TlsMode::default(),
            username: None,
            password: None,
            from: "ChronoMail <no-reply@localhost>".to_string(),
            timeout_secs: 30,
        }
    }
}

// Hand-written so the password never ends up in logs.
impl std::fmt::Debug for SmtpConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SmtpConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("tls", &self.tls)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("from", &self.from)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl SmtpConfig {
    pub fn from_mailbox(&self) -> Result<Mailbox, ConfigError> {
        self.from
            .parse::<Mailbox>()
            .map_err(|e| ConfigError::InvalidFrom {
                from: self.from.clone(),
                reason: e.to_string(),
            })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::MissingSmtpHost);
        }
        self.from_mailbox().map(|_| ())
    }
}
