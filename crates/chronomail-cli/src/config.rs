//! File configuration for the `chronomail` binary.

use std::path::{Path, PathBuf};

use anyhow::Context;
use chronomail_core::config::{DispatcherConfig, SmtpConfig, StoreConfig};
use serde::{Deserialize, Serialize};

/// Which mail transport the process uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum TransportKind {
    #[default]
    Smtp,
    /// Log messages instead of sending them.
    Log,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: "127.0.0.1:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub transport: TransportKind,
    pub server: ServerConfig,
    pub dispatcher: DispatcherConfig,
    pub store: StoreConfig,
    pub smtp: SmtpConfig,
}

impl AppConfig {
    /// Read `path` if given, otherwise start from defaults.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Checks that need more than the dispatcher section.
    pub fn validate(&self) -> anyhow::Result<()> {
        self.dispatcher
            .validate()
            .context("invalid [dispatcher] section")?;
        if self.transport == TransportKind::Smtp {
            self.smtp.validate().context("invalid [smtp] section")?;
        }
        Ok(())
    }
}

/// Command-line / environment values that win over the file.
#[derive(Debug, Default)]
pub struct Overrides {
    pub transport: Option<TransportKind>,
    pub listen: Option<String>,
    pub snapshot_path: Option<PathBuf>,
    pub interval_secs: Option<u64>,
}

impl Overrides {
    pub fn apply(self, config: &mut AppConfig) {
        if let Some(transport) = self.transport {
            config.transport = transport;
        }
        if let Some(listen) = self.listen {
            config.server.listen = listen;
        }
        if let Some(path) = self.snapshot_path {
            config.store.snapshot_path = Some(path);
        }
        if let Some(secs) = self.interval_secs {
            config.dispatcher.interval_secs = secs;
        }
    }
}
