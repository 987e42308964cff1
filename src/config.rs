use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::server::listener::DEFAULT_BACKLOG;

pub const DEFAULT_CONFIG_PATH: &str = "vein.yaml";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:8080";
pub const DEFAULT_SHUTDOWN_GRACE_SECS: u64 = 10;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub pages: Vec<PageConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    #[serde(default = "default_backlog")]
    pub backlog: u32,
    /// Seconds to wait for open sessions after shutdown before exiting.
    #[serde(default = "default_shutdown_grace_secs")]
    pub shutdown_grace_secs: u64,
}

/// One template served at one path.
#[derive(Debug, Clone, Deserialize)]
pub struct PageConfig {
    pub route: String,
    pub template: PathBuf,
    /// Replaces the text of `<title>` when the template has one.
    pub title: Option<String>,
    /// Replaces `<meta name="description">` content when present.
    pub description: Option<String>,
    /// Prefix for the canonical link, e.g. "https://example.com".
    pub canonical_base: Option<String>,
    /// Fixed text per element id. Every id must exist in the template.
    #[serde(default)]
    pub text: BTreeMap<String, String>,
}

fn default_listen_addr() -> String {
    DEFAULT_LISTEN_ADDR.to_string()
}

fn default_backlog() -> u32 {
    DEFAULT_BACKLOG
}

fn default_shutdown_grace_secs() -> u64 {
    DEFAULT_SHUTDOWN_GRACE_SECS
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            backlog: default_backlog(),
            shutdown_grace_secs: default_shutdown_grace_secs(),
        }
    }
}

impl Config {
    /// Loads the file named by `VEIN_CONFIG` (default `vein.yaml`), falling
    /// back to defaults when it does not exist. `LISTEN` overrides the
    /// listen address either way.
    pub fn load() -> anyhow::Result<Self> {
        let path = std::env::var("VEIN_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH));

        let mut cfg = if path.exists() {
            Self::from_file(&path)?
        } else {
            tracing::warn!(path = %path.display(), "Config file not found, using defaults");
            Self::default()
        };

        if let Ok(listen_addr) = std::env::var("LISTEN") {
            cfg.server.listen_addr = listen_addr;
        }

        Ok(cfg)
    }

    /// Parses a YAML config file. Relative template paths are resolved
    /// against the file's directory.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut cfg = Self::from_yaml(&text)
            .with_context(|| format!("invalid config {}", path.display()))?;

        if let Some(dir) = path.parent() {
            for page in &mut cfg.pages {
                if page.template.is_relative() {
                    page.template = dir.join(&page.template);
                }
            }
        }

        Ok(cfg)
    }

    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }

    pub fn listen_addr(&self) -> anyhow::Result<SocketAddr> {
        self.server
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address {:?}", self.server.listen_addr))
    }
}
