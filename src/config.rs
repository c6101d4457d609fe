use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Server configuration.
///
/// The original design leaves concurrency unbounded and never times out a
/// slow client; both stay the default here and are opt-in knobs rather than
/// silently changed behavior.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Address to bind, all interfaces by default.
    pub listen_addr: String,
    /// Cap on concurrently handled connections. `None` (default) preserves
    /// the unbounded one-task-per-connection model.
    pub max_connections: Option<usize>,
    /// Per-read deadline in seconds. `None` (default) lets an idle client
    /// hold its handler indefinitely.
    pub read_timeout_secs: Option<u64>,
    /// Directory the demo binary serves files from.
    pub document_root: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".to_string(),
            max_connections: None,
            read_timeout_secs: None,
            document_root: None,
        }
    }
}

impl Config {
    /// Loads the file named by `EMBER_CONFIG`, or defaults with a `LISTEN`
    /// environment override.
    pub fn load() -> Self {
        if let Ok(path) = std::env::var("EMBER_CONFIG") {
            match Self::from_file(&path) {
                Ok(cfg) => return cfg,
                Err(e) => {
                    tracing::warn!(path = %path, error = %e, "could not load config file, using defaults")
                }
            }
        }
        let mut cfg = Self::default();
        if let Ok(listen) = std::env::var("LISTEN") {
            cfg.listen_addr = listen;
        }
        cfg
    }

    /// Parses a YAML config file.
    pub fn from_file(path: &str) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {path}"))?;
        serde_yaml::from_str(&text).with_context(|| format!("parsing config file {path}"))
    }

    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout_secs.map(Duration::from_secs)
    }
}
