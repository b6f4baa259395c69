use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{PlannerError, Result};

/// Startup configuration for the planner daemon.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// SQLite file backing the `plans` and `tasks` tables.
    #[serde(default = "default_db_path")]
    pub db_path: String,
    /// Directory holding `index.html` and the other static assets.
    #[serde(default = "default_static_dir")]
    pub static_dir: String,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_db_path() -> String {
    crate::runtime_paths::default_db_path()
}

fn default_static_dir() -> String {
    "static".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            db_path: default_db_path(),
            static_dir: default_static_dir(),
        }
    }
}

impl Config {
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|e| {
            PlannerError::Config(format!("failed to read {}: {e}", path.to_string_lossy()))
        })?;
        let config: Config = serde_json::from_str(&raw).map_err(|e| {
            PlannerError::Config(format!("failed to parse {}: {e}", path.to_string_lossy()))
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.host.trim().is_empty() {
            return Err(PlannerError::Config("host must not be empty".to_string()));
        }
        if self.port == 0 {
            return Err(PlannerError::Config("port must be non-zero".to_string()));
        }
        if self.db_path.trim().is_empty() {
            return Err(PlannerError::Config("db_path must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
