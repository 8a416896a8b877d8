use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use gcl_classify::ClassifierConfig;
use gcl_types::RewardPolicy;
use serde::{Deserialize, Serialize};

use crate::error::{ServerError, ServerResult};

/// Top-level configuration, read from a TOML file.
///
/// Every section and field is optional; missing values take their defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GclConfig {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub policy: RewardPolicy,
    pub classifier: ClassifierConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// Answer cross-origin requests from any origin (the browser extension
    /// calls from page context).
    pub allow_cors: bool,
    /// Largest accepted request body.
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 5000)),
            allow_cors: true,
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// SQLite database file. `None` keeps the ledger in memory.
    pub path: Option<PathBuf>,
}

impl GclConfig {
    /// Read and validate a config file.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&text)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ServerResult<()> {
        self.policy
            .validate()
            .map_err(|e| ServerError::Config(e.to_string()))?;
        if self.server.max_body_bytes == 0 {
            return Err(ServerError::Config("server.max_body_bytes must be positive".into()));
        }
        if let Some(model) = &self.classifier.model {
            if model.timeout_secs == 0 {
                return Err(ServerError::Config(
                    "classifier.model.timeout_secs must be positive".into(),
                ));
            }
            if model.api_url.trim().is_empty() || model.model.trim().is_empty() {
                return Err(ServerError::Config(
                    "classifier.model needs an api_url and a model".into(),
                ));
            }
        }
        Ok(())
    }
}
