use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::domain::client_config::{ClientConfig, CsvMode};
use crate::domain::error::Result;

pub const DEFAULT_CONFIG_FILE: &str = "cleanforge.toml";
pub const ENV_PREFIX: &str = "CLEANFORGE_";

/// Values supplied on the command line; unset fields keep the lower layers
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigOverrides {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_timeout_secs: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_dir: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub csv_mode: Option<CsvMode>,
}

/// Layered client configuration:
/// defaults, then the TOML file, then `CLEANFORGE_*` env vars, then overrides.
pub struct ConfigService {
    figment: Figment,
}

impl Default for ConfigService {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigService {
    pub fn new() -> Self {
        Self::with_file(DEFAULT_CONFIG_FILE)
    }

    pub fn with_file(path: impl AsRef<Path>) -> Self {
        let figment = Figment::from(Serialized::defaults(ClientConfig::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX));
        Self { figment }
    }

    /// Load `.env` from the working directory if there is one
    pub fn load_dotenv() {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!(path = %path.display(), "Loaded .env");
        }
    }

    pub fn with_overrides(mut self, overrides: &ConfigOverrides) -> Self {
        self.figment = self.figment.merge(Serialized::defaults(overrides));
        self
    }

    pub fn load(&self) -> Result<ClientConfig> {
        let config: ClientConfig = self.figment.extract()?;
        config.check()?;
        Ok(config)
    }
}
