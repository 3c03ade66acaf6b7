//! Application configuration structures.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SearchId;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Portal credentials
    pub auth: AuthConfig,

    /// Saved search to walk
    pub search: SearchConfig,

    /// Portal endpoint and HTTP behavior settings
    #[serde(default)]
    pub portal: PortalConfig,
}

/// Layout of a configuration file as written on disk.
///
/// Both subtrees are optional here so that a missing one can be reported by
/// name instead of surfacing as a generic parse error. Files may nest
/// everything under a `data` root; when present it wins over the top level.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    data: Option<RawConfig>,
    #[serde(flatten)]
    flat: RawConfig,
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    auth: Option<AuthConfig>,
    search: Option<SearchConfig>,
    #[serde(default)]
    portal: PortalConfig,
}

impl Config {
    /// Load configuration from a file. `.toml` files are read as TOML,
    /// everything else as YAML.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AppError::config(format!(
                "the configuration file {} does not exist",
                path.display()
            )));
        }

        let content = fs::read_to_string(path)?;
        let is_toml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        if is_toml {
            Self::from_toml_str(&content)
        } else {
            Self::from_yaml_str(&content)
        }
    }

    /// Parse configuration from YAML text.
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        Self::from_file(file)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let file: ConfigFile = toml::from_str(content)?;
        Self::from_file(file)
    }

    fn from_file(file: ConfigFile) -> Result<Self> {
        let raw = file.data.unwrap_or(file.flat);

        let config = Self {
            auth: raw
                .auth
                .ok_or_else(|| AppError::config("missing the \"auth\" subtree"))?,
            search: raw
                .search
                .ok_or_else(|| AppError::config("missing the \"search\" subtree"))?,
            portal: raw.portal,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.auth.user.trim().is_empty() {
            return Err(AppError::config("auth.user is empty"));
        }
        if self.search.name.trim().is_empty() {
            return Err(AppError::config("search.name is empty"));
        }
        if self.portal.user_agent.trim().is_empty() {
            return Err(AppError::config("portal.user_agent is empty"));
        }
        if self.portal.timeout_secs == 0 {
            return Err(AppError::config("portal.timeout_secs must be > 0"));
        }
        url::Url::parse(&self.portal.base_url)?;
        Ok(())
    }
}

/// Portal login credentials.
#[derive(Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub user: String,
    pub pass: String,
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("user", &self.user)
            .field("pass", &"***")
            .finish()
    }
}

/// Saved search identity as stored on the portal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    pub name: String,
    pub id: SearchId,
}

/// Portal endpoint and HTTP client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Scheme and host of the portal
    #[serde(default = "defaults::base_url")]
    pub base_url: String,

    /// Client identifier sent with every request
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Extra attempts for transient transport failures
    #[serde(default = "defaults::max_retries")]
    pub max_retries: usize,
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::base_url(),
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            max_retries: defaults::max_retries(),
        }
    }
}

mod defaults {
    pub fn base_url() -> String {
        "http://www.apexchange.com".into()
    }
    pub fn user_agent() -> String {
        "apfetch/1.1 (+http://support.tlmdservices.com/)".into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn max_retries() -> usize {
        3
    }
}
