use serde::{Deserialize, Serialize};
use std::path::Path;
use url::Url;
use crate::utils::error::{ExplorerError, ExplorerResult};

pub const DEFAULT_BASE_URL: &str = "https://grasp.wtf";
pub const DEFAULT_CLIENT_ID: &str = "frontend";
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 30;
pub const DEFAULT_REFERENCE_KEY_ATTRIBUTE: &str = "Bezeichnung";

pub const TOKEN_PATH: &str = "/auth/realms/platform/protocol/openid-connect/token";
pub const GRAPHQL_PATH: &str = "/dynamicdb/v1/graphql";

pub const BASE_URL_ENV: &str = "BASE_URL";
pub const CLIENT_ID_ENV: &str = "DYNDB_CLIENT_ID";

/// Explorer configuration, passed explicitly to the transport and composer
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExplorerConfig {
    /// Backend root, stored without trailing slash
    pub base_url: String,
    pub client_id: String,
    pub timeout_seconds: u64,
    /// Attribute always requested on expanded reference targets
    pub reference_key_attribute: Option<String>,
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            client_id: DEFAULT_CLIENT_ID.to_string(),
            timeout_seconds: DEFAULT_TIMEOUT_SECONDS,
            reference_key_attribute: Some(DEFAULT_REFERENCE_KEY_ATTRIBUTE.to_string()),
        }
    }
}

impl ExplorerConfig {
    /// Create a configuration for the given backend root
    pub fn new(base_url: &str) -> Self {
        Self::default().with_base_url(base_url)
    }

    /// Defaults overridden by the process environment
    pub fn from_env() -> Self {
        Self::default().apply_env(|key| std::env::var(key).ok())
    }

    /// Load a JSON configuration file; missing keys fall back to defaults
    pub fn from_file(path: &Path) -> ExplorerResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| {
            ExplorerError::Configuration(format!("cannot read {}: {}", path.display(), e))
        })?;
        let config: ExplorerConfig = serde_json::from_str(&text).map_err(|e| {
            ExplorerError::Configuration(format!("invalid config file {}: {}", path.display(), e))
        })?;
        let base_url = config.base_url.clone();
        Ok(config.with_base_url(&base_url))
    }

    /// Apply overrides from an environment lookup
    pub fn apply_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(BASE_URL_ENV).filter(|v| !v.trim().is_empty()) {
            self = self.with_base_url(&base_url);
        }
        if let Some(client_id) = lookup(CLIENT_ID_ENV).filter(|v| !v.trim().is_empty()) {
            self.client_id = client_id;
        }
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }

    pub fn with_client_id(mut self, client_id: &str) -> Self {
        self.client_id = client_id.to_string();
        self
    }

    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout_seconds = seconds;
        self
    }

    pub fn with_reference_key_attribute(mut self, key: Option<String>) -> Self {
        self.reference_key_attribute = key.filter(|k| !k.trim().is_empty());
        self
    }

    /// OpenID-Connect token endpoint
    pub fn token_url(&self) -> ExplorerResult<Url> {
        self.endpoint(TOKEN_PATH)
    }

    /// GraphQL query endpoint
    pub fn graphql_url(&self) -> ExplorerResult<Url> {
        self.endpoint(GRAPHQL_PATH)
    }

    fn endpoint(&self, path: &str) -> ExplorerResult<Url> {
        Url::parse(&format!("{}{}", self.base_url, path)).map_err(|e| {
            ExplorerError::Configuration(format!("invalid base URL '{}': {}", self.base_url, e))
        })
    }
}

fn normalize_base_url(base_url: &str) -> String {
    base_url.trim().trim_end_matches('/').to_string()
}
