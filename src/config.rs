//! Source configuration loading.
//!
//! The configuration file lists every news provider the relay knows about.
//! It is read once at startup; the resulting [`AppConfig`] is immutable and
//! shared read-only by every fetch.
//!
//! Files ending in `.yaml`/`.yml` are parsed as YAML, anything else as JSON:
//!
//! ```json
//! {
//!   "sources": [{
//!     "name": "NewsAPI",
//!     "base_url": "https://newsapi.org/v2/",
//!     "endpoints": { "top_headlines": "<BASE_URL>top-headlines" },
//!     "default_params": { "pageSize": 20, "language": "en" },
//!     "api_key_env": "NEWSAPI_KEY",
//!     "available_countries": ["us"],
//!     "available_categories": ["technology", "science"],
//!     "response_mapping": { "published_at_path": "publishedAt" },
//!     "filter_limit": 10
//!   }]
//! }
//! ```

use crate::articles::rank::DEFAULT_LIMIT;
use serde::Deserialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, error, info, instrument};

/// Endpoint template used when a source does not name one.
pub const DEFAULT_ENDPOINT: &str = "top_headlines";
/// Query parameter carrying the API key when a source does not name one.
pub const DEFAULT_API_KEY_PARAM: &str = "apiKey";

/// Fatal configuration problems. Any of these aborts the run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration file not found or unreadable: {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid JSON in configuration file {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid YAML in configuration file {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("API key missing for source {source_name}: environment variable {env_var} is not set")]
    MissingApiKey { source_name: String, env_var: String },
    #[error("source name {0} is configured more than once")]
    DuplicateSource(String),
    #[error("no sources configured in {0}")]
    NoSources(PathBuf),
}

/// Where a source's payload keeps its articles and their fields.
///
/// Every path is dot-separated (`"meta.published"`) and resolved with
/// [`crate::articles::path`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ResponseMapping {
    /// Location of the article list. Defaults to `"articles"`.
    pub articles_path: String,
    /// Defaults to `"title"`.
    pub title_field: String,
    /// Defaults to `"url"`.
    pub url_field: String,
    /// Defaults to `"description"`.
    pub description_field: String,
    /// No default: without it every article is treated as undated.
    pub published_at_path: Option<String>,
}

impl Default for ResponseMapping {
    fn default() -> Self {
        Self {
            articles_path: "articles".to_string(),
            title_field: "title".to_string(),
            url_field: "url".to_string(),
            description_field: "description".to_string(),
            published_at_path: None,
        }
    }
}

#[cfg(test)]
impl ResponseMapping {
    /// Default mapping with the given publication-time path.
    pub fn with_published_at(path: &str) -> Self {
        Self {
            published_at_path: Some(path.to_string()),
            ..Self::default()
        }
    }
}

/// One configured news provider.
#[derive(Clone, Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub base_url: String,
    /// Named URL templates. `<BASE_URL>`, `<country>` and `<category>` are
    /// substituted per request.
    #[serde(default)]
    pub endpoints: BTreeMap<String, String>,
    /// Which entry of `endpoints` to call.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Query parameters sent with every request.
    #[serde(default)]
    pub default_params: BTreeMap<String, Value>,
    /// Environment variable holding the API key, if the source needs one.
    #[serde(default)]
    pub api_key_env: Option<String>,
    #[serde(default = "default_api_key_param")]
    pub api_key_param: String,
    /// Resolved from `api_key_env` at load time.
    #[serde(skip)]
    pub api_key: Option<String>,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub available_countries: Vec<String>,
    #[serde(default)]
    pub available_categories: Vec<String>,
    #[serde(default)]
    pub response_mapping: ResponseMapping,
    /// Maximum articles kept after ranking. Negative values keep nothing.
    #[serde(default)]
    pub filter_limit: Option<i64>,
}

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_api_key_param() -> String {
    DEFAULT_API_KEY_PARAM.to_string()
}

impl SourceConfig {
    /// The ranking limit for this source.
    pub fn limit(&self) -> usize {
        match self.filter_limit {
            None => DEFAULT_LIMIT,
            Some(n) if n <= 0 => 0,
            Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
        }
    }

    /// Minimal source pointing at `base_url`.
    #[cfg(test)]
    pub fn new(name: &str, base_url: &str) -> Self {
        Self {
            name: name.to_string(),
            base_url: base_url.to_string(),
            endpoints: BTreeMap::new(),
            endpoint: default_endpoint(),
            default_params: BTreeMap::new(),
            api_key_env: None,
            api_key_param: default_api_key_param(),
            api_key: None,
            headers: BTreeMap::new(),
            available_countries: Vec::new(),
            available_categories: Vec::new(),
            response_mapping: ResponseMapping::default(),
            filter_limit: None,
        }
    }
}

// The API key must never end up in logs.
impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("name", &self.name)
            .field("base_url", &self.base_url)
            .field("endpoint", &self.endpoint)
            .field("api_key_env", &self.api_key_env)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("available_countries", &self.available_countries)
            .field("available_categories", &self.available_categories)
            .field("response_mapping", &self.response_mapping)
            .field("filter_limit", &self.filter_limit)
            .finish()
    }
}

/// The whole configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub sources: Vec<SourceConfig>,
}

impl AppConfig {
    /// Load from `path`, resolving API keys from the process environment.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::load_with(path, |var| std::env::var(var).ok())
    }

    /// Load from `path`, resolving API keys through `lookup`.
    #[instrument(level = "info", skip_all, fields(path = %path.display()))]
    pub fn load_with<F>(path: &Path, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let content = std::fs::read_to_string(path).map_err(|source| {
            error!(error = %source, "Configuration file not found");
            ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let mut config: AppConfig = if is_yaml {
            serde_yaml::from_str(&content).map_err(|source| ConfigError::Yaml {
                path: path.to_path_buf(),
                source,
            })?
        } else {
            serde_json::from_str(&content).map_err(|source| ConfigError::Json {
                path: path.to_path_buf(),
                source,
            })?
        };

        if config.sources.is_empty() {
            return Err(ConfigError::NoSources(path.to_path_buf()));
        }
        config.validate()?;
        config.resolve_api_keys(lookup)?;

        info!(sources = config.sources.len(), "API configuration loaded");
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let mut seen = HashSet::new();
        for source in &self.sources {
            if !seen.insert(source.name.as_str()) {
                return Err(ConfigError::DuplicateSource(source.name.clone()));
            }
        }
        Ok(())
    }

    fn resolve_api_keys<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        for source in &mut self.sources {
            let Some(env_var) = source.api_key_env.as_deref() else {
                continue;
            };
            match lookup(env_var).filter(|k| !k.trim().is_empty()) {
                Some(key) => {
                    debug!(source = %source.name, %env_var, "Loaded API key");
                    source.api_key = Some(key);
                }
                None => {
                    error!(source = %source.name, %env_var, "API key not found");
                    return Err(ConfigError::MissingApiKey {
                        source_name: source.name.clone(),
                        env_var: env_var.to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Look up a source by its unique name.
    pub fn get_source(&self, name: &str) -> Option<&SourceConfig> {
        self.sources.iter().find(|s| s.name == name)
    }
}
