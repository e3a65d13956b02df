//! Layered configuration.
//!
//! Sources, later ones overriding earlier ones:
//! - Bundled defaults (include_str! from quarry.toml)
//! - `~/.config/quarry/quarry.toml`
//! - `./quarry.toml`
//! - `SILICONFLOW_BASE_URL` / `SILICONFLOW_MODEL` for the NLU endpoint

use crate::{BackendKind, OutputFormat, SourceCatalog, SourceEntry, TaskConfig};
use config::{Config, File, FileFormat};
use derive_getters::Getters;
use quarry_error::{ConfigError, QuarryError, QuarryResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, warn};

/// Language-model endpoint settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct NluConfig {
    /// OpenAI-compatible API root
    base_url: String,
    /// Model identifier
    model: String,
    /// Environment variable holding the API key
    api_key_env: String,
    /// Sampling temperature
    temperature: f32,
    /// Completion budget
    max_tokens: u32,
    /// Per-request HTTP timeout
    timeout_secs: u64,
    /// Retries on transient failures
    max_retries: u32,
}

impl Default for NluConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.siliconflow.cn/v1".to_string(),
            model: "deepseek-ai/DeepSeek-V3".to_string(),
            api_key_env: "SILICONFLOW_API_KEY".to_string(),
            temperature: 0.7,
            max_tokens: 4000,
            timeout_secs: 60,
            max_retries: 3,
        }
    }
}

impl NluConfig {
    /// Point the client at another endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Use another model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Read the key from another environment variable.
    pub fn with_api_key_env(mut self, api_key_env: impl Into<String>) -> Self {
        self.api_key_env = api_key_env.into();
        self
    }

    /// Change the retry budget.
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("SILICONFLOW_BASE_URL") {
            debug!(url = %url, "NLU base URL overridden from environment");
            self.base_url = url;
        }
        if let Ok(model) = std::env::var("SILICONFLOW_MODEL") {
            debug!(model = %model, "NLU model overridden from environment");
            self.model = model;
        }
    }
}

/// Pipeline-wide defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct PipelineConfig {
    /// Backend used when the caller names none
    default_backend: BackendKind,
    /// Format used when the caller names none
    default_format: OutputFormat,
    /// Rows in preview statements
    sample_size: u64,
    /// Task priority, 1..=5
    priority: u8,
    /// Task timeout in seconds
    timeout_secs: u64,
    /// Catalog entry used when no source matches
    default_source: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_backend: BackendKind::Spark,
            default_format: OutputFormat::Json,
            sample_size: 5,
            priority: TaskConfig::DEFAULT_PRIORITY,
            timeout_secs: TaskConfig::DEFAULT_TIMEOUT_SECS,
            default_source: "users".to_string(),
        }
    }
}

/// Connection settings for one backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct BackendSettings {
    /// Service root URL
    url: String,
    /// User name, where the service wants one
    username: Option<String>,
    /// Password
    password: Option<String>,
    /// Database / schema used for unqualified tables
    database: Option<String>,
    /// Presto catalog
    catalog: Option<String>,
    /// Presto schema
    schema: Option<String>,
    /// Cluster queue (Spark on YARN)
    queue: Option<String>,
    /// HDFS directory for WebHCat job output
    status_dir: Option<String>,
    /// WebHDFS root for reading job output
    webhdfs_url: Option<String>,
    /// Delay between status polls
    poll_interval_ms: u64,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            url: String::new(),
            username: None,
            password: None,
            database: None,
            catalog: None,
            schema: None,
            queue: None,
            status_dir: None,
            webhdfs_url: None,
            poll_interval_ms: 500,
        }
    }
}

impl BackendSettings {
    /// Local defaults for a backend kind.
    pub fn default_for(kind: BackendKind) -> Self {
        let base = Self::default();
        match kind {
            BackendKind::Spark => Self {
                url: "http://localhost:8998".to_string(),
                queue: Some("default".to_string()),
                ..base
            },
            BackendKind::Hive => Self {
                url: "http://localhost:50111".to_string(),
                username: Some("hive".to_string()),
                database: Some("default".to_string()),
                status_dir: Some("/tmp/quarry".to_string()),
                webhdfs_url: Some("http://localhost:9870".to_string()),
                ..base
            },
            BackendKind::ClickHouse => Self {
                url: "http://localhost:8123".to_string(),
                username: Some("default".to_string()),
                database: Some("default".to_string()),
                ..base
            },
            BackendKind::Presto => Self {
                url: "http://localhost:8080".to_string(),
                username: Some("quarry".to_string()),
                catalog: Some("hive".to_string()),
                schema: Some("default".to_string()),
                ..base
            },
        }
    }

    /// Settings pointing at `url`, otherwise the local defaults.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Change the poll interval.
    pub fn with_poll_interval_ms(mut self, poll_interval_ms: u64) -> Self {
        self.poll_interval_ms = poll_interval_ms;
        self
    }
}

/// Complete configuration.
///
/// # Examples
///
/// ```
/// use quarry_core::{BackendKind, QuarryConfig};
///
/// let config = QuarryConfig::default();
/// assert_eq!(config.backend(BackendKind::Spark).url(), "http://localhost:8998");
/// assert_eq!(config.catalog().resolve(None, "orders last week").table(), "order_info");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Getters)]
#[serde(default)]
pub struct QuarryConfig {
    nlu: NluConfig,
    pipeline: PipelineConfig,
    /// Keyed by backend name ("spark", "hive", ...)
    backends: BTreeMap<String, BackendSettings>,
    sources: Vec<SourceEntry>,
}

impl QuarryConfig {
    /// Load configuration from a single file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not deserialize.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> QuarryResult<Self> {
        debug!(path = %path.as_ref().display(), "Loading configuration from file");

        Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .map_err(|e| {
                QuarryError::from(ConfigError::new(format!(
                    "Failed to read configuration from {}: {}",
                    path.as_ref().display(),
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                QuarryError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })
    }

    /// Load configuration with precedence: current dir > home dir > bundled defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if a present file is malformed.
    pub fn load() -> QuarryResult<Self> {
        debug!("Loading configuration with precedence: current dir > home dir > bundled defaults");

        const DEFAULT_CONFIG: &str = include_str!("../../../quarry.toml");

        let mut builder =
            Config::builder().add_source(File::from_str(DEFAULT_CONFIG, FileFormat::Toml));

        if let Some(home) = dirs::home_dir() {
            let home_config = home.join(".config/quarry/quarry.toml");
            builder = builder.add_source(File::from(home_config).required(false));
        }

        builder = builder.add_source(File::with_name("quarry").required(false));

        let mut config: QuarryConfig = builder
            .build()
            .map_err(|e| {
                QuarryError::from(ConfigError::new(format!(
                    "Failed to build configuration: {}",
                    e
                )))
            })?
            .try_deserialize()
            .map_err(|e| {
                QuarryError::from(ConfigError::new(format!(
                    "Failed to parse configuration: {}",
                    e
                )))
            })?;

        config.nlu.apply_env();
        Ok(config)
    }

    /// Replace the NLU section.
    pub fn with_nlu(mut self, nlu: NluConfig) -> Self {
        self.nlu = nlu;
        self
    }

    /// Override settings for one backend.
    pub fn with_backend(mut self, kind: BackendKind, settings: BackendSettings) -> Self {
        self.backends.insert(kind.to_string(), settings);
        self
    }

    /// Settings for `kind`, falling back to local defaults.
    pub fn backend(&self, kind: BackendKind) -> BackendSettings {
        self.backends
            .get(kind.as_ref())
            .cloned()
            .unwrap_or_else(|| BackendSettings::default_for(kind))
    }

    /// Source catalog; the standard one when none is configured.
    pub fn catalog(&self) -> SourceCatalog {
        if self.sources.is_empty() {
            return SourceCatalog::standard();
        }
        let default_name = &self.pipeline.default_source;
        let fallback = match self.sources.iter().find(|s| s.name() == default_name) {
            Some(entry) => entry.clone(),
            None => {
                warn!(
                    default_source = %default_name,
                    "Default source not in catalog, using first entry"
                );
                self.sources[0].clone()
            }
        };
        SourceCatalog::new(self.sources.clone(), fallback)
    }
}
