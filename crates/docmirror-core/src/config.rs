//! Configuration module for DocMirror.
//!
//! Provides typed configuration structs that map to the YAML configuration file,
//! with loading, validation, defaults, and a builder pattern for programmatic use.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Config struct with sub-sections
// ---------------------------------------------------------------------------

/// Top-level configuration for DocMirror.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub source: SourceConfig,
    pub destination: DestinationConfig,
    pub aws: AwsConfig,
    pub transfer: TransferConfig,
    pub logging: LoggingConfig,
}

/// Source tree settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// Identifier of the folder that is the sync root. Required for a run.
    pub root_folder_id: Option<String>,
}

/// Destination bucket settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DestinationConfig {
    /// Bucket name. Required for a run.
    pub bucket: Option<String>,
    /// Key prefix under which the tree is mirrored (may be empty).
    pub prefix: String,
    /// User-metadata key holding the source version token.
    pub version_metadata_key: String,
    /// Multipart upload part size (in MiB).
    pub part_size_mb: u64,
}

/// AWS client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AwsConfig {
    /// Region for both the source and destination clients.
    pub region: String,
    /// Custom endpoint (S3-compatible stores, local testing).
    pub endpoint_url: Option<String>,
    /// SDK-level retry attempt bound (adaptive mode).
    pub max_attempts: u32,
}

/// Transfer worker pool settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TransferConfig {
    /// Maximum concurrent transfer tasks.
    pub max_workers: usize,
    /// Idle connection pool size for the HTTP clients.
    pub max_pool_connections: usize,
    /// Attempts for resolving a fetch handle.
    pub fetch_retry_attempts: u32,
    /// Base backoff delay between fetch handle attempts (in ms).
    pub fetch_retry_base_delay_ms: u64,
}

/// Logging / tracing settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level: `trace`, `debug`, `info`, `warn`, or `error`.
    pub level: String,
    /// Optional log file; records are appended.
    pub file: Option<PathBuf>,
    /// Emit JSON records instead of human-readable lines.
    pub json: bool,
}

// ---------------------------------------------------------------------------
// Config::load()
// ---------------------------------------------------------------------------

impl Config {
    /// Load configuration from a YAML file at `path`.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Try to load from `path`; fall back to [`Config::default`] on any error.
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Platform-appropriate default path for the configuration file.
    ///
    /// Typically `$XDG_CONFIG_HOME/docmirror/config.yaml` on Linux.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("~/.config"))
            .join("docmirror")
            .join("config.yaml")
    }

    /// Part size in bytes.
    pub fn part_size_bytes(&self) -> usize {
        (self.destination.part_size_mb as usize) * 1024 * 1024
    }
}

// ---------------------------------------------------------------------------
// Config::default()
// ---------------------------------------------------------------------------

/// Metadata key the original sync tool wrote version tokens under.
pub const DEFAULT_VERSION_METADATA_KEY: &str = "workdocs-version-id";

/// Smallest part size S3 accepts for non-final multipart parts (in MiB).
pub const MIN_PART_SIZE_MB: u64 = 5;

impl Default for DestinationConfig {
    fn default() -> Self {
        Self {
            bucket: None,
            prefix: String::new(),
            version_metadata_key: DEFAULT_VERSION_METADATA_KEY.to_string(),
            part_size_mb: 8,
        }
    }
}

impl Default for AwsConfig {
    fn default() -> Self {
        Self {
            region: "us-east-1".to_string(),
            endpoint_url: None,
            max_attempts: 5,
        }
    }
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            max_workers: 14,
            max_pool_connections: 28,
            fetch_retry_attempts: 5,
            fetch_retry_base_delay_ms: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
            file: None,
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Config::validate()
// ---------------------------------------------------------------------------

/// A single validation error found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path to the offending field, e.g. `"transfer.max_workers"`.
    pub field: String,
    /// Human-readable explanation.
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Valid values for `logging.level`.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Validate the configuration and return all errors found.
    ///
    /// An empty vector means the configuration is valid. Fields that are only
    /// needed to start a run are checked by [`Config::validate_for_run`].
    pub fn validate(&self) -> Vec<ValidationError> {
        let mut errors = Vec::new();

        // --- source ---
        if let Some(id) = &self.source.root_folder_id {
            if id.trim().is_empty() {
                errors.push(ValidationError {
                    field: "source.root_folder_id".into(),
                    message: "must not be blank".into(),
                });
            }
        }

        // --- destination ---
        if let Some(bucket) = &self.destination.bucket {
            if bucket.trim().is_empty() {
                errors.push(ValidationError {
                    field: "destination.bucket".into(),
                    message: "must not be blank".into(),
                });
            }
        }
        if self.destination.version_metadata_key.trim().is_empty() {
            errors.push(ValidationError {
                field: "destination.version_metadata_key".into(),
                message: "must not be blank".into(),
            });
        }
        if self.destination.part_size_mb < MIN_PART_SIZE_MB {
            errors.push(ValidationError {
                field: "destination.part_size_mb".into(),
                message: format!("must be at least {MIN_PART_SIZE_MB}"),
            });
        }

        // --- aws ---
        if self.aws.region.trim().is_empty() {
            errors.push(ValidationError {
                field: "aws.region".into(),
                message: "must not be blank".into(),
            });
        }
        if let Some(endpoint) = &self.aws.endpoint_url {
            if url::Url::parse(endpoint).is_err() {
                errors.push(ValidationError {
                    field: "aws.endpoint_url".into(),
                    message: format!("not a valid URL: {endpoint}"),
                });
            }
        }
        if self.aws.max_attempts == 0 {
            errors.push(ValidationError {
                field: "aws.max_attempts".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- transfer ---
        if self.transfer.max_workers == 0 {
            errors.push(ValidationError {
                field: "transfer.max_workers".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.transfer.max_pool_connections == 0 {
            errors.push(ValidationError {
                field: "transfer.max_pool_connections".into(),
                message: "must be greater than 0".into(),
            });
        }
        if self.transfer.fetch_retry_attempts == 0 {
            errors.push(ValidationError {
                field: "transfer.fetch_retry_attempts".into(),
                message: "must be greater than 0".into(),
            });
        }

        // --- logging ---
        if !VALID_LOG_LEVELS.contains(&self.logging.level.as_str()) {
            errors.push(ValidationError {
                field: "logging.level".into(),
                message: format!(
                    "invalid level '{}'; valid options: {}",
                    self.logging.level,
                    VALID_LOG_LEVELS.join(", ")
                ),
            });
        }

        errors
    }

    /// Validate, additionally requiring the fields a sync run needs.
    pub fn validate_for_run(&self) -> Vec<ValidationError> {
        let mut errors = self.validate();

        if self.source.root_folder_id.is_none() {
            errors.push(ValidationError {
                field: "source.root_folder_id".into(),
                message: "is required".into(),
            });
        }
        if self.destination.bucket.is_none() {
            errors.push(ValidationError {
                field: "destination.bucket".into(),
                message: "is required".into(),
            });
        }

        errors
    }
}

// ---------------------------------------------------------------------------
// ConfigBuilder
// ---------------------------------------------------------------------------

/// Builder for constructing a [`Config`] programmatically.
///
/// Starts from [`Config::default`] and allows selective overrides.
///
/// # Example
///
/// ```rust,no_run
/// use docmirror_core::config::ConfigBuilder;
///
/// let config = ConfigBuilder::new()
///     .root_folder_id("d90b1a6f1c3e")
///     .bucket("archive")
///     .prefix("workdocs")
///     .logging_level("info")
///     .build();
/// ```
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder initialised with [`Config::default`] values.
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Start from an existing configuration (e.g. one loaded from disk).
    pub fn from_config(config: Config) -> Self {
        Self { config }
    }

    // --- source ---

    pub fn root_folder_id(mut self, id: impl Into<String>) -> Self {
        self.config.source.root_folder_id = Some(id.into());
        self
    }

    // --- destination ---

    pub fn bucket(mut self, bucket: impl Into<String>) -> Self {
        self.config.destination.bucket = Some(bucket.into());
        self
    }

    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.destination.prefix = prefix.into();
        self
    }

    pub fn version_metadata_key(mut self, key: impl Into<String>) -> Self {
        self.config.destination.version_metadata_key = key.into();
        self
    }

    pub fn part_size_mb(mut self, mb: u64) -> Self {
        self.config.destination.part_size_mb = mb;
        self
    }

    // --- aws ---

    pub fn region(mut self, region: impl Into<String>) -> Self {
        self.config.aws.region = region.into();
        self
    }

    pub fn endpoint_url(mut self, url: impl Into<String>) -> Self {
        self.config.aws.endpoint_url = Some(url.into());
        self
    }

    pub fn aws_max_attempts(mut self, n: u32) -> Self {
        self.config.aws.max_attempts = n;
        self
    }

    // --- transfer ---

    pub fn max_workers(mut self, n: usize) -> Self {
        self.config.transfer.max_workers = n;
        self
    }

    pub fn max_pool_connections(mut self, n: usize) -> Self {
        self.config.transfer.max_pool_connections = n;
        self
    }

    pub fn fetch_retry_attempts(mut self, n: u32) -> Self {
        self.config.transfer.fetch_retry_attempts = n;
        self
    }

    pub fn fetch_retry_base_delay_ms(mut self, ms: u64) -> Self {
        self.config.transfer.fetch_retry_base_delay_ms = ms;
        self
    }

    // --- logging ---

    pub fn logging_level(mut self, level: impl Into<String>) -> Self {
        self.config.logging.level = level.into();
        self
    }

    pub fn logging_file(mut self, file: PathBuf) -> Self {
        self.config.logging.file = Some(file);
        self
    }

    pub fn logging_json(mut self, json: bool) -> Self {
        self.config.logging.json = json;
        self
    }

    // --- build ---

    /// Consume the builder and return the finished [`Config`].
    pub fn build(self) -> Config {
        self.config
    }

    /// Build and validate in one step. Returns `Err` with the list of
    /// validation errors if the configuration is invalid.
    pub fn build_validated(self) -> Result<Config, Vec<ValidationError>> {
        let config = self.build();
        let errors = config.validate();
        if errors.is_empty() {
            Ok(config)
        } else {
            Err(errors)
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
