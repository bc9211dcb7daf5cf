//! Configuration file parser for `config/config.toml`.
//!
//! The relay cannot run without a feed host and a queue, so a missing file
//! is an error. Unknown keys are accepted by serde but logged as warnings.
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use url::Url;

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid TOML in config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// Config file exceeds maximum allowed size.
    #[error("Config file too large: {0}")]
    TooLarge(String),

    /// A required value is blank.
    #[error("Invalid config value for `{key}`: {reason}")]
    Invalid { key: &'static str, reason: String },

    /// A feed URL composed from the base URL and a route does not parse.
    #[error("Invalid feed URL {url:?}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

// ============================================================================
// Configuration Structs
// ============================================================================

/// Relay configuration: where the feeds live and where articles go.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Feed host, e.g. `rsshub.example.com` or `localhost:1200`.
    /// Prefixed with `http://` unless it already carries a scheme.
    pub rsshub_base_url: String,

    /// Route path segments appended to the base URL, one feed each.
    #[serde(default)]
    pub rss_feed_routes: Vec<String>,

    /// Name of the destination queue.
    pub sqs_queue_name: String,

    /// Region of the queue service.
    pub aws_region: String,

    /// Alternate queue endpoint, e.g. a local SQS emulator.
    #[serde(default)]
    pub sqs_endpoint_url: Option<String>,

    /// Per-feed HTTP timeout in seconds.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    crate::feed::DEFAULT_TIMEOUT.as_secs()
}

impl Config {
    /// Maximum config file size (1 MB).
    const MAX_FILE_SIZE: u64 = 1_048_576;

    const KNOWN_KEYS: [&'static str; 6] = [
        "rsshub_base_url",
        "rss_feed_routes",
        "sqs_queue_name",
        "aws_region",
        "sqs_endpoint_url",
        "request_timeout_secs",
    ];

    /// Load configuration from a TOML file.
    ///
    /// - Missing file → `Err(ConfigError::Io)`
    /// - Invalid or empty TOML → `Err(ConfigError::Parse)`
    /// - Blank required values → `Err(ConfigError::Invalid)`
    /// - Unknown keys → accepted, logged as warning
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        // Check file size before reading to avoid loading a huge file.
        let meta = std::fs::metadata(path)?;
        if meta.len() > Self::MAX_FILE_SIZE {
            return Err(ConfigError::TooLarge(format!(
                "Config file is {} bytes (max {} bytes)",
                meta.len(),
                Self::MAX_FILE_SIZE
            )));
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::info!(
            path = %path.display(),
            routes = config.rss_feed_routes.len(),
            queue = %config.sqs_queue_name,
            "Loaded configuration"
        );
        Ok(config)
    }

    /// Parse and validate configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        // Parse as a raw table first to detect unknown keys
        if let Ok(raw) = content.parse::<toml::Table>() {
            for key in raw.keys() {
                if !Self::KNOWN_KEYS.contains(&key.as_str()) {
                    tracing::warn!(key = %key, "Unknown key in config file, ignoring");
                }
            }
        }

        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("rsshub_base_url", &self.rsshub_base_url),
            ("sqs_queue_name", &self.sqs_queue_name),
            ("aws_region", &self.aws_region),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                key: "request_timeout_secs",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Resolves every configured route to a full feed URL, in route order.
    pub fn feed_urls(&self) -> Result<Vec<String>, ConfigError> {
        let base = self.rsshub_base_url.trim().trim_end_matches('/');
        let base = if base.contains("://") {
            base.to_string()
        } else {
            format!("http://{}", base)
        };

        self.rss_feed_routes
            .iter()
            .map(|route| {
                let url = format!("{}/{}", base, route.trim().trim_start_matches('/'));
                Url::parse(&url)
                    .map(|_| url.clone())
                    .map_err(|source| ConfigError::InvalidUrl { url, source })
            })
            .collect()
    }
}

// ============================================================================
// Tests
// ============================================================================
