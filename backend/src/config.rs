use std::time::Duration;
use url::Url;

use crate::nim::retry::RetryPolicy;

pub const DEFAULT_API_ENDPOINT: &str = "https://integrate.api.nvidia.com/v1/chat/completions";
pub const DEFAULT_VISION_MODEL: &str = "nvidia/nemotron-nano-12b-v2-vl";
pub const DEFAULT_REASONING_MODEL: &str = "nvidia/llama-3.3-nemotron-super-49b-v1";
pub const DEFAULT_EDUCATOR_MODEL: &str = "nvidia/nemotron-mini-4b-instruct";

const API_KEY_PREFIX: &str = "nvapi-";

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("NVIDIA_API_KEY is missing or is not an nvapi- key")]
    MissingApiKey,
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("Invalid API endpoint: {0}")]
    InvalidEndpoint(#[from] url::ParseError),
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(String),
}

#[derive(Debug, Clone)]
pub struct ModelCatalog {
    pub vision: String,
    pub reasoning: String,
    pub educator: String,
}

/// Bucketing and screening thresholds for confidence scores.
#[derive(Debug, Clone, Copy)]
pub struct ConfidenceThresholds {
    pub high: f64,
    pub medium: f64,
    /// Below this the vision verdict is too weak to call the upload an item at all.
    pub min_item: f64,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high: 0.85,
            medium: 0.65,
            min_item: 0.40,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ImageLimits {
    pub max_upload_bytes: usize,
    pub max_dimension: u32,
    pub jpeg_quality: u8,
}

impl Default for ImageLimits {
    fn default() -> Self {
        Self {
            max_upload_bytes: 10 * 1024 * 1024,
            max_dimension: 1024,
            jpeg_quality: 85,
        }
    }
}

/// Process-wide settings. Built once in `main` and shared read-only.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: Option<String>,
    pub api_endpoint: Url,
    pub models: ModelCatalog,
    pub host: String,
    pub port: u16,
    pub upstream_timeout: Duration,
    pub retry: RetryPolicy,
    pub thresholds: ConfidenceThresholds,
    pub image: ImageLimits,
    pub max_concurrent_classifications: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_endpoint = Url::parse(
            &get("NVIDIA_API_ENDPOINT").unwrap_or_else(|| DEFAULT_API_ENDPOINT.to_string()),
        )?;

        let models = ModelCatalog {
            vision: get("VISION_MODEL").unwrap_or_else(|| DEFAULT_VISION_MODEL.to_string()),
            reasoning: get("REASONING_MODEL")
                .unwrap_or_else(|| DEFAULT_REASONING_MODEL.to_string()),
            educator: get("EDUCATOR_MODEL").unwrap_or_else(|| DEFAULT_EDUCATOR_MODEL.to_string()),
        };

        let port = parse_or("PORT", get("PORT"), 8000u16)?;
        let timeout_secs = parse_or("UPSTREAM_TIMEOUT_SECS", get("UPSTREAM_TIMEOUT_SECS"), 90u64)?;
        let max_concurrent = parse_or(
            "MAX_CONCURRENT_CLASSIFICATIONS",
            get("MAX_CONCURRENT_CLASSIFICATIONS"),
            50usize,
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "UPSTREAM_TIMEOUT_SECS",
                value: "0".into(),
            });
        }
        if max_concurrent == 0 {
            return Err(ConfigError::InvalidValue {
                key: "MAX_CONCURRENT_CLASSIFICATIONS",
                value: "0".into(),
            });
        }

        Ok(Self {
            api_key: get("NVIDIA_API_KEY"),
            api_endpoint,
            models,
            host: get("HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
            port,
            upstream_timeout: Duration::from_secs(timeout_secs),
            retry: RetryPolicy::default(),
            thresholds: ConfidenceThresholds::default(),
            image: ImageLimits::default(),
            max_concurrent_classifications: max_concurrent,
        })
    }

    /// A key counts as configured only when it has the provider's key prefix.
    pub fn api_key_configured(&self) -> bool {
        self.api_key
            .as_deref()
            .is_some_and(|key| key.starts_with(API_KEY_PREFIX))
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_or<T: std::str::FromStr>(
    key: &'static str,
    raw: Option<String>,
    default: T,
) -> Result<T, ConfigError> {
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::InvalidValue { key, value }),
    }
}
