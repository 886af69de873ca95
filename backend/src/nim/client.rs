use async_trait::async_trait;
use reqwest::Client as HttpClient;
use std::fmt;
use url::Url;

use super::models::{ChatMessage, ChatRequest, ContentPart, ImageUrl, MessageContent};
use super::retry::{RetryPolicy, with_retry};
use crate::config::{AppConfig, ConfigError, ModelCatalog};
use crate::parser::snippet;
use crate::preprocess::NormalizedImage;

const ERROR_BODY_LIMIT: usize = 1000;

/// Which of the three hosted models a call goes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModelRole {
    Vision,
    Reasoning,
    Educator,
}

impl ModelRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelRole::Vision => "vision",
            ModelRole::Reasoning => "reasoning",
            ModelRole::Educator => "educator",
        }
    }
}

impl fmt::Display for ModelRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Prompt {
    pub text: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ModelError {
    #[error("request timed out")]
    Timeout,
    #[error("upstream unavailable: {0}")]
    Unavailable(String),
    /// `body` is kept for logs and never rendered into client responses.
    #[error("upstream returned HTTP {status}")]
    Status { status: u16, body: String },
    #[error("upstream response had no message content")]
    MalformedEnvelope(String),
}

impl ModelError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ModelError::Timeout
        } else {
            ModelError::Unavailable(err.to_string())
        }
    }

    /// Client-side 4xx (bad input, bad key) is permanent; rate limiting is not.
    pub fn is_retryable(&self) -> bool {
        match self {
            ModelError::Timeout | ModelError::Unavailable(_) => true,
            ModelError::Status { status, .. } => *status >= 500 || *status == 429,
            ModelError::MalformedEnvelope(_) => false,
        }
    }
}

#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Send one prompt (and optionally the image) to the model behind `role`
    /// and return the model's raw text.
    async fn invoke(
        &self,
        role: ModelRole,
        prompt: &Prompt,
        image: Option<&NormalizedImage>,
    ) -> Result<String, ModelError>;
}

/// Client for the hosted chat-completions endpoint.
#[derive(Clone)]
pub struct NimClient {
    http_client: HttpClient,
    endpoint: Url,
    api_key: String,
    models: ModelCatalog,
    retry: RetryPolicy,
}

impl NimClient {
    pub fn new(config: &AppConfig) -> Result<Self, ConfigError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|_| config.api_key_configured())
            .ok_or(ConfigError::MissingApiKey)?;
        let http_client = HttpClient::builder()
            .timeout(config.upstream_timeout)
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self {
            http_client,
            endpoint: config.api_endpoint.clone(),
            api_key,
            models: config.models.clone(),
            retry: config.retry.clone(),
        })
    }

    fn model_name(&self, role: ModelRole) -> &str {
        match role {
            ModelRole::Vision => &self.models.vision,
            ModelRole::Reasoning => &self.models.reasoning,
            ModelRole::Educator => &self.models.educator,
        }
    }

    fn build_request(
        &self,
        role: ModelRole,
        prompt: &Prompt,
        image: Option<&NormalizedImage>,
    ) -> ChatRequest {
        let content = match image {
            Some(image) => MessageContent::Parts(vec![
                ContentPart::Text {
                    text: prompt.text.clone(),
                },
                ContentPart::ImageUrl {
                    image_url: ImageUrl {
                        url: image.data_url(),
                    },
                },
            ]),
            None => MessageContent::Text(prompt.text.clone()),
        };

        ChatRequest {
            model: self.model_name(role).to_string(),
            messages: vec![ChatMessage {
                role: "user",
                content,
            }],
            max_tokens: prompt.max_tokens,
            temperature: prompt.temperature,
        }
    }

    async fn send_once(&self, request: &ChatRequest) -> Result<String, ModelError> {
        let response = self
            .http_client
            .post(self.endpoint.clone())
            .bearer_auth(&self.api_key)
            .json(request)
            .send()
            .await
            .map_err(ModelError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            log::warn!(
                "Upstream answered HTTP {}: {}",
                status.as_u16(),
                snippet(&body, ERROR_BODY_LIMIT)
            );
            return Err(ModelError::Status {
                status: status.as_u16(),
                body: snippet(&body, ERROR_BODY_LIMIT),
            });
        }

        let body = response.text().await.map_err(ModelError::from_transport)?;
        let envelope: super::models::ChatResponse = serde_json::from_str(&body)
            .map_err(|e| ModelError::MalformedEnvelope(e.to_string()))?;
        envelope.into_content().ok_or_else(|| {
            let body = snippet(&body, ERROR_BODY_LIMIT);
            log::warn!("Upstream reply had no message content: {}", body);
            ModelError::MalformedEnvelope(body)
        })
    }
}

#[async_trait]
impl ModelBackend for NimClient {
    async fn invoke(
        &self,
        role: ModelRole,
        prompt: &Prompt,
        image: Option<&NormalizedImage>,
    ) -> Result<String, ModelError> {
        let request = self.build_request(role, prompt, image);
        log::info!("Calling {} model: {}", role, request.model);

        let label = format!("{} model", role);
        let result = with_retry(
            &self.retry,
            &label,
            |_| self.send_once(&request),
            ModelError::is_retryable,
        )
        .await;

        match &result {
            Ok(text) => log::debug!("{} model replied with {} chars", role, text.len()),
            Err(ModelError::MalformedEnvelope(detail)) => {
                log::error!("{} model call failed: malformed reply: {}", role, detail)
            }
            Err(e) => log::error!("{} model call failed: {}", role, e),
        }
        result
    }
}
