//! Errors surfaced by a classification request.
//!
//! Each variant maps to an HTTP status and a stable `code` string.
use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use shared::ErrorResponse;

use crate::config::ConfigError;
use crate::nim::{ModelError, ModelRole};
use crate::preprocess::PreprocessError;

pub type Result<T> = std::result::Result<T, ClassifyError>;

#[derive(Debug, thiserror::Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Input(#[from] PreprocessError),

    #[error("No image file was found in the upload")]
    MissingImage,

    #[error("Malformed multipart upload: {0}")]
    Multipart(String),

    #[error("The {stage} model call failed: {source}")]
    Upstream {
        stage: ModelRole,
        #[source]
        source: ModelError,
    },

    #[error("Could not interpret the {stage} model response: {reason}")]
    Parse { stage: ModelRole, reason: String },

    #[error("The reasoning model returned an unknown category: {0}")]
    UnknownCategory(String),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ClassifyError {
    pub fn code(&self) -> &'static str {
        match self {
            ClassifyError::Input(PreprocessError::PayloadTooLarge { .. }) => "payload_too_large",
            ClassifyError::Input(PreprocessError::UnsupportedFormat(_)) => "unsupported_format",
            ClassifyError::Input(PreprocessError::Encoding(_)) => "internal_error",
            ClassifyError::MissingImage => "missing_image",
            ClassifyError::Multipart(_) => "invalid_upload",
            ClassifyError::Upstream {
                source: ModelError::Timeout,
                ..
            } => "upstream_timeout",
            ClassifyError::Upstream {
                source: ModelError::Unavailable(_),
                ..
            } => "upstream_unavailable",
            ClassifyError::Upstream { .. } => "upstream_error",
            ClassifyError::Parse { .. } => "parse_error",
            ClassifyError::UnknownCategory(_) => "unknown_category",
            ClassifyError::Config(ConfigError::MissingApiKey) => "api_key_missing",
            ClassifyError::Config(_) => "configuration_error",
            ClassifyError::Internal(_) => "internal_error",
        }
    }

    pub fn stage(&self) -> Option<&'static str> {
        match self {
            ClassifyError::Input(PreprocessError::Encoding(_)) => Some("preprocess"),
            ClassifyError::Input(_) | ClassifyError::MissingImage | ClassifyError::Multipart(_) => {
                Some("upload")
            }
            ClassifyError::Upstream { stage, .. } | ClassifyError::Parse { stage, .. } => {
                Some(stage.as_str())
            }
            ClassifyError::UnknownCategory(_) => Some(ModelRole::Reasoning.as_str()),
            ClassifyError::Config(_) | ClassifyError::Internal(_) => None,
        }
    }

    /// Expected client-side outcomes, logged below error level.
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }
}

impl ResponseError for ClassifyError {
    fn status_code(&self) -> StatusCode {
        match self {
            ClassifyError::Input(PreprocessError::PayloadTooLarge { .. }) => {
                StatusCode::PAYLOAD_TOO_LARGE
            }
            ClassifyError::Input(PreprocessError::Encoding(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ClassifyError::Input(_) | ClassifyError::MissingImage | ClassifyError::Multipart(_) => {
                StatusCode::BAD_REQUEST
            }
            ClassifyError::Upstream {
                source: ModelError::Timeout,
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            ClassifyError::Upstream { .. } => StatusCode::BAD_GATEWAY,
            ClassifyError::Config(ConfigError::MissingApiKey) => StatusCode::SERVICE_UNAVAILABLE,
            ClassifyError::Parse { .. }
            | ClassifyError::UnknownCategory(_)
            | ClassifyError::Config(_)
            | ClassifyError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = ErrorResponse::new(self.code(), self.to_string());
        if let Some(stage) = self.stage() {
            body = body.with_stage(stage);
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;
    use serde_json::Value;

    async fn body_of(err: &ClassifyError) -> Value {
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn statuses_follow_the_error_taxonomy() {
        let cases = [
            (
                ClassifyError::Input(PreprocessError::PayloadTooLarge { size: 11, limit: 10 }),
                413,
            ),
            (
                ClassifyError::Input(PreprocessError::UnsupportedFormat("x".into())),
                400,
            ),
            (ClassifyError::MissingImage, 400),
            (
                ClassifyError::Upstream {
                    stage: ModelRole::Vision,
                    source: ModelError::Timeout,
                },
                504,
            ),
            (
                ClassifyError::Upstream {
                    stage: ModelRole::Educator,
                    source: ModelError::Status {
                        status: 500,
                        body: String::new(),
                    },
                },
                502,
            ),
            (
                ClassifyError::Parse {
                    stage: ModelRole::Reasoning,
                    reason: "nothing".into(),
                },
                500,
            ),
            (ClassifyError::UnknownCategory("plasma".into()), 500),
            (ClassifyError::Config(ConfigError::MissingApiKey), 503),
        ];
        for (err, status) in cases {
            assert_eq!(err.status_code().as_u16(), status, "{err:?}");
        }
    }

    #[actix_web::test]
    async fn timeout_body_has_stable_code_and_stage() {
        let err = ClassifyError::Upstream {
            stage: ModelRole::Vision,
            source: ModelError::Timeout,
        };
        let body = body_of(&err).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "upstream_timeout");
        assert_eq!(body["error"]["stage"], "vision");
        assert!(body.get("category").is_none());
    }

    #[actix_web::test]
    async fn upstream_bodies_are_not_echoed_to_clients() {
        let err = ClassifyError::Upstream {
            stage: ModelRole::Reasoning,
            source: ModelError::Status {
                status: 401,
                body: "{\"detail\": \"key nvapi-secret rejected for org 42\"}".into(),
            },
        };
        let body = body_of(&err).await;
        assert_eq!(body["error"]["code"], "upstream_error");
        let message = body["error"]["message"].as_str().unwrap();
        assert_eq!(message, "The reasoning model call failed: upstream returned HTTP 401");
        assert!(!body.to_string().contains("nvapi-secret"));

        let err = ClassifyError::Upstream {
            stage: ModelRole::Vision,
            source: ModelError::MalformedEnvelope("{\"choices\": []}".into()),
        };
        assert!(!body_of(&err).await.to_string().contains("choices"));
    }

    #[actix_web::test]
    async fn config_errors_omit_the_stage() {
        let body = body_of(&ClassifyError::Config(ConfigError::MissingApiKey)).await;
        assert_eq!(body["error"]["code"], "api_key_missing");
        assert!(body["error"].get("stage").is_none());
    }

    #[test]
    fn input_errors_are_client_errors() {
        assert!(ClassifyError::MissingImage.is_client_error());
        assert!(!ClassifyError::UnknownCategory("x".into()).is_client_error());
    }
}
