use actix_multipart::Multipart;
use actix_web::http::header::{self, ContentDisposition, HeaderName, HeaderValue};
use actix_web::{HttpRequest, HttpResponse, ResponseError, web};
use futures::StreamExt;
use serde_json::{Map, json};
use shared::ErrorResponse;
use uuid::Uuid;

use crate::categories;
use crate::error::{ClassifyError, Result};
use crate::pipeline::Classifier;
use crate::preprocess::{ClassificationRequest, PreprocessError};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/").route(web::get().to(index)))
        .service(web::resource("/health").route(web::get().to(health)))
        .service(
            web::resource("/classify")
                .route(web::post().to(classify))
                .default_service(web::to(method_not_allowed)),
        );
}

async fn index(classifier: web::Data<Classifier>) -> HttpResponse {
    let models = &classifier.config().models;
    HttpResponse::Ok().json(json!({
        "status": "GreenGuide API is running",
        "version": env!("CARGO_PKG_VERSION"),
        "features": {
            "waste_categories": categories::all().len(),
            "confidence_scoring": true,
            "invalid_image_detection": true,
            "environmental_metrics": 6,
        },
        "models": {
            "vision": models.vision,
            "reasoning": models.reasoning,
            "educator": models.educator,
        }
    }))
}

async fn health(classifier: web::Data<Classifier>) -> HttpResponse {
    let api_key_configured = classifier.config().api_key_configured();
    let models_loaded = classifier.is_ready();
    let status = if api_key_configured && models_loaded {
        "healthy"
    } else {
        "degraded"
    };

    let mut waste_categories = Map::new();
    for info in categories::all() {
        waste_categories.insert(
            info.key.key().to_string(),
            json!({ "name": info.name, "icon": info.icon, "color": info.color }),
        );
    }

    HttpResponse::Ok().json(json!({
        "status": status,
        "api_key_configured": api_key_configured,
        "models_loaded": models_loaded,
        "waste_categories": waste_categories,
    }))
}

async fn classify(classifier: web::Data<Classifier>, payload: Multipart) -> HttpResponse {
    let request_id = Uuid::new_v4().to_string();
    let limit = classifier.config().image.max_upload_bytes;

    let outcome = match read_upload(payload, limit).await {
        Ok(upload) => classifier.classify(upload, &request_id).await,
        Err(err) => Err(err),
    };

    let mut response = match outcome {
        Ok(result) => {
            log::info!(
                "[{}] Classification complete (valid item: {})",
                request_id,
                result.is_success()
            );
            HttpResponse::Ok().json(result)
        }
        Err(err) => {
            if err.is_client_error() {
                log::warn!("[{}] Rejected upload: {}", request_id, err);
            } else {
                log::error!("[{}] Classification failed: {}", request_id, err);
            }
            err.error_response()
        }
    };

    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response
            .headers_mut()
            .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
    }
    response
}

/// First file field of the form, read up to `limit` bytes.
async fn read_upload(mut payload: Multipart, limit: usize) -> Result<ClassificationRequest> {
    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| ClassifyError::Multipart(e.to_string()))?;

        let disposition = field
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| ContentDisposition::from_raw(value).ok());
        let file_name = disposition
            .as_ref()
            .and_then(|cd| cd.get_filename())
            .map(str::to_string);
        let is_file = file_name.is_some()
            || disposition.as_ref().and_then(|cd| cd.get_name()) == Some("file");

        if !is_file {
            while let Some(chunk) = field.next().await {
                chunk.map_err(|e| ClassifyError::Multipart(e.to_string()))?;
            }
            continue;
        }

        let content_type = field
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| ClassifyError::Multipart(e.to_string()))?;
            let size = bytes.len() + chunk.len();
            if size > limit {
                return Err(PreprocessError::PayloadTooLarge { size, limit }.into());
            }
            bytes.extend_from_slice(&chunk);
        }

        return Ok(ClassificationRequest {
            bytes,
            file_name,
            content_type,
        });
    }

    Err(ClassifyError::MissingImage)
}

async fn method_not_allowed(req: HttpRequest) -> HttpResponse {
    HttpResponse::MethodNotAllowed().json(ErrorResponse::new(
        "method_not_allowed",
        format!("{} is not supported on {}", req.method(), req.path()),
    ))
}

pub async fn not_found(req: HttpRequest) -> HttpResponse {
    HttpResponse::NotFound().json(ErrorResponse::new(
        "not_found",
        format!("No route for {}", req.path()),
    ))
}
