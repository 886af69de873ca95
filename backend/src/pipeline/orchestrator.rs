use actix_web::web;
use shared::{
    ClassificationResult, ConfidenceBreakdown, EnvironmentalImpact, InvalidResult,
    RejectionReason, ValidResult,
};
use std::sync::Arc;
use tokio::sync::Semaphore;

use super::confidence::{composite, level, round4};
use super::prompts;
use crate::categories;
use crate::config::{AppConfig, ConfigError};
use crate::error::{ClassifyError, Result};
use crate::nim::{ModelBackend, ModelRole, NimClient, Prompt};
use crate::parser::{
    ParseOutcome, VisionVerdict, non_waste_kind, parse_educator, parse_reasoning, parse_vision,
    snippet,
};
use crate::preprocess::{ClassificationRequest, NormalizedImage, preprocess};

const LOG_SNIPPET_CHARS: usize = 500;

/// Runs one upload through preprocessing and the three model calls.
#[derive(Clone)]
pub struct Classifier {
    config: Arc<AppConfig>,
    backend: Option<Arc<dyn ModelBackend>>,
    limiter: Arc<Semaphore>,
}

impl Classifier {
    /// `backend` is `None` when no API key is configured; classification then
    /// fails with a configuration error instead of calling out.
    pub fn new(config: Arc<AppConfig>, backend: Option<Arc<dyn ModelBackend>>) -> Self {
        let limiter = Arc::new(Semaphore::new(config.max_concurrent_classifications));
        Self {
            config,
            backend,
            limiter,
        }
    }

    /// Connects to the hosted models only when the API key is usable.
    pub fn from_config(config: AppConfig) -> Self {
        let backend: Option<Arc<dyn ModelBackend>> = match NimClient::new(&config) {
            Ok(client) => Some(Arc::new(client)),
            Err(e) => {
                log::warn!("Model client unavailable, /classify will answer 503: {}", e);
                None
            }
        };
        Self::new(Arc::new(config), backend)
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn is_ready(&self) -> bool {
        self.backend.is_some()
    }

    pub async fn classify(
        &self,
        request: ClassificationRequest,
        request_id: &str,
    ) -> Result<ClassificationResult> {
        let backend = self
            .backend
            .as_deref()
            .ok_or(ClassifyError::Config(ConfigError::MissingApiKey))?;

        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|e| ClassifyError::Internal(e.to_string()))?;

        let fingerprint = request.fingerprint();
        log::info!(
            "[{}] Received {} ({} bytes, sha256 {})",
            request_id,
            request.file_name.as_deref().unwrap_or("unnamed upload"),
            request.bytes.len(),
            fingerprint
        );

        let image = self.normalize(request).await?;
        if image.was_resized() {
            log::info!(
                "[{}] Resized {}x{} -> {}x{}",
                request_id,
                image.original_width,
                image.original_height,
                image.width,
                image.height
            );
        }
        log::info!(
            "[{}] Encoded {} bytes ({} base64 chars)",
            request_id,
            image.jpeg.len(),
            image.base64.len()
        );

        // Identify
        let vision = self
            .call(backend, ModelRole::Vision, &prompts::vision(), Some(&image), request_id)
            .await?;
        let verdict = settle(parse_vision(&vision), ModelRole::Vision, &vision, request_id)?;
        log::info!(
            "[{}] Vision: {:?} (waste item: {}, confidence {:.2})",
            request_id,
            verdict.item_name,
            verdict.is_waste_item,
            verdict.confidence
        );

        if let Some(rejection) = self.screen(&verdict) {
            log::info!(
                "[{}] Not a waste item ({}), skipping categorization",
                request_id,
                rejection.rejection_reason
            );
            return Ok(ClassificationResult::Invalid(rejection));
        }

        // Categorize
        let reasoning = self
            .call(
                backend,
                ModelRole::Reasoning,
                &prompts::reasoning(&verdict.item_name),
                None,
                request_id,
            )
            .await?;
        let categorized = settle(
            parse_reasoning(&reasoning),
            ModelRole::Reasoning,
            &reasoning,
            request_id,
        )?;
        let category = categories::resolve(&categorized.category).ok_or_else(|| {
            log::error!(
                "[{}] Reasoning model answered with unknown category {:?}",
                request_id,
                categorized.category
            );
            ClassifyError::UnknownCategory(categorized.category.clone())
        })?;
        let info = categories::lookup(category);

        let confidence = composite(verdict.confidence, categorized.confidence);
        let confidence_level = level(confidence, &self.config.thresholds);
        log::info!(
            "[{}] Category: {} (confidence {} {})",
            request_id,
            category,
            confidence,
            confidence_level
        );

        // Educate
        let focus = info.focus_metric;
        let educator = self
            .call(
                backend,
                ModelRole::Educator,
                &prompts::educator(&verdict.item_name, category, focus),
                None,
                request_id,
            )
            .await?;
        let feedback = settle(
            parse_educator(&educator, focus),
            ModelRole::Educator,
            &educator,
            request_id,
        )?;

        let preparation_steps = if categorized.preparation_steps.is_empty() {
            info.disposal_steps.clone()
        } else {
            categorized.preparation_steps
        };

        Ok(ClassificationResult::Valid(ValidResult {
            success: true,
            is_waste_item: true,
            object: verdict.item_name,
            category,
            category_info: info.clone(),
            preparation_steps,
            confidence,
            confidence_level,
            confidence_breakdown: ConfidenceBreakdown {
                vision: round4(verdict.confidence),
                reasoning: round4(categorized.confidence),
            },
            environmental_impact: EnvironmentalImpact {
                primary_metric: feedback.primary_metric,
                message: feedback.message,
            },
        }))
    }

    /// Decode and re-encode on the blocking pool.
    async fn normalize(&self, request: ClassificationRequest) -> Result<NormalizedImage> {
        let limits = self.config.image;
        let ClassificationRequest {
            bytes,
            content_type,
            ..
        } = request;
        let image = web::block(move || preprocess(&bytes, content_type.as_deref(), &limits))
            .await
            .map_err(|e| ClassifyError::Internal(e.to_string()))??;
        Ok(image)
    }

    async fn call(
        &self,
        backend: &dyn ModelBackend,
        role: ModelRole,
        prompt: &Prompt,
        image: Option<&NormalizedImage>,
        request_id: &str,
    ) -> Result<String> {
        backend.invoke(role, prompt, image).await.map_err(|source| {
            log::error!("[{}] {} model call failed: {}", request_id, role, source);
            ClassifyError::Upstream {
                stage: role,
                source,
            }
        })
    }

    /// An `InvalidResult` when the vision verdict rules out a disposable item.
    fn screen(&self, verdict: &VisionVerdict) -> Option<InvalidResult> {
        let too_weak = verdict.confidence < self.config.thresholds.min_item;
        if verdict.is_waste_item && !too_weak {
            return None;
        }
        let reason = if too_weak {
            RejectionReason::Unclear
        } else {
            non_waste_kind(&verdict.item_name).unwrap_or(RejectionReason::NotWaste)
        };
        Some(InvalidResult {
            success: false,
            is_waste_item: false,
            rejection_reason: reason,
            object: verdict.item_name.clone(),
            message: rejection_message(reason, &verdict.item_name),
            confidence: round4(verdict.confidence),
        })
    }
}

fn rejection_message(reason: RejectionReason, item_name: &str) -> String {
    match reason {
        RejectionReason::Person => {
            "This looks like a person, not a waste item. Please photograph the item you want to dispose of.".to_string()
        }
        RejectionReason::Animal => {
            "This looks like an animal, not a waste item. Please photograph the item you want to dispose of.".to_string()
        }
        RejectionReason::Landscape => {
            "This looks like a scene or landscape. Please take a close-up photo of a single item.".to_string()
        }
        RejectionReason::Unclear => {
            "We couldn't clearly identify an item. Try a well-lit photo with the item centred.".to_string()
        }
        RejectionReason::NotWaste => format!(
            "A {} doesn't look like something to throw away. Please photograph a waste item.",
            item_name
        ),
    }
}

/// Unwrap a parse outcome, logging degraded parses and turning failures into errors.
fn settle<T>(outcome: ParseOutcome<T>, stage: ModelRole, raw: &str, request_id: &str) -> Result<T> {
    match outcome {
        ParseOutcome::Parsed(value) => Ok(value),
        ParseOutcome::Degraded { value, note } => {
            log::warn!("[{}] Degraded {} parse: {}", request_id, stage, note);
            log::debug!(
                "[{}] Raw {} response: {}",
                request_id,
                stage,
                snippet(raw, LOG_SNIPPET_CHARS)
            );
            Ok(value)
        }
        ParseOutcome::Failed { reason } => {
            log::error!(
                "[{}] Could not parse {} response ({}): {}",
                request_id,
                stage,
                reason,
                snippet(raw, LOG_SNIPPET_CHARS)
            );
            Err(ClassifyError::Parse { stage, reason })
        }
    }
}
