//! # Ingredient Extractor
//!
//! Turns a meal description into a list of [`ParsedIngredient`]s.
//!
//! The AI path calls an [`ExtractionService`]; whenever that service is
//! missing, disabled, tripped, or failing, the deterministic legacy parser
//! takes over so a resolution never fails because of the extraction step.
//!
//! ## Recovery
//!
//! - Rate limits are retried with exponential backoff plus jitter, honoring
//!   `Retry-After`, up to `max_retries`
//! - Quota exhaustion falls back at once and adds a user-visible warning
//! - Each call is bounded by `operation_timeout_secs`
//! - Repeated failures open a [`CircuitBreaker`]

use log::{debug, info, warn};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;

use crate::circuit_breaker::CircuitBreaker;
use crate::config::{ExtractionConfig, ExtractionMode, RecoveryConfig, MIN_INPUT_CHARS};
use crate::errors::ExtractionError;
use crate::extraction::{ChatExtractionService, EdgeFunctionExtractionService, ExtractionService};
use crate::ingredient_model::{ExtractionSource, ParsedIngredient, ResolutionWarning};
use crate::legacy_parser::parse_meal_text;

/// Outcome of one extraction
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub ingredients: Vec<ParsedIngredient>,
    pub source: ExtractionSource,
    pub warnings: Vec<ResolutionWarning>,
}

impl Extraction {
    fn empty() -> Self {
        Self {
            ingredients: Vec::new(),
            source: ExtractionSource::None,
            warnings: Vec::new(),
        }
    }

    fn legacy(text: &str, warnings: Vec<ResolutionWarning>) -> Self {
        Self {
            ingredients: parse_meal_text(text),
            source: ExtractionSource::Legacy,
            warnings,
        }
    }
}

/// Delay before retry number `attempt` (0-based) of a rate-limited call
///
/// Exponential from `base_retry_delay_ms`, or the server's `Retry-After`
/// when given, plus up to 25% random jitter, capped at `max_retry_delay_ms`.
pub fn calculate_retry_delay(
    attempt: u32,
    retry_after_secs: Option<u64>,
    config: &RecoveryConfig,
) -> Duration {
    let base = match retry_after_secs {
        Some(secs) => secs.saturating_mul(1000),
        None => config
            .base_retry_delay_ms
            .saturating_mul(2u64.saturating_pow(attempt)),
    };
    let base = base.min(config.max_retry_delay_ms);
    let jitter = if base >= 4 {
        rand::thread_rng().gen_range(0..=base / 4)
    } else {
        0
    };
    Duration::from_millis((base + jitter).min(config.max_retry_delay_ms))
}

/// Extraction front-end with legacy fallback
pub struct IngredientExtractor {
    service: Option<Arc<dyn ExtractionService>>,
    enabled: bool,
    recovery: RecoveryConfig,
    circuit_breaker: CircuitBreaker,
}

impl IngredientExtractor {
    /// Create an extractor around an optional service
    pub fn new(service: Option<Arc<dyn ExtractionService>>, config: &ExtractionConfig) -> Self {
        Self {
            service,
            enabled: config.enabled,
            recovery: config.recovery.clone(),
            circuit_breaker: CircuitBreaker::new(config.recovery.clone()),
        }
    }

    /// An extractor that only ever uses the legacy parser
    pub fn legacy_only() -> Self {
        Self::new(None, &ExtractionConfig::default())
    }

    /// Build the configured HTTP service, if an endpoint is set
    pub fn from_config(config: &ExtractionConfig) -> Result<Self, ExtractionError> {
        let timeout = Duration::from_secs(config.recovery.operation_timeout_secs);
        let service: Option<Arc<dyn ExtractionService>> = match &config.endpoint {
            None => None,
            Some(endpoint) => match config.mode {
                ExtractionMode::EdgeFunction => Some(Arc::new(EdgeFunctionExtractionService::new(
                    endpoint.clone(),
                    config.api_key.clone(),
                    timeout,
                )?)),
                ExtractionMode::Chat => Some(Arc::new(ChatExtractionService::new(
                    endpoint,
                    config.api_key.clone(),
                    config.model.clone(),
                    timeout,
                )?)),
            },
        };

        match &service {
            Some(s) if config.enabled => info!("AI extraction enabled via {}", s.service_name()),
            _ => info!("AI extraction disabled, using legacy parser"),
        }
        Ok(Self::new(service, config))
    }

    pub fn circuit_breaker(&self) -> &CircuitBreaker {
        &self.circuit_breaker
    }

    /// Extract ingredients from a meal description
    ///
    /// Never fails: service problems degrade to the legacy parser.
    pub async fn extract(&self, meal_description: &str) -> Extraction {
        let text = meal_description.trim();
        if text.chars().count() < MIN_INPUT_CHARS {
            debug!("Input '{}' too short, skipping extraction", text);
            return Extraction::empty();
        }

        let service = match &self.service {
            Some(service) if self.enabled => service,
            _ => return Extraction::legacy(text, Vec::new()),
        };

        match self.call_with_retry(service.as_ref(), text).await {
            Ok(ingredients) => Extraction {
                ingredients,
                source: ExtractionSource::Ai,
                warnings: Vec::new(),
            },
            Err(ExtractionError::QuotaExhausted(message)) => {
                warn!("Extraction quota exhausted: {}", message);
                Extraction::legacy(
                    text,
                    vec![ResolutionWarning::ExtractionQuotaExhausted { message }],
                )
            }
            Err(ExtractionError::CircuitOpen) => {
                debug!("Circuit breaker open, using legacy parser");
                Extraction::legacy(text, Vec::new())
            }
            Err(e) => {
                warn!(
                    "Extraction via {} failed ({}), using legacy parser",
                    service.service_name(),
                    e
                );
                Extraction::legacy(text, Vec::new())
            }
        }
    }

    async fn call_with_retry(
        &self,
        service: &dyn ExtractionService,
        text: &str,
    ) -> Result<Vec<ParsedIngredient>, ExtractionError> {
        if self.circuit_breaker.is_open() {
            return Err(ExtractionError::CircuitOpen);
        }

        let timeout = Duration::from_secs(self.recovery.operation_timeout_secs);
        let mut attempt = 0;

        loop {
            let outcome = match tokio::time::timeout(timeout, service.extract(text)).await {
                Ok(outcome) => outcome,
                Err(_) => Err(ExtractionError::Timeout(format!(
                    "No answer from {} after {}s",
                    service.service_name(),
                    self.recovery.operation_timeout_secs
                ))),
            };

            match outcome {
                Ok(ingredients) => {
                    self.circuit_breaker.record_success();
                    debug!(
                        "Extraction via {} returned {} ingredients",
                        service.service_name(),
                        ingredients.len()
                    );
                    return Ok(ingredients);
                }
                Err(e) if e.is_retryable() && attempt < self.recovery.max_retries => {
                    let retry_after_secs = match &e {
                        ExtractionError::RateLimited { retry_after_secs } => *retry_after_secs,
                        _ => None,
                    };
                    let delay = calculate_retry_delay(attempt, retry_after_secs, &self.recovery);
                    attempt += 1;
                    warn!(
                        "{}, retry {}/{} in {:?}",
                        e, attempt, self.recovery.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => {
                    if e.counts_as_failure() {
                        self.circuit_breaker.record_failure();
                    }
                    return Err(e);
                }
            }
        }
    }
}
