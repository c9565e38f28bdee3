//! # Engine Configuration Module
//!
//! This module defines configuration structures for the resolution engine,
//! including recovery settings for the extraction service, matcher limits,
//! and the endpoints of the two external services.

use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use std::str::FromStr;

// Constants for engine configuration
pub const DEFAULT_MAX_RESULTS: usize = 15;
pub const MIN_QUERY_CHARS: usize = 2;
pub const MIN_INPUT_CHARS: usize = 3;
pub const DEFAULT_TABLE_TTL_SECS: u64 = 60 * 60; // 1 hour
pub const DEFAULT_STALE_RETRY_SECS: u64 = 30;
pub const DEFAULT_CHAT_MODEL: &str = "google/gemini-2.5-flash";

/// Recovery configuration for extraction service error handling
#[derive(Debug, Clone)]
pub struct RecoveryConfig {
    /// Maximum number of retries after a rate-limit response
    pub max_retries: u32,
    /// Base delay between retries in milliseconds
    pub base_retry_delay_ms: u64,
    /// Maximum delay between retries in milliseconds
    pub max_retry_delay_ms: u64,
    /// Timeout for a single extraction call in seconds
    pub operation_timeout_secs: u64,
    /// Circuit breaker failure threshold
    pub circuit_breaker_threshold: u32,
    /// Circuit breaker reset timeout in seconds
    pub circuit_breaker_reset_secs: u64,
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: 2,
            base_retry_delay_ms: 1000,  // 1 second
            max_retry_delay_ms: 8000,   // 8 seconds
            operation_timeout_secs: 30, // 30 seconds
            circuit_breaker_threshold: 5,
            circuit_breaker_reset_secs: 60, // 1 minute
        }
    }
}

/// Fuzzy matcher limits
#[derive(Debug, Clone)]
pub struct MatcherConfig {
    /// Number of ranked records returned by a search
    pub max_results: usize,
    /// Queries shorter than this (after normalization) are not scored
    pub min_query_chars: usize,
    /// Minimum score for the best record to be used for auto-resolution
    pub min_accept_score: u32,
}

impl Default for MatcherConfig {
    fn default() -> Self {
        Self {
            max_results: DEFAULT_MAX_RESULTS,
            min_query_chars: MIN_QUERY_CHARS,
            min_accept_score: 1,
        }
    }
}

/// Wire protocol spoken by the extraction endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// `{ mealDescription }` -> `{ foods }` envelope
    EdgeFunction,
    /// OpenAI-compatible chat completions
    Chat,
}

impl FromStr for ExtractionMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "edge" | "edge_function" | "function" => Ok(ExtractionMode::EdgeFunction),
            "chat" | "openai" => Ok(ExtractionMode::Chat),
            other => Err(anyhow::anyhow!("Unknown extraction mode: {other}")),
        }
    }
}

/// Extraction service settings
#[derive(Debug, Clone)]
pub struct ExtractionConfig {
    /// Whether the AI extraction step is used at all
    pub enabled: bool,
    /// Endpoint URL; `None` means legacy parsing only
    pub endpoint: Option<String>,
    /// Bearer token sent with each request
    pub api_key: Option<String>,
    pub mode: ExtractionMode,
    /// Model name for chat mode
    pub model: String,
    pub recovery: RecoveryConfig,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            endpoint: None,
            api_key: None,
            mode: ExtractionMode::EdgeFunction,
            model: DEFAULT_CHAT_MODEL.to_string(),
            recovery: RecoveryConfig::default(),
        }
    }
}

/// Composition table settings
#[derive(Debug, Clone)]
pub struct CompositionConfig {
    /// Lookup service URL; takes precedence over `file`
    pub endpoint: Option<String>,
    /// Local JSON table; used when no endpoint is set
    pub file: Option<PathBuf>,
    /// How long a fetched table stays fresh
    pub ttl_secs: u64,
    /// Timeout for a table fetch in seconds
    pub fetch_timeout_secs: u64,
    /// After a failed refresh, how long the stale table is served before
    /// the source is tried again
    pub stale_retry_secs: u64,
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            file: None,
            ttl_secs: DEFAULT_TABLE_TTL_SECS,
            fetch_timeout_secs: 15,
            stale_retry_secs: DEFAULT_STALE_RETRY_SECS,
        }
    }
}

/// Top-level configuration of a resolver
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub extraction: ExtractionConfig,
    pub composition: CompositionConfig,
    pub matcher: MatcherConfig,
}

fn env_opt(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_parse<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env_opt(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{e}"))
            .with_context(|| format!("Invalid value for {name}: {raw}")),
        None => Ok(default),
    }
}

impl EngineConfig {
    /// Build the configuration from `NUTRITION_*` environment variables
    ///
    /// Unset variables keep their defaults; malformed values are an error.
    pub fn from_env() -> Result<Self> {
        let defaults = EngineConfig::default();

        let recovery = RecoveryConfig {
            operation_timeout_secs: env_parse(
                "NUTRITION_EXTRACTION_TIMEOUT_SECS",
                defaults.extraction.recovery.operation_timeout_secs,
            )?,
            ..defaults.extraction.recovery
        };

        let extraction = ExtractionConfig {
            enabled: env_parse("NUTRITION_USE_AI", defaults.extraction.enabled)?,
            endpoint: env_opt("NUTRITION_EXTRACTION_URL"),
            api_key: env_opt("NUTRITION_EXTRACTION_API_KEY"),
            mode: env_parse("NUTRITION_EXTRACTION_MODE", defaults.extraction.mode)?,
            model: env_opt("NUTRITION_CHAT_MODEL").unwrap_or(defaults.extraction.model),
            recovery,
        };

        let composition = CompositionConfig {
            endpoint: env_opt("NUTRITION_COMPOSITION_URL"),
            file: env_opt("NUTRITION_COMPOSITION_FILE").map(PathBuf::from),
            ttl_secs: env_parse("NUTRITION_TABLE_TTL_SECS", defaults.composition.ttl_secs)?,
            ..defaults.composition
        };

        let matcher = MatcherConfig {
            max_results: env_parse("NUTRITION_MAX_RESULTS", defaults.matcher.max_results)?,
            ..defaults.matcher
        };

        Ok(Self {
            extraction,
            composition,
            matcher,
        })
    }
}
