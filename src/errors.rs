//! # Error Types Module
//!
//! Error types for the external services the engine depends on and for the
//! request coordinator. None of these abort a resolution: extraction errors
//! trigger the legacy parser, table errors produce a degraded result, and
//! supersession is reported only to the superseded caller.

/// Failures of the natural-language extraction service
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionError {
    /// HTTP 429; retryable after a backoff
    RateLimited { retry_after_secs: Option<u64> },
    /// HTTP 402; credits exhausted, not retryable
    QuotaExhausted(String),
    /// HTTP 401/403
    Unauthorized(String),
    /// Connection, DNS or body read failures
    Network(String),
    /// The call exceeded the configured timeout
    Timeout(String),
    /// Any other non-success response
    Api { status: u16, message: String },
    /// Circuit breaker is open, the service was not called
    CircuitOpen,
}

impl ExtractionError {
    /// Whether the call may succeed if repeated after a delay
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractionError::RateLimited { .. })
    }

    /// Whether this failure should count against the circuit breaker
    pub fn counts_as_failure(&self) -> bool {
        !matches!(
            self,
            ExtractionError::RateLimited { .. }
                | ExtractionError::QuotaExhausted(_)
                | ExtractionError::CircuitOpen
        )
    }
}

impl std::fmt::Display for ExtractionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExtractionError::RateLimited {
                retry_after_secs: Some(secs),
            } => write!(f, "Rate limited: retry after {secs}s"),
            ExtractionError::RateLimited {
                retry_after_secs: None,
            } => write!(f, "Rate limited"),
            ExtractionError::QuotaExhausted(msg) => write!(f, "Quota exhausted: {msg}"),
            ExtractionError::Unauthorized(msg) => write!(f, "Unauthorized: {msg}"),
            ExtractionError::Network(msg) => write!(f, "Network error: {msg}"),
            ExtractionError::Timeout(msg) => write!(f, "Timeout error: {msg}"),
            ExtractionError::Api { status, message } => write!(f, "API error {status}: {message}"),
            ExtractionError::CircuitOpen => write!(f, "Circuit breaker open"),
        }
    }
}

impl std::error::Error for ExtractionError {}

impl From<reqwest::Error> for ExtractionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ExtractionError::Timeout(err.to_string())
        } else {
            ExtractionError::Network(err.to_string())
        }
    }
}

/// Failures of the composition lookup service or table source
#[derive(Debug, Clone, PartialEq)]
pub enum TableError {
    /// The source could not be reached or read
    Unavailable(String),
    /// The source answered with something that is not a record list
    Malformed(String),
    /// The fetch exceeded the configured timeout
    Timeout(String),
}

impl std::fmt::Display for TableError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TableError::Unavailable(msg) => write!(f, "Composition table unavailable: {msg}"),
            TableError::Malformed(msg) => write!(f, "Malformed composition data: {msg}"),
            TableError::Timeout(msg) => write!(f, "Composition table timeout: {msg}"),
        }
    }
}

impl std::error::Error for TableError {}

impl From<reqwest::Error> for TableError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            TableError::Timeout(err.to_string())
        } else if err.is_decode() {
            TableError::Malformed(err.to_string())
        } else {
            TableError::Unavailable(err.to_string())
        }
    }
}

/// Outcome of a resolution that produced no result for its caller
#[derive(Debug, Clone, PartialEq)]
pub enum ResolveError {
    /// A newer `resolve` call on the same resolver replaced this one
    Superseded,
}

impl std::fmt::Display for ResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResolveError::Superseded => write!(f, "Superseded by a newer request"),
        }
    }
}

impl std::error::Error for ResolveError {}
