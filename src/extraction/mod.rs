//! Natural-language extraction service clients.
//!
//! The extraction service turns a meal description into a JSON list of
//! `{name, quantity, unit}` items. Its output is treated as untrusted text:
//! see [`response`] for the fail-closed parsing.

use async_trait::async_trait;

use crate::errors::ExtractionError;
use crate::ingredient_model::ParsedIngredient;

pub mod chat;
pub mod edge;
pub mod prompt;
pub mod response;

pub use chat::ChatExtractionService;
pub use edge::EdgeFunctionExtractionService;

/// A service that extracts ingredients from free text
#[async_trait]
pub trait ExtractionService: Send + Sync {
    /// Extract ingredients from a meal description
    ///
    /// A response that cannot be parsed is not an error: it yields an empty
    /// list. Errors are reserved for the service being unavailable.
    async fn extract(&self, meal_description: &str)
        -> Result<Vec<ParsedIngredient>, ExtractionError>;

    /// Short name used in logs
    fn service_name(&self) -> &'static str;
}

/// Map a non-success HTTP status to an extraction error
///
/// `body` is the raw response body; an `{"error": "..."}` envelope is
/// unwrapped into the message.
pub(crate) fn error_for_status(
    status: u16,
    retry_after_secs: Option<u64>,
    body: &str,
) -> ExtractionError {
    let message = response::error_message(body).unwrap_or_else(|| body.trim().to_string());
    match status {
        429 => ExtractionError::RateLimited { retry_after_secs },
        402 => ExtractionError::QuotaExhausted(message),
        401 | 403 => ExtractionError::Unauthorized(message),
        _ => ExtractionError::Api { status, message },
    }
}

/// Read a `Retry-After` header given in seconds
pub(crate) fn retry_after(headers: &reqwest::header::HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::{HeaderMap, HeaderValue, RETRY_AFTER};

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            error_for_status(429, Some(3), ""),
            ExtractionError::RateLimited {
                retry_after_secs: Some(3)
            }
        );
        assert_eq!(
            error_for_status(402, None, r#"{"error": "Créditos insuficientes"}"#),
            ExtractionError::QuotaExhausted("Créditos insuficientes".to_string())
        );
        assert!(matches!(
            error_for_status(403, None, "forbidden"),
            ExtractionError::Unauthorized(_)
        ));
        assert_eq!(
            error_for_status(500, None, " boom "),
            ExtractionError::Api {
                status: 500,
                message: "boom".to_string()
            }
        );
    }

    #[test]
    fn test_retry_after_header() {
        let mut headers = HeaderMap::new();
        assert_eq!(retry_after(&headers), None);
        headers.insert(RETRY_AFTER, HeaderValue::from_static("7"));
        assert_eq!(retry_after(&headers), Some(7));
        headers.insert(RETRY_AFTER, HeaderValue::from_static("Wed, 21 Oct 2015 07:28:00 GMT"));
        assert_eq!(retry_after(&headers), None);
    }
}
