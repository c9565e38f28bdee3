//! Extraction through a hosted edge function.
//!
//! Request: `POST {"mealDescription": "..."}`.
//! Response: `{"foods": [...]}` on success, `{"error": "..."}` otherwise.

use async_trait::async_trait;
use log::debug;
use serde::Serialize;
use std::time::Duration;

use super::response::{error_message, parse_foods};
use super::{error_for_status, retry_after, ExtractionService};
use crate::errors::ExtractionError;
use crate::ingredient_model::ParsedIngredient;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct EdgeRequest<'a> {
    meal_description: &'a str,
}

/// Client of the `{ mealDescription } -> { foods }` extraction endpoint
#[derive(Debug, Clone)]
pub struct EdgeFunctionExtractionService {
    endpoint: String,
    api_key: Option<String>,
    client: reqwest::Client,
}

impl EdgeFunctionExtractionService {
    pub fn new(
        endpoint: String,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Network(format!("Cannot build HTTP client: {e}")))?;
        Ok(Self {
            endpoint,
            api_key,
            client,
        })
    }
}

#[async_trait]
impl ExtractionService for EdgeFunctionExtractionService {
    async fn extract(
        &self,
        meal_description: &str,
    ) -> Result<Vec<ParsedIngredient>, ExtractionError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&EdgeRequest { meal_description });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status().as_u16();
        let retry_after_secs = retry_after(response.headers());
        let body = response.text().await?;

        if !(200..300).contains(&status) {
            return Err(error_for_status(status, retry_after_secs, &body));
        }
        if let Some(message) = error_message(&body) {
            return Err(ExtractionError::Api { status, message });
        }

        let foods = parse_foods(&body);
        debug!("Edge function extracted {} foods", foods.len());
        Ok(foods)
    }

    fn service_name(&self) -> &'static str {
        "edge_function"
    }
}
