//! Extraction through an OpenAI-compatible chat completions endpoint.

use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::prompt::{build_system_prompt, build_user_message};
use super::response::parse_foods;
use super::{error_for_status, retry_after, ExtractionService};
use crate::errors::ExtractionError;
use crate::ingredient_model::ParsedIngredient;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Chat-completions client prompting the model for a JSON food list
#[derive(Debug, Clone)]
pub struct ChatExtractionService {
    base_url: String,
    api_key: Option<String>,
    model: String,
    client: reqwest::Client,
}

impl ChatExtractionService {
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        model: String,
        timeout: Duration,
    ) -> Result<Self, ExtractionError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ExtractionError::Network(format!("Cannot build HTTP client: {e}")))?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            model,
            client,
        })
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }

    fn build_request(&self, meal_description: &str) -> ChatRequest {
        ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".to_string(),
                    content: build_system_prompt(),
                },
                ChatMessage {
                    role: "user".to_string(),
                    content: build_user_message(meal_description),
                },
            ],
            temperature: 0.1,
        }
    }
}

#[async_trait]
impl ExtractionService for ChatExtractionService {
    async fn extract(
        &self,
        meal_description: &str,
    ) -> Result<Vec<ParsedIngredient>, ExtractionError> {
        let mut request = self
            .client
            .post(self.completions_url())
            .json(&self.build_request(meal_description));
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

        // An unexpected envelope is a malformed answer, not an outage
        let content = match serde_json::from_str::<ChatResponse>(&body) {
            Ok(chat) => chat
                .choices
                .into_iter()
                .next()
                .map(|choice| choice.message.content)
                .unwrap_or_default(),
            Err(_) => body,
        };

        let foods = parse_foods(&content);
        debug!("Chat model {} extracted {} foods", self.model, foods.len());
        Ok(foods)
    }

    fn service_name(&self) -> &'static str {
        "chat"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> ChatExtractionService {
        ChatExtractionService::new(
            "https://ai.example.test/v1/",
            None,
            "google/gemini-2.5-flash".to_string(),
            Duration::from_secs(5),
        )
        .unwrap()
    }

    #[test]
    fn test_completions_url() {
        assert_eq!(
            service().completions_url(),
            "https://ai.example.test/v1/chat/completions"
        );
    }

    #[test]
    fn test_request_carries_prompt_and_meal() {
        let request = service().build_request("sopa de legumes");
        assert_eq!(request.model, "google/gemini-2.5-flash");
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, "system");
        assert!(request.messages[0].content.contains("porções de referência"));
        assert_eq!(request.messages[1].content, "Refeição: sopa de legumes");
    }

    #[test]
    fn test_response_content_is_parsed() {
        let body = r#"{"choices": [{"message": {"role": "assistant",
            "content": "[{\"name\": \"Cenoura\", \"quantity\": 40, \"unit\": \"g\"}]"}}]}"#;
        let chat: ChatResponse = serde_json::from_str(body).unwrap();
        let foods = parse_foods(&chat.choices[0].message.content);
        assert_eq!(foods[0].name, "Cenoura");
    }
}
