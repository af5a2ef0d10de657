use std::future::Future;

use anyhow::{anyhow, Context};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::error::AppResult;
use crate::prompt::classification_user_prompt;
use crate::rate_limiters::RateLimiters;
use crate::server_config::cfg;
use crate::HttpClient;

/// Seam between the dispatch pipeline and the classification service.
/// The production impl talks to a chat-completions endpoint; tests use an
/// instrumented mock.
pub trait Classifier: Send + Sync {
    fn classify(
        &self,
        system_prompt: &str,
        items: &[serde_json::Value],
    ) -> impl Future<Output = AppResult<Vec<serde_json::Value>>> + Send;
}

#[derive(Clone)]
pub struct ChatClassifier {
    http_client: HttpClient,
    rate_limiters: RateLimiters,
}

impl ChatClassifier {
    pub fn new(http_client: HttpClient, rate_limiters: RateLimiters) -> Self {
        Self {
            http_client,
            rate_limiters,
        }
    }
}

impl Classifier for ChatClassifier {
    async fn classify(
        &self,
        system_prompt: &str,
        items: &[serde_json::Value],
    ) -> AppResult<Vec<serde_json::Value>> {
        self.rate_limiters.acquire_one().await;

        let resp = self
            .http_client
            .post(&cfg.api.endpoint)
            .bearer_auth(&cfg.api.key)
            .json(&json!(
              {
                "model": &cfg.model.id,
                "temperature": cfg.model.temperature,
                "messages": [
                  {
                    "role": "system",
                    "content": system_prompt
                  },
                  {
                    "role": "user",
                    "content": classification_user_prompt(items)
                  }
                ]
              }
            ))
            .send()
            .await?
            .json::<serde_json::Value>()
            .await?;

        let parsed = serde_json::from_value::<ChatApiResponseOrError>(resp.clone())
            .context(format!("Could not parse chat response: {}", resp))?;

        let parsed = match parsed {
            ChatApiResponseOrError::Error(error) => {
                if error.message == "Requests rate limit exceeded" {
                    self.rate_limiters.trigger_backoff();
                }
                return Err(anyhow!("Chat API error: {:?}", error).into());
            }
            ChatApiResponseOrError::Response(parsed) => parsed,
        };

        let choice = parsed.choices.first().context("No choices in response")?;
        let labeled = parse_labeled_items(&choice.message.content)?;

        Ok(labeled)
    }
}

/// The model is instructed to answer with a bare JSON array of objects.
/// Anything else counts as a malformed response.
pub fn parse_labeled_items(content: &str) -> AppResult<Vec<serde_json::Value>> {
    let parsed: Vec<serde_json::Value> =
        serde_json::from_str(content).context("Expected a JSON array in model output")?;

    if !parsed.iter().all(|item| item.is_object()) {
        return Err(anyhow!("Expected a JSON array of objects in model output").into());
    }

    Ok(parsed)
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PromptUsage {
    pub prompt_tokens: i64,
    pub completion_tokens: i64,
    pub total_tokens: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatChoice {
    pub index: i32,
    pub message: ChatMessage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatApiResponse {
    pub choices: Vec<ChatChoice>,
    pub usage: PromptUsage,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ChatApiError {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ChatApiResponseOrError {
    Response(ChatApiResponse),
    Error(ChatApiError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labeled_items() {
        let content = r#"[
            {"query": "flint water crisis", "time": "2025-10-03T09:23:00Z", "category": "Society"},
            {"query": "deep set eyes heritable", "time": "2025-10-02T15:00:00Z", "category": "Health"}
        ]"#;

        let items = parse_labeled_items(content).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[0]["category"], "Society");
    }

    #[test]
    fn test_parse_labeled_items_rejects_non_array() {
        assert!(parse_labeled_items(r#"{"category": "Society"}"#).is_err());
        assert!(parse_labeled_items("Sure! Here is the array: []").is_err());
        assert!(parse_labeled_items(r#"["Society", "Health"]"#).is_err());
    }

    #[test]
    fn test_chat_response_envelope_parses() {
        let raw = serde_json::json!({
            "choices": [
                {"index": 0, "message": {"role": "assistant", "content": "[]"}}
            ],
            "usage": {"prompt_tokens": 10, "completion_tokens": 2, "total_tokens": 12}
        });

        match serde_json::from_value::<ChatApiResponseOrError>(raw).unwrap() {
            ChatApiResponseOrError::Response(resp) => {
                assert_eq!(resp.choices.len(), 1);
                assert_eq!(resp.usage.total_tokens, 12);
            }
            ChatApiResponseOrError::Error(_) => panic!("expected response variant"),
        }
    }

    #[test]
    fn test_chat_error_envelope_parses() {
        let raw = serde_json::json!({"message": "Requests rate limit exceeded"});

        match serde_json::from_value::<ChatApiResponseOrError>(raw).unwrap() {
            ChatApiResponseOrError::Error(err) => {
                assert_eq!(err.message, "Requests rate limit exceeded");
            }
            ChatApiResponseOrError::Response(_) => panic!("expected error variant"),
        }
    }
}
