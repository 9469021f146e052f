use std::{future::Future, time::Duration};

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// Tried in order after any configured models
pub const DEFAULT_MODELS: [&str; 3] = ["gpt-4o-mini", "gpt-3.5-turbo", "gpt-4"];

#[derive(thiserror::Error, Debug)]
pub enum LlmError {
    #[error("all {attempts} models failed, last error: {last_error}")]
    Exhausted { attempts: usize, last_error: String },
    #[error("model reply is not valid JSON: {0}")]
    InvalidJson(String),
    #[error("completion request failed: {0}")]
    Request(String),
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        LlmError::Request(e.to_string())
    }
}

impl From<reqwest_middleware::Error> for LlmError {
    fn from(e: reqwest_middleware::Error) -> Self {
        LlmError::Request(e.to_string())
    }
}

/// Single-prompt text completion
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, prompt: String) -> Result<String, LlmError>;
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: ChatMessage,
}

/// Text of the first choice, trimmed
pub fn parse_completion(body: &str) -> Result<String, LlmError> {
    let response: CompletionResponse = serde_json::from_str(body)
        .map_err(|e| LlmError::Request(format!("unexpected completion body: {}", e)))?;
    response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content.trim().to_string())
        .ok_or_else(|| LlmError::Request("completion has no choices".to_string()))
}

/// Configured models first, then the defaults, without repeats
pub fn model_order(configured: &[String]) -> Vec<String> {
    let mut models: Vec<String> = Vec::new();
    let candidates = configured
        .iter()
        .map(|m| m.trim().to_string())
        .chain(DEFAULT_MODELS.iter().map(|m| m.to_string()));
    for model in candidates {
        if !model.is_empty() && !models.contains(&model) {
            models.push(model);
        }
    }
    models
}

/// Run `attempt` per model until one succeeds
pub async fn first_success<F, Fut>(models: &[String], mut attempt: F) -> Result<String, LlmError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<String, LlmError>>,
{
    let mut last_error = String::from("no models configured");
    for model in models {
        match attempt(model.clone()).await {
            Ok(reply) => return Ok(reply),
            Err(e) => {
                warn!("model {} failed: {}", model, e);
                last_error = e.to_string();
            }
        }
    }
    Err(LlmError::Exhausted {
        attempts: models.len(),
        last_error,
    })
}

/// OpenAI-compatible `/chat/completions` client
pub struct OpenAiClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
    models: Vec<String>,
}

impl OpenAiClient {
    pub fn new(
        api_key: String,
        base_url: &str,
        models: &[String],
        request_timeout: Duration,
    ) -> Result<Self, LlmError> {
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(3);
        let client = ClientBuilder::new(Client::builder().timeout(request_timeout).build()?)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            models: model_order(models),
        })
    }

    pub fn models(&self) -> &[String] {
        &self.models
    }

    async fn complete_with(&self, model: &str, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/chat/completions", self.base_url);
        let body = CompletionRequest {
            model,
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
        };
        debug!("requesting completion from {} with {}", url, model);

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(LlmError::Request(format!(
                "{} returned {}: {}",
                model, status, text
            )));
        }
        parse_completion(&text)
    }
}

#[async_trait]
impl ChatCompletion for OpenAiClient {
    async fn complete(&self, prompt: String) -> Result<String, LlmError> {
        let prompt = prompt.as_str();
        first_success(&self.models, |model| async move {
            self.complete_with(&model, prompt).await
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn configured_models_go_first_without_repeats() {
        let order = model_order(&["gpt-4".to_string(), " o3-mini ".to_string()]);
        assert_eq!(order, vec!["gpt-4", "o3-mini", "gpt-4o-mini", "gpt-3.5-turbo"]);
        assert_eq!(model_order(&[]), DEFAULT_MODELS.to_vec());
    }

    #[test]
    fn completion_text_is_trimmed() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"  clear skies \n"}}]}"#;
        assert_eq!(parse_completion(body).unwrap(), "clear skies");
    }

    #[test]
    fn empty_choices_is_an_error() {
        assert!(matches!(
            parse_completion(r#"{"choices":[]}"#),
            Err(LlmError::Request(_))
        ));
        assert!(parse_completion("<html>").is_err());
    }

    #[tokio::test]
    async fn falls_back_to_the_next_model() {
        let models = model_order(&[]);
        let mut tried = Vec::new();
        let reply = first_success(&models, |model| {
            tried.push(model.clone());
            async move {
                if model == "gpt-3.5-turbo" {
                    Ok(format!("from {}", model))
                } else {
                    Err(LlmError::Request("model_not_found".into()))
                }
            }
        })
        .await
        .unwrap();
        assert_eq!(reply, "from gpt-3.5-turbo");
        assert_eq!(tried, vec!["gpt-4o-mini", "gpt-3.5-turbo"]);
    }

    #[tokio::test]
    async fn exhaustion_reports_attempts() {
        let models = model_order(&[]);
        let err = first_success(&models, |model| async move {
            Err(LlmError::Request(format!("{} unavailable", model)))
        })
        .await
        .unwrap_err();
        match err {
            LlmError::Exhausted {
                attempts,
                last_error,
            } => {
                assert_eq!(attempts, 3);
                assert!(last_error.contains("gpt-4 unavailable"));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
