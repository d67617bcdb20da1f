use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::llm::plan::{AttemptPlan, Outcome};
use crate::llm::provider::ReviewProvider;

const OPENROUTER_API_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

pub const OPENROUTER_MODELS: &[&str] = &[
    "meta-llama/llama-3.1-8b-instruct:free",
    "google/gemma-2-9b-it:free",
    "mistralai/mistral-7b-instruct:free",
];

pub struct OpenRouterProvider {
    client: Client,
    keys: Vec<String>,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: String,
}

impl OpenRouterProvider {
    pub fn new(keys: Vec<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, keys }
    }

    async fn attempt_once(&self, key: &str, model: &str, prompt: &str) -> Result<String> {
        let body = ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.9,
            max_tokens: 1024,
        };

        let response = self
            .client
            .post(OPENROUTER_API_URL)
            .bearer_auth(key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(Error::RateLimited("OpenRouter".to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::ProviderApi(format!(
                "OpenRouter API error ({}): {}",
                status, text
            )));
        }

        let result: ChatResponse = response.json().await?;
        let text = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(Error::ProviderApi(
                "Empty response from OpenRouter".to_string(),
            ));
        }
        Ok(text)
    }
}

#[async_trait]
impl ReviewProvider for OpenRouterProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if !self.is_available() {
            return Err(Error::ProviderUnavailable("OpenRouter".to_string()));
        }

        let mut plan = AttemptPlan::new(&self.keys, OPENROUTER_MODELS);
        let mut last_error = None;
        while let Some(attempt) = plan.current() {
            let (key, model) = (attempt.key.clone(), attempt.model.clone());
            match self.attempt_once(&key, &model, prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::debug!("OpenRouter attempt failed ({}): {}", model, e);
                    let outcome = match &e {
                        Error::RateLimited(_) => Outcome::RateLimited,
                        _ => Outcome::Failed,
                    };
                    last_error = Some(e);
                    plan.advance(outcome);
                }
            }
        }
        Err(last_error.unwrap_or_else(|| {
            Error::ProviderApi("No OpenRouter attempts were possible".to_string())
        }))
    }

    fn name(&self) -> &str {
        "openrouter"
    }

    fn is_available(&self) -> bool {
        !self.keys.is_empty()
    }

    // Free-tier models are unreliable with the combined multi-platform JSON
    // prompt; they only serve the single-platform path.
    fn supports_batch(&self) -> bool {
        false
    }
}
