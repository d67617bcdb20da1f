use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::llm::plan::{AttemptPlan, Outcome};
use crate::llm::provider::ReviewProvider;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";

pub const GEMINI_MODELS: &[&str] = &["gemini-1.5-flash", "gemini-1.5-flash-8b"];

pub struct GeminiProvider {
    client: Client,
    keys: Vec<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: GeminiContent,
}

impl GeminiProvider {
    pub fn new(keys: Vec<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, keys }
    }

    async fn attempt_once(&self, key: &str, model: &str, prompt: &str) -> Result<String> {
        let url = format!("{}/{}:generateContent?key={}", GEMINI_API_BASE, model, key);
        let body = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                temperature: 0.9,
                max_output_tokens: 1024,
            },
        };

        let response = self.client.post(&url).json(&body).send().await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(Error::RateLimited("Gemini".to_string()));
        }
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(Error::ProviderApi(format!(
                "Gemini API error ({}): {}",
                status, text
            )));
        }

        let result: GeminiResponse = response.json().await?;
        let text = result
            .candidates
            .into_iter()
            .next()
            .map(|c| {
                c.content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(Error::ProviderApi("Empty response from Gemini".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl ReviewProvider for GeminiProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if !self.is_available() {
            return Err(Error::ProviderUnavailable("Gemini".to_string()));
        }

        let mut plan = AttemptPlan::new(&self.keys, GEMINI_MODELS);
        let mut last_error = None;
        while let Some(attempt) = plan.current() {
            let (key, model) = (attempt.key.clone(), attempt.model.clone());
            match self.attempt_once(&key, &model, prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::debug!("Gemini attempt failed ({}): {}", model, e);
                    let outcome = match &e {
                        Error::RateLimited(_) => Outcome::RateLimited,
                        _ => Outcome::Failed,
                    };
                    last_error = Some(e);
                    plan.advance(outcome);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| Error::ProviderApi("No Gemini attempts were possible".to_string())))
    }

    fn name(&self) -> &str {
        "gemini"
    }

    fn is_available(&self) -> bool {
        !self.keys.is_empty()
    }
}
