use std::collections::VecDeque;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::llm::plan::{AttemptPlan, Outcome};
use crate::llm::provider::{ReviewProvider, TextStream};
use crate::llm::sse::{delta_content, SseDecoder};

const GROQ_API_URL: &str = "https://api.groq.com/openai/v1/chat/completions";

pub const GROQ_MODELS: &[&str] = &[
    "llama-3.1-8b-instant",
    "llama-3.3-70b-versatile",
    "mixtral-8x7b-32768",
];

pub struct GroqProvider {
    client: Client,
    keys: Vec<String>,
}

#[derive(Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
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

impl GroqProvider {
    pub fn new(keys: Vec<String>) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");
        Self { client, keys }
    }

    fn request_body(model: &str, prompt: &str, stream: bool) -> ChatRequest {
        ChatRequest {
            model: model.to_string(),
            messages: vec![ChatMessage {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: 0.9,
            max_tokens: 1024,
            stream,
        }
    }

    async fn attempt_once(&self, key: &str, model: &str, prompt: &str) -> Result<String> {
        let response = self
            .client
            .post(GROQ_API_URL)
            .bearer_auth(key)
            .json(&Self::request_body(model, prompt, false))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            return Err(Error::RateLimited("Groq".to_string()));
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ProviderApi(format!(
                "Groq API error ({}): {}",
                status, body
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
            return Err(Error::ProviderApi("Empty response from Groq".to_string()));
        }
        Ok(text)
    }
}

#[async_trait]
impl ReviewProvider for GroqProvider {
    async fn generate(&self, prompt: &str) -> Result<String> {
        if !self.is_available() {
            return Err(Error::ProviderUnavailable("Groq".to_string()));
        }

        let mut plan = AttemptPlan::new(&self.keys, GROQ_MODELS);
        let mut last_error = None;
        while let Some(attempt) = plan.current() {
            let (key, model) = (attempt.key.clone(), attempt.model.clone());
            match self.attempt_once(&key, &model, prompt).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    tracing::debug!("Groq attempt failed ({}): {}", model, e);
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
            .unwrap_or_else(|| Error::ProviderApi("No Groq attempts were possible".to_string())))
    }

    async fn generate_stream(&self, prompt: &str) -> Result<TextStream> {
        if !self.is_available() {
            return Err(Error::ProviderUnavailable("Groq".to_string()));
        }

        let mut plan = AttemptPlan::new(&self.keys, GROQ_MODELS);
        let mut last_error = None;
        while let Some(attempt) = plan.current() {
            let (key, model) = (attempt.key.clone(), attempt.model.clone());
            let sent = self
                .client
                .post(GROQ_API_URL)
                .bearer_auth(&key)
                .json(&Self::request_body(&model, prompt, true))
                .send()
                .await;

            match sent {
                Ok(response) if response.status().as_u16() == 429 => {
                    last_error = Some(Error::RateLimited("Groq".to_string()));
                    plan.advance(Outcome::RateLimited);
                }
                Ok(response) if !response.status().is_success() => {
                    let status = response.status();
                    let body = response.text().await.unwrap_or_default();
                    last_error = Some(Error::ProviderApi(format!(
                        "Groq API error ({}): {}",
                        status, body
                    )));
                    plan.advance(Outcome::Failed);
                }
                Ok(response) => {
                    let bytes = Box::pin(response.bytes_stream());
                    let state = (bytes, SseDecoder::new(), VecDeque::<String>::new());
                    let stream =
                        futures::stream::unfold(state, |(mut bytes, mut decoder, mut pending)| async move {
                            loop {
                                if let Some(text) = pending.pop_front() {
                                    return Some((Ok(text), (bytes, decoder, pending)));
                                }
                                if decoder.is_done() {
                                    return None;
                                }
                                match bytes.next().await {
                                    Some(Ok(chunk)) => {
                                        for payload in decoder.push(&chunk) {
                                            if let Some(text) = delta_content(&payload) {
                                                pending.push_back(text);
                                            }
                                        }
                                    }
                                    Some(Err(e)) => {
                                        return Some((
                                            Err(Error::Network(e)),
                                            (bytes, decoder, pending),
                                        ));
                                    }
                                    None => return None,
                                }
                            }
                        });
                    return Ok(Box::pin(stream));
                }
                Err(e) => {
                    last_error = Some(Error::Network(e));
                    plan.advance(Outcome::Failed);
                }
            }
        }
        Err(last_error
            .unwrap_or_else(|| Error::ProviderApi("No Groq attempts were possible".to_string())))
    }

    fn name(&self) -> &str {
        "groq"
    }

    fn is_available(&self) -> bool {
        !self.keys.is_empty()
    }
}
