use std::env;
use std::time::Duration;

use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct Config {
    pub groq_api_keys: Vec<String>,
    pub gemini_api_keys: Vec<String>,
    pub openrouter_api_keys: Vec<String>,
    pub single_timeout: Duration,
    pub batch_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Missing keys mean "provider unavailable", which is a routable
        // state rather than a startup failure.
        let groq_api_keys = parse_key_list(env::var("GROQ_API_KEY").ok());
        let gemini_api_keys = parse_key_list(env::var("GEMINI_API_KEY").ok());
        let openrouter_api_keys = parse_key_list(env::var("OPENROUTER_API_KEY").ok());

        let single_timeout =
            parse_timeout(env::var("GENERATION_TIMEOUT_SECS").ok(), "GENERATION_TIMEOUT_SECS", 12)?;
        let batch_timeout =
            parse_timeout(env::var("BATCH_TIMEOUT_SECS").ok(), "BATCH_TIMEOUT_SECS", 30)?;

        Ok(Self {
            groq_api_keys,
            gemini_api_keys,
            openrouter_api_keys,
            single_timeout,
            batch_timeout,
        })
    }

    pub fn has_any_provider(&self) -> bool {
        !self.groq_api_keys.is_empty()
            || !self.gemini_api_keys.is_empty()
            || !self.openrouter_api_keys.is_empty()
    }
}

fn parse_timeout(raw: Option<String>, var: &str, default_secs: u64) -> Result<Duration> {
    match raw {
        Some(v) => v
            .trim()
            .parse()
            .map(Duration::from_secs)
            .map_err(|_| Error::Config(format!("{} must be a whole number of seconds", var))),
        None => Ok(Duration::from_secs(default_secs)),
    }
}

// Credentials arrive as a comma-separated list so load can be spread
// across several keys per provider.
pub fn parse_key_list(raw: Option<String>) -> Vec<String> {
    raw.map(|v| {
        v.split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
