use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("provider {0} has no credentials configured")]
    ProviderUnavailable(String),

    #[error("rate limited by {0}")]
    RateLimited(String),

    #[error("provider API error: {0}")]
    ProviderApi(String),

    #[error("provider call timed out after {0}s")]
    Timeout(u64),

    #[error("failed to parse model output: {0}")]
    ParseError(String),

    #[error("all providers exhausted for platform {0}")]
    AllProvidersExhausted(String),

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("profile is deactivated: {0}")]
    ProfileInactive(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    // Unavailable providers are skipped silently rather than reported.
    pub fn is_silent_skip(&self) -> bool {
        matches!(self, Error::ProviderUnavailable(_))
    }

    // Failures that move the orchestrator on to the next provider instead
    // of surfacing to the caller.
    pub fn is_provider_failure(&self) -> bool {
        matches!(
            self,
            Error::ProviderUnavailable(_)
                | Error::RateLimited(_)
                | Error::ProviderApi(_)
                | Error::Timeout(_)
                | Error::ParseError(_)
                | Error::Network(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_failures_are_recoverable() {
        assert!(Error::RateLimited("groq".into()).is_provider_failure());
        assert!(Error::Timeout(12).is_provider_failure());
        assert!(Error::ParseError("bad output".into()).is_provider_failure());
        assert!(!Error::ProfileNotFound("acme".into()).is_provider_failure());
        assert!(!Error::AllProvidersExhausted("Google".into()).is_provider_failure());
    }

    #[test]
    fn only_missing_credentials_skip_silently() {
        assert!(Error::ProviderUnavailable("gemini".into()).is_silent_skip());
        assert!(!Error::RateLimited("gemini".into()).is_silent_skip());
    }
}
