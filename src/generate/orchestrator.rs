use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::time::timeout;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::generate::stream::StreamEvent;
use crate::llm::parser::{parse_batch, parse_reviews, ReviewScanner};
use crate::llm::prompts::{build_batch_prompt, build_prompt};
use crate::llm::{GeminiProvider, GroqProvider, OpenRouterProvider, ReviewProvider};
use crate::models::{format_reviews, GenerationConfig, PlatformStyle, Review};

#[derive(Debug, Clone, Copy)]
pub struct TimeoutPolicy {
    pub single: Duration,
    pub batch: Duration,
}

// Fixed provider priority: fast first, quality second, free tier last.
// First provider whose output parses wins; the rest are never called.
pub struct Orchestrator {
    providers: Vec<Arc<dyn ReviewProvider>>,
    timeouts: TimeoutPolicy,
}

impl Orchestrator {
    pub fn new(config: &Config) -> Self {
        let providers: Vec<Arc<dyn ReviewProvider>> = vec![
            Arc::new(GroqProvider::new(config.groq_api_keys.clone())),
            Arc::new(GeminiProvider::new(config.gemini_api_keys.clone())),
            Arc::new(OpenRouterProvider::new(config.openrouter_api_keys.clone())),
        ];
        Self {
            providers,
            timeouts: TimeoutPolicy {
                single: config.single_timeout,
                batch: config.batch_timeout,
            },
        }
    }

    pub fn with_providers(
        providers: Vec<Arc<dyn ReviewProvider>>,
        timeouts: TimeoutPolicy,
    ) -> Self {
        Self {
            providers,
            timeouts,
        }
    }

    pub async fn generate_platform(
        &self,
        config: &GenerationConfig,
        platform_name: &str,
    ) -> Result<(String, Vec<Review>)> {
        let style = PlatformStyle::from_name(platform_name);
        tracing::debug!("Generating for {} in {} style", platform_name, style);

        // One prompt per platform; every fallback provider sees the same
        // topics and seed.
        let prompt = build_prompt(config, style);

        for provider in &self.providers {
            if !provider.is_available() {
                tracing::debug!("Skipping {} (no credentials)", provider.name());
                continue;
            }

            let raw = match timeout(self.timeouts.single, provider.generate(&prompt)).await {
                Ok(Ok(raw)) => raw,
                Ok(Err(e)) if e.is_silent_skip() => {
                    tracing::debug!("Skipping {}: {}", provider.name(), e);
                    continue;
                }
                Ok(Err(e)) if e.is_provider_failure() => {
                    tracing::warn!("{} failed for {}: {}", provider.name(), platform_name, e);
                    continue;
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    let e = Error::Timeout(self.timeouts.single.as_secs());
                    tracing::warn!("{} for {}: {}", provider.name(), platform_name, e);
                    continue;
                }
            };

            match parse_reviews(&raw) {
                Some(texts) => {
                    let reviews = format_reviews(&texts, provider.name(), &config.language);
                    if reviews.is_empty() {
                        continue;
                    }
                    tracing::info!(
                        "{} produced {} reviews for {}",
                        provider.name(),
                        reviews.len(),
                        platform_name
                    );
                    return Ok((provider.name().to_string(), reviews));
                }
                None => {
                    let e = Error::ParseError(format!("unusable output from {}", provider.name()));
                    tracing::warn!("{} for {}: {}", provider.name(), platform_name, e);
                }
            }
        }

        Err(Error::AllProvidersExhausted(platform_name.to_string()))
    }

    pub async fn generate_batch(
        &self,
        config: &GenerationConfig,
        platforms: &[String],
    ) -> Result<(String, HashMap<String, Vec<Review>>)> {
        let prompt = build_batch_prompt(config, platforms);

        for provider in &self.providers {
            if !provider.is_available() || !provider.supports_batch() {
                continue;
            }

            let raw = match timeout(self.timeouts.batch, provider.generate(&prompt)).await {
                Ok(Ok(raw)) => raw,
                Ok(Err(e)) if e.is_provider_failure() => {
                    tracing::warn!("{} batch failed: {}", provider.name(), e);
                    continue;
                }
                Ok(Err(e)) => return Err(e),
                Err(_) => {
                    let e = Error::Timeout(self.timeouts.batch.as_secs());
                    tracing::warn!("{} batch: {}", provider.name(), e);
                    continue;
                }
            };

            if let Some(by_platform) = parse_batch(&raw, platforms) {
                let formatted = by_platform
                    .into_iter()
                    .map(|(platform, texts)| {
                        let reviews = format_reviews(&texts, provider.name(), &config.language);
                        (platform, reviews)
                    })
                    .filter(|(_, reviews)| !reviews.is_empty())
                    .collect::<HashMap<_, _>>();
                if !formatted.is_empty() {
                    return Ok((provider.name().to_string(), formatted));
                }
            }
        }

        Err(Error::AllProvidersExhausted(platforms.join(",")))
    }

    // Streams one platform through the fallback chain. A provider counts as
    // settled once it emitted at least one review, even if its stream then
    // dies or times out; fallback happens only when nothing came through.
    pub async fn stream_platform(
        &self,
        config: &GenerationConfig,
        platform_name: &str,
        tx: &mpsc::Sender<StreamEvent>,
    ) -> Result<usize> {
        let style = PlatformStyle::from_name(platform_name);
        let prompt = build_prompt(config, style);

        for provider in &self.providers {
            if !provider.is_available() {
                tracing::debug!("Skipping {} (no credentials)", provider.name());
                continue;
            }
            let emitted = Arc::new(AtomicUsize::new(0));

            let consume = {
                let prompt = prompt.clone();
                let emitted = emitted.clone();
                let source = provider.name().to_string();
                let language = config.language.clone();
                async move {
                    let mut stream = provider.generate_stream(&prompt).await?;
                    let mut scanner = ReviewScanner::new();
                    while let Some(item) = stream.next().await {
                        let fragment = item?;
                        for text in scanner.push(&fragment) {
                            let reviews = format_reviews(&[text], &source, &language);
                            if reviews.is_empty() {
                                continue;
                            }
                            emitted.fetch_add(1, Ordering::SeqCst);
                            if tx
                                .send(StreamEvent::reviews(platform_name, reviews))
                                .await
                                .is_err()
                            {
                                return Ok(());
                            }
                        }
                    }
                    if let Some(tail) = scanner.finish() {
                        let reviews = format_reviews(&[tail], &source, &language);
                        if !reviews.is_empty() {
                            emitted.fetch_add(1, Ordering::SeqCst);
                            let _ = tx.send(StreamEvent::reviews(platform_name, reviews)).await;
                        }
                    }
                    Ok::<(), Error>(())
                }
            };

            match timeout(self.timeouts.single, consume).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) if e.is_provider_failure() => {
                    tracing::warn!(
                        "{} stream for {} failed: {}",
                        provider.name(),
                        platform_name,
                        e
                    );
                }
                Ok(Err(e)) => {
                    // Partial output still counts; otherwise the failure is
                    // not a provider problem and fallback will not help.
                    if emitted.load(Ordering::SeqCst) == 0 {
                        return Err(e);
                    }
                    tracing::warn!(
                        "{} stream for {} died after partial output: {}",
                        provider.name(),
                        platform_name,
                        e
                    );
                }
                Err(_) => {
                    let e = Error::Timeout(self.timeouts.single.as_secs());
                    tracing::warn!("{} stream for {}: {}", provider.name(), platform_name, e);
                }
            }

            let count = emitted.load(Ordering::SeqCst);
            if count > 0 {
                return Ok(count);
            }
        }

        Err(Error::AllProvidersExhausted(platform_name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::AtomicBool;

    struct ScriptedProvider {
        name: &'static str,
        response: Option<String>,
        available: bool,
        fatal: bool,
        called: AtomicBool,
        prompts: std::sync::Mutex<Vec<String>>,
    }

    impl ScriptedProvider {
        fn ok(name: &'static str, response: &str) -> Self {
            Self {
                name,
                response: Some(response.to_string()),
                available: true,
                fatal: false,
                called: AtomicBool::new(false),
                prompts: std::sync::Mutex::new(Vec::new()),
            }
        }

        fn failing(name: &'static str) -> Self {
            Self {
                response: None,
                ..Self::ok(name, "")
            }
        }

        fn unavailable(name: &'static str) -> Self {
            Self {
                available: false,
                ..Self::failing(name)
            }
        }

        fn fatal(name: &'static str) -> Self {
            Self {
                fatal: true,
                ..Self::failing(name)
            }
        }

        fn was_called(&self) -> bool {
            self.called.load(Ordering::SeqCst)
        }

        fn seen_prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ReviewProvider for ScriptedProvider {
        async fn generate(&self, prompt: &str) -> Result<String> {
            self.called.store(true, Ordering::SeqCst);
            self.prompts.lock().unwrap().push(prompt.to_string());
            if self.fatal {
                return Err(Error::Config("scripted config failure".to_string()));
            }
            match &self.response {
                Some(text) => Ok(text.clone()),
                None => Err(Error::ProviderApi("scripted failure".to_string())),
            }
        }

        fn name(&self) -> &str {
            self.name
        }

        fn is_available(&self) -> bool {
            self.available
        }
    }

    fn policy() -> TimeoutPolicy {
        TimeoutPolicy {
            single: Duration::from_secs(5),
            batch: Duration::from_secs(5),
        }
    }

    #[tokio::test]
    async fn first_successful_provider_wins_and_later_ones_are_never_called() {
        let a = Arc::new(ScriptedProvider::failing("a"));
        let b = Arc::new(ScriptedProvider::ok(
            "b",
            "A wonderful experience every single time. ||| Staff were friendly and very professional.",
        ));
        let c = Arc::new(ScriptedProvider::ok("c", "Should never be used at all here."));

        let orchestrator = Orchestrator::with_providers(
            vec![a.clone(), b.clone(), c.clone()],
            policy(),
        );
        let config = GenerationConfig::default();
        let (source, reviews) = orchestrator
            .generate_platform(&config, "Google")
            .await
            .unwrap();

        assert_eq!(source, "b");
        assert_eq!(reviews.len(), 2);
        assert!(a.was_called());
        assert!(!c.was_called());
    }

    #[tokio::test]
    async fn unavailable_providers_are_skipped_silently() {
        let a = Arc::new(ScriptedProvider::unavailable("a"));
        let b = Arc::new(ScriptedProvider::ok(
            "b",
            "Quick turnaround and honest pricing throughout. ||| Got exactly what was promised, on time.",
        ));

        let orchestrator = Orchestrator::with_providers(vec![a.clone(), b], policy());
        let config = GenerationConfig::default();
        let (source, _) = orchestrator
            .generate_platform(&config, "JustDial")
            .await
            .unwrap();

        assert_eq!(source, "b");
        assert!(!a.was_called());
    }

    #[tokio::test]
    async fn exhausting_every_provider_is_an_error() {
        let a = Arc::new(ScriptedProvider::failing("a"));
        let b = Arc::new(ScriptedProvider::failing("b"));

        let orchestrator = Orchestrator::with_providers(vec![a, b], policy());
        let config = GenerationConfig::default();
        let err = orchestrator
            .generate_platform(&config, "Google")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::AllProvidersExhausted(_)));
    }

    #[tokio::test]
    async fn unparseable_output_falls_through_to_the_next_provider() {
        let a = Arc::new(ScriptedProvider::ok("a", "I cannot help with that."));
        let b = Arc::new(ScriptedProvider::ok(
            "b",
            "Every visit has been consistently pleasant. ||| The manager remembers regulars by name.",
        ));

        let orchestrator = Orchestrator::with_providers(vec![a, b], policy());
        let config = GenerationConfig::default();
        let (source, _) = orchestrator
            .generate_platform(&config, "Google")
            .await
            .unwrap();

        assert_eq!(source, "b");
    }

    #[tokio::test]
    async fn every_fallback_provider_sees_the_same_prompt() {
        let a = Arc::new(ScriptedProvider::failing("a"));
        let b = Arc::new(ScriptedProvider::failing("b"));

        let orchestrator = Orchestrator::with_providers(vec![a.clone(), b.clone()], policy());
        let config = GenerationConfig::default();
        let _ = orchestrator.generate_platform(&config, "Google").await;

        let first = a.seen_prompts();
        let second = b.seen_prompts();
        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_eq!(first[0], second[0]);
    }

    #[tokio::test]
    async fn non_provider_errors_stop_the_fallback_chain() {
        let a = Arc::new(ScriptedProvider::fatal("a"));
        let b = Arc::new(ScriptedProvider::ok(
            "b",
            "A fine choice for weekend brunches. ||| Parking was easy and the queue moved fast.",
        ));

        let orchestrator = Orchestrator::with_providers(vec![a, b.clone()], policy());
        let config = GenerationConfig::default();
        let err = orchestrator
            .generate_platform(&config, "Google")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Config(_)));
        assert!(!b.was_called());
    }

    #[tokio::test]
    async fn batch_parses_the_json_object_per_platform() {
        let a = Arc::new(ScriptedProvider::ok(
            "a",
            r#"{"Google": ["Consistently excellent customer care."], "Zomato": ["The biryani here is worth the trip alone."]}"#,
        ));

        let orchestrator = Orchestrator::with_providers(vec![a], policy());
        let config = GenerationConfig::default();
        let platforms = vec!["Google".to_string(), "Zomato".to_string()];
        let (source, by_platform) = orchestrator
            .generate_batch(&config, &platforms)
            .await
            .unwrap();

        assert_eq!(source, "a");
        assert_eq!(by_platform.len(), 2);
        assert_eq!(by_platform["Google"][0].rating, 5);
    }

    #[tokio::test]
    async fn stream_emits_one_event_per_completed_review() {
        let a = Arc::new(ScriptedProvider::ok(
            "a",
            "The haircut was exactly what I asked for. ||| Booking online was simple and quick.",
        ));

        let orchestrator = Orchestrator::with_providers(vec![a], policy());
        let config = GenerationConfig::default();
        let (tx, mut rx) = mpsc::channel(16);

        let count = orchestrator
            .stream_platform(&config, "Google", &tx)
            .await
            .unwrap();
        drop(tx);

        assert_eq!(count, 2);
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        assert_eq!(events.len(), 2);
    }

    #[tokio::test]
    async fn stream_falls_back_when_the_first_provider_emits_nothing() {
        let a = Arc::new(ScriptedProvider::failing("a"));
        let b = Arc::new(ScriptedProvider::ok(
            "b",
            "An easy five stars for the attention to detail.",
        ));

        let orchestrator = Orchestrator::with_providers(vec![a, b], policy());
        let config = GenerationConfig::default();
        let (tx, mut rx) = mpsc::channel(16);

        let count = orchestrator
            .stream_platform(&config, "Google", &tx)
            .await
            .unwrap();
        drop(tx);

        assert_eq!(count, 1);
        assert!(rx.recv().await.is_some());
    }
}
