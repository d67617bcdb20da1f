use std::sync::Arc;

use serde::Serialize;
use tokio::sync::mpsc;

use crate::generate::Orchestrator;
use crate::models::{GenerationConfig, Review};

// Wire events for the SSE endpoint. Untagged so the payloads match the
// shapes clients already consume.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum StreamEvent {
    Reviews {
        success: bool,
        platform: String,
        reviews: Vec<Review>,
    },
    Error {
        success: bool,
        platform: String,
        error: String,
    },
    Done {
        #[serde(rename = "type")]
        kind: String,
    },
}

impl StreamEvent {
    pub fn reviews(platform: &str, reviews: Vec<Review>) -> Self {
        StreamEvent::Reviews {
            success: true,
            platform: platform.to_string(),
            reviews,
        }
    }

    pub fn error(platform: &str, error: String) -> Self {
        StreamEvent::Error {
            success: false,
            platform: platform.to_string(),
            error,
        }
    }

    pub fn done() -> Self {
        StreamEvent::Done {
            kind: "DONE".to_string(),
        }
    }
}

// One streaming session: the first listed platform streams to completion
// before any other platform starts, the rest run concurrently, and exactly
// one DONE terminates the channel. A platform failing only produces a scoped
// error event.
pub async fn run_session(
    orchestrator: Arc<Orchestrator>,
    config: GenerationConfig,
    platforms: Vec<String>,
    tx: mpsc::Sender<StreamEvent>,
) {
    let mut iter = platforms.into_iter();
    let Some(primary) = iter.next() else {
        let _ = tx.send(StreamEvent::done()).await;
        return;
    };
    let rest: Vec<String> = iter.collect();

    if let Err(e) = orchestrator.stream_platform(&config, &primary, &tx).await {
        tracing::warn!("Primary platform {} failed: {}", primary, e);
        let _ = tx.send(StreamEvent::error(&primary, e.to_string())).await;
    }

    let mut handles = Vec::with_capacity(rest.len());
    for platform in rest {
        let orchestrator = orchestrator.clone();
        let config = config.clone();
        let tx = tx.clone();
        handles.push(tokio::spawn(async move {
            if let Err(e) = orchestrator.stream_platform(&config, &platform, &tx).await {
                tracing::warn!("Platform {} failed: {}", platform, e);
                let _ = tx.send(StreamEvent::error(&platform, e.to_string())).await;
            }
        }));
    }
    for handle in handles {
        let _ = handle.await;
    }

    let _ = tx.send(StreamEvent::done()).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::generate::TimeoutPolicy;
    use crate::llm::ReviewProvider;
    use async_trait::async_trait;
    use std::time::Duration;

    // Fails for Trustpilot prompts (keyed off the style block label),
    // succeeds for everything else.
    struct PerPlatformProvider;

    #[async_trait]
    impl ReviewProvider for PerPlatformProvider {
        async fn generate(&self, prompt: &str) -> Result<String> {
            if prompt.contains("TRUSTPILOT") {
                Err(Error::ProviderApi("no trustpilot output".to_string()))
            } else {
                Ok("A dependable team that delivers every single time.".to_string())
            }
        }

        fn name(&self) -> &str {
            "mock"
        }

        fn is_available(&self) -> bool {
            true
        }
    }

    fn orchestrator() -> Arc<Orchestrator> {
        Arc::new(Orchestrator::with_providers(
            vec![Arc::new(PerPlatformProvider)],
            TimeoutPolicy {
                single: Duration::from_secs(5),
                batch: Duration::from_secs(5),
            },
        ))
    }

    async fn collect(rx: &mut mpsc::Receiver<StreamEvent>) -> Vec<StreamEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn primary_platform_events_come_first_and_done_is_last() {
        let (tx, mut rx) = mpsc::channel(64);
        let platforms = vec!["Google".to_string(), "Facebook".to_string()];
        run_session(orchestrator(), GenerationConfig::default(), platforms, tx).await;

        let events = collect(&mut rx).await;
        assert!(events.len() >= 3);
        match &events[0] {
            StreamEvent::Reviews { platform, .. } => assert_eq!(platform, "Google"),
            other => panic!("expected a review event first, got {:?}", other),
        }
        assert!(matches!(events.last(), Some(StreamEvent::Done { .. })));
        let done_count = events
            .iter()
            .filter(|e| matches!(e, StreamEvent::Done { .. }))
            .count();
        assert_eq!(done_count, 1);
    }

    #[tokio::test]
    async fn a_failing_platform_yields_a_scoped_error_event() {
        let (tx, mut rx) = mpsc::channel(64);
        let platforms = vec!["Google".to_string(), "Trustpilot".to_string()];
        run_session(orchestrator(), GenerationConfig::default(), platforms, tx).await;

        let events = collect(&mut rx).await;
        let errors: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Error { platform, .. } => Some(platform.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(errors, vec!["Trustpilot".to_string()]);

        let review_platforms: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                StreamEvent::Reviews { platform, .. } => Some(platform.clone()),
                _ => None,
            })
            .collect();
        assert_eq!(review_platforms, vec!["Google".to_string()]);
    }

    #[tokio::test]
    async fn empty_platform_list_still_terminates_with_done() {
        let (tx, mut rx) = mpsc::channel(4);
        run_session(orchestrator(), GenerationConfig::default(), vec![], tx).await;

        let events = collect(&mut rx).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(events[0], StreamEvent::Done { .. }));
    }

    #[test]
    fn done_event_serializes_to_the_terminal_marker() {
        let json = serde_json::to_string(&StreamEvent::done()).unwrap();
        assert_eq!(json, r#"{"type":"DONE"}"#);
    }
}
