use std::convert::Infallible;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use futures::Stream;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::generate::{run_session, StreamEvent};
use crate::models::{BusinessProfile, GenerationConfig, Review};
use crate::server::AppState;

const MAX_REVIEW_COUNT: usize = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewsQuery {
    #[serde(default)]
    pub platform: Option<String>,
    #[serde(default)]
    pub platforms: Option<String>,
    #[serde(default)]
    pub business_name: Option<String>,
    #[serde(default)]
    pub business_type: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub keywords: Option<String>,
    #[serde(default)]
    pub review_count: Option<usize>,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReviewsResponse {
    pub success: bool,
    pub source: String,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<BusinessProfile>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

// Resolves an optional tenant identifier. Deactivated profiles are refused
// here so no provider call ever happens for them.
fn resolve_profile(state: &AppState, slug: Option<&str>) -> Result<Option<BusinessProfile>> {
    let Some(slug) = slug else {
        return Ok(None);
    };
    match state.store.lookup(slug)? {
        Some(profile) if profile.is_active => Ok(Some(profile)),
        Some(_) => Err(Error::ProfileInactive(slug.to_string())),
        None => Err(Error::ProfileNotFound(slug.to_string())),
    }
}

fn gate_status(error: &Error) -> StatusCode {
    match error {
        Error::ProfileNotFound(_) => StatusCode::NOT_FOUND,
        Error::ProfileInactive(_) => StatusCode::FORBIDDEN,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// Query parameters override profile defaults; the profile fills the gaps.
fn build_config(query: &ReviewsQuery, profile: Option<&BusinessProfile>) -> GenerationConfig {
    let base = GenerationConfig::default();
    GenerationConfig {
        business_name: query
            .business_name
            .clone()
            .or_else(|| profile.map(|p| p.business_name.clone()))
            .unwrap_or(base.business_name),
        business_type: query
            .business_type
            .clone()
            .or_else(|| profile.map(|p| p.business_type.clone()))
            .unwrap_or(base.business_type),
        owner_name: query
            .owner_name
            .clone()
            .or_else(|| profile.and_then(|p| p.owner_name.clone())),
        location: query
            .location
            .clone()
            .or_else(|| profile.map(|p| p.location.clone()))
            .unwrap_or(base.location),
        description: query
            .description
            .clone()
            .or_else(|| profile.and_then(|p| p.description.clone())),
        keywords: query
            .keywords
            .clone()
            .or_else(|| profile.and_then(|p| p.keywords.clone())),
        review_count: query
            .review_count
            .unwrap_or(base.review_count)
            .clamp(1, MAX_REVIEW_COUNT),
        language: query
            .language
            .clone()
            .or_else(|| profile.map(|p| p.preferred_language().to_string()))
            .unwrap_or(base.language),
    }
}

fn failure(status: StatusCode) -> (StatusCode, Json<ReviewsResponse>) {
    (
        status,
        Json(ReviewsResponse {
            success: false,
            source: String::new(),
            reviews: Vec::new(),
        }),
    )
}

pub async fn health() -> &'static str {
    "OK"
}

pub async fn get_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewsQuery>,
) -> (StatusCode, Json<ReviewsResponse>) {
    let profile = match resolve_profile(&state, query.slug.as_deref()) {
        Ok(profile) => profile,
        Err(e) => {
            tracing::warn!("Profile gate refused the request: {}", e);
            return failure(gate_status(&e));
        }
    };

    let config = build_config(&query, profile.as_ref());
    let platform = query.platform.as_deref().unwrap_or("Google");

    match state.orchestrator.generate_platform(&config, platform).await {
        Ok((source, reviews)) => (
            StatusCode::OK,
            Json(ReviewsResponse {
                success: true,
                source,
                reviews,
            }),
        ),
        Err(e) => {
            tracing::warn!("Generation failed for {}: {}", platform, e);
            failure(StatusCode::OK)
        }
    }
}

// Spawns whichever task feeds the event channel: a full generation session,
// or (when the profile gate refuses the request) per-platform errors plus the
// terminal DONE. Both paths use send().await so no event is dropped while the
// SSE stream is still unpolled.
fn spawn_event_stream(state: &AppState, query: ReviewsQuery) -> mpsc::Receiver<StreamEvent> {
    let platforms: Vec<String> = query
        .platforms
        .as_deref()
        .or(query.platform.as_deref())
        .unwrap_or("Google")
        .split(',')
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    let (tx, rx) = mpsc::channel(32);

    match resolve_profile(state, query.slug.as_deref()) {
        Ok(profile) => {
            let config = build_config(&query, profile.as_ref());
            let orchestrator = state.orchestrator.clone();
            tokio::spawn(run_session(orchestrator, config, platforms, tx));
        }
        Err(e) => {
            tokio::spawn(async move {
                for platform in &platforms {
                    if tx
                        .send(StreamEvent::error(platform, e.to_string()))
                        .await
                        .is_err()
                    {
                        return;
                    }
                }
                let _ = tx.send(StreamEvent::done()).await;
            });
        }
    }

    rx
}

pub async fn stream_reviews(
    State(state): State<AppState>,
    Query(query): Query<ReviewsQuery>,
) -> Sse<impl Stream<Item = std::result::Result<Event, Infallible>>> {
    let rx = spawn_event_stream(&state, query);

    let stream = futures::stream::unfold(rx, |mut rx| async move {
        let event = rx.recv().await?;
        let sse_event = Event::default()
            .json_data(&event)
            .unwrap_or_else(|_| Event::default().data("{}"));
        Some((Ok(sse_event), rx))
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

pub async fn get_profile(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> (StatusCode, Json<ProfileResponse>) {
    match resolve_profile(&state, Some(&slug)) {
        Ok(Some(profile)) => (
            StatusCode::OK,
            Json(ProfileResponse {
                success: true,
                profile: Some(profile),
                error: None,
            }),
        ),
        Ok(None) => (
            StatusCode::NOT_FOUND,
            Json(ProfileResponse {
                success: false,
                profile: None,
                error: Some("Profile not found".to_string()),
            }),
        ),
        Err(e) => {
            let status = gate_status(&e);
            if status == StatusCode::INTERNAL_SERVER_ERROR {
                tracing::error!("Profile lookup failed: {}", e);
            }
            (
                status,
                Json(ProfileResponse {
                    success: false,
                    profile: None,
                    error: Some(e.to_string()),
                }),
            )
        }
    }
}
