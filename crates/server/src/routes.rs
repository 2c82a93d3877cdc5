use crate::error::HttpError;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use prompthub_api::{HealthStatus, PromptDocument, PromptHub, PromptSummary, RefreshOutcome};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

#[derive(Clone)]
struct AppState {
    hub: Arc<dyn PromptHub>,
}

#[derive(Debug, Default, Deserialize)]
struct ListParams {
    tag: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct GetParams {
    version: Option<String>,
}

#[derive(Debug, Serialize)]
struct RefreshResponse {
    status: RefreshOutcome,
}

pub fn router(hub: Arc<dyn PromptHub>, allowed_origins: &[String]) -> Router {
    Router::new()
        .route("/prompts", get(list_prompts))
        .route("/prompts/{name}", get(get_prompt))
        .route("/refresh", post(trigger_refresh))
        .route("/health", get(health))
        .with_state(AppState { hub })
        .layer(cors_layer(allowed_origins))
}

fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any);

    if allowed_origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid allowed origin {:?}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(origins))
}

async fn list_prompts(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<PromptSummary>>, HttpError> {
    let tag = params.tag.as_deref().filter(|t| !t.is_empty());
    Ok(Json(state.hub.list_prompts(tag).await?))
}

async fn get_prompt(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(params): Query<GetParams>,
) -> Result<Json<PromptDocument>, HttpError> {
    let doc = state
        .hub
        .get_prompt(&name, params.version.as_deref())
        .await?;
    Ok(Json(doc))
}

async fn trigger_refresh(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<RefreshResponse>), HttpError> {
    let outcome = state.hub.trigger_refresh().await?;
    let status = match outcome {
        RefreshOutcome::Accepted => StatusCode::ACCEPTED,
        RefreshOutcome::AlreadyInProgress => StatusCode::CONFLICT,
    };
    Ok((status, Json(RefreshResponse { status: outcome })))
}

async fn health(State(state): State<AppState>) -> Result<Json<HealthStatus>, HttpError> {
    Ok(Json(state.hub.health_status().await?))
}
