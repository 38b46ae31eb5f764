use axum::extract::State;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

use configs::PublicConfig;
use domains::{DomainError, StoryCategory};

use crate::error::ApiResult;
use crate::metrics::CONTENT_TYPE as METRICS_CONTENT_TYPE;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CategoryInfo {
    pub value: StoryCategory,
    pub label: &'static str,
    pub emoji: &'static str,
}

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

pub async fn metrics(State(state): State<AppState>) -> ApiResult<impl IntoResponse> {
    let body = state.metrics.render().map_err(DomainError::internal)?;
    Ok(([(CONTENT_TYPE, METRICS_CONTENT_TYPE)], body))
}

pub async fn public_config(State(state): State<AppState>) -> Json<PublicConfig> {
    Json(state.public_config.as_ref().clone())
}

pub async fn categories() -> Json<Vec<CategoryInfo>> {
    Json(
        StoryCategory::ALL
            .iter()
            .map(|&value| CategoryInfo {
                value,
                label: value.label(),
                emoji: value.emoji(),
            })
            .collect(),
    )
}
