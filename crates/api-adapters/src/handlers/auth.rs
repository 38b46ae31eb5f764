use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use domains::User;
use services::{LoginRequest, RegisterRequest, Session};

use crate::error::ApiResult;
use crate::extract::{JsonBody, RequireSession};
use crate::state::AppState;

pub async fn register(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<Session>)> {
    let session = state.auth.register(request).await?;
    Ok((StatusCode::CREATED, Json(session)))
}

pub async fn login(
    State(state): State<AppState>,
    JsonBody(request): JsonBody<LoginRequest>,
) -> ApiResult<Json<Session>> {
    Ok(Json(state.auth.login(request).await?))
}

pub async fn logout(State(state): State<AppState>, RequireSession(session): RequireSession) -> StatusCode {
    state.auth.logout(&session);
    StatusCode::NO_CONTENT
}

pub async fn me(RequireSession(session): RequireSession) -> Json<User> {
    Json(session.user)
}
