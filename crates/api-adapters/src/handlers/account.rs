use axum::extract::State;
use axum::Json;

use domains::{Like, User, UserId};
use services::Dashboard;

use crate::error::ApiResult;
use crate::extract::{PathParams, RequireSession};
use crate::state::AppState;

pub async fn my_likes(State(state): State<AppState>, session: RequireSession) -> ApiResult<Json<Vec<Like>>> {
    Ok(Json(state.likes.my_likes(&session.actor()).await?))
}

pub async fn dashboard(State(state): State<AppState>, session: RequireSession) -> ApiResult<Json<Dashboard>> {
    Ok(Json(state.dashboard.dashboard(&session.actor()).await?))
}

/// Profile of any user, for signed-in callers.
pub async fn profile(
    State(state): State<AppState>,
    _session: RequireSession,
    PathParams(user_id): PathParams<UserId>,
) -> ApiResult<Json<User>> {
    Ok(Json(state.users.get_profile(user_id).await?))
}
