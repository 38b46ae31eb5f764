use axum::extract::State;
use axum::Json;
use serde::Deserialize;

use domains::{Like, User, UserId};

use crate::error::ApiResult;
use crate::extract::{JsonBody, PathParams, RequireSession};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminFlag {
    pub is_admin: bool,
}

pub async fn users(State(state): State<AppState>, session: RequireSession) -> ApiResult<Json<Vec<User>>> {
    Ok(Json(state.users.list_users(&session.actor()).await?))
}

pub async fn set_admin(
    State(state): State<AppState>,
    session: RequireSession,
    PathParams(user_id): PathParams<UserId>,
    JsonBody(flag): JsonBody<AdminFlag>,
) -> ApiResult<Json<User>> {
    let user = state
        .users
        .set_admin(&session.actor(), user_id, flag.is_admin)
        .await?;
    Ok(Json(user))
}

pub async fn likes(State(state): State<AppState>, session: RequireSession) -> ApiResult<Json<Vec<Like>>> {
    Ok(Json(state.likes.all_likes(&session.actor()).await?))
}
