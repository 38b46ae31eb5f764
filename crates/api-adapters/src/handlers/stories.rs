use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};

use domains::{
    Catalog, CategoryFilter, Like, LikeToggle, Story, StoryDraft, StoryId, StoryPatch, UserId,
};

use crate::error::ApiResult;
use crate::extract::{JsonBody, MaybeSession, PathParams, QueryParams, RequireSession};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    #[serde(default)]
    pub category: Option<String>,
}

/// A story plus whether the caller has liked it.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDetail {
    #[serde(flatten)]
    pub story: Story,
    pub liked: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryLikes {
    pub like_count: usize,
    pub likes: Vec<Like>,
}

/// Public reads still take `MaybeSession` so a bad token is reported.
pub async fn browse(
    State(state): State<AppState>,
    _session: MaybeSession,
    QueryParams(query): QueryParams<BrowseQuery>,
) -> ApiResult<Json<Catalog>> {
    let filter: CategoryFilter = query.category.as_deref().unwrap_or_default().parse()?;
    Ok(Json(state.stories.browse(filter).await))
}

pub async fn create(
    State(state): State<AppState>,
    session: RequireSession,
    JsonBody(draft): JsonBody<StoryDraft>,
) -> ApiResult<(StatusCode, Json<Story>)> {
    let story = state.stories.create_story(&session.actor(), draft).await?;
    state.metrics.story_created();
    Ok((StatusCode::CREATED, Json(story)))
}

pub async fn show(
    State(state): State<AppState>,
    session: MaybeSession,
    PathParams(id): PathParams<StoryId>,
) -> ApiResult<Json<StoryDetail>> {
    let mut story = state.stories.get_story(id).await?;
    let status = state.likes.status(&session.actor(), id).await?;
    story.like_count = status.like_count;
    Ok(Json(StoryDetail {
        story,
        liked: status.liked,
    }))
}

pub async fn update(
    State(state): State<AppState>,
    session: RequireSession,
    PathParams(id): PathParams<StoryId>,
    JsonBody(patch): JsonBody<StoryPatch>,
) -> ApiResult<Json<Story>> {
    Ok(Json(state.stories.update_story(&session.actor(), id, patch).await?))
}

pub async fn delete(
    State(state): State<AppState>,
    session: RequireSession,
    PathParams(id): PathParams<StoryId>,
) -> ApiResult<StatusCode> {
    state.stories.delete_story(&session.actor(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_like(
    State(state): State<AppState>,
    session: RequireSession,
    PathParams(id): PathParams<StoryId>,
) -> ApiResult<Json<LikeToggle>> {
    let outcome = state.likes.toggle(&session.actor(), id).await?;
    state.metrics.like_toggled(outcome);
    Ok(Json(outcome))
}

pub async fn likes(
    State(state): State<AppState>,
    _session: MaybeSession,
    PathParams(id): PathParams<StoryId>,
) -> Json<StoryLikes> {
    let likes = state.likes.likes_for_story(id).await;
    Json(StoryLikes {
        like_count: likes.len(),
        likes,
    })
}

pub async fn by_author(
    State(state): State<AppState>,
    _session: MaybeSession,
    PathParams(author_id): PathParams<UserId>,
) -> Json<Vec<Story>> {
    Json(state.stories.list_by_author(author_id).await)
}
