//! Like toggling and like listings.

use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument};

use domains::{
    Actor, DomainError, DomainResult, Like, LikeRepository, LikeToggle, StoryId,
    StoryRepository, UserId,
};

/// What a story page needs to render its like button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeStatus {
    pub liked: bool,
    pub like_count: u64,
}

pub struct LikeService {
    likes: Arc<dyn LikeRepository>,
    stories: Arc<dyn StoryRepository>,
}

impl LikeService {
    pub fn new(likes: Arc<dyn LikeRepository>, stories: Arc<dyn StoryRepository>) -> Self {
        Self { likes, stories }
    }

    /// Transaction errors propagate so the caller can roll back.
    #[instrument(skip(self, actor))]
    pub async fn toggle(&self, actor: &Actor, story_id: StoryId) -> DomainResult<LikeToggle> {
        let identity = actor.require_identity()?;
        let outcome = self.likes.toggle_like(story_id, identity.user_id).await?;
        info!(
            %story_id,
            user_id = %identity.user_id,
            liked = outcome.liked,
            like_count = outcome.like_count,
            "like toggled"
        );
        Ok(outcome)
    }

    /// Anonymous callers always see `liked: false`.
    pub async fn status(&self, actor: &Actor, story_id: StoryId) -> DomainResult<LikeStatus> {
        let story = self
            .stories
            .get_story(story_id)
            .await?
            .ok_or_else(|| DomainError::not_found("story", story_id))?;

        let liked = match actor.user_id() {
            Some(user_id) => self.likes.has_liked(story_id, user_id).await?,
            None => false,
        };
        Ok(LikeStatus {
            liked,
            like_count: story.like_count,
        })
    }

    pub async fn likes_for_story(&self, story_id: StoryId) -> Vec<Like> {
        self.likes.likes_for_story(story_id).await.unwrap_or_else(|err| {
            error!(error = %err, %story_id, "error fetching likes by story");
            Vec::new()
        })
    }

    pub async fn likes_by_user(&self, user_id: UserId) -> Vec<Like> {
        self.likes.likes_by_user(user_id).await.unwrap_or_else(|err| {
            error!(error = %err, %user_id, "error fetching likes by user");
            Vec::new()
        })
    }

    pub async fn my_likes(&self, actor: &Actor) -> DomainResult<Vec<Like>> {
        let identity = actor.require_identity()?;
        Ok(self.likes_by_user(identity.user_id).await)
    }

    pub async fn all_likes(&self, actor: &Actor) -> DomainResult<Vec<Like>> {
        actor.require_admin()?;
        Ok(self.likes.all_likes().await.unwrap_or_else(|err| {
            error!(error = %err, "error fetching all likes");
            Vec::new()
        }))
    }

    /// Counts the like records, not the story's cached counter.
    pub async fn like_count_for_story(&self, story_id: StoryId) -> usize {
        self.likes_for_story(story_id).await.len()
    }

    pub async fn like_count_by_user(&self, user_id: UserId) -> usize {
        self.likes_by_user(user_id).await.len()
    }
}
