//! The signed-in landing view: own stories for members, everything for admins.

use std::sync::Arc;

use serde::Serialize;
use tracing::error;

use domains::{Actor, DomainResult, Story, StoryRepository, User, UserRepository};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub is_admin: bool,
    pub stories: Vec<Story>,
    /// Only populated for admins
    pub users: Option<Vec<User>>,
    pub story_count: usize,
    /// Sum of like counters across `stories`
    pub like_total: u64,
}

pub struct DashboardService {
    stories: Arc<dyn StoryRepository>,
    users: Arc<dyn UserRepository>,
}

impl DashboardService {
    pub fn new(stories: Arc<dyn StoryRepository>, users: Arc<dyn UserRepository>) -> Self {
        Self { stories, users }
    }

    pub async fn dashboard(&self, actor: &Actor) -> DomainResult<Dashboard> {
        let identity = actor.require_identity()?;

        let (stories, users) = if actor.is_admin() {
            let users = self.users.list_users().await.unwrap_or_else(|err| {
                error!(error = %err, "error loading dashboard users");
                Vec::new()
            });
            (self.stories.list_stories().await, Some(users))
        } else {
            (self.stories.list_stories_by_author(identity.user_id).await, None)
        };
        let stories = stories.unwrap_or_else(|err| {
            error!(error = %err, "error loading dashboard stories");
            Vec::new()
        });

        Ok(Dashboard {
            is_admin: actor.is_admin(),
            story_count: stories.len(),
            like_total: stories.iter().map(|s| s.like_count).sum(),
            stories,
            users,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{admin, member, story_by, user};
    use domains::{DomainError, MockStoryRepository, MockUserRepository, StoryCategory};
    use mockall::predicate::eq;

    #[tokio::test]
    async fn member_sees_own_stories_and_like_total() {
        let (me, actor) = member();
        let mut first = story_by(me.id, StoryCategory::Fantasy);
        first.like_count = 2;
        let mut second = story_by(me.id, StoryCategory::Funny);
        second.like_count = 3;
        let mine = vec![first, second];

        let mut stories = MockStoryRepository::new();
        stories
            .expect_list_stories_by_author()
            .with(eq(me.id))
            .returning(move |_| Ok(mine.clone()));
        stories.expect_list_stories().never();
        let mut users = MockUserRepository::new();
        users.expect_list_users().never();

        let view = DashboardService::new(Arc::new(stories), Arc::new(users))
            .dashboard(&actor)
            .await
            .unwrap();
        assert!(!view.is_admin);
        assert_eq!(view.story_count, 2);
        assert_eq!(view.like_total, 5);
        assert!(view.users.is_none());
    }

    #[tokio::test]
    async fn admin_sees_everything() {
        let (_, actor) = admin();
        let everyone = vec![user(false), user(false), user(true)];
        let shelf = vec![story_by(uuid::Uuid::now_v7(), StoryCategory::Space)];

        let mut stories = MockStoryRepository::new();
        stories.expect_list_stories().returning(move || Ok(shelf.clone()));
        let mut users = MockUserRepository::new();
        users.expect_list_users().returning(move || Ok(everyone.clone()));

        let view = DashboardService::new(Arc::new(stories), Arc::new(users))
            .dashboard(&actor)
            .await
            .unwrap();
        assert!(view.is_admin);
        assert_eq!(view.story_count, 1);
        assert_eq!(view.users.map(|u| u.len()), Some(3));
    }

    #[tokio::test]
    async fn anonymous_has_no_dashboard() {
        let result = DashboardService::new(
            Arc::new(MockStoryRepository::new()),
            Arc::new(MockUserRepository::new()),
        )
        .dashboard(&Actor::Anonymous)
        .await;
        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    }
}
