//! # services
//!
//! Use cases for Storytime. Each service holds `Arc<dyn Port>` handles and
//! receives the caller as an explicit [`domains::Actor`]; none of them keep
//! per-user state of their own.

pub mod auth;
pub mod dashboard;
pub mod likes;
pub mod media;
pub mod stories;
pub mod users;

pub use auth::{AuthService, LoginRequest, RegisterRequest, Session};
pub use dashboard::{Dashboard, DashboardService};
pub use likes::{LikeService, LikeStatus};
pub use media::MediaService;
pub use stories::StoryService;
pub use users::UserService;

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::Utc;
    use domains::{Actor, Story, StoryCategory, StoryDraft, User, UserId};
    use uuid::Uuid;

    pub fn user(is_admin: bool) -> User {
        let now = Utc::now();
        User {
            id: Uuid::now_v7(),
            email: format!("{}@example.com", Uuid::now_v7().simple()),
            display_name: "Tester".into(),
            is_admin,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn member() -> (User, Actor) {
        let user = user(false);
        let actor = Actor::from_user(&user);
        (user, actor)
    }

    pub fn admin() -> (User, Actor) {
        let user = user(true);
        let actor = Actor::from_user(&user);
        (user, actor)
    }

    pub fn story_by(author: UserId, category: StoryCategory) -> Story {
        let draft = StoryDraft {
            title: "The Moon Bear".into(),
            content: "Far away...".into(),
            category,
            ..StoryDraft::default()
        };
        Story::from_draft(draft.validate(None).unwrap(), author, Utc::now())
    }
}
