//! In-process store backed by `DashMap`.
//!
//! A like toggle holds the write guard on the story entry for its whole
//! duration, so toggles on one story are serialized while toggles on
//! different stories proceed in parallel. Lock order is always
//! `stories` then `likes`.

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::debug;

use domains::{
    DomainError, DomainResult, Like, LikeRepository, LikeToggle, MediaKind, NewUser, Story,
    StoryId, StoryRepository, StoryWrite, User, UserCredentials, UserId, UserRepository,
    ValidPatch,
};

const EMAIL_TAKEN: &str = "This email is already registered";

#[derive(Default)]
pub struct MemoryStore {
    stories: DashMap<StoryId, Story>,
    users: DashMap<UserId, UserCredentials>,
    /// Lowercased email to user id
    emails: DashMap<String, UserId>,
    likes: DashMap<(StoryId, UserId), Like>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn newest_first_stories(&self, keep: impl Fn(&Story) -> bool) -> Vec<Story> {
        let mut stories: Vec<Story> = self
            .stories
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        stories.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        stories
    }

    fn newest_first_likes(&self, keep: impl Fn(&Like) -> bool) -> Vec<Like> {
        let mut likes: Vec<Like> = self
            .likes
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| entry.value().clone())
            .collect();
        likes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        likes
    }
}

#[async_trait]
impl StoryRepository for MemoryStore {
    async fn insert_story(&self, story: Story) -> DomainResult<()> {
        match self.stories.entry(story.id) {
            Entry::Occupied(_) => Err(DomainError::Conflict(format!(
                "story {} already exists",
                story.id
            ))),
            Entry::Vacant(slot) => {
                slot.insert(story);
                Ok(())
            }
        }
    }

    async fn get_story(&self, id: StoryId) -> DomainResult<Option<Story>> {
        Ok(self.stories.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_stories(&self) -> DomainResult<Vec<Story>> {
        Ok(self.newest_first_stories(|_| true))
    }

    async fn list_stories_by_author(&self, author_id: UserId) -> DomainResult<Vec<Story>> {
        Ok(self.newest_first_stories(|story| story.author_id == author_id))
    }

    async fn patch_story(&self, id: StoryId, patch: ValidPatch) -> DomainResult<StoryWrite> {
        let mut stored = self
            .stories
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("story", id))?;
        let released = stored.apply_patch(patch, Utc::now());
        Ok(StoryWrite {
            story: stored.clone(),
            released,
        })
    }

    async fn set_media_url(&self, id: StoryId, kind: MediaKind, url: String) -> DomainResult<StoryWrite> {
        let mut stored = self
            .stories
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("story", id))?;
        let released = stored.set_media(kind, url, Utc::now()).into_iter().collect();
        Ok(StoryWrite {
            story: stored.clone(),
            released,
        })
    }

    async fn delete_story(&self, id: StoryId) -> DomainResult<bool> {
        if self.stories.remove(&id).is_none() {
            return Ok(false);
        }
        self.likes.retain(|(story_id, _), _| *story_id != id);
        debug!(story_id = %id, "story and likes removed");
        Ok(true)
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> DomainResult<User> {
        let (user, password_hash) = user.into_user(Utc::now());
        match self.emails.entry(user.email.clone()) {
            Entry::Occupied(_) => Err(DomainError::Conflict(EMAIL_TAKEN.into())),
            Entry::Vacant(slot) => {
                slot.insert(user.id);
                self.users.insert(
                    user.id,
                    UserCredentials {
                        user: user.clone(),
                        password_hash,
                    },
                );
                Ok(user)
            }
        }
    }

    async fn get_user(&self, id: UserId) -> DomainResult<Option<User>> {
        Ok(self.users.get(&id).map(|entry| entry.user.clone()))
    }

    async fn find_credentials(&self, email: &str) -> DomainResult<Option<UserCredentials>> {
        let Some(id) = self.emails.get(&email.to_ascii_lowercase()).map(|e| *e.value()) else {
            return Ok(None);
        };
        Ok(self.users.get(&id).map(|entry| entry.value().clone()))
    }

    async fn list_users(&self) -> DomainResult<Vec<User>> {
        let mut users: Vec<User> = self.users.iter().map(|entry| entry.user.clone()).collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }

    async fn set_admin(&self, id: UserId, is_admin: bool) -> DomainResult<User> {
        let mut entry = self
            .users
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found("user", id))?;
        entry.user.is_admin = is_admin;
        entry.user.updated_at = Utc::now();
        Ok(entry.user.clone())
    }
}

#[async_trait]
impl LikeRepository for MemoryStore {
    async fn toggle_like(&self, story_id: StoryId, user_id: UserId) -> DomainResult<LikeToggle> {
        let mut story = self
            .stories
            .get_mut(&story_id)
            .ok_or_else(|| DomainError::not_found("story", story_id))?;

        let liked = match self.likes.entry((story_id, user_id)) {
            Entry::Occupied(existing) => {
                existing.remove();
                story.like_count = story.like_count.saturating_sub(1);
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(Like {
                    story_id,
                    user_id,
                    created_at: Utc::now(),
                });
                story.like_count += 1;
                true
            }
        };

        Ok(LikeToggle {
            liked,
            like_count: story.like_count,
        })
    }

    async fn has_liked(&self, story_id: StoryId, user_id: UserId) -> DomainResult<bool> {
        Ok(self.likes.contains_key(&(story_id, user_id)))
    }

    async fn likes_for_story(&self, story_id: StoryId) -> DomainResult<Vec<Like>> {
        Ok(self.newest_first_likes(|like| like.story_id == story_id))
    }

    async fn likes_by_user(&self, user_id: UserId) -> DomainResult<Vec<Like>> {
        Ok(self.newest_first_likes(|like| like.user_id == user_id))
    }

    async fn all_likes(&self) -> DomainResult<Vec<Like>> {
        Ok(self.newest_first_likes(|_| true))
    }
}
