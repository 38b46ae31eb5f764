//! # Ports
//!
//! Any adapter must implement these traits to be wired into the binary.

use async_trait::async_trait;
use mime::Mime;
use serde::{Deserialize, Serialize};

use crate::errors::DomainResult;
use crate::media::{MediaKind, ProgressCallback};
use crate::models::{
    Like, LikeToggle, NewUser, Story, StoryId, StoryWrite, User, UserCredentials, UserId,
    ValidPatch,
};

/// Persistence contract for stories.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait StoryRepository: Send + Sync {
    async fn insert_story(&self, story: Story) -> DomainResult<()>;
    async fn get_story(&self, id: StoryId) -> DomainResult<Option<Story>>;
    /// Newest first.
    async fn list_stories(&self) -> DomainResult<Vec<Story>>;
    /// Newest first.
    async fn list_stories_by_author(&self, author_id: UserId) -> DomainResult<Vec<Story>>;
    /// Applies `patch` to the stored row under the store's own lock, so
    /// concurrent writers never revert each other. Must not touch
    /// `like_count`, which belongs to [`LikeRepository::toggle_like`].
    /// `NotFound` when the story is missing.
    async fn patch_story(&self, id: StoryId, patch: ValidPatch) -> DomainResult<StoryWrite>;
    /// Sets a single media slot atomically; `released` holds the URL it
    /// replaced, if any. `NotFound` when the story is missing.
    async fn set_media_url(&self, id: StoryId, kind: MediaKind, url: String) -> DomainResult<StoryWrite>;
    /// Removes the story and its like records. Returns false when absent.
    async fn delete_story(&self, id: StoryId) -> DomainResult<bool>;
}

/// Persistence contract for accounts.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn insert_user(&self, user: NewUser) -> DomainResult<User>;
    async fn get_user(&self, id: UserId) -> DomainResult<Option<User>>;
    async fn find_credentials(&self, email: &str) -> DomainResult<Option<UserCredentials>>;
    /// Newest first.
    async fn list_users(&self) -> DomainResult<Vec<User>>;
    async fn set_admin(&self, id: UserId, is_admin: bool) -> DomainResult<User>;
}

/// Like records and the counter they back.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait LikeRepository: Send + Sync {
    /// Atomically flips the (story, user) like and adjusts the story's
    /// counter, floored at zero. `NotFound` when the story is missing.
    async fn toggle_like(&self, story_id: StoryId, user_id: UserId) -> DomainResult<LikeToggle>;
    async fn has_liked(&self, story_id: StoryId, user_id: UserId) -> DomainResult<bool>;
    /// Newest first.
    async fn likes_for_story(&self, story_id: StoryId) -> DomainResult<Vec<Like>>;
    /// Newest first.
    async fn likes_by_user(&self, user_id: UserId) -> DomainResult<Vec<Like>>;
    /// Newest first.
    async fn all_likes(&self) -> DomainResult<Vec<Like>>;
}

/// Blob storage for uploaded media.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait MediaStorage: Send + Sync {
    /// Stores `data` under `key` and returns its public URL.
    async fn put_object(
        &self,
        key: &str,
        content_type: &Mime,
        data: bytes::Bytes,
        progress: Option<ProgressCallback>,
    ) -> DomainResult<String>;
    /// Deletes the object a previously returned URL points to.
    async fn delete_object(&self, url: &str) -> DomainResult<()>;
}

/// One-way password hashing.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait CredentialHasher: Send + Sync {
    fn hash_password(&self, password: &str) -> DomainResult<String>;
    fn verify_password(&self, password: &str, hash: &str) -> bool;
}

/// Claims carried by a session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub sub: UserId,
    /// Token id, the unit of revocation
    pub jti: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedToken {
    pub token: String,
    pub claims: TokenClaims,
}

/// Issues, verifies and revokes session tokens.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
pub trait SessionTokens: Send + Sync {
    fn issue(&self, user_id: UserId) -> DomainResult<IssuedToken>;
    /// Signature and expiry only; revocation is checked separately.
    fn verify(&self, token: &str) -> DomainResult<TokenClaims>;
    fn revoke(&self, claims: &TokenClaims);
    fn is_revoked(&self, token_id: &str) -> bool;
}
