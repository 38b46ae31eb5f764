//! # Domain Models
//!
//! These structs represent the core entities of Storytime.
//! We use UUID v7 for time-ordered, globally unique identification.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{DomainError, DomainResult};
use crate::media::MediaKind;
use crate::validation;

pub type StoryId = Uuid;
pub type UserId = Uuid;

/// The ten fixed story categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum StoryCategory {
    #[default]
    Adventure,
    Fantasy,
    Animals,
    FairyTale,
    Nature,
    Space,
    Friendship,
    Mystery,
    Funny,
    Magical,
}

impl StoryCategory {
    /// Display order used by the browse view.
    pub const ALL: [StoryCategory; 10] = [
        StoryCategory::Adventure,
        StoryCategory::Fantasy,
        StoryCategory::Animals,
        StoryCategory::FairyTale,
        StoryCategory::Nature,
        StoryCategory::Space,
        StoryCategory::Friendship,
        StoryCategory::Mystery,
        StoryCategory::Funny,
        StoryCategory::Magical,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            StoryCategory::Adventure => "adventure",
            StoryCategory::Fantasy => "fantasy",
            StoryCategory::Animals => "animals",
            StoryCategory::FairyTale => "fairy-tale",
            StoryCategory::Nature => "nature",
            StoryCategory::Space => "space",
            StoryCategory::Friendship => "friendship",
            StoryCategory::Mystery => "mystery",
            StoryCategory::Funny => "funny",
            StoryCategory::Magical => "magical",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            StoryCategory::Adventure => "Adventure",
            StoryCategory::Fantasy => "Fantasy",
            StoryCategory::Animals => "Animals",
            StoryCategory::FairyTale => "Fairy Tale",
            StoryCategory::Nature => "Nature",
            StoryCategory::Space => "Space",
            StoryCategory::Friendship => "Friendship",
            StoryCategory::Mystery => "Mystery",
            StoryCategory::Funny => "Funny",
            StoryCategory::Magical => "Magical",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            StoryCategory::Adventure => "🗺️",
            StoryCategory::Fantasy => "🧚",
            StoryCategory::Animals => "🐻",
            StoryCategory::FairyTale => "👸",
            StoryCategory::Nature => "🌲",
            StoryCategory::Space => "🚀",
            StoryCategory::Friendship => "💕",
            StoryCategory::Mystery => "🔮",
            StoryCategory::Funny => "😄",
            StoryCategory::Magical => "✨",
        }
    }
}

impl fmt::Display for StoryCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoryCategory {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        StoryCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| DomainError::Validation(format!("unknown story category '{s}'")))
    }
}

/// A user-authored bedtime story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Story {
    pub id: StoryId,
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub category: StoryCategory,
    pub author_id: UserId,
    pub author_name: String,
    pub image_url: Option<String>,
    pub sound_url: Option<String>,
    pub youtube_url: Option<String>,
    /// Denormalized like counter, only ever changed by the toggle transaction
    pub like_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Story {
    pub fn is_authored_by(&self, user_id: UserId) -> bool {
        self.author_id == user_id
    }

    /// Builds a fresh story from a validated draft.
    pub fn from_draft(draft: ValidDraft, author_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            title: draft.title,
            description: draft.description,
            content: draft.content,
            category: draft.category,
            author_id,
            author_name: draft.author_name,
            image_url: None,
            sound_url: None,
            youtube_url: draft.youtube_url,
            like_count: 0,
            created_at: now,
            updated_at: now,
        }
    }

    /// Applies a validated patch and returns the media URLs it cleared.
    /// `like_count` is never touched here.
    pub fn apply_patch(&mut self, patch: ValidPatch, now: DateTime<Utc>) -> Vec<String> {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(description) = patch.description {
            self.description = description;
        }
        if let Some(content) = patch.content {
            self.content = content;
        }
        if let Some(category) = patch.category {
            self.category = category;
        }
        if let Some(youtube_url) = patch.youtube_url {
            self.youtube_url = youtube_url;
        }
        let mut released = Vec::new();
        if patch.clear_image {
            released.extend(self.image_url.take());
        }
        if patch.clear_sound {
            released.extend(self.sound_url.take());
        }
        self.updated_at = now;
        released
    }

    /// Points one media slot at `url` and returns what it held before.
    pub fn set_media(&mut self, kind: MediaKind, url: String, now: DateTime<Utc>) -> Option<String> {
        let slot = match kind {
            MediaKind::Image => &mut self.image_url,
            MediaKind::Sound => &mut self.sound_url,
        };
        let replaced = slot.replace(url);
        self.updated_at = now;
        replaced
    }

    /// URLs of uploaded media attached to this story.
    pub fn media_urls(&self) -> impl Iterator<Item = &str> {
        self.image_url.iter().chain(self.sound_url.iter()).map(String::as_str)
    }
}

/// Client-supplied input for a new story.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryDraft {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub content: String,
    #[serde(default)]
    pub category: StoryCategory,
    #[serde(default)]
    pub author_name: Option<String>,
    #[serde(default)]
    pub youtube_url: Option<String>,
}

/// A draft that passed validation; all strings trimmed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidDraft {
    pub title: String,
    pub description: Option<String>,
    pub content: String,
    pub category: StoryCategory,
    pub author_name: String,
    pub youtube_url: Option<String>,
}

impl StoryDraft {
    /// `fallback_name` is the signed-in user's display name.
    pub fn validate(&self, fallback_name: Option<&str>) -> DomainResult<ValidDraft> {
        let title = validation::required("title", &self.title)?;
        let content = validation::required("content", &self.content)?;
        let author_name = validation::optional(self.author_name.as_deref())
            .or_else(|| validation::optional(fallback_name))
            .unwrap_or_else(|| validation::DEFAULT_AUTHOR_NAME.to_string());

        Ok(ValidDraft {
            title,
            description: validation::description(self.description.as_deref())?,
            content,
            category: self.category,
            author_name,
            youtube_url: validation::youtube_url(self.youtube_url.as_deref())?,
        })
    }
}

/// Partial update of a story. Absent fields are left alone; an empty
/// `description` or `youtubeUrl` clears the field.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub category: Option<StoryCategory>,
    #[serde(default)]
    pub youtube_url: Option<String>,
    #[serde(default)]
    pub clear_image: bool,
    #[serde(default)]
    pub clear_sound: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidPatch {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub content: Option<String>,
    pub category: Option<StoryCategory>,
    pub youtube_url: Option<Option<String>>,
    pub clear_image: bool,
    pub clear_sound: bool,
}

impl StoryPatch {
    pub fn validate(&self) -> DomainResult<ValidPatch> {
        Ok(ValidPatch {
            title: self
                .title
                .as_deref()
                .map(|t| validation::required("title", t))
                .transpose()?,
            description: self
                .description
                .as_deref()
                .map(|d| validation::description(Some(d)))
                .transpose()?,
            content: self
                .content
                .as_deref()
                .map(|c| validation::required("content", c))
                .transpose()?,
            category: self.category,
            youtube_url: self
                .youtube_url
                .as_deref()
                .map(|u| validation::youtube_url(Some(u)))
                .transpose()?,
            clear_image: self.clear_image,
            clear_sound: self.clear_sound,
        })
    }
}

/// A registered account. Credentials live in [`UserCredentials`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Everything needed to persist a new account.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    pub email: String,
    pub display_name: String,
    pub password_hash: String,
    pub is_admin: bool,
}

impl NewUser {
    pub fn into_user(self, now: DateTime<Utc>) -> (User, String) {
        let user = User {
            id: Uuid::now_v7(),
            email: self.email,
            display_name: self.display_name,
            is_admin: self.is_admin,
            created_at: now,
            updated_at: now,
        };
        (user, self.password_hash)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserCredentials {
    pub user: User,
    /// Argon2 PHC string
    pub password_hash: String,
}

/// One user's like of one story. Identity is the (story, user) pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Like {
    pub story_id: StoryId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// A story as the store wrote it, plus media URLs it no longer references.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryWrite {
    pub story: Story,
    pub released: Vec<String>,
}

/// Result of the like-toggle transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeToggle {
    pub liked: bool,
    pub like_count: u64,
}
