//! Media attachment rules: kinds, size ceiling, storage keys.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use bytes::Bytes;
use mime::Mime;
use serde::{Deserialize, Serialize};

use crate::errors::{DomainError, DomainResult};
use crate::models::StoryId;

/// 20 MiB, applied to both images and sounds.
pub const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Receives upload progress as a percentage in `0.0..=100.0`.
pub type ProgressCallback = Arc<dyn Fn(f32) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Sound,
}

impl MediaKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Sound => "sound",
        }
    }

    /// MIME top-level type this kind accepts.
    pub fn accepted_type(self) -> mime::Name<'static> {
        match self {
            MediaKind::Image => mime::IMAGE,
            MediaKind::Sound => mime::AUDIO,
        }
    }

    pub fn accepts(self, content_type: &Mime) -> bool {
        content_type.type_() == self.accepted_type()
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MediaKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(MediaKind::Image),
            "sound" => Ok(MediaKind::Sound),
            other => Err(DomainError::Validation(format!("unknown media kind '{other}'"))),
        }
    }
}

/// A file waiting to be attached to a story.
#[derive(Debug, Clone)]
pub struct MediaUpload {
    pub story_id: StoryId,
    pub kind: MediaKind,
    pub filename: String,
    pub content_type: Mime,
    pub data: Bytes,
}

impl MediaUpload {
    pub fn validate(&self, max_bytes: usize) -> DomainResult<()> {
        if self.data.len() > max_bytes {
            return Err(DomainError::PayloadTooLarge(format!(
                "{} file size must be less than {}MB",
                self.kind,
                max_bytes / (1024 * 1024)
            )));
        }
        if self.data.is_empty() {
            return Err(DomainError::Validation("uploaded file is empty".into()));
        }
        if !self.kind.accepts(&self.content_type) {
            let expected = match self.kind {
                MediaKind::Image => "an image",
                MediaKind::Sound => "an audio file",
            };
            return Err(DomainError::Validation(format!("File must be {expected}")));
        }
        Ok(())
    }

    /// `stories/{storyId}/{kind}_{millis}_{filename}`
    pub fn storage_key(&self, timestamp_millis: i64) -> String {
        format!(
            "stories/{}/{}_{}_{}",
            self.story_id,
            self.kind,
            timestamp_millis,
            sanitize_filename(&self.filename)
        )
    }
}

/// Keeps the last path component and maps anything outside
/// `[A-Za-z0-9._-]` to `_`.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "upload".to_string()
    } else {
        cleaned.to_string()
    }
}
