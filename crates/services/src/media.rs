//! Attaching uploaded images and sounds to stories.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument, warn};

use domains::{
    Actor, DomainError, DomainResult, MediaStorage, MediaUpload, ProgressCallback, Story,
    StoryRepository, StoryWrite,
};

pub struct MediaService {
    stories: Arc<dyn StoryRepository>,
    storage: Arc<dyn MediaStorage>,
    max_upload_bytes: usize,
}

impl MediaService {
    pub fn new(
        stories: Arc<dyn StoryRepository>,
        storage: Arc<dyn MediaStorage>,
        max_upload_bytes: usize,
    ) -> Self {
        Self {
            stories,
            storage,
            max_upload_bytes,
        }
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.max_upload_bytes
    }

    /// Stores the file, points the story at it and drops whatever it replaced.
    #[instrument(skip(self, actor, upload, progress), fields(story_id = %upload.story_id, kind = %upload.kind))]
    pub async fn attach(
        &self,
        actor: &Actor,
        upload: MediaUpload,
        progress: Option<ProgressCallback>,
    ) -> DomainResult<Story> {
        let story = self
            .stories
            .get_story(upload.story_id)
            .await?
            .ok_or_else(|| DomainError::not_found("story", upload.story_id))?;
        actor.ensure_can_modify(&story)?;
        upload.validate(self.max_upload_bytes)?;

        let key = upload.storage_key(Utc::now().timestamp_millis());
        let size = upload.data.len();
        let url = self
            .storage
            .put_object(&key, &upload.content_type, upload.data, progress)
            .await?;

        // only the one slot is written, so a concurrent edit or upload survives
        let StoryWrite { story, released } = match self
            .stories
            .set_media_url(upload.story_id, upload.kind, url.clone())
            .await
        {
            Ok(write) => write,
            Err(err) => {
                self.discard(&url).await;
                return Err(err);
            }
        };
        for old in &released {
            self.discard(old).await;
        }

        info!(%key, size, "media attached");
        Ok(story)
    }

    async fn discard(&self, url: &str) {
        if let Err(err) = self.storage.delete_object(url).await {
            warn!(error = %err, url, "failed to delete media");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{member, story_by};
    use bytes::Bytes;
    use domains::{
        MediaKind, MockMediaStorage, MockStoryRepository, StoryCategory, MAX_UPLOAD_BYTES,
    };
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Mimics the store: sets the slot on `stored` and reports what it replaced.
    fn expect_slot_write(stories: &mut MockStoryRepository, stored: Story) {
        stories
            .expect_set_media_url()
            .times(1)
            .returning(move |_, kind, url| {
                let mut story = stored.clone();
                let released = story.set_media(kind, url, Utc::now()).into_iter().collect();
                Ok(StoryWrite { story, released })
            });
    }

    fn upload(story: &Story, kind: MediaKind, content_type: &str) -> MediaUpload {
        MediaUpload {
            story_id: story.id,
            kind,
            filename: "night sky.png".into(),
            content_type: content_type.parse().unwrap(),
            data: Bytes::from_static(b"\x89PNG...."),
        }
    }

    #[tokio::test]
    async fn owner_attaches_image_under_story_prefix() {
        let (owner, actor) = member();
        let story = story_by(owner.id, StoryCategory::Space);
        let prefix = format!("stories/{}/image_", story.id);
        let stored = story.clone();

        let mut stories = MockStoryRepository::new();
        stories.expect_get_story().returning(move |_| Ok(Some(stored.clone())));
        expect_slot_write(&mut stories, story.clone());

        let mut storage = MockMediaStorage::new();
        storage
            .expect_put_object()
            .withf(move |key, content_type, _, _| {
                key.starts_with(&prefix)
                    && key.ends_with("_night_sky.png")
                    && content_type.type_() == mime::IMAGE
            })
            .times(1)
            .returning(|_, _, _, progress| {
                if let Some(report) = progress {
                    report(50.0);
                    report(100.0);
                }
                Ok("/media/key.png".into())
            });
        storage.expect_delete_object().never();

        let ticks = Arc::new(AtomicU32::new(0));
        let counter = ticks.clone();
        let progress: ProgressCallback = Arc::new(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        let service = MediaService::new(Arc::new(stories), Arc::new(storage), MAX_UPLOAD_BYTES);
        let updated = service
            .attach(&actor, upload(&story, MediaKind::Image, "image/png"), Some(progress))
            .await
            .unwrap();

        assert_eq!(updated.image_url.as_deref(), Some("/media/key.png"));
        assert_eq!(ticks.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn wrong_mime_never_reaches_storage() {
        let (owner, actor) = member();
        let story = story_by(owner.id, StoryCategory::Space);
        let stored = story.clone();

        let mut stories = MockStoryRepository::new();
        stories.expect_get_story().returning(move |_| Ok(Some(stored.clone())));
        let mut storage = MockMediaStorage::new();
        storage.expect_put_object().never();

        let service = MediaService::new(Arc::new(stories), Arc::new(storage), MAX_UPLOAD_BYTES);
        let result = service
            .attach(&actor, upload(&story, MediaKind::Sound, "image/png"), None)
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn stranger_cannot_attach() {
        let (owner, _) = member();
        let (_, stranger) = member();
        let story = story_by(owner.id, StoryCategory::Space);
        let stored = story.clone();

        let mut stories = MockStoryRepository::new();
        stories.expect_get_story().returning(move |_| Ok(Some(stored.clone())));
        let mut storage = MockMediaStorage::new();
        storage.expect_put_object().never();

        let service = MediaService::new(Arc::new(stories), Arc::new(storage), MAX_UPLOAD_BYTES);
        let result = service
            .attach(&stranger, upload(&story, MediaKind::Image, "image/png"), None)
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn replacing_sound_deletes_old_object() {
        let (owner, actor) = member();
        let mut story = story_by(owner.id, StoryCategory::Space);
        story.sound_url = Some("/media/old.mp3".into());
        let stored = story.clone();

        let mut stories = MockStoryRepository::new();
        stories.expect_get_story().returning(move |_| Ok(Some(stored.clone())));
        expect_slot_write(&mut stories, story.clone());
        let mut storage = MockMediaStorage::new();
        storage
            .expect_put_object()
            .returning(|_, _, _, _| Ok("/media/new.mp3".into()));
        storage
            .expect_delete_object()
            .withf(|url| url == "/media/old.mp3")
            .times(1)
            .returning(|_| Ok(()));

        let service = MediaService::new(Arc::new(stories), Arc::new(storage), MAX_UPLOAD_BYTES);
        let updated = service
            .attach(&actor, upload(&story, MediaKind::Sound, "audio/mpeg"), None)
            .await
            .unwrap();
        assert_eq!(updated.sound_url.as_deref(), Some("/media/new.mp3"));
    }

    #[tokio::test]
    async fn upload_is_discarded_when_story_vanished_meanwhile() {
        let (owner, actor) = member();
        let story = story_by(owner.id, StoryCategory::Space);
        let stored = story.clone();

        let mut stories = MockStoryRepository::new();
        stories.expect_get_story().returning(move |_| Ok(Some(stored.clone())));
        stories
            .expect_set_media_url()
            .returning(|id, _, _| Err(DomainError::not_found("story", id)));
        let mut storage = MockMediaStorage::new();
        storage
            .expect_put_object()
            .returning(|_, _, _, _| Ok("/media/orphan.png".into()));
        storage
            .expect_delete_object()
            .withf(|url| url == "/media/orphan.png")
            .times(1)
            .returning(|_| Ok(()));

        let service = MediaService::new(Arc::new(stories), Arc::new(storage), MAX_UPLOAD_BYTES);
        let result = service
            .attach(&actor, upload(&story, MediaKind::Image, "image/png"), None)
            .await;
        assert!(matches!(result, Err(DomainError::NotFound(..))));
    }
}
