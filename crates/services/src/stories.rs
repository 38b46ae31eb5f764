//! Story CRUD, browse and cascade delete.

use std::sync::Arc;

use chrono::Utc;
use tracing::{error, info, instrument, warn};

use domains::{
    Actor, Catalog, CategoryFilter, DomainError, DomainResult, MediaStorage, Story, StoryDraft,
    StoryId, StoryPatch, StoryRepository, StoryWrite, UserId,
};

pub struct StoryService {
    stories: Arc<dyn StoryRepository>,
    media: Arc<dyn MediaStorage>,
}

impl StoryService {
    pub fn new(stories: Arc<dyn StoryRepository>, media: Arc<dyn MediaStorage>) -> Self {
        Self { stories, media }
    }

    /// Validation happens before anything reaches the repository.
    #[instrument(skip(self, actor, draft), fields(category = %draft.category))]
    pub async fn create_story(&self, actor: &Actor, draft: StoryDraft) -> DomainResult<Story> {
        let identity = actor.require_identity()?;
        let valid = draft.validate(Some(&identity.display_name))?;
        let story = Story::from_draft(valid, identity.user_id, Utc::now());

        self.stories.insert_story(story.clone()).await?;
        info!(story_id = %story.id, author_id = %story.author_id, "story created");
        Ok(story)
    }

    pub async fn get_story(&self, id: StoryId) -> DomainResult<Story> {
        self.stories
            .get_story(id)
            .await?
            .ok_or_else(|| DomainError::not_found("story", id))
    }

    /// Store failures degrade to an empty list.
    pub async fn list_stories(&self) -> Vec<Story> {
        self.stories.list_stories().await.unwrap_or_else(|err| {
            error!(error = %err, "error fetching stories");
            Vec::new()
        })
    }

    pub async fn list_by_author(&self, author_id: UserId) -> Vec<Story> {
        self.stories
            .list_stories_by_author(author_id)
            .await
            .unwrap_or_else(|err| {
                error!(error = %err, %author_id, "error fetching stories by author");
                Vec::new()
            })
    }

    /// Fetches everything once and filters in memory.
    pub async fn browse(&self, filter: CategoryFilter) -> Catalog {
        Catalog::build(self.list_stories().await, filter)
    }

    #[instrument(skip(self, actor, patch))]
    pub async fn update_story(
        &self,
        actor: &Actor,
        id: StoryId,
        patch: StoryPatch,
    ) -> DomainResult<Story> {
        let current = self.get_story(id).await?;
        actor.ensure_can_modify(&current)?;
        let valid = patch.validate()?;

        let StoryWrite { story, released } = self.stories.patch_story(id, valid).await?;
        self.discard_media(released.iter().map(String::as_str)).await;

        info!(story_id = %story.id, "story updated");
        Ok(story)
    }

    /// Deletes the story and its likes, then its uploaded media.
    #[instrument(skip(self, actor))]
    pub async fn delete_story(&self, actor: &Actor, id: StoryId) -> DomainResult<()> {
        let story = self.get_story(id).await?;
        actor.ensure_can_modify(&story)?;

        if !self.stories.delete_story(id).await? {
            return Err(DomainError::not_found("story", id));
        }
        self.discard_media(story.media_urls()).await;

        info!(story_id = %id, by_admin = actor.is_admin(), "story deleted");
        Ok(())
    }

    async fn discard_media<'a>(&self, urls: impl Iterator<Item = &'a str>) {
        for url in urls {
            if let Err(err) = self.media.delete_object(url).await {
                warn!(error = %err, url, "failed to delete media");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{admin, member, story_by};
    use domains::{MockMediaStorage, MockStoryRepository, StoryCategory};
    use mockall::predicate::eq;
    use tokio_test::{assert_err, assert_ok};

    fn service(repo: MockStoryRepository, media: MockMediaStorage) -> StoryService {
        StoryService::new(Arc::new(repo), Arc::new(media))
    }

    fn draft(title: &str, content: &str) -> StoryDraft {
        StoryDraft {
            title: title.into(),
            content: content.into(),
            category: StoryCategory::Nature,
            ..StoryDraft::default()
        }
    }

    #[tokio::test]
    async fn create_rejects_missing_content_before_persistence() {
        let mut repo = MockStoryRepository::new();
        repo.expect_insert_story().never();
        let (_, actor) = member();

        let result = service(repo, MockMediaStorage::new())
            .create_story(&actor, draft("Title", "   "))
            .await;
        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[tokio::test]
    async fn anonymous_cannot_create() {
        let mut repo = MockStoryRepository::new();
        repo.expect_insert_story().never();

        let result = service(repo, MockMediaStorage::new())
            .create_story(&Actor::Anonymous, draft("Title", "Body"))
            .await;
        assert!(matches!(result, Err(DomainError::Unauthorized(_))));
    }

    #[tokio::test]
    async fn create_stamps_author_and_zero_likes() {
        let mut repo = MockStoryRepository::new();
        repo.expect_insert_story().times(1).returning(|_| Ok(()));
        let (user, actor) = member();

        let story = assert_ok!(
            service(repo, MockMediaStorage::new())
                .create_story(&actor, draft(" Title ", "Body"))
                .await
        );
        assert_eq!(story.author_id, user.id);
        assert_eq!(story.author_name, user.display_name);
        assert_eq!(story.title, "Title");
        assert_eq!(story.like_count, 0);
    }

    #[tokio::test]
    async fn non_owner_update_is_rejected() {
        let (owner, _) = member();
        let (_, stranger) = member();
        let story = story_by(owner.id, StoryCategory::Space);
        let id = story.id;

        let mut repo = MockStoryRepository::new();
        repo.expect_get_story()
            .with(eq(id))
            .returning(move |_| Ok(Some(story.clone())));
        repo.expect_patch_story().never();

        let patch = StoryPatch {
            title: Some("Hijacked".into()),
            ..StoryPatch::default()
        };
        let result = service(repo, MockMediaStorage::new())
            .update_story(&stranger, id, patch)
            .await;
        assert!(matches!(result, Err(DomainError::Forbidden(_))));
    }

    #[tokio::test]
    async fn update_returns_what_the_store_wrote() {
        let (owner, actor) = member();
        let mut story = story_by(owner.id, StoryCategory::Space);
        story.sound_url = Some("/media/stories/x/sound_1_hum.wav".into());
        let id = story.id;
        let read = story.clone();

        let mut repo = MockStoryRepository::new();
        repo.expect_get_story().returning(move |_| Ok(Some(read.clone())));
        repo.expect_patch_story()
            .withf(move |story_id, patch| *story_id == id && patch.clear_sound)
            .times(1)
            .returning(move |_, patch| {
                let mut written = story.clone();
                // a like landed between the read and the write
                written.like_count = 3;
                let released = written.apply_patch(patch, Utc::now());
                Ok(StoryWrite {
                    story: written,
                    released,
                })
            });
        let mut media = MockMediaStorage::new();
        media
            .expect_delete_object()
            .withf(|url| url == "/media/stories/x/sound_1_hum.wav")
            .times(1)
            .returning(|_| Ok(()));

        let patch = StoryPatch {
            clear_sound: true,
            ..StoryPatch::default()
        };
        let updated = assert_ok!(service(repo, media).update_story(&actor, id, patch).await);
        assert_eq!(updated.like_count, 3);
        assert!(updated.sound_url.is_none());
    }

    #[tokio::test]
    async fn non_owner_delete_is_rejected() {
        let (owner, _) = member();
        let (_, stranger) = member();
        let story = story_by(owner.id, StoryCategory::Space);
        let id = story.id;

        let mut repo = MockStoryRepository::new();
        repo.expect_get_story().returning(move |_| Ok(Some(story.clone())));
        repo.expect_delete_story().never();

        assert_err!(
            service(repo, MockMediaStorage::new())
                .delete_story(&stranger, id)
                .await
        );
    }

    #[tokio::test]
    async fn admin_delete_cascades_to_media() {
        let (owner, _) = member();
        let (_, admin) = admin();
        let mut story = story_by(owner.id, StoryCategory::Funny);
        story.image_url = Some("/media/stories/x/image_1_a.png".into());
        let id = story.id;

        let mut repo = MockStoryRepository::new();
        repo.expect_get_story().returning(move |_| Ok(Some(story.clone())));
        repo.expect_delete_story().with(eq(id)).times(1).returning(|_| Ok(true));

        let mut media = MockMediaStorage::new();
        media
            .expect_delete_object()
            .withf(|url| url == "/media/stories/x/image_1_a.png")
            .times(1)
            .returning(|_| Err(DomainError::Internal("disk gone".into())));

        // media failure is logged, not surfaced
        assert_ok!(service(repo, media).delete_story(&admin, id).await);
    }

    #[tokio::test]
    async fn get_missing_story_is_not_found() {
        let mut repo = MockStoryRepository::new();
        repo.expect_get_story().returning(|_| Ok(None));

        let result = service(repo, MockMediaStorage::new())
            .get_story(uuid::Uuid::now_v7())
            .await;
        assert!(matches!(result, Err(DomainError::NotFound(..))));
    }

    #[tokio::test]
    async fn list_degrades_to_empty_on_store_failure() {
        let mut repo = MockStoryRepository::new();
        repo.expect_list_stories()
            .returning(|| Err(DomainError::Internal("connection refused".into())));

        let stories = service(repo, MockMediaStorage::new()).list_stories().await;
        assert!(stories.is_empty());
    }

    #[tokio::test]
    async fn browse_filters_and_counts() {
        let author = uuid::Uuid::now_v7();
        let shelf = vec![
            story_by(author, StoryCategory::Space),
            story_by(author, StoryCategory::Mystery),
            story_by(author, StoryCategory::Space),
        ];
        let mut repo = MockStoryRepository::new();
        repo.expect_list_stories().returning(move || Ok(shelf.clone()));

        let catalog = service(repo, MockMediaStorage::new())
            .browse(CategoryFilter::Only(StoryCategory::Space))
            .await;
        assert_eq!(catalog.stories.len(), 2);
        assert_eq!(catalog.total, 3);
        assert_eq!(catalog.counts.iter().map(|c| c.count).sum::<usize>(), 3);
    }
}
