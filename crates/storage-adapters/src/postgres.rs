//! # PostgreSQL store
//!
//! Maps the relational model onto the domain types. Like toggles run in a
//! transaction that locks the story row with `SELECT ... FOR UPDATE`, so
//! concurrent toggles on one story serialize inside the database.

use anyhow::Context;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use tracing::{debug, info};

use domains::{
    DomainError, DomainResult, Like, LikeRepository, LikeToggle, MediaKind, NewUser, Story,
    StoryId, StoryRepository, StoryWrite, User, UserCredentials, UserId, UserRepository,
    ValidPatch,
};

const STORY_COLUMNS: &str = "id, title, description, content, category, author_id, author_name, \
     image_url, sound_url, youtube_url, like_count, created_at, updated_at";
const USER_COLUMNS: &str = "id, email, display_name, is_admin, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Opens a pool and applies pending migrations.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await
            .context("connecting to postgres")?;
        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .context("running migrations")?;
        info!(max_connections, "postgres store ready");
        Ok(Self { pool })
    }

    /// Locks the story row, edits it and writes the editable columns back in
    /// one transaction. `like_count` is read but never written here.
    async fn rewrite<F>(&self, id: StoryId, edit: F) -> DomainResult<StoryWrite>
    where
        F: FnOnce(&mut Story) -> Vec<String> + Send,
    {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        let row = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_error)?;
        let Some(row) = row else {
            return Err(DomainError::not_found("story", id));
        };
        let mut story = story_from_row(&row)?;
        let released = edit(&mut story);

        let row = sqlx::query(&format!(
            "UPDATE stories SET title = $2, description = $3, content = $4, category = $5, \
             image_url = $6, sound_url = $7, youtube_url = $8, updated_at = $9 \
             WHERE id = $1 RETURNING {STORY_COLUMNS}"
        ))
        .bind(id)
        .bind(&story.title)
        .bind(&story.description)
        .bind(&story.content)
        .bind(story.category.as_str())
        .bind(&story.image_url)
        .bind(&story.sound_url)
        .bind(&story.youtube_url)
        .bind(story.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(db_error)?;
        let story = story_from_row(&row)?;

        tx.commit().await.map_err(db_error)?;
        Ok(StoryWrite { story, released })
    }
}

fn db_error(err: sqlx::Error) -> DomainError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() && db.constraint() == Some("users_email_key") {
            return DomainError::Conflict("This email is already registered".into());
        }
    }
    DomainError::internal(err)
}

fn story_from_row(row: &PgRow) -> DomainResult<Story> {
    let category: String = row.try_get("category").map_err(db_error)?;
    let like_count: i64 = row.try_get("like_count").map_err(db_error)?;
    Ok(Story {
        id: row.try_get("id").map_err(db_error)?,
        title: row.try_get("title").map_err(db_error)?,
        description: row.try_get("description").map_err(db_error)?,
        content: row.try_get("content").map_err(db_error)?,
        category: category.parse()?,
        author_id: row.try_get("author_id").map_err(db_error)?,
        author_name: row.try_get("author_name").map_err(db_error)?,
        image_url: row.try_get("image_url").map_err(db_error)?,
        sound_url: row.try_get("sound_url").map_err(db_error)?,
        youtube_url: row.try_get("youtube_url").map_err(db_error)?,
        like_count: u64::try_from(like_count).unwrap_or(0),
        created_at: row.try_get("created_at").map_err(db_error)?,
        updated_at: row.try_get("updated_at").map_err(db_error)?,
    })
}

fn user_from_row(row: &PgRow) -> DomainResult<User> {
    Ok(User {
        id: row.try_get("id").map_err(db_error)?,
        email: row.try_get("email").map_err(db_error)?,
        display_name: row.try_get("display_name").map_err(db_error)?,
        is_admin: row.try_get("is_admin").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
        updated_at: row.try_get("updated_at").map_err(db_error)?,
    })
}

fn like_from_row(row: &PgRow) -> DomainResult<Like> {
    Ok(Like {
        story_id: row.try_get("story_id").map_err(db_error)?,
        user_id: row.try_get("user_id").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
    })
}

fn collect<T>(rows: Vec<PgRow>, map: fn(&PgRow) -> DomainResult<T>) -> DomainResult<Vec<T>> {
    rows.iter().map(map).collect()
}

#[async_trait]
impl StoryRepository for PgStore {
    async fn insert_story(&self, story: Story) -> DomainResult<()> {
        sqlx::query(&format!(
            "INSERT INTO stories ({STORY_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)"
        ))
        .bind(story.id)
        .bind(&story.title)
        .bind(&story.description)
        .bind(&story.content)
        .bind(story.category.as_str())
        .bind(story.author_id)
        .bind(&story.author_name)
        .bind(&story.image_url)
        .bind(&story.sound_url)
        .bind(&story.youtube_url)
        .bind(i64::try_from(story.like_count).unwrap_or(i64::MAX))
        .bind(story.created_at)
        .bind(story.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn get_story(&self, id: StoryId) -> DomainResult<Option<Story>> {
        let row = sqlx::query(&format!("SELECT {STORY_COLUMNS} FROM stories WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(story_from_row).transpose()
    }

    async fn list_stories(&self) -> DomainResult<Vec<Story>> {
        let rows = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        collect(rows, story_from_row)
    }

    async fn list_stories_by_author(&self, author_id: UserId) -> DomainResult<Vec<Story>> {
        let rows = sqlx::query(&format!(
            "SELECT {STORY_COLUMNS} FROM stories WHERE author_id = $1 \
             ORDER BY created_at DESC, id DESC"
        ))
        .bind(author_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        collect(rows, story_from_row)
    }

    async fn patch_story(&self, id: StoryId, patch: ValidPatch) -> DomainResult<StoryWrite> {
        self.rewrite(id, |story| story.apply_patch(patch, Utc::now())).await
    }

    async fn set_media_url(&self, id: StoryId, kind: MediaKind, url: String) -> DomainResult<StoryWrite> {
        self.rewrite(id, |story| {
            story.set_media(kind, url, Utc::now()).into_iter().collect()
        })
        .await
    }

    async fn delete_story(&self, id: StoryId) -> DomainResult<bool> {
        // likes go with it through ON DELETE CASCADE
        let result = sqlx::query("DELETE FROM stories WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error)?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert_user(&self, user: NewUser) -> DomainResult<User> {
        let (user, password_hash) = user.into_user(Utc::now());
        sqlx::query(
            "INSERT INTO users (id, email, display_name, password_hash, is_admin, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.display_name)
        .bind(&password_hash)
        .bind(user.is_admin)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> DomainResult<Option<User>> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error)?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn find_credentials(&self, email: &str) -> DomainResult<Option<UserCredentials>> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE email = $1"
        ))
        .bind(email.to_ascii_lowercase())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(UserCredentials {
            user: user_from_row(&row)?,
            password_hash: row.try_get("password_hash").map_err(db_error)?,
        }))
    }

    async fn list_users(&self) -> DomainResult<Vec<User>> {
        let rows = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        collect(rows, user_from_row)
    }

    async fn set_admin(&self, id: UserId, is_admin: bool) -> DomainResult<User> {
        let row = sqlx::query(&format!(
            "UPDATE users SET is_admin = $2, updated_at = $3 WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(id)
        .bind(is_admin)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        match row {
            Some(row) => user_from_row(&row),
            None => Err(DomainError::not_found("user", id)),
        }
    }
}

#[async_trait]
impl LikeRepository for PgStore {
    async fn toggle_like(&self, story_id: StoryId, user_id: UserId) -> DomainResult<LikeToggle> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;

        // 1. Lock the story row; dropping `tx` on any early return rolls back
        let current: Option<i64> =
            sqlx::query_scalar("SELECT like_count FROM stories WHERE id = $1 FOR UPDATE")
                .bind(story_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_error)?;
        let Some(current) = current else {
            return Err(DomainError::not_found("story", story_id));
        };

        // 2. Flip the like record
        let removed = sqlx::query("DELETE FROM likes WHERE story_id = $1 AND user_id = $2")
            .bind(story_id)
            .bind(user_id)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?
            .rows_affected()
            > 0;

        let like_count = if removed {
            (current - 1).max(0)
        } else {
            sqlx::query("INSERT INTO likes (story_id, user_id, created_at) VALUES ($1, $2, $3)")
                .bind(story_id)
                .bind(user_id)
                .bind(Utc::now())
                .execute(&mut *tx)
                .await
                .map_err(db_error)?;
            current + 1
        };

        // 3. Write the counter back
        sqlx::query("UPDATE stories SET like_count = $2 WHERE id = $1")
            .bind(story_id)
            .bind(like_count)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;

        tx.commit().await.map_err(db_error)?;
        debug!(%story_id, %user_id, liked = !removed, like_count, "like toggle committed");

        Ok(LikeToggle {
            liked: !removed,
            like_count: u64::try_from(like_count).unwrap_or(0),
        })
    }

    async fn has_liked(&self, story_id: StoryId, user_id: UserId) -> DomainResult<bool> {
        sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM likes WHERE story_id = $1 AND user_id = $2)",
        )
        .bind(story_id)
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error)
    }

    async fn likes_for_story(&self, story_id: StoryId) -> DomainResult<Vec<Like>> {
        let rows = sqlx::query(
            "SELECT story_id, user_id, created_at FROM likes WHERE story_id = $1 \
             ORDER BY created_at DESC",
        )
        .bind(story_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        collect(rows, like_from_row)
    }

    async fn likes_by_user(&self, user_id: UserId) -> DomainResult<Vec<Like>> {
        let rows = sqlx::query(
            "SELECT story_id, user_id, created_at FROM likes WHERE user_id = $1 \
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        collect(rows, like_from_row)
    }

    async fn all_likes(&self) -> DomainResult<Vec<Like>> {
        let rows =
            sqlx::query("SELECT story_id, user_id, created_at FROM likes ORDER BY created_at DESC")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error)?;
        collect(rows, like_from_row)
    }
}
