//! Multipart upload of a story's image or sound.
//!
//! Expects one part named `file`. When the part has no content type it is
//! guessed from the filename.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use mime::Mime;
use tracing::debug;

use domains::{MediaKind, MediaUpload, ProgressCallback, Story, StoryId};

use crate::error::{ApiError, ApiResult};
use crate::extract::{MultipartForm, PathParams, RequireSession};
use crate::state::AppState;

const FILE_FIELD: &str = "file";

pub async fn upload(
    State(state): State<AppState>,
    session: RequireSession,
    PathParams((story_id, kind)): PathParams<(StoryId, MediaKind)>,
    MultipartForm(mut multipart): MultipartForm,
) -> ApiResult<Json<Story>> {
    let mut upload = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload").to_string();
        let content_type = field
            .content_type()
            .and_then(|ct| ct.parse::<Mime>().ok())
            .unwrap_or_else(|| mime_guess::from_path(&filename).first_or_octet_stream());
        let data = field.bytes().await?;

        upload = Some(MediaUpload {
            story_id,
            kind,
            filename,
            content_type,
            data,
        });
        break;
    }
    let upload =
        upload.ok_or_else(|| ApiError::BadRequest(format!("missing multipart field `{FILE_FIELD}`")))?;

    let progress: ProgressCallback = Arc::new(move |percent| {
        debug!(%story_id, %kind, percent, "upload progress");
    });
    let story = state
        .media
        .attach(&session.actor(), upload, Some(progress))
        .await?;
    state.metrics.media_uploaded(kind);
    Ok(Json(story))
}
