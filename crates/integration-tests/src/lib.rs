//! Shared harness: a fully wired app over the in-memory store, local media
//! in a temp dir and real Argon2/JWT adapters.

use std::sync::Arc;

use api_adapters::{router, AppState, Ports, RouterSettings};
use auth_adapters::{Argon2Hasher, JwtSessions};
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use configs::PublicConfig;
use domains::{Story, StoryCategory, StoryDraft};
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::faker::name::en::Name;
use fake::Fake;
use secrecy::SecretString;
use serde_json::Value;
use services::{RegisterRequest, Session};
use storage_adapters::{LocalMediaStorage, MemoryStore};
use tempfile::TempDir;
use tower::ServiceExt;

pub const PASSWORD: &str = "bedtime-123";
pub const MAX_UPLOAD_BYTES: usize = 256 * 1024;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    media: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let media = tempfile::tempdir().expect("temp media dir");
        let store = Arc::new(MemoryStore::new());
        let ports = Ports {
            stories: store.clone(),
            users: store.clone(),
            likes: store.clone(),
            media: Arc::new(LocalMediaStorage::new(media.path(), "/media")),
            hasher: Arc::new(Argon2Hasher::new()),
            tokens: Arc::new(JwtSessions::new(
                &SecretString::from("integration-secret".to_string()),
                chrono::Duration::hours(1),
            )),
        };
        let public = PublicConfig {
            project_id: "storytime-it".into(),
            api_key: None,
            captcha_site_key: Some("site-key".into()),
            media_url_prefix: "/media".into(),
            max_upload_bytes: MAX_UPLOAD_BYTES,
        };
        let state = AppState::new(ports, public);
        let router = router(
            state.clone(),
            &RouterSettings {
                media_root: Some(media.path().to_path_buf()),
                cors_origins: Vec::new(),
            },
        );
        Self {
            router,
            state,
            store,
            media,
        }
    }

    pub fn media_root(&self) -> &std::path::Path {
        self.media.path()
    }

    /// Registers through the service layer with generated details.
    pub async fn member(&self) -> Session {
        self.state
            .auth
            .register(register_request())
            .await
            .expect("register member")
    }

    pub async fn admin(&self) -> Session {
        let request = register_request();
        self.state
            .auth
            .bootstrap_admin(request.clone())
            .await
            .expect("bootstrap admin");
        self.state
            .auth
            .login(services::LoginRequest {
                email: request.email,
                password: request.password,
            })
            .await
            .expect("admin login")
    }

    pub async fn story(&self, session: &Session, category: StoryCategory) -> Story {
        self.state
            .stories
            .create_story(&session.actor(), draft(category))
            .await
            .expect("create story")
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.expect("router");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        (status, body)
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

pub fn register_request() -> RegisterRequest {
    RegisterRequest {
        // prefixed so generated addresses never collide within one store
        email: format!("{}.{}", uuid::Uuid::new_v4().simple(), SafeEmail().fake::<String>()),
        password: PASSWORD.into(),
        display_name: Name().fake(),
    }
}

pub fn draft(category: StoryCategory) -> StoryDraft {
    StoryDraft {
        title: Sentence(2..5).fake(),
        description: None,
        content: Paragraph(1..3).fake(),
        category,
        author_name: None,
        youtube_url: None,
    }
}

pub fn random_category() -> StoryCategory {
    StoryCategory::ALL[(0..StoryCategory::ALL.len()).fake::<usize>()]
}

pub fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };
    builder.body(body).expect("request")
}
