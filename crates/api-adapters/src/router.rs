//! Route table and middleware stack.

use std::path::PathBuf;
use std::time::Duration;

use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, Request};
use axum::routing::{get, post, put};
use axum::Router;
use tower::ServiceBuilder;
use tower_http::compression::CompressionLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info_span, warn};

use crate::handlers::{account, admin, auth, media, stories, system};
use crate::state::AppState;

/// Multipart framing on top of the file itself
const MULTIPART_OVERHEAD: usize = 64 * 1024;

#[derive(Debug, Clone, Default)]
pub struct RouterSettings {
    /// Directory served under the public media prefix, if any
    pub media_root: Option<PathBuf>,
    pub cors_origins: Vec<String>,
}

fn cors(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::PATCH, Method::DELETE])
        .allow_headers(Any)
        .max_age(Duration::from_secs(60 * 60));

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(%origin, "ignoring unparseable CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

pub fn router(state: AppState, settings: &RouterSettings) -> Router {
    let upload_limit = state.media.max_upload_bytes() + MULTIPART_OVERHEAD;

    let api = Router::new()
        .route("/health", get(system::health))
        .route("/metrics", get(system::metrics))
        .route("/config/public", get(system::public_config))
        .route("/categories", get(system::categories))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/stories", get(stories::browse).post(stories::create))
        .route(
            "/stories/{id}",
            get(stories::show).patch(stories::update).delete(stories::delete),
        )
        .route("/stories/{id}/like", post(stories::toggle_like))
        .route("/stories/{id}/likes", get(stories::likes))
        .route(
            "/stories/{id}/media/{kind}",
            post(media::upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/authors/{id}/stories", get(stories::by_author))
        .route("/users/{id}", get(account::profile))
        .route("/me/likes", get(account::my_likes))
        .route("/dashboard", get(account::dashboard))
        .route("/admin/users", get(admin::users))
        .route("/admin/users/{id}/admin", put(admin::set_admin))
        .route("/admin/likes", get(admin::likes));

    let api = match &settings.media_root {
        Some(root) => api.nest_service(&state.public_config.media_url_prefix, ServeDir::new(root)),
        None => api,
    };

    let middleware = ServiceBuilder::new()
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<Body>| {
                let request_id = request
                    .headers()
                    .get("x-request-id")
                    .and_then(|v| v.to_str().ok())
                    .unwrap_or("-");
                info_span!(
                    "http",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id,
                )
            }),
        )
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(CompressionLayer::new())
        .layer(cors(&settings.cors_origins));

    api.layer(middleware).with_state(state)
}
