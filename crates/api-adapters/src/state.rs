use std::sync::Arc;

use configs::PublicConfig;
use domains::{
    CredentialHasher, LikeRepository, MediaStorage, SessionTokens, StoryRepository,
    UserRepository,
};
use services::{
    AuthService, DashboardService, LikeService, MediaService, StoryService, UserService,
};

use crate::metrics::Metrics;

/// The adapters a running instance is wired with.
#[derive(Clone)]
pub struct Ports {
    pub stories: Arc<dyn StoryRepository>,
    pub users: Arc<dyn UserRepository>,
    pub likes: Arc<dyn LikeRepository>,
    pub media: Arc<dyn MediaStorage>,
    pub hasher: Arc<dyn CredentialHasher>,
    pub tokens: Arc<dyn SessionTokens>,
}

/// State shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub auth: Arc<AuthService>,
    pub stories: Arc<StoryService>,
    pub likes: Arc<LikeService>,
    pub users: Arc<UserService>,
    pub media: Arc<MediaService>,
    pub dashboard: Arc<DashboardService>,
    pub public_config: Arc<PublicConfig>,
    pub metrics: Arc<Metrics>,
}

impl AppState {
    pub fn new(ports: Ports, public_config: PublicConfig) -> Self {
        let max_upload_bytes = public_config.max_upload_bytes;
        Self {
            auth: Arc::new(AuthService::new(
                ports.users.clone(),
                ports.hasher,
                ports.tokens,
            )),
            stories: Arc::new(StoryService::new(ports.stories.clone(), ports.media.clone())),
            likes: Arc::new(LikeService::new(ports.likes, ports.stories.clone())),
            users: Arc::new(UserService::new(ports.users.clone())),
            media: Arc::new(MediaService::new(
                ports.stories.clone(),
                ports.media,
                max_upload_bytes,
            )),
            dashboard: Arc::new(DashboardService::new(ports.stories, ports.users)),
            public_config: Arc::new(public_config),
            metrics: Arc::new(Metrics::new()),
        }
    }
}
