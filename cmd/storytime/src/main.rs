//! # storytime
//!
//! Loads settings, wires the adapters into the services and serves the API
//! until SIGINT/SIGTERM.

mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use secrecy::ExposeSecret;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{info, warn};

use api_adapters::{router, AppState, Ports, RouterSettings};
use auth_adapters::{Argon2Hasher, JwtSessions};
use configs::{DatabaseSettings, Settings};
use domains::{LikeRepository, StoryRepository, UserRepository};
use storage_adapters::{LocalMediaStorage, MemoryStore};

struct Stores {
    stories: Arc<dyn StoryRepository>,
    users: Arc<dyn UserRepository>,
    likes: Arc<dyn LikeRepository>,
}

#[cfg(feature = "db-postgres")]
async fn postgres(db: &DatabaseSettings) -> anyhow::Result<Option<Stores>> {
    let Some(url) = &db.url else {
        return Ok(None);
    };
    let store = Arc::new(
        storage_adapters::PgStore::connect(url.expose_secret(), db.max_connections).await?,
    );
    Ok(Some(Stores {
        stories: store.clone(),
        users: store.clone(),
        likes: store,
    }))
}

#[cfg(not(feature = "db-postgres"))]
async fn postgres(db: &DatabaseSettings) -> anyhow::Result<Option<Stores>> {
    if db.url.as_ref().is_some_and(|url| !url.expose_secret().is_empty()) {
        warn!("database.url is set but this build has no postgres support");
    }
    Ok(None)
}

async fn stores(db: &DatabaseSettings) -> anyhow::Result<Stores> {
    if let Some(stores) = postgres(db).await? {
        return Ok(stores);
    }
    warn!("no database configured, data will not survive a restart");
    let memory = Arc::new(MemoryStore::new());
    Ok(Stores {
        stories: memory.clone(),
        users: memory.clone(),
        likes: memory,
    })
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().context("loading settings")?;
    telemetry::init(&settings.log);

    let Stores { stories, users, likes } = stores(&settings.database).await?;
    tokio::fs::create_dir_all(&settings.media.root)
        .await
        .with_context(|| format!("creating media root {}", settings.media.root.display()))?;

    let ttl = chrono::Duration::seconds(i64::try_from(settings.auth.session_ttl_secs)?);
    let ports = Ports {
        stories,
        users,
        likes,
        media: Arc::new(LocalMediaStorage::new(
            settings.media.root.clone(),
            settings.media.url_prefix.clone(),
        )),
        hasher: Arc::new(Argon2Hasher::new()),
        tokens: Arc::new(JwtSessions::new(&settings.auth.jwt_secret, ttl)),
    };

    let app = router(
        AppState::new(ports, settings.public()),
        &RouterSettings {
            media_root: Some(settings.media.root.clone()),
            cors_origins: settings.server.cors_origins.clone(),
        },
    );

    let address = settings.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("binding {address}"))?;
    info!(%address, "storytime listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            warn!(error = %err, "failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
        info!("received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
                info!("received terminate signal, shutting down");
            }
            Err(err) => {
                warn!(error = %err, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
