//! # create-admin
//!
//! `create-admin <email> <password> <displayName>`
//!
//! Creates an account with the admin flag set. Exits 1 on bad arguments
//! (including a password shorter than 6 characters) or any failure.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use secrecy::{ExposeSecret, SecretString};
use tracing_subscriber::EnvFilter;

use auth_adapters::{Argon2Hasher, JwtSessions};
use configs::Settings;
use domains::{User, UserRepository};
use services::{AuthService, RegisterRequest};
use storage_adapters::MemoryStore;

const USAGE: &str = "usage: create-admin <email> <password> <displayName>";

#[cfg(feature = "db-postgres")]
async fn user_store(settings: &Settings) -> anyhow::Result<Arc<dyn UserRepository>> {
    match &settings.database.url {
        Some(url) => Ok(Arc::new(
            storage_adapters::PgStore::connect(url.expose_secret(), 1).await?,
        )),
        None => memory_store(),
    }
}

#[cfg(not(feature = "db-postgres"))]
async fn user_store(settings: &Settings) -> anyhow::Result<Arc<dyn UserRepository>> {
    if settings.database.url.as_ref().is_some_and(|url| !url.expose_secret().is_empty()) {
        tracing::warn!("database.url is set but this build has no postgres support");
    }
    memory_store()
}

fn memory_store() -> anyhow::Result<Arc<dyn UserRepository>> {
    tracing::warn!("no database configured, the account only lives until this process exits");
    Ok(Arc::new(MemoryStore::new()))
}

async fn run(request: RegisterRequest) -> anyhow::Result<User> {
    let settings = Settings::read().context("loading settings")?;
    let users = user_store(&settings).await?;
    // bootstrap never issues a token, so any key will do
    let tokens = JwtSessions::new(
        &SecretString::from(uuid::Uuid::new_v4().to_string()),
        chrono::Duration::minutes(1),
    );
    let auth = AuthService::new(users, Arc::new(Argon2Hasher::new()), Arc::new(tokens));
    Ok(auth.bootstrap_admin(request).await?)
}

fn parse_args(args: &[String]) -> Option<RegisterRequest> {
    let [email, password, display_name] = args else {
        return None;
    };
    Some(RegisterRequest {
        email: email.clone(),
        password: password.clone(),
        display_name: display_name.clone(),
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(request) = parse_args(&args) else {
        eprintln!("{USAGE}");
        return ExitCode::FAILURE;
    };

    match run(request).await {
        Ok(user) => {
            println!("Admin user created: {} ({})", user.email, user.id);
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("Error creating admin user: {err:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn needs_exactly_three_arguments() {
        assert!(parse_args(&args(&["a@b.co", "secret1"])).is_none());
        assert!(parse_args(&args(&["a@b.co", "secret1", "Ann", "extra"])).is_none());

        let request = parse_args(&args(&["a@b.co", "secret1", "Ann"])).unwrap();
        assert_eq!(request.display_name, "Ann");
    }

    #[tokio::test]
    async fn short_password_is_refused() {
        let users: Arc<dyn UserRepository> = Arc::new(MemoryStore::new());
        let tokens = JwtSessions::new(&SecretString::from("k".to_string()), chrono::Duration::minutes(1));
        let auth = AuthService::new(users.clone(), Arc::new(Argon2Hasher::new()), Arc::new(tokens));

        let result = auth
            .bootstrap_admin(parse_args(&args(&["a@b.co", "12345", "Ann"])).unwrap())
            .await;
        assert!(result.is_err());
        assert!(users.list_users().await.unwrap().is_empty());

        let admin = auth
            .bootstrap_admin(parse_args(&args(&["a@b.co", "123456", "Ann"])).unwrap())
            .await
            .unwrap();
        assert!(admin.is_admin);
    }
}
