//! # Authentication
//!
//! Register, login, logout and per-request session resolution. A [`Session`]
//! is created at sign-in and torn down at sign-out by revoking its token id;
//! there is no process-wide "current user".

use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use domains::validation;
use domains::{
    Actor, CredentialHasher, DomainError, DomainResult, IssuedToken, NewUser, SessionTokens,
    TokenClaims, User, UserRepository,
};

const INVALID_LOGIN: &str = "Invalid email or password";

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub display_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// A signed-in user plus the token that proves it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user: User,
    #[serde(skip)]
    claims: TokenClaims,
}

impl Session {
    fn new(token: String, claims: TokenClaims, user: User) -> Self {
        let expires_at = Utc
            .timestamp_opt(claims.exp, 0)
            .single()
            .unwrap_or_else(Utc::now);
        Self {
            token,
            expires_at,
            user,
            claims,
        }
    }

    pub fn actor(&self) -> Actor {
        Actor::from_user(&self.user)
    }

    pub fn token_id(&self) -> &str {
        &self.claims.jti
    }
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn CredentialHasher>,
    tokens: Arc<dyn SessionTokens>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn CredentialHasher>,
        tokens: Arc<dyn SessionTokens>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
        }
    }

    /// New accounts are never admins.
    #[instrument(skip_all)]
    pub async fn register(&self, request: RegisterRequest) -> DomainResult<Session> {
        let user = self.create_account(request, false).await?;
        info!(user_id = %user.id, "user registered");
        self.start_session(user)
    }

    #[instrument(skip_all)]
    pub async fn login(&self, request: LoginRequest) -> DomainResult<Session> {
        let email = request.email.trim().to_ascii_lowercase();
        let Some(credentials) = self.users.find_credentials(&email).await? else {
            return Err(DomainError::Unauthorized(INVALID_LOGIN.into()));
        };
        if !self
            .hasher
            .verify_password(&request.password, &credentials.password_hash)
        {
            warn!(user_id = %credentials.user.id, "failed login");
            return Err(DomainError::Unauthorized(INVALID_LOGIN.into()));
        }

        info!(user_id = %credentials.user.id, "user signed in");
        self.start_session(credentials.user)
    }

    pub fn logout(&self, session: &Session) {
        self.tokens.revoke(&session.claims);
        info!(user_id = %session.user.id, "user signed out");
    }

    /// Reloads the user every time so admin changes apply immediately.
    pub async fn resolve(&self, token: &str) -> DomainResult<Session> {
        let claims = self.tokens.verify(token)?;
        if self.tokens.is_revoked(&claims.jti) {
            return Err(DomainError::Unauthorized("session has ended".into()));
        }
        let user = self
            .users
            .get_user(claims.sub)
            .await?
            .ok_or_else(|| DomainError::Unauthorized("account no longer exists".into()))?;
        Ok(Session::new(token.to_string(), claims, user))
    }

    /// Creates the first admin; used by the `create-admin` CLI.
    #[instrument(skip_all)]
    pub async fn bootstrap_admin(&self, request: RegisterRequest) -> DomainResult<User> {
        let user = self.create_account(request, true).await?;
        info!(user_id = %user.id, "admin account created");
        Ok(user)
    }

    async fn create_account(&self, request: RegisterRequest, is_admin: bool) -> DomainResult<User> {
        let email = validation::email(&request.email)?;
        validation::password(&request.password)?;
        let display_name = validation::required("display name", &request.display_name)?;
        let password_hash = self.hasher.hash_password(&request.password)?;

        self.users
            .insert_user(NewUser {
                email,
                display_name,
                password_hash,
                is_admin,
            })
            .await
    }

    fn start_session(&self, user: User) -> DomainResult<Session> {
        let IssuedToken { token, claims } = self.tokens.issue(user.id)?;
        Ok(Session::new(token, claims, user))
    }
}
