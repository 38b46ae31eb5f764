//! HS256 session tokens.
//!
//! Revoked token ids are remembered until the token would have expired
//! anyway; the list is pruned whenever a token is revoked.

use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use tracing::debug;
use uuid::Uuid;

use domains::{DomainError, DomainResult, IssuedToken, SessionTokens, TokenClaims, UserId};

pub struct JwtSessions {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: Duration,
    /// jti to expiry (unix seconds)
    revoked: DashMap<String, i64>,
}

impl JwtSessions {
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let key = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(key),
            decoding: DecodingKey::from_secret(key),
            validation: Validation::new(Algorithm::HS256),
            ttl,
            revoked: DashMap::new(),
        }
    }

    fn prune_revoked(&self) {
        let now = Utc::now().timestamp();
        self.revoked.retain(|_, exp| *exp > now);
    }
}

impl SessionTokens for JwtSessions {
    fn issue(&self, user_id: UserId) -> DomainResult<IssuedToken> {
        let now = Utc::now();
        let claims = TokenClaims {
            sub: user_id,
            jti: Uuid::new_v4().to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(DomainError::internal)?;
        Ok(IssuedToken { token, claims })
    }

    fn verify(&self, token: &str) -> DomainResult<TokenClaims> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(|err| {
                debug!(error = %err, "rejected session token");
                DomainError::Unauthorized("invalid or expired session".into())
            })
    }

    fn revoke(&self, claims: &TokenClaims) {
        self.prune_revoked();
        self.revoked.insert(claims.jti.clone(), claims.exp);
    }

    fn is_revoked(&self, token_id: &str) -> bool {
        self.revoked.contains_key(token_id)
    }
}
