//! # Access Model
//!
//! Who may do what. Every mutating service call takes an [`Actor`] and asks
//! it before touching a repository.

use serde::Serialize;

use crate::errors::{DomainError, DomainResult};
use crate::models::{Story, User, UserId};

/// The signed-in person behind a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Identity {
    pub user_id: UserId,
    pub email: String,
    pub display_name: String,
}

impl From<&User> for Identity {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            display_name: user.display_name.clone(),
        }
    }
}

/// The three capability tiers.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Actor {
    #[default]
    Anonymous,
    Member(Identity),
    Admin(Identity),
}

impl Actor {
    pub fn from_user(user: &User) -> Self {
        let identity = Identity::from(user);
        if user.is_admin {
            Actor::Admin(identity)
        } else {
            Actor::Member(identity)
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        match self {
            Actor::Anonymous => None,
            Actor::Member(identity) | Actor::Admin(identity) => Some(identity),
        }
    }

    pub fn user_id(&self) -> Option<UserId> {
        self.identity().map(|i| i.user_id)
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Actor::Admin(_))
    }

    /// Creating and liking both need nothing more than a signed-in identity.
    pub fn require_identity(&self) -> DomainResult<&Identity> {
        self.identity()
            .ok_or_else(|| DomainError::Unauthorized("sign in required".into()))
    }

    pub fn require_admin(&self) -> DomainResult<&Identity> {
        match self {
            Actor::Admin(identity) => Ok(identity),
            Actor::Member(_) => Err(DomainError::Forbidden("admin privileges required".into())),
            Actor::Anonymous => Err(DomainError::Unauthorized("sign in required".into())),
        }
    }

    pub fn can_modify(&self, story: &Story) -> bool {
        match self {
            Actor::Admin(_) => true,
            Actor::Member(identity) => story.is_authored_by(identity.user_id),
            Actor::Anonymous => false,
        }
    }

    /// Edit, delete and media attachment share this check.
    pub fn ensure_can_modify(&self, story: &Story) -> DomainResult<()> {
        self.require_identity()?;
        if self.can_modify(story) {
            Ok(())
        } else {
            Err(DomainError::Forbidden(
                "only the author or an admin may change this story".into(),
            ))
        }
    }
}
