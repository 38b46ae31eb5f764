//! Admin-status queries and the user management view.

use std::sync::Arc;

use tracing::{error, info, instrument};

use domains::{Actor, DomainError, DomainResult, User, UserId, UserRepository};

pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Unknown users and store failures both read as "not an admin".
    pub async fn is_admin(&self, user_id: UserId) -> bool {
        match self.users.get_user(user_id).await {
            Ok(user) => user.is_some_and(|u| u.is_admin),
            Err(err) => {
                error!(error = %err, %user_id, "error checking admin status");
                false
            }
        }
    }

    pub async fn get_profile(&self, user_id: UserId) -> DomainResult<User> {
        self.users
            .get_user(user_id)
            .await?
            .ok_or_else(|| DomainError::not_found("user", user_id))
    }

    pub async fn list_users(&self, actor: &Actor) -> DomainResult<Vec<User>> {
        actor.require_admin()?;
        Ok(self.users.list_users().await.unwrap_or_else(|err| {
            error!(error = %err, "error fetching users");
            Vec::new()
        }))
    }

    /// Admins may not revoke their own flag.
    #[instrument(skip(self, actor))]
    pub async fn set_admin(
        &self,
        actor: &Actor,
        target: UserId,
        is_admin: bool,
    ) -> DomainResult<User> {
        let identity = actor.require_admin()?;
        if identity.user_id == target && !is_admin {
            return Err(DomainError::Conflict(
                "admins cannot revoke their own admin access".into(),
            ));
        }

        let user = self.users.set_admin(target, is_admin).await?;
        info!(user_id = %target, is_admin, by = %identity.user_id, "admin status changed");
        Ok(user)
    }
}
