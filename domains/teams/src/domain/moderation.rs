//! Admin moderation of user accounts
//!
//! Every action requires an admin actor and refuses admin targets.

use std::sync::Arc;

use codejam_common::{Error, RepositoryError, Result};
use uuid::Uuid;

use crate::domain::entities::{AccountStatus, User};
use crate::domain::validation::normalize_name;
use crate::repository::UserStore;

/// The actor must be an admin.
pub fn ensure_admin(actor: &User) -> Result<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(Error::Authorization("Admin role required".to_string()))
    }
}

/// Admins cannot be moderated.
pub fn ensure_moderatable(target: &User) -> Result<()> {
    if target.is_admin() {
        Err(Error::Authorization(
            "Admin accounts cannot be moderated".to_string(),
        ))
    } else {
        Ok(())
    }
}

#[derive(Clone)]
pub struct Moderation {
    users: Arc<dyn UserStore>,
}

impl Moderation {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }

    /// Load `actor_id` and require the admin role.
    pub async fn admin(&self, actor_id: Uuid) -> Result<User> {
        let actor = self
            .users
            .get_by_id(actor_id)
            .await
            .map_err(log_failure("load_actor", actor_id))?
            .ok_or_else(|| Error::Authorization("Admin role required".to_string()))?;
        ensure_admin(&actor)?;
        Ok(actor)
    }

    /// All users, admins first.
    pub async fn list_users(&self, actor: &User) -> Result<Vec<User>> {
        ensure_admin(actor)?;
        Ok(self.users.list_all().await.map_err(log_failure("list_users", actor.id))?)
    }

    pub async fn set_account_status(
        &self,
        actor: &User,
        target_id: Uuid,
        status: AccountStatus,
    ) -> Result<User> {
        self.target(actor, target_id).await?;
        let user = self
            .users
            .set_account_status(target_id, status)
            .await
            .map_err(log_failure("set_account_status", target_id))?;
        tracing::info!(actor_id = %actor.id, user_id = %target_id, status = %status, "Account status changed");
        Ok(user)
    }

    pub async fn ban(&self, actor: &User, target_id: Uuid) -> Result<User> {
        self.set_account_status(actor, target_id, AccountStatus::Banned)
            .await
    }

    pub async fn unban(&self, actor: &User, target_id: Uuid) -> Result<User> {
        self.set_account_status(actor, target_id, AccountStatus::Active)
            .await
    }

    pub async fn set_display_name(
        &self,
        actor: &User,
        target_id: Uuid,
        display_name: &str,
    ) -> Result<User> {
        ensure_admin(actor)?;
        let display_name = normalize_name(display_name)
            .ok_or_else(|| Error::Validation("Display name cannot be empty".to_string()))?;
        self.target(actor, target_id).await?;

        Ok(self
            .users
            .update_display_name(target_id, &display_name)
            .await
            .map_err(log_failure("set_display_name", target_id))?)
    }

    pub async fn set_display_name_lock(
        &self,
        actor: &User,
        target_id: Uuid,
        locked: bool,
    ) -> Result<User> {
        self.target(actor, target_id).await?;

        Ok(self
            .users
            .set_display_name_lock(target_id, locked)
            .await
            .map_err(log_failure("set_display_name_lock", target_id))?)
    }

    async fn target(&self, actor: &User, target_id: Uuid) -> Result<User> {
        ensure_admin(actor)?;
        let target = self
            .users
            .get_by_id(target_id)
            .await
            .map_err(log_failure("load_target", target_id))?
            .ok_or_else(|| Error::NotFound("User not found".to_string()))?;
        ensure_moderatable(&target)?;
        Ok(target)
    }
}

fn log_failure(operation: &'static str, user_id: Uuid) -> impl FnOnce(RepositoryError) -> RepositoryError {
    move |err| {
        if !matches!(err, RepositoryError::NotFound) {
            tracing::error!(operation, user_id = %user_id, error = %err, "User store failure");
        }
        err
    }
}
