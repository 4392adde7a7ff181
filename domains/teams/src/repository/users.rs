//! User repository

use std::sync::Arc;

use async_trait::async_trait;
use codejam_auth::{Account, AccountDirectory, ExternalIdentity};
use codejam_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use super::UserStore;
use crate::domain::entities::{AccountStatus, User};

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for UserRepository {
    async fn get_by_id(&self, id: Uuid) -> Result<Option<User>, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, service_name, service_user_id, service_user_name, role,
                   display_name, avatar_url, account_status, lock_display_name, created_on
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn list_all(&self) -> Result<Vec<User>, RepositoryError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, service_name, service_user_id, service_user_name, role,
                   display_name, avatar_url, account_status, lock_display_name, created_on
            FROM users
            ORDER BY (role = 'ADMIN') DESC, service_user_name ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(users)
    }

    async fn upsert_identity(&self, identity: &ExternalIdentity) -> Result<User, RepositoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, service_name, service_user_id, service_user_name,
                               display_name, avatar_url)
            VALUES ($1, $2, $3, $4, $4, $5)
            ON CONFLICT ON CONSTRAINT users_provider_identity_key DO UPDATE
            SET service_user_name = EXCLUDED.service_user_name,
                avatar_url = EXCLUDED.avatar_url
            RETURNING id, service_name, service_user_id, service_user_name, role,
                      display_name, avatar_url, account_status, lock_display_name, created_on
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(identity.provider.name())
        .bind(&identity.provider_user_id)
        .bind(&identity.display_name)
        .bind(&identity.avatar_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(user)
    }

    async fn update_display_name(
        &self,
        id: Uuid,
        display_name: &str,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET display_name = $2
            WHERE id = $1
            RETURNING id, service_name, service_user_id, service_user_name, role,
                      display_name, avatar_url, account_status, lock_display_name, created_on
            "#,
        )
        .bind(id)
        .bind(display_name)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn set_account_status(
        &self,
        id: Uuid,
        status: AccountStatus,
    ) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET account_status = $2
            WHERE id = $1
            RETURNING id, service_name, service_user_id, service_user_name, role,
                      display_name, avatar_url, account_status, lock_display_name, created_on
            "#,
        )
        .bind(id)
        .bind(status)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn set_display_name_lock(&self, id: Uuid, locked: bool) -> Result<User, RepositoryError> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users SET lock_display_name = $2
            WHERE id = $1
            RETURNING id, service_name, service_user_id, service_user_name, role,
                      display_name, avatar_url, account_status, lock_display_name, created_on
            "#,
        )
        .bind(id)
        .bind(locked)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }
}

/// Records login identities as users for the auth login flow.
#[derive(Clone)]
pub struct UserAccounts {
    users: Arc<dyn UserStore>,
}

impl UserAccounts {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}

#[async_trait]
impl AccountDirectory for UserAccounts {
    async fn upsert_identity(
        &self,
        identity: &ExternalIdentity,
    ) -> Result<Account, RepositoryError> {
        let user = self.users.upsert_identity(identity).await?;
        Ok(Account {
            user_id: user.id,
            display_name: user.display_name,
        })
    }
}
