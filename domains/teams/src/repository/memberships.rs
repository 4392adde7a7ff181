//! Membership repository

use async_trait::async_trait;
use codejam_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use super::MembershipStore;
use crate::domain::entities::Membership;

#[derive(Clone)]
pub struct MembershipRepository {
    pool: PgPool,
}

impl MembershipRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MembershipStore for MembershipRepository {
    async fn get(&self, team_id: Uuid, user_id: Uuid) -> Result<Option<Membership>, RepositoryError> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT team_id, user_id, team_role, created_on
            FROM team_members
            WHERE team_id = $1 AND user_id = $2
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(membership)
    }

    /// Fails with a `team_members_pkey` unique violation when the user is
    /// already on the team.
    async fn add(&self, membership: &Membership) -> Result<Membership, RepositoryError> {
        let created = sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO team_members (team_id, user_id, team_role, created_on)
            VALUES ($1, $2, $3, $4)
            RETURNING team_id, user_id, team_role, created_on
            "#,
        )
        .bind(membership.team_id)
        .bind(membership.user_id)
        .bind(membership.team_role)
        .bind(membership.created_on)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }
}
