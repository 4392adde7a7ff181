//! Team repository

use async_trait::async_trait;
use codejam_common::RepositoryError;
use sqlx::PgPool;
use uuid::Uuid;

use super::transactions::{create_membership_tx, create_team_tx};
use super::{RosterFilter, TeamStore};
use crate::domain::entities::{Membership, Team};
use crate::domain::roster::RosterRow;

const ROSTER_SELECT: &str = r#"
    SELECT t.id, t.event_id, t.name, t.visibility, t.timezone, t.technologies,
           t.availability, t.description, t.created_on,
           u.id AS user_id, u.display_name, u.avatar_url, u.service_user_id,
           m.team_role
    FROM teams t
    INNER JOIN team_members m ON m.team_id = t.id
    INNER JOIN users u ON u.id = m.user_id
"#;

const ROSTER_ORDER: &str = "ORDER BY t.created_on ASC, t.id ASC, m.created_on ASC";

#[derive(Clone)]
pub struct TeamRepository {
    pool: PgPool,
}

impl TeamRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TeamStore for TeamRepository {
    async fn create_with_owner(
        &self,
        team: &Team,
        owner: &Membership,
    ) -> Result<Team, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let created = create_team_tx(&mut tx, team).await?;
        create_membership_tx(&mut tx, owner).await?;

        // Dropping without commit rolls back
        tx.commit().await?;
        Ok(created)
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Team>, RepositoryError> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, event_id, name, visibility, timezone, technologies,
                   availability, description, created_on, invite_code
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    async fn get_by_invite_code(&self, invite_code: &str) -> Result<Option<Team>, RepositoryError> {
        let team = sqlx::query_as::<_, Team>(
            r#"
            SELECT id, event_id, name, visibility, timezone, technologies,
                   availability, description, created_on, invite_code
            FROM teams
            WHERE invite_code = $1
            "#,
        )
        .bind(invite_code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(team)
    }

    async fn update(&self, team: &Team) -> Result<Team, RepositoryError> {
        sqlx::query_as::<_, Team>(
            r#"
            UPDATE teams
            SET name = $2, visibility = $3, timezone = $4, technologies = $5,
                availability = $6, description = $7
            WHERE id = $1
            RETURNING id, event_id, name, visibility, timezone, technologies,
                      availability, description, created_on, invite_code
            "#,
        )
        .bind(team.id)
        .bind(&team.name)
        .bind(team.visibility)
        .bind(&team.timezone)
        .bind(&team.technologies)
        .bind(&team.availability)
        .bind(&team.description)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)
    }

    async fn roster_rows(&self, filter: RosterFilter) -> Result<Vec<RosterRow>, RepositoryError> {
        let rows = match filter {
            RosterFilter::All => {
                let sql = format!("{} {}", ROSTER_SELECT, ROSTER_ORDER);
                sqlx::query_as::<_, RosterRow>(&sql)
                    .fetch_all(&self.pool)
                    .await?
            }
            RosterFilter::Team(team_id) => {
                let sql = format!("{} WHERE t.id = $1 {}", ROSTER_SELECT, ROSTER_ORDER);
                sqlx::query_as::<_, RosterRow>(&sql)
                    .bind(team_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            RosterFilter::MemberOf(user_id) => {
                let sql = format!(
                    "{} WHERE t.id IN (SELECT team_id FROM team_members WHERE user_id = $1) {}",
                    ROSTER_SELECT, ROSTER_ORDER
                );
                sqlx::query_as::<_, RosterRow>(&sql)
                    .bind(user_id)
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        Ok(rows)
    }
}
