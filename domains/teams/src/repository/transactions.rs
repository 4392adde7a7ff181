//! Transactional free functions for the Teams domain

use crate::domain::entities::{Membership, Team};
use sqlx::{Postgres, Transaction};

/// Insert a team within an existing transaction.
pub async fn create_team_tx(
    transaction: &mut Transaction<'_, Postgres>,
    team: &Team,
) -> std::result::Result<Team, sqlx::Error> {
    sqlx::query_as::<_, Team>(
        r#"
        INSERT INTO teams (id, event_id, name, visibility, timezone, technologies,
                           availability, description, created_on, invite_code)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        RETURNING id, event_id, name, visibility, timezone, technologies,
                  availability, description, created_on, invite_code
        "#,
    )
    .bind(team.id)
    .bind(team.event_id)
    .bind(&team.name)
    .bind(team.visibility)
    .bind(&team.timezone)
    .bind(&team.technologies)
    .bind(&team.availability)
    .bind(&team.description)
    .bind(team.created_on)
    .bind(&team.invite_code)
    .fetch_one(&mut **transaction)
    .await
}

/// Insert a membership within an existing transaction.
pub async fn create_membership_tx(
    transaction: &mut Transaction<'_, Postgres>,
    membership: &Membership,
) -> std::result::Result<Membership, sqlx::Error> {
    sqlx::query_as::<_, Membership>(
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
    .fetch_one(&mut **transaction)
    .await
}
