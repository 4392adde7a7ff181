//! Team handlers
//!
//! Creation, joining, lookup, owner edits and roster listings. Membership
//! rules are enforced by `MembershipCoordinator`.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use codejam_auth::SessionUser;
use codejam_common::{Error, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::TeamsState;
use crate::domain::coordinator::TeamDetails;
use crate::domain::entities::{Membership, Team, TeamAttributes, TeamVisibility};
use crate::domain::roster::TeamRoster;
use crate::domain::validation::normalize_name;

/// Editable team fields shared by create and update
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct TeamFields {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    pub visibility: TeamVisibility,
    #[validate(length(max = 100))]
    #[serde(default)]
    pub timezone: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub technologies: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub availability: String,
    #[validate(length(max = 2000))]
    #[serde(default)]
    pub description: String,
}

impl TeamFields {
    fn into_attributes(self) -> Result<TeamAttributes> {
        let name = normalize_name(&self.name)
            .ok_or_else(|| Error::Validation("Team name cannot be empty".to_string()))?;
        Ok(TeamAttributes {
            name,
            visibility: self.visibility,
            timezone: self.timezone.trim().to_string(),
            technologies: self.technologies,
            availability: self.availability,
            description: self.description,
        })
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTeamRequest {
    pub event_id: Uuid,
    #[serde(flatten)]
    #[validate(nested)]
    pub team: TeamFields,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinTeamRequest {
    pub team_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct CreatedTeam {
    pub id: Uuid,
}

/// **POST /team**
pub async fn create_team(
    session: SessionUser,
    State(state): State<TeamsState>,
    ValidatedJson(request): ValidatedJson<CreateTeamRequest>,
) -> Result<(StatusCode, Json<CreatedTeam>)> {
    let attributes = request.team.into_attributes()?;
    let team = state
        .coordinator
        .create_team(session.user_id, request.event_id, attributes)
        .await?;

    Ok((StatusCode::CREATED, Json(CreatedTeam { id: team.id })))
}

/// **POST /team/join**
pub async fn join_team(
    session: SessionUser,
    State(state): State<TeamsState>,
    ValidatedJson(request): ValidatedJson<JoinTeamRequest>,
) -> Result<Json<Membership>> {
    let membership = state
        .coordinator
        .join_by_browse(session.user_id, request.team_id)
        .await?;
    Ok(Json(membership))
}

/// **POST /team/invite/{code}/join**
pub async fn join_by_invite(
    session: SessionUser,
    State(state): State<TeamsState>,
    Path(code): Path<String>,
) -> Result<Json<Membership>> {
    let membership = state
        .coordinator
        .join_by_invite(session.user_id, &code)
        .await?;
    Ok(Json(membership))
}

/// **GET /team/{id}**
pub async fn get_team(
    session: SessionUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
) -> Result<Json<TeamDetails>> {
    let details = state
        .coordinator
        .team_details_by_id(session.user_id, team_id)
        .await?;
    Ok(Json(details))
}

/// **GET /team/invite/{code}**
pub async fn get_team_by_invite(
    session: SessionUser,
    State(state): State<TeamsState>,
    Path(code): Path<String>,
) -> Result<Json<TeamDetails>> {
    let team = state.coordinator.verify_invite(&code).await?;
    let details = state.coordinator.team_details(session.user_id, team).await?;
    Ok(Json(details))
}

/// **PUT /team/{id}**
///
/// Owner only. The invite code never changes.
pub async fn update_team(
    session: SessionUser,
    State(state): State<TeamsState>,
    Path(team_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<TeamFields>,
) -> Result<Json<Team>> {
    let attributes = request.into_attributes()?;
    let team = state
        .coordinator
        .update_team(session.user_id, team_id, attributes)
        .await?;
    Ok(Json(team))
}

/// **GET /teams**
pub async fn list_my_teams(
    session: SessionUser,
    State(state): State<TeamsState>,
) -> Result<Json<Vec<TeamRoster>>> {
    Ok(Json(state.coordinator.rosters_for(session.user_id).await?))
}

/// **GET /teams/browse**
pub async fn browse_teams(
    _session: SessionUser,
    State(state): State<TeamsState>,
) -> Result<Json<Vec<TeamRoster>>> {
    Ok(Json(state.coordinator.browse().await?))
}
