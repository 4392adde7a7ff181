//! Current-user handlers

use axum::{extract::State, Json};
use codejam_auth::SessionUser;
use codejam_common::{Error, Result, ValidatedJson};
use serde::Deserialize;
use validator::Validate;

use crate::api::middleware::TeamsState;
use crate::domain::entities::User;
use crate::domain::validation::normalize_name;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
}

async fn current_user(state: &TeamsState, session: &SessionUser) -> Result<User> {
    state
        .repos
        .users
        .get_by_id(session.user_id)
        .await?
        .ok_or_else(|| Error::Authentication("Session user no longer exists".to_string()))
}

/// **GET /user**
pub async fn get_user(session: SessionUser, State(state): State<TeamsState>) -> Result<Json<User>> {
    Ok(Json(current_user(&state, &session).await?))
}

/// **PUT /user/profile**
///
/// Banned accounts and accounts with a locked display name are refused.
pub async fn update_profile(
    session: SessionUser,
    State(state): State<TeamsState>,
    ValidatedJson(request): ValidatedJson<UpdateProfileRequest>,
) -> Result<Json<User>> {
    let display_name = normalize_name(&request.display_name)
        .ok_or_else(|| Error::Validation("Display name cannot be empty".to_string()))?;

    let user = current_user(&state, &session).await?;
    if !user.is_active() {
        return Err(Error::Authorization("Account is not active".to_string()));
    }
    if user.lock_display_name {
        return Err(Error::Authorization("Display name is locked".to_string()));
    }

    let updated = state
        .repos
        .users
        .update_display_name(user.id, &display_name)
        .await
        .map_err(|e| {
            tracing::error!(operation = "update_profile", user_id = %user.id, error = %e, "Failed to update display name");
            Error::from(e)
        })?;

    Ok(Json(updated))
}
