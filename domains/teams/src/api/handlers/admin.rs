//! Admin moderation handlers
//!
//! `AdminUser` settles authorization before any body is parsed, so a
//! non-admin always gets 403.

use axum::{
    extract::{Path, State},
    Json,
};
use codejam_common::{Result, ValidatedJson};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::{AdminUser, TeamsState};
use crate::domain::entities::{AccountStatus, User};

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AccountStatusRequest {
    pub account_status: AccountStatus,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DisplayNameRequest {
    #[validate(length(min = 1, max = 100))]
    pub display_name: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DisplayNameLockRequest {
    pub locked: bool,
}

/// **GET /admin/user/all**
pub async fn list_users(
    AdminUser(admin): AdminUser,
    State(state): State<TeamsState>,
) -> Result<Json<Vec<User>>> {
    Ok(Json(state.moderation.list_users(&admin).await?))
}

/// **PUT /admin/user/{id}/account_status**
pub async fn set_account_status(
    AdminUser(admin): AdminUser,
    State(state): State<TeamsState>,
    Path(user_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AccountStatusRequest>,
) -> Result<Json<User>> {
    let user = state
        .moderation
        .set_account_status(&admin, user_id, request.account_status)
        .await?;
    Ok(Json(user))
}

/// **PUT /admin/user/{id}/display_name**
pub async fn set_display_name(
    AdminUser(admin): AdminUser,
    State(state): State<TeamsState>,
    Path(user_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<DisplayNameRequest>,
) -> Result<Json<User>> {
    let user = state
        .moderation
        .set_display_name(&admin, user_id, &request.display_name)
        .await?;
    Ok(Json(user))
}

/// **PUT /admin/user/{id}/display_name_lock**
pub async fn set_display_name_lock(
    AdminUser(admin): AdminUser,
    State(state): State<TeamsState>,
    Path(user_id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<DisplayNameLockRequest>,
) -> Result<Json<User>> {
    let user = state
        .moderation
        .set_display_name_lock(&admin, user_id, request.locked)
        .await?;
    Ok(Json(user))
}

/// **PUT /admin/user/{id}/ban**
pub async fn ban(
    AdminUser(admin): AdminUser,
    State(state): State<TeamsState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>> {
    Ok(Json(state.moderation.ban(&admin, user_id).await?))
}

/// **PUT /admin/user/{id}/unban**
pub async fn unban(
    AdminUser(admin): AdminUser,
    State(state): State<TeamsState>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>> {
    Ok(Json(state.moderation.unban(&admin, user_id).await?))
}
