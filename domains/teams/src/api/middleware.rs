//! Teams domain state and auth backend integration

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
    response::{IntoResponse, Response},
};
use codejam_auth::{AuthBackend, AuthConfig, IdentityProvider, LoginFlow, SessionUser};

use crate::domain::coordinator::MembershipCoordinator;
use crate::domain::entities::User;
use crate::domain::invite_code::RandomInviteCodes;
use crate::domain::moderation::Moderation;
use crate::repository::TeamsRepositories;

/// Application state for the Teams domain
#[derive(Clone)]
pub struct TeamsState {
    pub repos: TeamsRepositories,
    pub coordinator: MembershipCoordinator,
    pub moderation: Moderation,
    pub login: LoginFlow,
    pub auth: AuthBackend,
}

impl TeamsState {
    /// Wire the services over the given repositories, sessions and provider.
    pub fn new(
        repos: TeamsRepositories,
        auth: AuthBackend,
        provider: Arc<dyn IdentityProvider>,
        config: AuthConfig,
    ) -> Self {
        let login = LoginFlow::new(
            provider,
            Arc::new(repos.accounts()),
            auth.sessions(),
            config,
        );

        Self {
            coordinator: MembershipCoordinator::new(&repos, Arc::new(RandomInviteCodes)),
            moderation: Moderation::new(repos.users.clone()),
            login,
            auth,
            repos,
        }
    }
}

impl FromRef<TeamsState> for AuthBackend {
    fn from_ref(state: &TeamsState) -> Self {
        state.auth.clone()
    }
}

/// Logged-in admin.
///
/// Like `SessionUser` but loads the account and rejects non-admins with
/// 403 before the request body is read.
#[derive(Debug, Clone)]
pub struct AdminUser(pub User);

impl FromRequestParts<TeamsState> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &TeamsState,
    ) -> std::result::Result<Self, Self::Rejection> {
        let session = SessionUser::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;

        let admin = state
            .moderation
            .admin(session.user_id)
            .await
            .map_err(IntoResponse::into_response)?;

        Ok(AdminUser(admin))
    }
}
