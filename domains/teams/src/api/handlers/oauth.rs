//! OAuth login handlers
//!
//! The handshake itself lives in `codejam_auth::LoginFlow`; these handlers
//! bind it to the session cookie and turn outcomes into redirects.

use axum::{
    extract::{Query, State},
    http::{header::REFERER, HeaderMap},
    response::Response,
};
use codejam_auth::LoginError;
use serde::Deserialize;
use tower_cookies::Cookies;

use super::found;
use crate::api::middleware::TeamsState;

#[derive(Debug, Deserialize)]
pub struct RedirectParams {
    pub redirect: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
}

/// **GET /oauth/redirect**
///
/// Starts a login and sends the browser to the identity provider.
pub async fn redirect(
    State(state): State<TeamsState>,
    cookies: Cookies,
    Query(params): Query<RedirectParams>,
) -> Result<Response, LoginError> {
    let session = state
        .auth
        .ensure_session(&cookies)
        .await
        .map_err(|e| LoginError::Internal(e.to_string()))?;

    let url = state
        .login
        .begin_login(&session, params.redirect.as_deref())
        .await?;

    Ok(found(&url))
}

/// **GET /oauth/callback**
pub async fn callback(
    State(state): State<TeamsState>,
    cookies: Cookies,
    Query(params): Query<CallbackParams>,
) -> Result<Response, LoginError> {
    let Some(session) = state.auth.session_id(&cookies) else {
        return Err(match params.state {
            None => LoginError::MissingState,
            Some(_) => LoginError::InvalidState,
        });
    };

    let outcome = state
        .login
        .complete_login(&session, params.state.as_deref(), params.code.as_deref())
        .await?;
    state.auth.set_session_cookie(&cookies, &outcome.session);

    Ok(found(&outcome.redirect))
}

/// **GET /oauth/debug-login**
///
/// Stand-in for the provider round trip when debug login is enabled.
pub async fn debug_login(
    State(state): State<TeamsState>,
    cookies: Cookies,
    Query(params): Query<CallbackParams>,
) -> Result<Response, LoginError> {
    if !state.login.config().debug_login {
        return Err(LoginError::DebugLoginDisabled);
    }
    let session = state
        .auth
        .session_id(&cookies)
        .ok_or(LoginError::InvalidState)?;

    let outcome = state
        .login
        .debug_login(&session, params.state.as_deref())
        .await?;
    state.auth.set_session_cookie(&cookies, &outcome.session);

    tracing::warn!(user_id = %outcome.user_id, "Debug login used");
    Ok(found(&outcome.redirect))
}

/// **GET /user/logout**
pub async fn logout(
    State(state): State<TeamsState>,
    cookies: Cookies,
    headers: HeaderMap,
) -> Result<Response, LoginError> {
    let session = state.auth.session_id(&cookies);
    state.login.logout(session.as_ref()).await?;
    state.auth.expire_cookie(&cookies);

    let referer = headers.get(REFERER).and_then(|v| v.to_str().ok());
    Ok(found(&state.login.logout_redirect(referer)))
}
