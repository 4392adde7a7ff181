//! Route definitions for Teams domain API

use axum::{
    routing::{get, post, put},
    Router,
};
use tower_cookies::CookieManagerLayer;

use super::handlers::{admin, oauth, teams, users};
use super::middleware::TeamsState;

/// OAuth handshake and logout
fn oauth_routes() -> Router<TeamsState> {
    Router::new()
        .route("/oauth/redirect", get(oauth::redirect))
        .route("/oauth/callback", get(oauth::callback))
        .route(codejam_auth::DEBUG_LOGIN_PATH, get(oauth::debug_login))
        .route("/user/logout", get(oauth::logout))
}

fn user_routes() -> Router<TeamsState> {
    Router::new()
        .route("/user", get(users::get_user))
        .route("/user/profile", put(users::update_profile))
}

fn team_routes() -> Router<TeamsState> {
    Router::new()
        .route("/team", post(teams::create_team))
        .route("/team/join", post(teams::join_team))
        .route("/team/invite/{code}", get(teams::get_team_by_invite))
        .route("/team/invite/{code}/join", post(teams::join_by_invite))
        .route("/team/{id}", get(teams::get_team).put(teams::update_team))
        .route("/teams", get(teams::list_my_teams))
        .route("/teams/browse", get(teams::browse_teams))
}

fn admin_routes() -> Router<TeamsState> {
    Router::new()
        .route("/admin/user/all", get(admin::list_users))
        .route(
            "/admin/user/{id}/account_status",
            put(admin::set_account_status),
        )
        .route("/admin/user/{id}/display_name", put(admin::set_display_name))
        .route(
            "/admin/user/{id}/display_name_lock",
            put(admin::set_display_name_lock),
        )
        .route("/admin/user/{id}/ban", put(admin::ban))
        .route("/admin/user/{id}/unban", put(admin::unban))
}

/// Create all Teams domain API routes
///
/// Carries the cookie layer the session extractors depend on.
pub fn routes() -> Router<TeamsState> {
    Router::new()
        .merge(oauth_routes())
        .merge(user_routes())
        .merge(team_routes())
        .merge(admin_routes())
        .layer(CookieManagerLayer::new())
}
