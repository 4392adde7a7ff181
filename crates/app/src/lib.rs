//! CodeJam application composition root
//!
//! Wires configuration, the session store, the identity provider client and
//! the Teams domain into a single router.

use std::sync::Arc;
use std::time::Duration;

use axum::{routing::get, Router};
use codejam_auth::{
    AuthBackend, AuthConfig, MemorySessionStore, OAuthClient, PgSessionStore, SessionStore,
};
use codejam_common::{Config, SessionStoreKind};
use codejam_teams::{TeamsRepositories, TeamsState};
use sqlx::PgPool;

/// How often expired sessions are deleted
pub const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Create the main application router with all routes and middleware
pub async fn create_app(config: &Config, pool: PgPool) -> Result<Router, anyhow::Error> {
    let auth_config = AuthConfig::from_config(config)?;
    tracing::info!(
        provider = %auth_config.provider,
        debug_login = auth_config.debug_login,
        "Auth configured"
    );
    if auth_config.debug_login {
        tracing::warn!("DEBUG_LOGIN is enabled; anyone can sign in as the debug user");
    }

    let ttl = chrono::Duration::hours(auth_config.session.ttl_hours);
    let sessions: Arc<dyn SessionStore> = match config.session_store {
        SessionStoreKind::Postgres => Arc::new(PgSessionStore::new(pool.clone(), ttl)),
        SessionStoreKind::Memory => {
            tracing::warn!("SESSION_STORE=memory; sessions are lost on restart");
            Arc::new(MemorySessionStore::new(ttl))
        }
    };
    spawn_session_sweeper(sessions.clone(), SESSION_SWEEP_INTERVAL);

    let auth = AuthBackend::new(sessions, auth_config.session.clone());
    let provider = OAuthClient::new(&auth_config)?;

    let teams_state = TeamsState::new(
        TeamsRepositories::new(pool),
        auth,
        Arc::new(provider),
        auth_config,
    );

    Ok(build_router(teams_state))
}

/// Compose domain routers with shared infrastructure routes
pub fn build_router(teams_state: TeamsState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .merge(codejam_teams::routes().with_state(teams_state))
}

/// Periodically delete expired sessions.
pub fn spawn_session_sweeper(sessions: Arc<dyn SessionStore>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            match sessions.purge_expired().await {
                Ok(0) => {}
                Ok(purged) => tracing::debug!(purged, "Purged expired sessions"),
                Err(e) => tracing::warn!(error = %e, "Failed to purge expired sessions"),
            }
        }
    });
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
