//! OAuth login handshake bound to a server-side session
//!
//! `begin_login` parks a random token in the session and sends the browser
//! to the provider. `complete_login` takes the parked state back out (the
//! session is cleared whether or not it matches), exchanges the code,
//! resolves the identity and records the account. The authenticated state
//! is stored under a newly minted session id; the pre-login id never
//! becomes authenticated.

use std::sync::Arc;

use async_trait::async_trait;
use codejam_common::{generate_token, tokens_match, RepositoryError};
use reqwest::Url;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::LoginError;
use crate::oauth::IdentityProvider;
use crate::provider::ExternalIdentity;
use crate::session::{SessionEvent, SessionId, SessionState, SessionStateMachine};
use crate::store::SessionStore;

/// Random bytes in each OAuth `state` token
pub const STATE_TOKEN_BYTES: usize = 32;

/// Path of the stubbed login completion used in debug mode
pub const DEBUG_LOGIN_PATH: &str = "/oauth/debug-login";

/// The local account a provider identity maps to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Account {
    pub user_id: Uuid,
    pub display_name: String,
}

/// Where provider identities become local accounts.
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Insert or refresh the account keyed by (provider, provider user id).
    async fn upsert_identity(&self, identity: &ExternalIdentity)
        -> Result<Account, RepositoryError>;
}

/// Result of a completed login
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginOutcome {
    /// Session now holding the authenticated state
    pub session: SessionId,
    pub user_id: Uuid,
    pub display_name: String,
    pub redirect: String,
}

/// Keep a requested post-login redirect only when it is an in-app path
/// under `return_prefix`; anything else becomes `/`.
pub fn sanitize_redirect(
    requested: Option<&str>,
    return_prefix: &str,
    fragment_routing: bool,
) -> String {
    match requested {
        Some(path) if is_in_app_path(path, return_prefix) => {
            if fragment_routing {
                format!("/#{}", path)
            } else {
                path.to_string()
            }
        }
        _ => "/".to_string(),
    }
}

/// Path, query and fragment of `target` when it names a page on the same
/// origin as `app_url`. Bare local paths pass through as they are.
pub fn same_origin_path(target: &str, app_url: &str) -> Option<String> {
    if is_local_path(target) {
        return Some(target.to_string());
    }
    let target = Url::parse(target).ok()?;
    let app = Url::parse(app_url).ok()?;
    if target.origin() != app.origin() {
        return None;
    }

    let mut path = target.path().to_string();
    if let Some(query) = target.query() {
        path.push('?');
        path.push_str(query);
    }
    if let Some(fragment) = target.fragment() {
        path.push('#');
        path.push_str(fragment);
    }
    Some(path).filter(|p| is_local_path(p))
}

fn is_local_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

fn is_in_app_path(path: &str, prefix: &str) -> bool {
    if !is_local_path(path) {
        return false;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with(['/', '?', '#']),
        None => false,
    }
}

#[derive(Clone)]
pub struct LoginFlow {
    provider: Arc<dyn IdentityProvider>,
    accounts: Arc<dyn AccountDirectory>,
    sessions: Arc<dyn SessionStore>,
    config: Arc<AuthConfig>,
}

impl LoginFlow {
    pub fn new(
        provider: Arc<dyn IdentityProvider>,
        accounts: Arc<dyn AccountDirectory>,
        sessions: Arc<dyn SessionStore>,
        config: AuthConfig,
    ) -> Self {
        Self {
            provider,
            accounts,
            sessions,
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    /// Start a login and return the URL to send the browser to.
    pub async fn begin_login(
        &self,
        session: &SessionId,
        requested_redirect: Option<&str>,
    ) -> Result<String, LoginError> {
        let token =
            generate_token(STATE_TOKEN_BYTES).map_err(|e| LoginError::Internal(e.to_string()))?;
        let redirect = sanitize_redirect(
            requested_redirect,
            &self.config.return_prefix,
            self.config.fragment_routing,
        );

        let current = self.sessions.load(session).await?;
        let next = SessionStateMachine::transition(
            &current,
            SessionEvent::BeginLogin {
                token: token.clone(),
                redirect,
            },
        )
        .map_err(|e| LoginError::Internal(e.to_string()))?;
        self.sessions.save(session, &next).await?;

        if self.config.debug_login {
            return Ok(format!("{}?state={}", DEBUG_LOGIN_PATH, token));
        }
        Ok(self.provider.authorization_url(&token))
    }

    /// Finish a login from the provider callback parameters.
    pub async fn complete_login(
        &self,
        session: &SessionId,
        returned_state: Option<&str>,
        code: Option<&str>,
    ) -> Result<LoginOutcome, LoginError> {
        let returned_state = returned_state
            .filter(|s| !s.is_empty())
            .ok_or(LoginError::MissingState)?;
        let pending = self.take_pending(session, returned_state).await?;

        let Some(code) = code.filter(|c| !c.is_empty()) else {
            self.reject(session, &pending).await?;
            return Err(LoginError::MissingCode);
        };

        let provider = self.provider.provider();
        let access_token = match self.provider.exchange_code(code).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(provider = %provider, error = %e, "OAuth code exchange failed");
                self.reject(session, &pending).await?;
                return Err(LoginError::ExchangeFailed(e.to_string()));
            }
        };

        let identity = match self.provider.fetch_identity(&access_token).await {
            Ok(Some(identity)) => identity,
            Ok(None) => {
                self.reject(session, &pending).await?;
                return Err(LoginError::IdentityLookupFailed(
                    "provider returned no resolvable profile".to_string(),
                ));
            }
            Err(e) => {
                tracing::warn!(provider = %provider, error = %e, "Profile lookup failed");
                self.reject(session, &pending).await?;
                return Err(LoginError::IdentityLookupFailed(e.to_string()));
            }
        };

        self.authenticate(session, pending, &identity).await
    }

    /// Stubbed login completion that signs in the fixed debug identity.
    pub async fn debug_login(
        &self,
        session: &SessionId,
        returned_state: Option<&str>,
    ) -> Result<LoginOutcome, LoginError> {
        if !self.config.debug_login {
            return Err(LoginError::DebugLoginDisabled);
        }
        let returned_state = returned_state
            .filter(|s| !s.is_empty())
            .ok_or(LoginError::MissingState)?;
        let pending = self.take_pending(session, returned_state).await?;

        self.authenticate(session, pending, &ExternalIdentity::debug())
            .await
    }

    /// Where to send the browser after logout: the referring page when it
    /// is on this app's origin, otherwise `/`.
    pub fn logout_redirect(&self, referer: Option<&str>) -> String {
        referer
            .and_then(|r| same_origin_path(r, &self.config.redirect_url))
            .unwrap_or_else(|| "/".to_string())
    }

    /// Clear the session. Missing sessions are not an error.
    pub async fn logout(&self, session: Option<&SessionId>) -> Result<(), LoginError> {
        if let Some(session) = session {
            let current = self.sessions.load(session).await?;
            let next = SessionStateMachine::transition(&current, SessionEvent::Logout)
                .map_err(|e| LoginError::Internal(e.to_string()))?;
            self.sessions.save(session, &next).await?;
        }
        Ok(())
    }

    /// Consume the session state and require it to be pending with a token
    /// equal to `returned_state`.
    async fn take_pending(
        &self,
        session: &SessionId,
        returned_state: &str,
    ) -> Result<SessionState, LoginError> {
        let stored = self.sessions.take(session).await?;
        match &stored {
            SessionState::Pending { token, .. } if tokens_match(token, returned_state) => {
                Ok(stored)
            }
            SessionState::Pending { .. } => {
                tracing::info!("OAuth callback state did not match");
                self.reject(session, &stored).await?;
                Err(LoginError::InvalidState)
            }
            other => {
                tracing::info!(session_state = other.name(), "Rejected OAuth callback state");
                Err(LoginError::InvalidState)
            }
        }
    }

    /// Drop a pending login back to anonymous.
    async fn reject(&self, session: &SessionId, pending: &SessionState) -> Result<(), LoginError> {
        let next = SessionStateMachine::transition(pending, SessionEvent::Reject)
            .map_err(|e| LoginError::Internal(e.to_string()))?;
        self.sessions.save(session, &next).await?;
        Ok(())
    }

    async fn authenticate(
        &self,
        session: &SessionId,
        pending: SessionState,
        identity: &ExternalIdentity,
    ) -> Result<LoginOutcome, LoginError> {
        let redirect = match &pending {
            SessionState::Pending { redirect, .. } => redirect.clone(),
            _ => return Err(LoginError::InvalidState),
        };

        let account = self.accounts.upsert_identity(identity).await.map_err(|e| {
            tracing::error!(
                provider = %identity.provider,
                provider_user_id = %identity.provider_user_id,
                error = %e,
                "Failed to upsert user"
            );
            LoginError::Account(e)
        })?;

        let next = SessionStateMachine::transition(
            &pending,
            SessionEvent::Authenticate {
                user_id: account.user_id,
                display_name: account.display_name.clone(),
            },
        )
        .map_err(|_| LoginError::InvalidState)?;

        let rotated = SessionId::generate().map_err(|e| LoginError::Internal(e.to_string()))?;
        self.sessions.save(&rotated, &next).await?;
        self.sessions.delete(session).await?;

        tracing::info!(user_id = %account.user_id, provider = %identity.provider, "User logged in");

        Ok(LoginOutcome {
            session: rotated,
            user_id: account.user_id,
            display_name: account.display_name,
            redirect,
        })
    }
}
