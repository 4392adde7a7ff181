//! Session backend shared by the extractors and the login handlers
//!
//! Wraps the session store and the cookie settings. Domain states expose
//! it via `FromRef`:
//! ```ignore
//! impl FromRef<MyDomainState> for AuthBackend {
//!     fn from_ref(state: &MyDomainState) -> Self {
//!         state.auth.clone()
//!     }
//! }
//! ```

use std::sync::Arc;

use codejam_common::{Error, Result};
use tower_cookies::cookie::{time, SameSite};
use tower_cookies::{Cookie, Cookies};

use crate::config::SessionCookieConfig;
use crate::error::AuthError;
use crate::session::{SessionId, SessionState};
use crate::store::SessionStore;

#[derive(Clone)]
pub struct AuthBackend {
    sessions: Arc<dyn SessionStore>,
    cookie: SessionCookieConfig,
}

impl AuthBackend {
    pub fn new(sessions: Arc<dyn SessionStore>, cookie: SessionCookieConfig) -> Self {
        Self { sessions, cookie }
    }

    pub fn sessions(&self) -> Arc<dyn SessionStore> {
        self.sessions.clone()
    }

    /// Session id from the request cookie, if any
    pub fn session_id(&self, cookies: &Cookies) -> Option<SessionId> {
        cookies
            .get(&self.cookie.name)
            .map(|c| c.value().to_string())
            .filter(|v| !v.is_empty())
            .map(SessionId::from)
    }

    /// Session id to start a login under.
    ///
    /// The cookie's id is reused only when the store holds live state for
    /// it; otherwise a fresh id is minted and its cookie set on the response.
    pub async fn ensure_session(&self, cookies: &Cookies) -> Result<SessionId> {
        if let Some(id) = self.session_id(cookies) {
            let state = self
                .load(&id)
                .await
                .map_err(|_| Error::Internal("Failed to load session".to_string()))?;
            if state != SessionState::Anonymous {
                return Ok(id);
            }
        }
        let id = SessionId::generate()?;
        self.set_session_cookie(cookies, &id);
        Ok(id)
    }

    /// Point the session cookie at `id`.
    pub fn set_session_cookie(&self, cookies: &Cookies, id: &SessionId) {
        cookies.add(self.session_cookie(id));
    }

    /// Replace the session cookie with one that expires immediately.
    pub fn expire_cookie(&self, cookies: &Cookies) {
        cookies.remove(Cookie::build((self.cookie.name.clone(), "")).path("/").build());
    }

    pub async fn load(&self, id: &SessionId) -> std::result::Result<SessionState, AuthError> {
        self.sessions.load(id).await.map_err(|e| {
            tracing::error!(error = %e, "Failed to load session");
            AuthError::SessionLoadError
        })
    }

    fn session_cookie(&self, id: &SessionId) -> Cookie<'static> {
        Cookie::build((self.cookie.name.clone(), id.as_str().to_string()))
            .path("/")
            .http_only(true)
            .secure(self.cookie.secure)
            .same_site(SameSite::Lax)
            .max_age(time::Duration::hours(self.cookie.ttl_hours))
            .build()
    }
}
