//! Axum extractors for session authentication
//!
//! Generic over any state `S` where `AuthBackend: FromRef<S>`.
//! This is axum's idiomatic nested-state pattern. The router must carry
//! `tower_cookies::CookieManagerLayer`.

use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tower_cookies::Cookies;
use uuid::Uuid;

use crate::backend::AuthBackend;
use crate::error::AuthError;
use crate::session::{SessionId, SessionState};

/// Logged-in user taken from the session cookie.
///
/// Anything other than an authenticated session is rejected with 401.
#[derive(Debug, Clone)]
pub struct SessionUser {
    pub session_id: SessionId,
    pub user_id: Uuid,
    pub display_name: String,
}

impl<S> FromRequestParts<S> for SessionUser
where
    AuthBackend: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> std::result::Result<Self, Self::Rejection> {
        let backend = AuthBackend::from_ref(state);

        let cookies = Cookies::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthError::SessionUnavailable)?;

        let session_id = backend
            .session_id(&cookies)
            .ok_or(AuthError::NotAuthenticated)?;

        match backend.load(&session_id).await? {
            SessionState::Authenticated {
                user_id,
                display_name,
            } => Ok(SessionUser {
                session_id,
                user_id,
                display_name,
            }),
            _ => Err(AuthError::NotAuthenticated),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SessionCookieConfig;
    use crate::store::{MemorySessionStore, SessionStore};
    use axum::{body::Body, http::Request, http::StatusCode, routing::get, Router};
    use std::sync::Arc;
    use tower::ServiceExt;
    use tower_cookies::CookieManagerLayer;

    async fn whoami(user: SessionUser) -> String {
        user.display_name
    }

    fn app(store: Arc<MemorySessionStore>) -> Router {
        let backend = AuthBackend::new(
            store,
            SessionCookieConfig {
                name: "sid".to_string(),
                ttl_hours: 1,
                secure: false,
            },
        );
        Router::new()
            .route("/whoami", get(whoami))
            .layer(CookieManagerLayer::new())
            .with_state(backend)
    }

    fn request(cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri("/whoami");
        if let Some(cookie) = cookie {
            builder = builder.header("cookie", cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_no_cookie_is_unauthorized() {
        let response = app(Arc::new(MemorySessionStore::default()))
            .oneshot(request(None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_pending_session_is_unauthorized() {
        let store = Arc::new(MemorySessionStore::default());
        let id = SessionId::from("abc".to_string());
        store
            .save(
                &id,
                &SessionState::Pending {
                    token: "t".to_string(),
                    redirect: "/".to_string(),
                },
            )
            .await
            .unwrap();

        let response = app(store).oneshot(request(Some("sid=abc"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_authenticated_session_is_extracted() {
        let store = Arc::new(MemorySessionStore::default());
        let id = SessionId::from("abc".to_string());
        store
            .save(
                &id,
                &SessionState::Authenticated {
                    user_id: Uuid::new_v4(),
                    display_name: "Ada".to_string(),
                },
            )
            .await
            .unwrap();

        let response = app(store).oneshot(request(Some("sid=abc"))).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"Ada");
    }
}
