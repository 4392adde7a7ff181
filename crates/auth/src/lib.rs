//! Authentication for the CodeJam API
//!
//! Provides the OAuth login handshake, the identity providers it talks to,
//! server-side sessions and axum extractors that work with any domain state
//! implementing `FromRef<S>` for `AuthBackend`.

mod backend;
mod config;
mod error;
mod extractors;
mod flow;
mod oauth;
mod provider;
mod session;
mod store;

pub use backend::AuthBackend;
pub use config::{AuthConfig, SessionCookieConfig};
pub use error::{AuthError, LoginError};
pub use extractors::SessionUser;
pub use flow::{
    same_origin_path, sanitize_redirect, Account, AccountDirectory, LoginFlow, LoginOutcome,
    DEBUG_LOGIN_PATH, STATE_TOKEN_BYTES,
};
pub use oauth::{IdentityProvider, OAuthClient, OAuthError};
pub use provider::{resolve_profile, ExternalIdentity, Provider, ProviderEndpoints};
pub use session::{SessionEvent, SessionId, SessionState, SessionStateMachine};
pub use store::{MemorySessionStore, PgSessionStore, SessionStore, SessionStoreError};
