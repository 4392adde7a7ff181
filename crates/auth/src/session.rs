//! Session state and its lifecycle
//!
//! A session moves `Anonymous -> Pending -> Authenticated -> Anonymous`.
//! A pending session that fails validation falls back to `Anonymous`.
//! The state is one tagged value, so a session can never be pending and
//! authenticated at the same time.

use codejam_common::{generate_token, Result, StateError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Random bytes behind each session identifier
pub const SESSION_ID_BYTES: usize = 32;

/// Opaque session identifier carried in the session cookie
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn generate() -> Result<Self> {
        Ok(Self(generate_token(SESSION_ID_BYTES)?))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for SessionId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Server-side session state
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum SessionState {
    #[default]
    Anonymous,
    /// Waiting for the provider callback
    Pending { token: String, redirect: String },
    Authenticated { user_id: Uuid, display_name: String },
}

impl SessionState {
    pub fn name(&self) -> &'static str {
        match self {
            SessionState::Anonymous => "anonymous",
            SessionState::Pending { .. } => "pending",
            SessionState::Authenticated { .. } => "authenticated",
        }
    }

    pub fn user_id(&self) -> Option<Uuid> {
        match self {
            SessionState::Authenticated { user_id, .. } => Some(*user_id),
            _ => None,
        }
    }
}

/// Events that drive session transitions
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// A login attempt starts; replaces whatever the session held
    BeginLogin { token: String, redirect: String },
    /// The provider callback validated
    Authenticate { user_id: Uuid, display_name: String },
    /// The callback failed validation
    Reject,
    Logout,
}

impl SessionEvent {
    fn name(&self) -> &'static str {
        match self {
            SessionEvent::BeginLogin { .. } => "begin_login",
            SessionEvent::Authenticate { .. } => "authenticate",
            SessionEvent::Reject => "reject",
            SessionEvent::Logout => "logout",
        }
    }
}

/// Session state machine
pub struct SessionStateMachine;

impl SessionStateMachine {
    pub fn transition(
        current: &SessionState,
        event: SessionEvent,
    ) -> std::result::Result<SessionState, StateError> {
        let next = match (current, event) {
            (_, SessionEvent::BeginLogin { token, redirect }) => {
                if token.is_empty() {
                    return Err(StateError::GuardFailed(
                        "Login state token must not be empty".to_string(),
                    ));
                }
                SessionState::Pending { token, redirect }
            }
            (
                SessionState::Pending { .. },
                SessionEvent::Authenticate {
                    user_id,
                    display_name,
                },
            ) => SessionState::Authenticated {
                user_id,
                display_name,
            },
            (SessionState::Pending { .. }, SessionEvent::Reject) => SessionState::Anonymous,
            (_, SessionEvent::Logout) => SessionState::Anonymous,
            (current, event) => {
                return Err(StateError::InvalidTransition {
                    from: current.name().to_string(),
                    event: event.name().to_string(),
                });
            }
        };

        Ok(next)
    }
}
