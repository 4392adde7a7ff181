//! Team membership errors

use codejam_common::{Error, RepositoryError};

#[derive(Debug, thiserror::Error)]
pub enum TeamError {
    #[error("Signups are closed for this event")]
    SignupsClosed,

    #[error("This team is private; an invite code is required")]
    PrivateTeam,

    #[error("User is already a member of this team")]
    AlreadyMember,

    #[error("Only the team owner can do this")]
    NotOwner,

    #[error("Account is not active")]
    AccountInactive,

    #[error("Team not found")]
    TeamNotFound,

    #[error("Event not found")]
    EventNotFound,

    #[error("Invite code not found")]
    InviteNotFound,

    #[error("Could not allocate a unique invite code")]
    InviteCodeExhausted,

    #[error("Team storage failure during {operation}: {source}")]
    Storage {
        operation: &'static str,
        #[source]
        source: RepositoryError,
    },
}

impl TeamError {
    /// Wrap a repository failure with the operation it interrupted.
    pub fn storage(operation: &'static str) -> impl FnOnce(RepositoryError) -> TeamError {
        move |source| TeamError::Storage { operation, source }
    }
}

impl From<TeamError> for Error {
    fn from(err: TeamError) -> Self {
        match err {
            TeamError::SignupsClosed
            | TeamError::PrivateTeam
            | TeamError::NotOwner
            | TeamError::AccountInactive => {
                Error::Authorization(err.to_string())
            }
            TeamError::AlreadyMember | TeamError::InviteCodeExhausted => {
                Error::Conflict(err.to_string())
            }
            TeamError::TeamNotFound | TeamError::EventNotFound | TeamError::InviteNotFound => {
                Error::NotFound(err.to_string())
            }
            TeamError::Storage { .. } => Error::Internal(err.to_string()),
        }
    }
}
