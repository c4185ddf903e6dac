// Typed error taxonomy for draft engine operations.

use thiserror::Error;

use super::state::DraftStatus;

/// Errors surfaced by draft engine operations.
///
/// `WrongTurn` and `PlayerUnavailable` are expected, recoverable conditions:
/// callers should refresh their view of the draft and show the message to the
/// user. The remaining variants indicate caller misuse of the state machine
/// or a storage failure.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error("draft requires exactly {expected} teams, found {actual}")]
    PreconditionFailed { expected: usize, actual: usize },

    #[error("no draft instance with id `{draft_id}`")]
    DraftNotFound { draft_id: String },

    #[error("draft has not started")]
    NotStarted,

    #[error("draft has already started")]
    AlreadyStarted,

    #[error("draft is {status} and cannot accept this operation")]
    AlreadyTerminal { status: DraftStatus },

    #[error("it is {expected}'s turn to pick")]
    WrongTurn { expected: String },

    #[error("no team named `{name}` in this draft")]
    TeamNotFound { name: String },

    #[error("no player with id {id}")]
    PlayerNotFound { id: i64 },

    #[error("{name} has already been drafted")]
    PlayerUnavailable { name: String },

    #[error("draft roster is full ({capacity} teams)")]
    RosterFull { capacity: usize },

    #[error("a team named `{name}` is already registered")]
    DuplicateTeamName { name: String },

    #[error("caller identity is missing or unauthenticated")]
    NotAuthenticated,

    #[error("`{who}` is not authorized to perform this operation")]
    NotAuthorized { who: String },

    #[error("storage error: {0}")]
    Storage(String),
}

impl DraftError {
    /// Wrap a storage-layer failure, preserving the full context chain.
    pub fn storage(err: anyhow::Error) -> Self {
        DraftError::Storage(format!("{err:#}"))
    }

    /// Whether this error is an expected, user-recoverable condition rather
    /// than a misuse of the state machine.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            DraftError::WrongTurn { .. } | DraftError::PlayerUnavailable { .. }
        )
    }

    /// Stable identifier for the wire protocol.
    pub fn kind(&self) -> &'static str {
        match self {
            DraftError::PreconditionFailed { .. } => "preconditionFailed",
            DraftError::DraftNotFound { .. } => "draftNotFound",
            DraftError::NotStarted => "notStarted",
            DraftError::AlreadyStarted => "alreadyStarted",
            DraftError::AlreadyTerminal { .. } => "alreadyTerminal",
            DraftError::WrongTurn { .. } => "wrongTurn",
            DraftError::TeamNotFound { .. } => "teamNotFound",
            DraftError::PlayerNotFound { .. } => "playerNotFound",
            DraftError::PlayerUnavailable { .. } => "playerUnavailable",
            DraftError::RosterFull { .. } => "rosterFull",
            DraftError::DuplicateTeamName { .. } => "duplicateTeamName",
            DraftError::NotAuthenticated => "notAuthenticated",
            DraftError::NotAuthorized { .. } => "notAuthorized",
            DraftError::Storage(_) => "storage",
        }
    }
}
