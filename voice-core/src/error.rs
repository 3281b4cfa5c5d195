use thiserror::Error;

use crate::controller::SessionState;

/// Errors surfaced by the voice analysis core.
#[derive(Debug, Error)]
pub enum VoiceError {
    /// The frame source could not be started (missing device, permission denied, ...).
    #[error("audio source failed to start: {0:#}")]
    SourceInit(#[source] anyhow::Error),

    /// A session action was requested from a state that does not permit it.
    #[error("cannot {action} while session is {state:?}")]
    InvalidTransition {
        action: &'static str,
        state: SessionState,
    },

    #[error("select at least 1 profile")]
    EmptySelection,

    #[error("select max {0} profiles")]
    SelectionFull(usize),

    #[error("no saved profile with id {0}")]
    UnknownProfile(u64),

    #[error("no profile id is free after {0}")]
    IdsExhausted(u64),

    #[error("profile store I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("profile store holds malformed data: {0}")]
    Json(#[from] serde_json::Error),
}
