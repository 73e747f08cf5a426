//! Error taxonomy shared across the ledger, standings and flow modules.
//!
//! Label-collaborator failures are a separate type ([`crate::labels::LabelError`])
//! and never convert into a `LadderError`: label sync is best-effort.

use thiserror::Error;

pub type LadderResult<T> = Result<T, LadderError>;

#[derive(Debug, Error)]
pub enum LadderError {
    /// Bad input or an ill-formed pairing (self-match, cross-community).
    /// Reported to the user; nothing was mutated.
    #[error("{0}")]
    Validation(String),

    /// Unknown participant, match or community. Nothing was mutated.
    #[error("{0}")]
    NotFound(String),

    /// The user (or their opponent) timed out or declined mid-flow.
    #[error("abandoned: {0}")]
    Abandoned(&'static str),

    /// The reporting user already has a flow in progress.
    #[error("another command is already in progress for this user")]
    Busy,

    /// Store failure. User-facing text stays generic; detail is logged by
    /// the caller that surfaces it.
    #[error("storage failure")]
    Persistence(#[from] anyhow::Error),
}

impl LadderError {
    pub fn validation(msg: impl Into<String>) -> Self {
        LadderError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        LadderError::NotFound(msg.into())
    }
}
