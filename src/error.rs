use thiserror::Error;

use crate::types::Rect;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Board dimensions must both be non-zero.
    #[error("invalid board {0}: dimensions must be non-zero")]
    InvalidBoard(Rect),

    /// A demand line failed validation; nothing was placed.
    #[error("invalid piece '{piece_id}': {reason}")]
    InvalidPiece { piece_id: String, reason: String },

    /// The placement engine broke one of its own guarantees.
    #[error("internal invariant violated on board {board} while placing '{piece_id}': {detail}")]
    InvariantViolation {
        board: usize,
        piece_id: String,
        detail: String,
    },
}

impl Error {
    pub(crate) fn invalid_piece(piece_id: &str, reason: impl Into<String>) -> Self {
        Self::InvalidPiece {
            piece_id: piece_id.to_string(),
            reason: reason.into(),
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidBoard(_) | Self::InvalidPiece { .. })
    }
}
