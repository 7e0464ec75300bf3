use std::cmp::Reverse;
use std::collections::HashSet;

use crate::error::{Error, Result};
use crate::types::{Piece, Rect};

/// A single copy of a piece waiting to be placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnitTask {
    /// Index into the caller's piece list.
    pub piece_idx: usize,
    pub rect: Rect,
    pub allow_rotate: bool,
}

impl UnitTask {
    /// Whether any permitted orientation fits an empty board.
    pub fn fits_board(&self, board: &Rect) -> bool {
        self.rect.fits_in(board) || (self.allow_rotate && self.rect.rotated().fits_in(board))
    }
}

pub fn validate(pieces: &[Piece], board: Rect) -> Result<()> {
    if board.is_empty() {
        return Err(Error::InvalidBoard(board));
    }

    let mut seen = HashSet::new();
    for (idx, p) in pieces.iter().enumerate() {
        if p.id.is_empty() {
            return Err(Error::invalid_piece(
                &format!("#{}", idx + 1),
                "id must not be empty",
            ));
        }
        if !seen.insert(p.id.as_str()) {
            return Err(Error::invalid_piece(&p.id, "duplicate id"));
        }
        if p.rect.is_empty() {
            return Err(Error::invalid_piece(
                &p.id,
                format!("dimensions must be non-zero, got {}", p.rect),
            ));
        }
        if p.qty == 0 {
            return Err(Error::invalid_piece(&p.id, "quantity must be at least 1"));
        }
    }
    Ok(())
}

/// Expands every piece into `qty` unit tasks, largest first.
///
/// Order: longest side descending, then area descending, then input index,
/// so equal-sized pieces keep the order the caller listed them in.
pub fn expand(pieces: &[Piece]) -> Vec<UnitTask> {
    let mut tasks: Vec<UnitTask> = pieces
        .iter()
        .enumerate()
        .flat_map(|(piece_idx, p)| {
            (0..p.qty).map(move |_| UnitTask {
                piece_idx,
                rect: p.rect,
                allow_rotate: p.allow_rotate,
            })
        })
        .collect();

    tasks.sort_by_key(|t| {
        (
            Reverse(t.rect.w.max(t.rect.h)),
            Reverse(t.rect.area()),
            t.piece_idx,
        )
    });
    tasks
}
