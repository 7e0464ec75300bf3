//! Guillotine cutting-stock optimizer for rectangular panels.
//!
//! Given a cutting list and one board size, [`solver::optimize`] spreads the
//! pieces over as few boards as the greedy heuristic manages, using only
//! full-span saw passes, and reports the layout, cut sequence and yield of
//! every board.

pub mod cuts;
pub mod demand;
pub mod error;
pub mod guillotine;
pub mod report;
pub mod solver;
pub mod types;

pub use error::{Error, Result};
pub use guillotine::{FitStrategy, ScoreStrategy};
pub use solver::{Config, Solver, optimize};
pub use types::{BoardLayout, CutLine, CutOrientation, MultiBoardResult, Piece, PlacedPiece, Rect};
