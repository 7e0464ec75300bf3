use serde::{Deserialize, Serialize};

use crate::cuts;
use crate::demand::{self, UnitTask};
use crate::error::{Error, Result};
use crate::guillotine::{FitStrategy, GuillotineBin, ScoreStrategy};
use crate::report;
use crate::types::{BoardLayout, MultiBoardResult, Piece, Rect, UnplacedPiece};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Blade width, lost after every saw pass.
    pub kerf: u32,
    pub strategy: ScoreStrategy,
}

/// Places a cutting list onto as many identical boards as it takes.
///
/// Holds only the inputs of one run; every call to [`Solver::solve`] builds
/// its own queue and boards from scratch.
pub struct Solver {
    board: Rect,
    config: Config,
    pieces: Vec<Piece>,
}

/// Runs one optimization with the default strategy.
pub fn optimize(pieces: &[Piece], board: Rect, kerf: u32) -> Result<MultiBoardResult> {
    let config = Config {
        kerf,
        ..Config::default()
    };
    Solver::new(board, config, pieces.to_vec()).solve()
}

impl Solver {
    pub fn new(board: Rect, config: Config, pieces: Vec<Piece>) -> Self {
        Self {
            board,
            config,
            pieces,
        }
    }

    pub fn solve(&self) -> Result<MultiBoardResult> {
        self.solve_with(&self.config.strategy)
    }

    /// Runs every built-in strategy and keeps the one needing the fewest
    /// boards; earlier strategies win ties.
    pub fn solve_best(&self) -> Result<MultiBoardResult> {
        let mut best = self.solve_with(&ScoreStrategy::ALL[0])?;
        for strategy in &ScoreStrategy::ALL[1..] {
            let candidate = self.solve_with(strategy)?;
            if candidate.total_boards < best.total_boards {
                tracing::debug!(%strategy, boards = candidate.total_boards, "strategy improved board count");
                best = candidate;
            }
        }
        Ok(best)
    }

    pub fn solve_with<S: FitStrategy + ?Sized>(&self, strategy: &S) -> Result<MultiBoardResult> {
        demand::validate(&self.pieces, self.board)?;

        let (queue, oversized): (Vec<UnitTask>, Vec<UnitTask>) = demand::expand(&self.pieces)
            .into_iter()
            .partition(|t| t.fits_board(&self.board));
        let unplaced = self.tally_unplaced(&oversized);

        let bins = self.fill_boards(queue, strategy)?;
        let boards = bins
            .into_iter()
            .enumerate()
            .map(|(i, bin)| self.layout(i + 1, bin))
            .collect::<Result<Vec<_>>>()?;

        let total_pieces = self.pieces.iter().map(|p| p.qty).sum();
        let result = report::summarize(self.board, self.config.kerf, boards, total_pieces, unplaced);

        tracing::info!(
            board = %self.board,
            kerf = self.config.kerf,
            boards = result.total_boards,
            placed = result.total_placed_pieces,
            unplaced = result.total_unplaced_pieces,
            efficiency = result.overall_efficiency,
            "optimization finished"
        );
        Ok(result)
    }

    fn tally_unplaced(&self, oversized: &[UnitTask]) -> Vec<UnplacedPiece> {
        let mut counts = vec![0u32; self.pieces.len()];
        for task in oversized {
            counts[task.piece_idx] += 1;
        }

        self.pieces
            .iter()
            .zip(counts)
            .filter(|(_, qty)| *qty > 0)
            .map(|(p, qty)| {
                tracing::warn!(piece = %p.id, size = %p.rect, board = %self.board, qty, "piece exceeds board");
                UnplacedPiece {
                    piece_id: p.id.clone(),
                    qty,
                }
            })
            .collect()
    }

    /// Fills one board at a time. A board is done once a full pass over the
    /// remaining queue places nothing.
    fn fill_boards<S: FitStrategy + ?Sized>(
        &self,
        mut queue: Vec<UnitTask>,
        strategy: &S,
    ) -> Result<Vec<GuillotineBin>> {
        let mut bins: Vec<GuillotineBin> = Vec::new();

        while !queue.is_empty() {
            let board_number = bins.len() + 1;
            tracing::debug!(board = board_number, remaining = queue.len(), "opening board");
            let mut bin = GuillotineBin::new(self.board, self.config.kerf);

            loop {
                let before = queue.len();
                let mut idx = 0;
                while idx < queue.len() {
                    let task = queue[idx];
                    let Some(scored) = bin.find_best(task.rect, task.allow_rotate, strategy) else {
                        idx += 1;
                        continue;
                    };
                    let piece_id = &self.pieces[task.piece_idx].id;
                    bin.place(scored, task.rect, piece_id);
                    if let Some(detail) = bin.find_overlap() {
                        return Err(Error::InvariantViolation {
                            board: board_number,
                            piece_id: piece_id.clone(),
                            detail,
                        });
                    }
                    queue.remove(idx);
                }
                if queue.len() == before {
                    break;
                }
            }

            if bin.placements.is_empty() {
                // Every queued task fits an empty board, so this cannot loop.
                let head = &self.pieces[queue[0].piece_idx];
                return Err(Error::InvariantViolation {
                    board: board_number,
                    piece_id: head.id.clone(),
                    detail: format!("empty board {} accepted no piece", self.board),
                });
            }
            bins.push(bin);
        }

        Ok(bins)
    }

    fn layout(&self, board_number: usize, bin: GuillotineBin) -> Result<BoardLayout> {
        let Some(cut_lines) = cuts::extract(bin.stock(), &bin.placements, bin.kerf()) else {
            let piece_id = bin
                .placements
                .last()
                .map(|p| p.piece_id.clone())
                .unwrap_or_default();
            return Err(Error::InvariantViolation {
                board: board_number,
                piece_id,
                detail: "layout cannot be cut with guillotine passes".to_string(),
            });
        };
        Ok(report::board_layout(
            self.board,
            board_number,
            bin.placements,
            bin.free_rects,
            cut_lines,
        ))
    }
}
