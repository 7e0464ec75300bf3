use serde::{Deserialize, Serialize};

use crate::cuts::{self, Region};
use crate::types::{FreeRect, PlacedPiece, Rect};

/// Candidate ranking, compared lexicographically; lower is better.
pub type Score = (u64, u64);

/// Ranks how well a piece of size `piece` sits in a free rectangle `free`
/// it is known to fit in. Ties beyond the score fall back to the lowest
/// free-rectangle index, then to the unrotated orientation.
pub trait FitStrategy {
    fn score(&self, piece: Rect, free: Rect) -> Score;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[allow(clippy::enum_variant_names)]
pub enum ScoreStrategy {
    #[default]
    BestAreaFit,
    BestShortSideFit,
    BestLongSideFit,
}

impl ScoreStrategy {
    pub const ALL: [ScoreStrategy; 3] = [
        ScoreStrategy::BestAreaFit,
        ScoreStrategy::BestShortSideFit,
        ScoreStrategy::BestLongSideFit,
    ];
}

impl FitStrategy for ScoreStrategy {
    fn score(&self, piece: Rect, free: Rect) -> Score {
        let short = std::cmp::min(free.w - piece.w, free.h - piece.h) as u64;
        let long = std::cmp::max(free.w - piece.w, free.h - piece.h) as u64;
        match self {
            ScoreStrategy::BestAreaFit => (free.area() - piece.area(), short),
            ScoreStrategy::BestShortSideFit => (short, long),
            ScoreStrategy::BestLongSideFit => (long, short),
        }
    }
}

impl std::fmt::Display for ScoreStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ScoreStrategy::BestAreaFit => "best-area-fit",
            ScoreStrategy::BestShortSideFit => "best-short-side-fit",
            ScoreStrategy::BestLongSideFit => "best-long-side-fit",
        })
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ScoredPlacement {
    pub free_idx: usize,
    pub rotated: bool,
    pub score: Score,
}

/// One board being filled: its free rectangles and what has been cut so far.
#[derive(Debug, Clone)]
pub struct GuillotineBin {
    stock: Rect,
    kerf: u32,
    pub free_rects: Vec<FreeRect>,
    pub placements: Vec<PlacedPiece>,
}

impl GuillotineBin {
    pub fn new(stock: Rect, kerf: u32) -> Self {
        Self {
            stock,
            kerf,
            free_rects: vec![FreeRect {
                x: 0,
                y: 0,
                rect: stock,
            }],
            placements: Vec::new(),
        }
    }

    pub fn stock(&self) -> Rect {
        self.stock
    }

    pub fn kerf(&self) -> u32 {
        self.kerf
    }

    pub fn used_area(&self) -> u64 {
        self.placements.iter().map(|p| p.rect.area()).sum()
    }

    pub fn find_best<S: FitStrategy + ?Sized>(
        &self,
        piece: Rect,
        allow_rotate: bool,
        strategy: &S,
    ) -> Option<ScoredPlacement> {
        let mut best: Option<ScoredPlacement> = None;

        for (idx, free) in self.free_rects.iter().enumerate() {
            for rotated in [false, true] {
                if rotated && !allow_rotate {
                    continue;
                }
                let candidate = if rotated { piece.rotated() } else { piece };
                if !candidate.fits_in(&free.rect) {
                    continue;
                }
                let score = strategy.score(candidate, free.rect);
                if best.is_none_or(|b| score < b.score) {
                    best = Some(ScoredPlacement {
                        free_idx: idx,
                        rotated,
                        score,
                    });
                }
            }
        }

        best
    }

    /// Cuts `piece` from the top-left corner of the chosen free rectangle.
    pub fn place(&mut self, scored: ScoredPlacement, piece: Rect, piece_id: &str) -> PlacedPiece {
        let free = self.free_rects[scored.free_idx];
        let placed = if scored.rotated {
            piece.rotated()
        } else {
            piece
        };

        let placement = PlacedPiece {
            piece_id: piece_id.to_string(),
            rect: placed,
            x: free.x,
            y: free.y,
            rotated: scored.rotated,
        };

        self.free_rects.swap_remove(scored.free_idx);
        self.split(free, placed);
        self.placements.push(placement.clone());
        self.merge_free_rects();

        placement
    }

    fn split(&mut self, free: FreeRect, placed: Rect) {
        let leftover_w = free.rect.w - placed.w;
        let leftover_h = free.rect.h - placed.h;
        let right_w = leftover_w.saturating_sub(self.kerf);
        let bottom_h = leftover_h.saturating_sub(self.kerf);

        let (right, bottom) = if leftover_w < leftover_h {
            // Vertical pass first: the right strip keeps the full height.
            (
                Rect::new(right_w, free.rect.h),
                Rect::new(placed.w, bottom_h),
            )
        } else {
            // Horizontal pass first: the bottom strip keeps the full width.
            (
                Rect::new(right_w, placed.h),
                Rect::new(free.rect.w, bottom_h),
            )
        };

        if !right.is_empty() {
            self.free_rects.push(FreeRect {
                x: free.x + placed.w + self.kerf,
                y: free.y,
                rect: right,
            });
        }
        if !bottom.is_empty() {
            self.free_rects.push(FreeRect {
                x: free.x,
                y: free.y + placed.h + self.kerf,
                rect: bottom,
            });
        }
    }

    fn merge_free_rects(&mut self) {
        while let Some((i, j, merged)) = self.next_merge() {
            self.free_rects[i] = merged;
            self.free_rects.swap_remove(j);
        }
    }

    fn next_merge(&self) -> Option<(usize, usize, FreeRect)> {
        for i in 0..self.free_rects.len() {
            for j in (i + 1)..self.free_rects.len() {
                if let Some(m) = Self::try_merge(self.free_rects[i], self.free_rects[j])
                    && self.stays_guillotine(i, j, m)
                {
                    return Some((i, j, m));
                }
            }
        }
        None
    }

    /// A merged rectangle may straddle a pass already needed elsewhere; only
    /// accept it if the board can still be cut with full-span passes.
    fn stays_guillotine(&self, i: usize, j: usize, merged: FreeRect) -> bool {
        let items = self
            .placements
            .iter()
            .map(Region::of_piece)
            .chain(
                self.free_rects
                    .iter()
                    .enumerate()
                    .filter(|&(k, _)| k != i && k != j)
                    .map(|(_, f)| Region::of_free(f)),
            )
            .chain(std::iter::once(Region::of_free(&merged)))
            .collect();
        cuts::is_guillotine(self.stock, items, self.kerf)
    }

    fn try_merge(a: FreeRect, b: FreeRect) -> Option<FreeRect> {
        // Side by side: same y, same height, touching in x
        if a.y == b.y && a.rect.h == b.rect.h {
            if a.x + a.rect.w == b.x {
                return Some(FreeRect {
                    x: a.x,
                    y: a.y,
                    rect: Rect::new(a.rect.w + b.rect.w, a.rect.h),
                });
            }
            if b.x + b.rect.w == a.x {
                return Some(FreeRect {
                    x: b.x,
                    y: b.y,
                    rect: Rect::new(a.rect.w + b.rect.w, a.rect.h),
                });
            }
        }
        // Stacked: same x, same width, touching in y
        if a.x == b.x && a.rect.w == b.rect.w {
            if a.y + a.rect.h == b.y {
                return Some(FreeRect {
                    x: a.x,
                    y: a.y,
                    rect: Rect::new(a.rect.w, a.rect.h + b.rect.h),
                });
            }
            if b.y + b.rect.h == a.y {
                return Some(FreeRect {
                    x: b.x,
                    y: b.y,
                    rect: Rect::new(a.rect.w, a.rect.h + b.rect.h),
                });
            }
        }
        None
    }

    /// Describes the first free rectangle that leaves the board, overlaps a
    /// placed piece or overlaps another free rectangle.
    pub fn find_overlap(&self) -> Option<String> {
        let board = Region::of_board(self.stock);
        for (i, f) in self.free_rects.iter().enumerate() {
            let fr = Region::of_free(f);
            if fr.x1 > board.x1 || fr.y1 > board.y1 {
                return Some(format!("free rect {} @ ({},{}) leaves the board", f.rect, f.x, f.y));
            }
            if let Some(p) = self
                .placements
                .iter()
                .find(|p| intersects(&fr, &Region::of_piece(p)))
            {
                return Some(format!(
                    "free rect {} @ ({},{}) overlaps piece '{}' {} @ ({},{})",
                    f.rect, f.x, f.y, p.piece_id, p.rect, p.x, p.y
                ));
            }
            if let Some(g) = self.free_rects[i + 1..]
                .iter()
                .find(|g| intersects(&fr, &Region::of_free(g)))
            {
                return Some(format!(
                    "free rect {} @ ({},{}) overlaps free rect {} @ ({},{})",
                    f.rect, f.x, f.y, g.rect, g.x, g.y
                ));
            }
        }
        None
    }
}

fn intersects(a: &Region, b: &Region) -> bool {
    a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
}
