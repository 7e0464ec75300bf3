//! Saw-cut reconstruction.
//!
//! Cuts are rebuilt from the finished layout rather than logged while
//! splitting: merged free rectangles can join space that two different splits
//! produced, so the split history is not always a valid saw order. A layout is
//! cut by repeatedly taking a full-span line through the current region that
//! crosses no piece, then recursing into both sides.

use crate::types::{CutLine, CutOrientation, FreeRect, PlacedPiece, Rect};

/// Half-open box `[x0, x1) × [y0, y1)` in board coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Region {
    pub x0: u32,
    pub y0: u32,
    pub x1: u32,
    pub y1: u32,
}

impl Region {
    pub fn of_board(board: Rect) -> Self {
        Self {
            x0: 0,
            y0: 0,
            x1: board.w,
            y1: board.h,
        }
    }

    pub fn of_piece(p: &PlacedPiece) -> Self {
        Self {
            x0: p.x,
            y0: p.y,
            x1: p.right(),
            y1: p.bottom(),
        }
    }

    pub fn of_free(f: &FreeRect) -> Self {
        Self {
            x0: f.x,
            y0: f.y,
            x1: f.x + f.rect.w,
            y1: f.y + f.rect.h,
        }
    }

    fn lo(&self, orientation: CutOrientation) -> u32 {
        match orientation {
            CutOrientation::Horizontal => self.y0,
            CutOrientation::Vertical => self.x0,
        }
    }

    fn hi(&self, orientation: CutOrientation) -> u32 {
        match orientation {
            CutOrientation::Horizontal => self.y1,
            CutOrientation::Vertical => self.x1,
        }
    }

    /// The two sides left by a pass at `position`. Either side is `None` when
    /// the blade runs past that edge of the region.
    fn split(
        &self,
        orientation: CutOrientation,
        position: u32,
        kerf: u32,
    ) -> (Option<Region>, Option<Region>) {
        let resume = position.saturating_add(kerf);
        match orientation {
            CutOrientation::Horizontal => (
                (position > self.y0).then_some(Region { y1: position, ..*self }),
                (resume < self.y1).then_some(Region { y0: resume, ..*self }),
            ),
            CutOrientation::Vertical => (
                (position > self.x0).then_some(Region { x1: position, ..*self }),
                (resume < self.x1).then_some(Region { x0: resume, ..*self }),
            ),
        }
    }

    /// Whether a pass at `position` takes material out of this region.
    /// A trim pass may start in material an earlier pass already removed.
    fn is_cut_by(&self, orientation: CutOrientation, position: u32, kerf: u32) -> bool {
        position < self.hi(orientation) && position.saturating_add(kerf) > self.lo(orientation)
    }

    fn cut_line(&self, orientation: CutOrientation, position: u32) -> CutLine {
        let (start, end) = match orientation {
            CutOrientation::Horizontal => (self.x0, self.x1),
            CutOrientation::Vertical => (self.y0, self.y1),
        };
        CutLine {
            orientation,
            position,
            start,
            end,
        }
    }
}

/// Ordered saw passes that free every piece on a board, or `None` when the
/// layout is not guillotine-separable.
pub fn extract(board: Rect, pieces: &[PlacedPiece], kerf: u32) -> Option<Vec<CutLine>> {
    let items = pieces.iter().map(Region::of_piece).collect();
    let mut cuts = Vec::new();
    decompose(Region::of_board(board), items, kerf, &mut cuts).then_some(cuts)
}

/// Whether `items` can be separated from each other by guillotine passes.
pub(crate) fn is_guillotine(board: Rect, items: Vec<Region>, kerf: u32) -> bool {
    let mut scratch = Vec::new();
    decompose(Region::of_board(board), items, kerf, &mut scratch)
}

fn decompose(region: Region, items: Vec<Region>, kerf: u32, cuts: &mut Vec<CutLine>) -> bool {
    match items.as_slice() {
        [] => return true,
        [only] if *only == region => return true,
        _ => {}
    }

    let Some((orientation, position)) = choose_cut(&region, &items, kerf) else {
        return false;
    };
    cuts.push(region.cut_line(orientation, position));

    let (near, far) = region.split(orientation, position, kerf);
    let (near_items, far_items): (Vec<Region>, Vec<Region>) = items
        .into_iter()
        .partition(|it| it.hi(orientation) <= position);

    let near_ok = match near {
        Some(near) => decompose(near, near_items, kerf, cuts),
        None => near_items.is_empty(),
    };
    near_ok
        && match far {
            Some(far) => decompose(far, far_items, kerf, cuts),
            None => far_items.is_empty(),
        }
}

/// Picks the valid pass closest to the region origin, horizontal first on
/// ties. Only item edges are candidates: if any line through a gap is valid,
/// so is the one hugging the nearest item.
fn choose_cut(region: &Region, items: &[Region], kerf: u32) -> Option<(CutOrientation, u32)> {
    [CutOrientation::Horizontal, CutOrientation::Vertical]
        .into_iter()
        .flat_map(move |o| {
            items
                .iter()
                .flat_map(move |it| [Some(it.hi(o)), it.lo(o).checked_sub(kerf)])
                .flatten()
                .filter(move |&c| region.is_cut_by(o, c, kerf))
                .filter(move |&c| {
                    items
                        .iter()
                        .all(|it| it.hi(o) <= c || it.lo(o) >= c.saturating_add(kerf))
                })
                .map(move |c| (o, c))
        })
        .min_by_key(|&(o, c)| (c.saturating_sub(region.lo(o)), o == CutOrientation::Vertical))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Applies `cuts` in order to the empty board and returns the regions
    /// left over. Panics if a cut does not span exactly one current region.
    pub(crate) fn replay(board: Rect, cuts: &[CutLine], kerf: u32) -> Vec<Region> {
        let mut regions = vec![Region::of_board(board)];
        for (i, cut) in cuts.iter().enumerate() {
            let o = cut.orientation;
            let hits: Vec<usize> = regions
                .iter()
                .enumerate()
                .filter(|(_, r)| {
                    let (start, end) = match o {
                        CutOrientation::Horizontal => (r.x0, r.x1),
                        CutOrientation::Vertical => (r.y0, r.y1),
                    };
                    r.is_cut_by(o, cut.position, kerf) && start == cut.start && end == cut.end
                })
                .map(|(idx, _)| idx)
                .collect();
            assert_eq!(hits.len(), 1, "cut {i} ({cut:?}) spans {} regions", hits.len());
            let region = regions.swap_remove(hits[0]);
            let (near, far) = region.split(o, cut.position, kerf);
            regions.extend(near);
            regions.extend(far);
        }
        regions
    }

    pub(crate) fn assert_cuts_reproduce(board: Rect, pieces: &[PlacedPiece], cuts: &[CutLine], kerf: u32) {
        let regions = replay(board, cuts, kerf);
        for p in pieces {
            let footprint = Region::of_piece(p);
            assert!(
                regions.contains(&footprint),
                "piece {} {} @ ({},{}) is not reproduced by the cut list",
                p.piece_id,
                p.rect,
                p.x,
                p.y
            );
        }
    }

    fn piece(id: &str, x: u32, y: u32, w: u32, h: u32) -> PlacedPiece {
        PlacedPiece {
            piece_id: id.to_string(),
            rect: Rect::new(w, h),
            x,
            y,
            rotated: false,
        }
    }

    #[test]
    fn test_full_board_piece_needs_no_cut() {
        let board = Rect::new(100, 50);
        let cuts = extract(board, &[piece("a", 0, 0, 100, 50)], 3).unwrap();
        assert!(cuts.is_empty());
    }

    #[test]
    fn test_single_piece_trimmed_on_two_sides() {
        let board = Rect::new(100, 100);
        let pieces = [piece("a", 0, 0, 60, 30)];
        let cuts = extract(board, &pieces, 0).unwrap();
        assert_eq!(
            cuts,
            vec![
                CutLine {
                    orientation: CutOrientation::Horizontal,
                    position: 30,
                    start: 0,
                    end: 100,
                },
                CutLine {
                    orientation: CutOrientation::Vertical,
                    position: 60,
                    start: 0,
                    end: 30,
                },
            ]
        );
        assert_cuts_reproduce(board, &pieces, &cuts, 0);
    }

    #[test]
    fn test_grid_with_kerf() {
        let board = Rect::new(103, 103);
        let pieces = [
            piece("a", 0, 0, 50, 50),
            piece("b", 53, 0, 50, 50),
            piece("c", 0, 53, 50, 50),
            piece("d", 53, 53, 50, 50),
        ];
        let cuts = extract(board, &pieces, 3).unwrap();
        assert_eq!(cuts.len(), 3);
        assert_eq!(cuts[0].orientation, CutOrientation::Horizontal);
        assert_eq!(cuts[0].position, 50);
        assert_cuts_reproduce(board, &pieces, &cuts, 3);
    }

    #[test]
    fn test_piece_in_kerf_gap_blocks_cut() {
        // b starts 1 unit after a, inside the 3 unit blade path.
        let board = Rect::new(100, 10);
        let pieces = [piece("a", 0, 0, 50, 10), piece("b", 51, 0, 49, 10)];
        assert!(extract(board, &pieces, 3).is_none());
        assert!(extract(board, &pieces, 1).is_some());
    }

    #[test]
    fn test_pinwheel_is_not_guillotine() {
        let board = Rect::new(30, 30);
        let pieces = [
            piece("n", 0, 0, 20, 10),
            piece("e", 20, 0, 10, 20),
            piece("s", 10, 20, 20, 10),
            piece("w", 0, 10, 10, 20),
        ];
        assert!(extract(board, &pieces, 0).is_none());
        let items = pieces.iter().map(Region::of_piece).collect();
        assert!(!is_guillotine(board, items, 0));
    }

    #[test]
    fn test_leading_gap_narrower_than_kerf() {
        // After the first two passes c sits 1 unit right of its region's
        // edge; the trim pass has to start in air.
        let board = Rect::new(40, 23);
        let pieces = [
            piece("a", 0, 0, 10, 23),
            piece("b", 13, 0, 7, 10),
            piece("c", 14, 13, 26, 10),
        ];
        let cuts = extract(board, &pieces, 3).unwrap();
        assert!(cuts.contains(&CutLine {
            orientation: CutOrientation::Vertical,
            position: 11,
            start: 13,
            end: 23,
        }));
        assert_cuts_reproduce(board, &pieces, &cuts, 3);
    }

    #[test]
    fn test_leading_waste_is_trimmed() {
        let board = Rect::new(100, 100);
        let pieces = [piece("a", 40, 0, 60, 100)];
        let cuts = extract(board, &pieces, 0).unwrap();
        assert_eq!(cuts.len(), 1);
        assert_eq!(cuts[0].orientation, CutOrientation::Vertical);
        assert_eq!(cuts[0].position, 40);
        assert_cuts_reproduce(board, &pieces, &cuts, 0);
    }
}
