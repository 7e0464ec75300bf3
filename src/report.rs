use crate::types::{BoardLayout, CutLine, FreeRect, MultiBoardResult, PlacedPiece, Rect, UnplacedPiece};

pub fn board_layout(
    board: Rect,
    board_number: usize,
    placed_pieces: Vec<PlacedPiece>,
    free_rects: Vec<FreeRect>,
    cut_lines: Vec<CutLine>,
) -> BoardLayout {
    let board_area = board.area();
    let used: u64 = placed_pieces.iter().map(|p| p.rect.area()).sum();
    BoardLayout {
        board_number,
        placed_pieces,
        free_rects,
        efficiency: used as f64 / board_area as f64,
        waste_area: board_area - used,
        cut_lines,
    }
}

pub fn summarize(
    board: Rect,
    kerf: u32,
    boards: Vec<BoardLayout>,
    total_pieces: u32,
    unplaced_pieces: Vec<UnplacedPiece>,
) -> MultiBoardResult {
    let total_board_area = board.area() * boards.len() as u64;
    let used_area: u64 = boards
        .iter()
        .flat_map(|b| &b.placed_pieces)
        .map(|p| p.rect.area())
        .sum();
    let total_placed_pieces = boards.iter().map(|b| b.placed_pieces.len() as u32).sum();
    let total_unplaced_pieces = unplaced_pieces.iter().map(|u| u.qty).sum();
    let overall_efficiency = if total_board_area == 0 {
        0.0
    } else {
        used_area as f64 / total_board_area as f64
    };

    MultiBoardResult {
        board,
        kerf,
        total_boards: boards.len(),
        boards,
        total_pieces,
        total_placed_pieces,
        total_unplaced_pieces,
        overall_efficiency,
        unplaced_pieces,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn placed(w: u32, h: u32) -> PlacedPiece {
        PlacedPiece {
            piece_id: "a".to_string(),
            rect: Rect::new(w, h),
            x: 0,
            y: 0,
            rotated: false,
        }
    }

    #[test]
    fn test_board_layout_efficiency_and_waste() {
        let layout = board_layout(Rect::new(100, 50), 1, vec![placed(50, 50)], vec![], vec![]);
        assert_eq!(layout.waste_area, 2500);
        assert!((layout.efficiency - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_summarize_weights_by_board_area() {
        let board = Rect::new(10, 10);
        let boards = vec![
            board_layout(board, 1, vec![placed(10, 10)], vec![], vec![]),
            board_layout(board, 2, vec![placed(5, 10)], vec![], vec![]),
        ];
        let result = summarize(
            board,
            0,
            boards,
            4,
            vec![UnplacedPiece {
                piece_id: "huge".to_string(),
                qty: 2,
            }],
        );
        assert_eq!(result.total_boards, 2);
        assert_eq!(result.total_placed_pieces, 2);
        assert_eq!(result.total_unplaced_pieces, 2);
        assert!((result.overall_efficiency - 0.75).abs() < 1e-12);
        assert!((result.waste_percent() - 25.0).abs() < 1e-9);
    }

    #[test]
    fn test_summarize_without_boards() {
        let result = summarize(Rect::new(10, 10), 0, vec![], 0, vec![]);
        assert_eq!(result.total_boards, 0);
        assert_eq!(result.overall_efficiency, 0.0);
    }
}
