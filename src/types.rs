use serde::{Deserialize, Deserializer, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub w: u32,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub h: u32,
}

impl Rect {
    pub fn new(w: u32, h: u32) -> Self {
        Self { w, h }
    }

    pub fn area(&self) -> u64 {
        self.w as u64 * self.h as u64
    }

    pub fn rotated(&self) -> Self {
        Self {
            w: self.h,
            h: self.w,
        }
    }

    pub fn fits_in(&self, other: &Rect) -> bool {
        self.w <= other.w && self.h <= other.h
    }

    pub fn is_empty(&self) -> bool {
        self.w == 0 || self.h == 0
    }
}

impl std::fmt::Display for Rect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.w, self.h)
    }
}

/// Accepts a JSON integer or an integral float (`600` or `600.0`) and rejects
/// negatives, fractions and values beyond `u32::MAX`.
pub fn deserialize_u32_from_number<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberVisitor;

    impl serde::de::Visitor<'_> for NumberVisitor {
        type Value = u32;

        fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
            f.write_str("a non-negative whole number")
        }

        fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<u32, E> {
            u32::try_from(v).map_err(|_| E::custom(format!("{v} is out of range")))
        }

        fn visit_i64<E: serde::de::Error>(self, v: i64) -> Result<u32, E> {
            if v < 0 {
                return Err(E::custom(format!("{v} must not be negative")));
            }
            self.visit_u64(v as u64)
        }

        fn visit_f64<E: serde::de::Error>(self, v: f64) -> Result<u32, E> {
            if v < 0.0 {
                return Err(E::custom(format!("{v} must not be negative")));
            }
            if v.fract() != 0.0 || v > u32::MAX as f64 {
                return Err(E::custom(format!("{v} is not a whole number in range")));
            }
            Ok(v as u32)
        }
    }

    deserializer.deserialize_any(NumberVisitor)
}

/// One line of the cutting list: `qty` copies of `rect`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Piece {
    pub id: String,
    pub rect: Rect,
    #[serde(deserialize_with = "deserialize_u32_from_number")]
    pub qty: u32,
    #[serde(default = "default_true")]
    pub allow_rotate: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

fn default_true() -> bool {
    true
}

impl Piece {
    pub fn new(id: impl Into<String>, rect: Rect, qty: u32, allow_rotate: bool) -> Self {
        Self {
            id: id.into(),
            rect,
            qty,
            allow_rotate,
            label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacedPiece {
    pub piece_id: String,
    /// Footprint as cut, i.e. already swapped when `rotated` is set.
    pub rect: Rect,
    pub x: u32,
    pub y: u32,
    pub rotated: bool,
}

impl PlacedPiece {
    pub fn right(&self) -> u32 {
        self.x + self.rect.w
    }

    pub fn bottom(&self) -> u32 {
        self.y + self.rect.h
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CutOrientation {
    /// Runs along x at a fixed y.
    Horizontal,
    /// Runs along y at a fixed x.
    Vertical,
}

/// One saw pass. `position` is the leading edge of the blade on the cut
/// axis; the pass spans `start..end` on the other axis. A trim pass can start
/// up to `kerf` before the edge of the region it cuts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CutLine {
    pub orientation: CutOrientation,
    pub position: u32,
    pub start: u32,
    pub end: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FreeRect {
    pub x: u32,
    pub y: u32,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardLayout {
    pub board_number: usize,
    pub placed_pieces: Vec<PlacedPiece>,
    pub free_rects: Vec<FreeRect>,
    pub efficiency: f64,
    pub waste_area: u64,
    pub cut_lines: Vec<CutLine>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnplacedPiece {
    pub piece_id: String,
    pub qty: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiBoardResult {
    pub board: Rect,
    pub kerf: u32,
    pub boards: Vec<BoardLayout>,
    pub total_boards: usize,
    pub total_pieces: u32,
    pub total_placed_pieces: u32,
    pub total_unplaced_pieces: u32,
    pub overall_efficiency: f64,
    pub unplaced_pieces: Vec<UnplacedPiece>,
}

impl MultiBoardResult {
    pub fn waste_percent(&self) -> f64 {
        if self.boards.is_empty() {
            return 0.0;
        }
        (1.0 - self.overall_efficiency) * 100.0
    }

    pub fn warning(&self) -> Option<String> {
        match self.total_unplaced_pieces {
            0 => None,
            1 => Some("1 piece exceeds the maximum board size".to_string()),
            n => Some(format!("{n} pieces exceed the maximum board size")),
        }
    }
}
