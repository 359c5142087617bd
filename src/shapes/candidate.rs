use super::rect::RectF32;
use crate::detection::FaceBounds;

/// Raw face detection: a square of side `scale` centred on (`row`, `col`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub row: i32,
    pub col: i32,
    pub scale: i32,
    pub score: f32,
}

impl Candidate {
    pub fn new(row: i32, col: i32, scale: i32, score: f32) -> Candidate {
        Candidate {
            row,
            col,
            scale,
            score,
        }
    }

    /// Top-left anchored box. Halving truncates, matching the cascade's
    /// integer units.
    pub fn bounds(&self) -> FaceBounds {
        FaceBounds {
            x: self.col - self.scale / 2,
            y: self.row - self.scale / 2,
            height: self.scale,
            width: self.scale,
        }
    }

    pub fn rect(&self) -> RectF32 {
        RectF32::from_center(
            self.col as f32,
            self.row as f32,
            self.scale as f32,
            self.scale as f32,
        )
    }
}
