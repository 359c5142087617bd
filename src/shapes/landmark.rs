use crate::detection::Mouth;

/// A facial keypoint reported by a landmark model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LandmarkPoint {
    pub col: i32,
    pub row: i32,
    pub scale: f32,
}

impl LandmarkPoint {
    pub fn new(col: i32, row: i32, scale: f32) -> LandmarkPoint {
        LandmarkPoint { col, row, scale }
    }
}

impl Mouth {
    /// Box spanned by the two mouth corners, in the order the landmark passes
    /// produced them (plain first, mirrored second). Height never drops
    /// below 1.
    pub fn from_corners(first: &LandmarkPoint, second: &LandmarkPoint) -> Mouth {
        let width = second.col - first.col;
        let mut height = second.row - first.row;
        if height <= 0 {
            height = 1;
        }

        Mouth {
            x: first.col,
            y: first.row + (first.row - second.row) / 2,
            height,
            width,
        }
    }
}
