use super::candidate::Candidate;
use super::point::PointF32;
use crate::config::{EYE_COL_OFFSET, EYE_ROW_OFFSET, EYE_SCALE_DIVISOR, EYE_SEARCH_SCALE};
use crate::detection::Eye;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// Where, and how hard, to look for one pupil.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PupilRegion {
    pub row: i32,
    pub col: i32,
    pub scale: f32,
    pub perturbations: u32,
}

impl PupilRegion {
    /// Search window for one eye of a face candidate. Eyes sit slightly above
    /// the face centre, symmetric about it.
    pub fn for_candidate(face: &Candidate, side: Side, perturbations: u32) -> PupilRegion {
        let scale = face.scale as f32;
        let row_offset = (EYE_ROW_OFFSET * scale) as i32;
        let col_offset = (EYE_COL_OFFSET * scale) as i32;

        let col = match side {
            Side::Left => face.col - col_offset,
            Side::Right => face.col + col_offset,
        };

        PupilRegion {
            row: face.row - row_offset,
            col,
            scale: scale * EYE_SEARCH_SCALE,
            perturbations,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pupil {
    pub row: i32,
    pub col: i32,
    pub scale: f32,
}

impl Pupil {
    pub fn new(row: i32, col: i32, scale: f32) -> Pupil {
        Pupil { row, col, scale }
    }

    /// Localizers report "not found" with a non-positive row or column, so a
    /// pupil sitting exactly on row 0 or column 0 is treated as missing too.
    pub fn is_located(&self) -> bool {
        self.row > 0 && self.col > 0
    }

    pub fn center(&self) -> PointF32 {
        PointF32::new(self.col as f32, self.row as f32)
    }
}

impl From<Pupil> for Eye {
    fn from(p: Pupil) -> Eye {
        Eye {
            x: p.col,
            y: p.row,
            scale: (p.scale / EYE_SCALE_DIVISOR) as i32,
        }
    }
}
