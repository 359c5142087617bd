//! Geometry shared by the classifier and the pipeline, and the translation
//! of raw classifier tuples into the public result model.

pub mod candidate;
pub mod landmark;
pub mod point;
pub mod pupil;
pub mod rect;

pub use candidate::Candidate;
pub use landmark::LandmarkPoint;
pub use point::PointF32;
pub use pupil::{Pupil, PupilRegion, Side};
pub use rect::RectF32;
