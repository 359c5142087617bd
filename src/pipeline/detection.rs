use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use image::GrayImage;
use rustface::{Detector, FaceInfo, ImageData, Model};
use tracing::{span, trace, Level};

use crate::classifier::SearchParams;
use crate::shapes::Candidate;

/// Side of the square window the funnel cascade classifies.
const WINDOW: f32 = 40.;
/// Smallest face the cascade accepts.
const MIN_WINDOW: u32 = 20;
/// Raw score floor. Real thresholding happens in the pipeline.
const SCORE_FLOOR: f64 = 1.;

/// SeetaFace funnel cascade face detector.
pub struct FaceFinder {
    model: Model,
}

impl FaceFinder {
    pub fn new(model_path: &Path) -> Result<FaceFinder> {
        let file = File::open(model_path)
            .with_context(|| format!("opening face model {model_path:?}"))?;
        let model = rustface::read_model(BufReader::new(file))
            .with_context(|| format!("unpacking face model {model_path:?}"))?;

        Ok(FaceFinder { model })
    }

    pub fn run(&self, image: &GrayImage, params: &SearchParams) -> Result<Vec<Candidate>> {
        let span = span!(Level::DEBUG, "face_finder");
        let _guard = span.enter();

        // Nothing smaller than the cascade window, or than the smallest
        // face searched for, can hold a face
        let (width, height) = image.dimensions();
        let smallest = (WINDOW as u32).max(params.min_size);
        if width.min(height) < smallest {
            trace!("Image {width}x{height} too small to search");
            return Ok(Vec::new());
        }

        // Detectors keep per-run buffers, so every run gets its own
        let mut detector = rustface::create_detector_with_model(self.model.clone());
        configure(detector.as_mut(), params);

        let faces = detector.detect(&ImageData::new(image.as_raw(), width, height));
        trace!("Cascade returned {} faces", faces.len());

        Ok(faces.iter().map(to_candidate).collect())
    }
}

/// Cascade boxes are top-left anchored, candidates are centred.
fn to_candidate(face: &FaceInfo) -> Candidate {
    let bbox = face.bbox();
    let w = bbox.width() as i32;
    let h = bbox.height() as i32;

    Candidate::new(bbox.y() + h / 2, bbox.x() + w / 2, w.max(h), face.score() as f32)
}

fn configure(detector: &mut dyn Detector, params: &SearchParams) {
    let (min_size, max_size, step, pyramid_factor) = cascade_settings(params);

    detector.set_min_face_size(min_size);
    detector.set_max_face_size(max_size);
    detector.set_slide_window_step(step, step);
    detector.set_pyramid_scale_factor(pyramid_factor);
    detector.set_score_thresh(SCORE_FLOOR);
}

/// Map search parameters onto the cascade's knobs, clamped to the ranges it
/// accepts (it panics outside of them).
fn cascade_settings(params: &SearchParams) -> (u32, u32, u32, f32) {
    let min_size = params.min_size.max(MIN_WINDOW);
    let max_size = params.max_size.max(min_size);
    let step = ((params.step_ratio * WINDOW).round() as u32).max(1);
    let pyramid_factor = if params.scale_ratio > 0. {
        (1. / params.scale_ratio).clamp(0.01, 0.99)
    } else {
        0.99
    };

    (min_size, max_size, step, pyramid_factor)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cascade_settings() {
        let fast = SearchParams {
            min_size: 50,
            max_size: 640,
            step_ratio: 0.1,
            scale_ratio: 1.1,
        };
        let (min_size, max_size, step, factor) = cascade_settings(&fast);
        assert_eq!(min_size, 50);
        assert_eq!(max_size, 640);
        assert_eq!(step, 4);
        assert!((factor - 0.909).abs() < 1e-3);

        let fine = SearchParams {
            step_ratio: 0.5,
            scale_ratio: 1.02,
            ..fast
        };
        let (_, _, step, factor) = cascade_settings(&fine);
        assert_eq!(step, 20);
        assert!((factor - 0.98).abs() < 1e-3);
    }

    fn face_info(x: i32, y: i32, width: u32, height: u32, score: f64) -> FaceInfo {
        let mut face = FaceInfo::new();
        let bbox = face.bbox_mut();
        bbox.set_x(x);
        bbox.set_y(y);
        bbox.set_width(width);
        bbox.set_height(height);
        face.set_score(score);
        face
    }

    #[test]
    fn test_to_candidate() {
        let candidate = to_candidate(&face_info(-7, 30, 51, 61, 12.5));
        assert_eq!(candidate.row, 60);
        assert_eq!(candidate.col, 18);
        assert_eq!(candidate.scale, 61);
        assert_eq!(candidate.score, 12.5);

        let wide = to_candidate(&face_info(100, 40, 80, 64, 3.));
        assert_eq!((wide.row, wide.col, wide.scale), (72, 140, 80));
    }

    #[test]
    fn test_cascade_settings_clamped() {
        let odd = SearchParams {
            min_size: 5,
            max_size: 10,
            step_ratio: 0.,
            scale_ratio: 1.,
        };
        let (min_size, max_size, step, factor) = cascade_settings(&odd);
        assert_eq!(min_size, 20);
        assert_eq!(max_size, 20);
        assert_eq!(step, 1);
        assert_eq!(factor, 0.99);
    }
}
