use std::path::Path;

use anyhow::Result;
use image::GrayImage;
use tracing::info;

use super::detection::FaceFinder;
use super::landmarks::FaceLandmarker;
use super::pupils::PupilLocator;
use crate::classifier::{Classifier, SearchParams};
use crate::shapes::{Candidate, LandmarkPoint, Pupil, PupilRegion};

pub const FACE_MODEL: &str = "seeta_fd_frontal_v1.0.bin";
pub const LANDMARK_MODEL: &str = "mediapipe_face_landmark.onnx";

/// The bundled classifier: a SeetaFace cascade for faces, a perturbation
/// search for pupils and the MediaPipe face mesh for mouth corners.
pub struct CascadeClassifier {
    face_finder: FaceFinder,
    pupil_locator: PupilLocator,
    face_landmarker: FaceLandmarker,
}

impl CascadeClassifier {
    /// Load every model from `models_dir`. Meant to run once at start-up.
    pub fn load(models_dir: &Path, threads: usize) -> Result<CascadeClassifier> {
        info!("Loading models from {models_dir:?}");

        Ok(CascadeClassifier {
            face_finder: FaceFinder::new(&models_dir.join(FACE_MODEL))?,
            pupil_locator: PupilLocator,
            face_landmarker: FaceLandmarker::new(&models_dir.join(LANDMARK_MODEL), threads)?,
        })
    }
}

impl Classifier for CascadeClassifier {
    fn detect_faces(&self, image: &GrayImage, params: &SearchParams) -> Result<Vec<Candidate>> {
        self.face_finder.run(image, params)
    }

    fn locate_pupil(&self, image: &GrayImage, region: &PupilRegion) -> Result<Option<Pupil>> {
        Ok(self.pupil_locator.run(image, region))
    }

    fn locate_landmark(
        &self,
        image: &GrayImage,
        left: &Pupil,
        right: &Pupil,
        perturbations: u32,
        mirrored: bool,
    ) -> Result<LandmarkPoint> {
        self.face_landmarker
            .run(image, left, right, perturbations, mirrored)
    }
}
