use std::io::Read;
use std::sync::Arc;

use anyhow::Result;
use image::GrayImage;
use tracing::{debug, error, span, trace, warn, Level};

use crate::classifier::{Classifier, SearchParams};
use crate::config::DetectorConfig;
use crate::detection::{Face, FaceDetection, Mouth};
use crate::error::DetectionError;
use crate::shapes::{Candidate, Pupil, PupilRegion, Side};

pub mod cascade;
mod detection;
mod landmarks;
mod model;
mod pupils;

/// Turns an encoded image into the faces on it. Cheap to clone: clones share
/// the classifier.
pub struct Pipeline<C: Classifier + ?Sized> {
    classifier: Arc<C>,
    config: DetectorConfig,
}

impl<C: Classifier + ?Sized> Clone for Pipeline<C> {
    fn clone(&self) -> Self {
        Pipeline {
            classifier: Arc::clone(&self.classifier),
            config: self.config.clone(),
        }
    }
}

impl<C: Classifier + ?Sized> Pipeline<C> {
    pub fn new(classifier: Arc<C>, config: DetectorConfig) -> Pipeline<C> {
        Pipeline { classifier, config }
    }

    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    /// Decode a PNG or JPEG stream and detect the faces on it.
    pub fn detect<R: Read>(&self, image: R) -> Result<FaceDetection, DetectionError> {
        let span = span!(Level::DEBUG, "pipeline");
        let _guard = span.enter();

        let gray = decode_grayscale(image)?;
        self.detect_image(&gray)
    }

    /// Detect faces on an already decoded image.
    pub fn detect_image(&self, image: &GrayImage) -> Result<FaceDetection, DetectionError> {
        let candidates = self.find_faces(image).map_err(internal)?;
        if candidates.is_empty() {
            return Err(DetectionError::NoFacesFound);
        }

        let mut detection = FaceDetection::default();
        for candidate in candidates {
            match self.assemble_face(image, &candidate).map_err(internal)? {
                Some(face) => detection.faces.push(face),
                None => debug!("Dropping candidate {candidate:?}: missing pupil"),
            }
        }

        if detection.is_empty() {
            return Err(DetectionError::NoFacesFound);
        }

        debug!("Detected {} faces", detection.len());
        Ok(detection)
    }

    /// Clustered candidates the classifier is confident enough about.
    fn find_faces(&self, image: &GrayImage) -> Result<Vec<Candidate>> {
        let span = span!(Level::DEBUG, "find_faces");
        let _guard = span.enter();

        let params = SearchParams {
            min_size: self.config.min_size,
            max_size: image.width(),
            step_ratio: self.config.step_ratio,
            scale_ratio: self.config.scale_ratio,
        };

        let detections = self.classifier.detect_faces(image, &params)?;
        trace!("{} raw detections", detections.len());

        let clusters = self
            .classifier
            .cluster_detections(detections, self.config.cluster_overlap);

        let threshold = self.config.score_threshold;
        Ok(clusters
            .into_iter()
            .filter(|c| {
                let keep = c.score > threshold;
                if !keep {
                    trace!("Candidate {c:?} below score threshold {threshold}");
                }
                keep
            })
            .collect())
    }

    fn locate_pupil(&self, image: &GrayImage, face: &Candidate, side: Side) -> Result<Option<Pupil>> {
        let region = PupilRegion::for_candidate(face, side, self.config.pupil_perturbations);
        let pupil = self.classifier.locate_pupil(image, &region)?;

        Ok(pupil.filter(Pupil::is_located))
    }

    fn assemble_face(&self, image: &GrayImage, candidate: &Candidate) -> Result<Option<Face>> {
        let left = self.locate_pupil(image, candidate, Side::Left)?;
        let right = self.locate_pupil(image, candidate, Side::Right)?;

        let (Some(left), Some(right)) = (left, right) else {
            return Ok(None);
        };

        let perturbations = self.config.landmark_perturbations;
        let first = self
            .classifier
            .locate_landmark(image, &left, &right, perturbations, false)?;
        let second = self
            .classifier
            .locate_landmark(image, &left, &right, perturbations, true)?;

        Ok(Some(Face {
            bounds: candidate.bounds(),
            mouth: Mouth::from_corners(&first, &second),
            left_eye: left.into(),
            right_eye: right.into(),
        }))
    }
}

/// Classifier failures are reported without their cause, so log it here.
fn internal(err: anyhow::Error) -> DetectionError {
    error!("Detection failed: {err:?}");
    DetectionError::Internal(err)
}

fn decode_grayscale<R: Read>(mut reader: R) -> Result<GrayImage, DetectionError> {
    let mut bytes = Vec::new();
    if let Err(e) = reader.read_to_end(&mut bytes) {
        warn!("cannot read the image: {e}");
        return Err(DetectionError::CantReadImage);
    }

    match image::load_from_memory(&bytes) {
        Ok(img) => Ok(img.to_luma8()),
        Err(e) => {
            warn!("cannot open the image: {e}");
            Err(DetectionError::CantReadImage)
        }
    }
}
