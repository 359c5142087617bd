//! The pattern matching capability the pipeline is built on.
//!
//! A [`Classifier`] bundles a face detector, a pupil localizer and a
//! mouth-corner landmark model. The pipeline only ever talks to this trait,
//! so any backend honouring it can be swapped in.

use anyhow::Result;
use image::GrayImage;

use crate::shapes::{Candidate, LandmarkPoint, Pupil, PupilRegion};

/// Face search window sizes and sweep density.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    pub min_size: u32,
    pub max_size: u32,
    /// Window shift between neighbouring positions, relative to window size.
    pub step_ratio: f32,
    /// Growth of the window size between successive passes.
    pub scale_ratio: f32,
}

/// Implementations are shared between concurrent detections and must not
/// mutate shared state from these methods.
pub trait Classifier: Send + Sync {
    /// Raw face detections, in the order the detector produced them.
    fn detect_faces(&self, image: &GrayImage, params: &SearchParams) -> Result<Vec<Candidate>>;

    /// Collapse detections of the same face into one.
    fn cluster_detections(&self, candidates: Vec<Candidate>, overlap: f32) -> Vec<Candidate> {
        cluster_detections(&candidates, overlap)
    }

    /// `None` when no pupil could be found in the region.
    fn locate_pupil(&self, image: &GrayImage, region: &PupilRegion) -> Result<Option<Pupil>>;

    /// A mouth corner, given both pupils. `mirrored` runs the model on the
    /// horizontally flipped face, which yields the opposite corner.
    fn locate_landmark(
        &self,
        image: &GrayImage,
        left: &Pupil,
        right: &Pupil,
        perturbations: u32,
        mirrored: bool,
    ) -> Result<LandmarkPoint>;
}

/// Greedy IoU clustering. Each unassigned detection seeds a cluster of every
/// detection overlapping it by more than `overlap`; members are averaged
/// (integer division) and their scores summed.
pub fn cluster_detections(candidates: &[Candidate], overlap: f32) -> Vec<Candidate> {
    let mut assigned = vec![false; candidates.len()];
    let mut clusters = Vec::new();

    for (i, seed) in candidates.iter().enumerate() {
        if assigned[i] {
            continue;
        }

        let seed_rect = seed.rect();
        let (mut row, mut col, mut scale, mut n) = (0i32, 0i32, 0i32, 0i32);
        let mut score = 0f32;

        for (j, other) in candidates.iter().enumerate() {
            if seed_rect.iou(&other.rect()) > overlap {
                assigned[j] = true;
                row += other.row;
                col += other.col;
                scale += other.scale;
                score += other.score;
                n += 1;
            }
        }

        // zero sized detections overlap nothing, not even themselves
        if n == 0 {
            continue;
        }

        clusters.push(Candidate::new(row / n, col / n, scale / n, score));
    }

    clusters
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cluster_merges_overlapping() {
        let candidates = vec![
            Candidate::new(100, 100, 50, 3.),
            Candidate::new(102, 104, 52, 2.5),
            Candidate::new(300, 300, 60, 4.),
        ];

        let clusters = cluster_detections(&candidates, 0.2);
        assert_eq!(clusters.len(), 2);

        assert_eq!(clusters[0].row, 101);
        assert_eq!(clusters[0].col, 102);
        assert_eq!(clusters[0].scale, 51);
        assert!((clusters[0].score - 5.5).abs() < 1e-6);

        assert_eq!(clusters[1], Candidate::new(300, 300, 60, 4.));
    }

    #[test]
    fn test_cluster_keeps_detection_order() {
        let candidates = vec![
            Candidate::new(300, 300, 60, 1.),
            Candidate::new(100, 100, 50, 9.),
        ];

        let clusters = cluster_detections(&candidates, 0.2);
        assert_eq!(clusters, candidates);
    }

    #[test]
    fn test_cluster_overlap_is_strict() {
        // IoU of these two is exactly 1/3
        let candidates = vec![
            Candidate::new(10, 10, 10, 1.),
            Candidate::new(10, 15, 10, 1.),
        ];

        assert_eq!(cluster_detections(&candidates, 0.5).len(), 2);
        assert_eq!(cluster_detections(&candidates, 0.2).len(), 1);
    }

    #[test]
    fn test_cluster_drops_empty_detections() {
        let candidates = vec![Candidate::new(10, 10, 0, 7.)];
        assert!(cluster_detections(&candidates, 0.2).is_empty());
        assert!(cluster_detections(&[], 0.2).is_empty());
    }
}
