//! Tuning for the detection pipeline.
//!
//! The values below are the ones the detector was calibrated with. Output
//! coordinates depend on them, so changing one changes the results.

use clap::ValueEnum;

/// Smallest face, in pixels, the cascade searches for.
pub const MIN_FACE_SIZE: u32 = 50;

/// IoU above which two raw detections are merged into one.
pub const CLUSTER_OVERLAP: f32 = 0.2;

/// Candidates must score strictly above this to be searched for eyes.
pub const SCORE_THRESHOLD: f32 = 5.0;

/// Refinement passes of the pupil localizer.
pub const PUPIL_PERTURBATIONS: u32 = 50;

/// Refinement passes of the mouth-corner landmarker.
pub const LANDMARK_PERTURBATIONS: u32 = 63;

/// Pupils sit this fraction of the face scale above the face centre...
pub const EYE_ROW_OFFSET: f32 = 0.085;
/// ...and this fraction of the face scale either side of it.
pub const EYE_COL_OFFSET: f32 = 0.185;
/// Pupil search radius as a fraction of the face scale.
pub const EYE_SEARCH_SCALE: f32 = 0.45;

/// Pupil scales are reported in eighths of the localizer's units.
pub const EYE_SCALE_DIVISOR: f32 = 8.;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Preset {
    /// Windows shift by 10% of their size, sizes grow 10% per pass
    #[default]
    Fast,
    /// Windows shift by 50% of their size, sizes grow 2% per pass
    Fine,
}

impl Preset {
    pub fn step_ratio(&self) -> f32 {
        match self {
            Preset::Fast => 0.1,
            Preset::Fine => 0.5,
        }
    }

    pub fn scale_ratio(&self) -> f32 {
        match self {
            Preset::Fast => 1.1,
            Preset::Fine => 1.02,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DetectorConfig {
    pub min_size: u32,
    pub step_ratio: f32,
    pub scale_ratio: f32,
    pub cluster_overlap: f32,
    pub score_threshold: f32,
    pub pupil_perturbations: u32,
    pub landmark_perturbations: u32,
}

impl DetectorConfig {
    pub fn from_preset(preset: Preset) -> DetectorConfig {
        DetectorConfig {
            min_size: MIN_FACE_SIZE,
            step_ratio: preset.step_ratio(),
            scale_ratio: preset.scale_ratio(),
            cluster_overlap: CLUSTER_OVERLAP,
            score_threshold: SCORE_THRESHOLD,
            pupil_perturbations: PUPIL_PERTURBATIONS,
            landmark_perturbations: LANDMARK_PERTURBATIONS,
        }
    }
}

impl Default for DetectorConfig {
    fn default() -> DetectorConfig {
        DetectorConfig::from_preset(Preset::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_fast_preset() {
        let config = DetectorConfig::default();
        assert_eq!(config, DetectorConfig::from_preset(Preset::Fast));
        assert_eq!(config.min_size, 50);
        assert_eq!(config.step_ratio, 0.1);
        assert_eq!(config.scale_ratio, 1.1);
        assert_eq!(config.cluster_overlap, 0.2);
        assert_eq!(config.score_threshold, 5.0);
        assert_eq!(config.pupil_perturbations, 50);
        assert_eq!(config.landmark_perturbations, 63);
    }

    #[test]
    fn test_fine_preset() {
        let config = DetectorConfig::from_preset(Preset::Fine);
        assert_eq!(config.step_ratio, 0.5);
        assert_eq!(config.scale_ratio, 1.02);
        assert_eq!(config.score_threshold, SCORE_THRESHOLD);
    }
}
