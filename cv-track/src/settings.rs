use crate::SettingsError;
use cv_core::{sample_consensus::Estimator, FeatureMatch, KeyPoint};
use four_point::FourPoint;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The fewest correspondences a homography can be fitted to.
pub const MIN_VERIFICATION_CANDIDATES: usize =
    <FourPoint as Estimator<FeatureMatch<KeyPoint>>>::MIN_SAMPLES;

/// Which frame's descriptors are searched for in the other frame.
///
/// Correspondences always run from the previous frame (source) to the current
/// frame (target). This only picks the frame that plays the role of the query
/// during nearest-neighbor search, which decides the order of the ratio-test
/// output and which side must have the two candidates needed for a ratio.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "snake_case"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum QueryFrame {
    #[default]
    Current,
    Previous,
}

/// How much frame history the [`FrameStore`](crate::FrameStore) keeps.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde-serialize", serde(rename_all = "snake_case"))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Retention {
    /// Every frame is kept until the caller evicts it.
    #[default]
    Unbounded,
    /// Only the most recent frames are kept. Values below 2 are treated as 2.
    KeepLast(usize),
}

/// Parameters handed to a [`GeometricSolver`](crate::GeometricSolver).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ConsensusSettings {
    /// Reprojection error in pixels below which a correspondence is an inlier.
    pub threshold: f64,
    pub max_iterations: usize,
    /// Probability of having drawn an all-inlier sample at which sampling stops early.
    pub confidence: f64,
    pub min_inliers: usize,
    /// Refit the winning model on all of its inliers.
    pub refine: bool,
}

/// The settings for frame-to-frame tracking.
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TrackSettings {
    /// Lowe's ratio: a best match survives only if it is closer than `ratio` times the second best
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_ratio"))]
    pub ratio: f64,
    /// The maximum reprojection error in pixels for a correspondence to count as an inlier
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_reprojection_threshold")
    )]
    pub reprojection_threshold: f64,
    /// The maximum number of consensus iterations
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_max_iterations"))]
    pub max_iterations: usize,
    /// The confidence at which consensus stops sampling early
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_confidence"))]
    pub confidence: f64,
    /// The number of ratio-test survivors needed before geometric verification runs
    #[cfg_attr(
        feature = "serde-serialize",
        serde(default = "default_min_verification_candidates")
    )]
    pub min_verification_candidates: usize,
    /// The minimum inlier support for a verified model to be accepted
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_min_inliers"))]
    pub min_inliers: usize,
    /// Whether the winning model is refit on all of its inliers
    #[cfg_attr(feature = "serde-serialize", serde(default = "default_refine"))]
    pub refine: bool,
    /// The frame whose descriptors query the other frame
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub query: QueryFrame,
    /// How many frames of history are retained
    #[cfg_attr(feature = "serde-serialize", serde(default))]
    pub retention: Retention,
}

fn default_ratio() -> f64 {
    0.75
}

fn default_reprojection_threshold() -> f64 {
    3.0
}

fn default_max_iterations() -> usize {
    2000
}

fn default_confidence() -> f64 {
    0.85
}

fn default_min_verification_candidates() -> usize {
    MIN_VERIFICATION_CANDIDATES
}

fn default_min_inliers() -> usize {
    4
}

fn default_refine() -> bool {
    true
}

impl Default for TrackSettings {
    fn default() -> Self {
        Self {
            ratio: default_ratio(),
            reprojection_threshold: default_reprojection_threshold(),
            max_iterations: default_max_iterations(),
            confidence: default_confidence(),
            min_verification_candidates: default_min_verification_candidates(),
            min_inliers: default_min_inliers(),
            refine: default_refine(),
            query: QueryFrame::default(),
            retention: Retention::default(),
        }
    }
}

impl TrackSettings {
    pub fn validate(&self) -> Result<(), SettingsError> {
        if !(self.ratio > 0.0 && self.ratio < 1.0) {
            return Err(SettingsError::Ratio(self.ratio));
        }
        if !(self.reprojection_threshold > 0.0 && self.reprojection_threshold.is_finite()) {
            return Err(SettingsError::ReprojectionThreshold(
                self.reprojection_threshold,
            ));
        }
        if self.max_iterations == 0 {
            return Err(SettingsError::MaxIterations);
        }
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            return Err(SettingsError::Confidence(self.confidence));
        }
        if self.min_verification_candidates < MIN_VERIFICATION_CANDIDATES {
            return Err(SettingsError::MinVerificationCandidates(
                self.min_verification_candidates,
            ));
        }
        Ok(())
    }

    pub fn consensus(&self) -> ConsensusSettings {
        ConsensusSettings {
            threshold: self.reprojection_threshold,
            max_iterations: self.max_iterations,
            confidence: self.confidence,
            min_inliers: self.min_inliers,
            refine: self.refine,
        }
    }
}
