use crate::MIN_VERIFICATION_CANDIDATES;
use thiserror::Error;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A condition that cut a tracking cycle short.
///
/// None of these are fatal. The tracker records the condition on the
/// [`FrameTrack`](crate::FrameTrack) it returns and keeps going with the next frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub enum TrackError {
    #[error("the feature extractor produced no features for this frame")]
    EmptyExtraction,
    #[error("nearest/second-nearest search needs at least 2 candidates, found {found}")]
    InsufficientCandidates { found: usize },
    #[error("geometric verification needs at least {required} correspondences, found {found}")]
    InsufficientCorrespondences { found: usize, required: usize },
    #[error("no model reached the minimum inlier support of {min_inliers}")]
    NoModelFound { min_inliers: usize },
}

/// Rejected [`TrackSettings`](crate::TrackSettings).
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum SettingsError {
    #[error("ratio must lie strictly between 0 and 1, got {0}")]
    Ratio(f64),
    #[error("reprojection threshold must be positive and finite, got {0}")]
    ReprojectionThreshold(f64),
    #[error("max iterations must be at least 1")]
    MaxIterations,
    #[error("confidence must lie strictly between 0 and 1, got {0}")]
    Confidence(f64),
    #[error(
        "min verification candidates must be at least {min}, got {0}",
        min = MIN_VERIFICATION_CANDIDATES
    )]
    MinVerificationCandidates(usize),
}
