use cv_core::{FeatureMatch, KeyPoint};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// A feature on the previous frame associated with a feature on the current frame.
///
/// Correspondences are produced in an ordered `Vec`, and their position in it is
/// the identity used by geometric verification.
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Correspondence {
    /// Feature index in the previous frame.
    pub source: usize,
    /// Feature index in the current frame.
    pub target: usize,
    pub source_point: KeyPoint,
    pub target_point: KeyPoint,
    /// Descriptor distance of the accepted match.
    pub distance: f64,
}

impl Correspondence {
    pub fn indices(&self) -> FeatureMatch<usize> {
        FeatureMatch(self.source, self.target)
    }

    pub fn points(&self) -> FeatureMatch<KeyPoint> {
        FeatureMatch(self.source_point, self.target_point)
    }
}
