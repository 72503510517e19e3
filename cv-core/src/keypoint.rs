use derive_more::{AsMut, AsRef, Deref, DerefMut, From, Into};
use nalgebra::Point2;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// Allows the retrieval of the point on the image the feature came from.
pub trait ImagePoint {
    /// Retrieves the point on the image
    fn image_point(&self) -> Point2<f64>;
}

/// A point on an image frame in pixel coordinates.
///
/// The point is neither undistorted nor normalized. It is exactly where the
/// feature extractor reported the feature on the (possibly resized) frame.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, AsMut, AsRef, Deref, DerefMut, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct KeyPoint(pub Point2<f64>);

impl KeyPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self(Point2::new(x, y))
    }

    /// Squared euclidean distance in pixels.
    pub fn distance_squared(&self, other: &Self) -> f64 {
        let d = self.0 - other.0;
        d.x * d.x + d.y * d.y
    }
}

impl From<(f32, f32)> for KeyPoint {
    fn from((x, y): (f32, f32)) -> Self {
        Self::new(x as f64, y as f64)
    }
}

impl From<[f64; 2]> for KeyPoint {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl ImagePoint for KeyPoint {
    fn image_point(&self) -> Point2<f64> {
        self.0
    }
}
