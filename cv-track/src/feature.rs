use cv_core::KeyPoint;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// One detected point on one frame: where it is and what it looks like.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Feature<D> {
    keypoint: KeyPoint,
    descriptor: D,
}

impl<D> Feature<D> {
    pub fn new(keypoint: KeyPoint, descriptor: D) -> Self {
        Self {
            keypoint,
            descriptor,
        }
    }

    pub fn keypoint(&self) -> KeyPoint {
        self.keypoint
    }

    pub fn descriptor(&self) -> &D {
        &self.descriptor
    }

    pub fn into_parts(self) -> (KeyPoint, D) {
        (self.keypoint, self.descriptor)
    }
}

/// Turns an image into an ordered set of features.
///
/// The tracker does not care how features are found. It only needs the
/// descriptor type to agree with the [`DescriptorMetric`](crate::DescriptorMetric)
/// it was built with.
pub trait FeatureExtractor<I> {
    type Descriptor;

    fn extract(&self, image: &I) -> Vec<Feature<Self::Descriptor>>;
}

#[cfg(feature = "akaze")]
mod akaze_extractor {
    use super::*;
    use akaze::Akaze;
    use bitarray::BitArray;
    use image::DynamicImage;

    /// AKAZE produces 486-bit binary descriptors packed into 64 bytes, compared with Hamming.
    impl FeatureExtractor<DynamicImage> for Akaze {
        type Descriptor = BitArray<64>;

        fn extract(&self, image: &DynamicImage) -> Vec<Feature<BitArray<64>>> {
            let (keypoints, descriptors) = Akaze::extract(self, image);
            keypoints
                .into_iter()
                .zip(descriptors)
                .map(|(keypoint, descriptor)| Feature::new(keypoint.point.into(), descriptor))
                .collect()
        }
    }
}
