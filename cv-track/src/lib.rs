//! # `cv-track`
//!
//! Frame-to-frame feature association for video streams.
//!
//! For every incoming frame the [`Tracker`] extracts features, stores them in a
//! [`FrameStore`], matches them against the previous frame with a
//! [`BruteForceMatcher`], drops ambiguous matches with a [`RatioTest`], and finally
//! keeps only the correspondences consistent with one planar transform found by a
//! [`GeometricSolver`]. The default solver is [`HomographySolver`], which runs
//! [`Ransac`] over the [`four_point::FourPoint`] estimator.
//!
//! ```text
//! image -> features -> FrameStore -> knn2(previous, current) -> ratio test -> verify -> correspondences
//! ```
//!
//! Feature extraction is a black box behind [`FeatureExtractor`]. With the `akaze`
//! feature enabled, `akaze::Akaze` can be used directly on an `image::DynamicImage`.
//!
//! ## Degraded cycles
//!
//! A cycle never panics or returns an error to the caller. When a stage cannot run,
//! the [`FrameTrack`] records why in its `degraded` field:
//!
//! * [`TrackError::EmptyExtraction`] - the frame had no features
//! * [`TrackError::InsufficientCandidates`] - fewer than two features to pick neighbors from
//! * [`TrackError::InsufficientCorrespondences`] - too few ratio-test survivors to verify,
//!   so the survivors are returned unverified
//! * [`TrackError::NoModelFound`] - verification failed, so nothing is returned

mod consensus;
mod correspondence;
mod error;
mod feature;
mod filter;
mod frame_store;
mod matcher;
mod settings;
mod tracker;
mod verifier;

pub use consensus::*;
pub use correspondence::*;
pub use error::*;
pub use feature::*;
pub use filter::*;
pub use frame_store::*;
pub use matcher::*;
pub use settings::*;
pub use tracker::*;
pub use verifier::*;

pub use bitarray::{BitArray, Hamming};
pub use cv_core::{nalgebra, FeatureMatch, ImagePoint, KeyPoint};
pub use four_point::{FourPoint, Homography};
