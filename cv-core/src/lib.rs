//! # Rust CV Core
//!
//! Common types shared by the frame-to-frame tracking crates in this workspace.
//!
//! The crate names the pixel-space [`KeyPoint`] that every
//! tracked feature carries, the [`ImagePoint`] trait for anything that has a position on
//! an image, and [`FeatureMatch`], the pair type consumed by estimators. It re-exports
//! [`nalgebra`] and [`sample_consensus`] so the estimator and consensus crates agree on
//! one version of each.
//!
//! The crate is `#![no_std]` and does not require an allocator.
//!
//! ## Coordinates
//!
//! A [`KeyPoint`] lives in the pixel coordinates of the frame it was detected on, after
//! whatever resize the caller applied. Nothing in this workspace rescales or undistorts
//! keypoints. `+x` faces right and `+y` faces the bottom of the image, with the origin
//! at the top-left corner:
//!
//! ```text
//!   (0,0) ----------> +x
//!     |
//!     |      * keypoint (x, y)
//!     |
//!     v +y
//! ```

#![no_std]

mod keypoint;
mod matches;

pub use keypoint::*;
pub use matches::*;
pub use nalgebra;
pub use sample_consensus;
