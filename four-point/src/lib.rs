use cv_core::{
    nalgebra::{Matrix3, SMatrix, SVector, Vector3},
    sample_consensus::{Estimator, Model},
    FeatureMatch, KeyPoint,
};
use derive_more::{AsRef, Deref, From, Into};

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

type Square9 = SMatrix<f64, 9, 9>;
type Row9 = SVector<f64, 9>;

/// Normalized-space homographies whose determinant falls below this are rank deficient.
const DEGENERATE_DETERMINANT: f64 = 1e-9;

/// A planar projective transform taking source keypoints to target keypoints.
///
/// The matrix is kept scaled so that its bottom-right element is `1` whenever
/// that element is not vanishingly small.
#[derive(Debug, Clone, Copy, PartialEq, AsRef, Deref, From, Into)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct Homography(pub Matrix3<f64>);

impl Homography {
    pub fn identity() -> Self {
        Self(Matrix3::identity())
    }

    /// A pure image-space shift by `(x, y)` pixels.
    pub fn translation(x: f64, y: f64) -> Self {
        Self(Matrix3::new(1.0, 0.0, x, 0.0, 1.0, y, 0.0, 0.0, 1.0))
    }

    /// Maps a source keypoint into the target frame.
    ///
    /// Returns `None` when the point lands on the line at infinity.
    pub fn transform(&self, point: KeyPoint) -> Option<KeyPoint> {
        let v = self.0 * Vector3::new(point.x, point.y, 1.0);
        if v.z.abs() < f64::EPSILON {
            None
        } else {
            Some(KeyPoint::new(v.x / v.z, v.y / v.z))
        }
    }

    /// Forward reprojection error in pixels.
    pub fn reprojection_error(&self, source: KeyPoint, target: KeyPoint) -> f64 {
        self.transform(source)
            .map(|projected| projected.distance_squared(&target).sqrt())
            .unwrap_or(f64::INFINITY)
    }

    pub fn inverse(&self) -> Option<Self> {
        self.0.try_inverse().map(|m| Self(m).rescaled())
    }

    fn rescaled(self) -> Self {
        let Self(mat) = self;
        let w = mat[(2, 2)];
        if w.abs() > f64::EPSILON {
            Self(mat / w)
        } else {
            Self(mat / mat.norm())
        }
    }
}

impl Model<FeatureMatch<KeyPoint>> for Homography {
    fn residual(&self, data: &FeatureMatch<KeyPoint>) -> f64 {
        let &FeatureMatch(source, target) = data;
        self.reprojection_error(source, target)
    }
}

/// Similarity transform that moves the centroid of the points to the origin and
/// scales them to an average distance of `sqrt(2)` (Hartley normalization).
fn normalizing_transform(points: impl Iterator<Item = KeyPoint> + Clone) -> Option<Matrix3<f64>> {
    let (count, sx, sy) = points
        .clone()
        .fold((0usize, 0.0, 0.0), |(n, sx, sy), p| (n + 1, sx + p.x, sy + p.y));
    if count == 0 {
        return None;
    }
    let cx = sx / count as f64;
    let cy = sy / count as f64;
    let mean_distance = points
        .map(|p| ((p.x - cx).powi(2) + (p.y - cy).powi(2)).sqrt())
        .sum::<f64>()
        / count as f64;
    if mean_distance < f64::EPSILON {
        return None;
    }
    let s = core::f64::consts::SQRT_2 / mean_distance;
    Some(Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0))
}

fn apply(transform: &Matrix3<f64>, point: KeyPoint) -> KeyPoint {
    let v = transform * Vector3::new(point.x, point.y, 1.0);
    KeyPoint::new(v.x / v.z, v.y / v.z)
}

/// The two DLT rows contributed by one correspondence `(x, y) -> (u, v)`.
fn dlt_rows(source: KeyPoint, target: KeyPoint) -> [Row9; 2] {
    let (x, y) = (source.x, source.y);
    let (u, v) = (target.x, target.y);
    [
        Row9::from_row_slice(&[-x, -y, -1.0, 0.0, 0.0, 0.0, u * x, u * y, u]),
        Row9::from_row_slice(&[0.0, 0.0, 0.0, -x, -y, -1.0, v * x, v * y, v]),
    ]
}

/// Checks if any three of the four points lie on one line.
fn has_collinear_triple(points: &[KeyPoint; 4]) -> bool {
    let tolerance = f32::EPSILON as f64;
    (0..4).any(|skip| {
        let mut triple = points
            .iter()
            .enumerate()
            .filter(|&(ix, _)| ix != skip)
            .map(|(_, &p)| p);
        let (Some(a), Some(b), Some(c)) = (triple.next(), triple.next(), triple.next()) else {
            return false;
        };
        let (dx1, dy1) = (b.x - a.x, b.y - a.y);
        let (dx2, dy2) = (c.x - a.x, c.y - a.y);
        (dx2 * dy1 - dy2 * dx1).abs() <= tolerance * (dx1.abs() + dy1.abs() + dx2.abs() + dy2.abs())
    })
}

/// Estimates a [`Homography`] with the normalized
/// [direct linear transform](https://en.wikipedia.org/wiki/Direct_linear_transformation)
/// described by Richard Hartley and Andrew Zisserman.
///
/// Four matches give the exact solution. More than four give the algebraic
/// least-squares fit, which is how a consensus winner is refined on its inliers.
#[derive(Copy, Clone, Debug)]
pub struct FourPoint {
    pub epsilon: f64,
    pub iterations: usize,
}

impl FourPoint {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn from_matches<I>(&self, data: I) -> Option<Homography>
    where
        I: Iterator<Item = FeatureMatch<KeyPoint>> + Clone,
    {
        let count = data.clone().count();
        if count < 4 {
            return None;
        }
        if count == 4 {
            let mut sources = [KeyPoint::new(0.0, 0.0); 4];
            let mut targets = [KeyPoint::new(0.0, 0.0); 4];
            for ((s, t), FeatureMatch(a, b)) in sources.iter_mut().zip(&mut targets).zip(data.clone()) {
                *s = a;
                *t = b;
            }
            if has_collinear_triple(&sources) || has_collinear_triple(&targets) {
                return None;
            }
        }

        let norm_a = normalizing_transform(data.clone().map(|FeatureMatch(a, _)| a))?;
        let norm_b = normalizing_transform(data.clone().map(|FeatureMatch(_, b)| b))?;

        let mut ata = Square9::zeros();
        for FeatureMatch(a, b) in data {
            for row in dlt_rows(apply(&norm_a, a), apply(&norm_b, b)) {
                ata += row * row.transpose();
            }
        }

        let eigens = ata.try_symmetric_eigen(self.epsilon, self.iterations)?;
        let nullspace = eigens
            .eigenvalues
            .iter()
            .enumerate()
            .min_by_key(|&(_, &n)| float_ord::FloatOrd(n))
            .map(|(ix, _)| eigens.eigenvectors.column(ix).into_owned())?;
        let normalized = Matrix3::from_row_slice(nullspace.as_slice());
        if normalized.determinant().abs() < DEGENERATE_DETERMINANT {
            return None;
        }

        let mat = norm_b.try_inverse()? * normalized * norm_a;
        Some(Homography(mat).rescaled())
    }
}

impl Default for FourPoint {
    fn default() -> Self {
        Self {
            epsilon: 1e-12,
            iterations: 1000,
        }
    }
}

impl Estimator<FeatureMatch<KeyPoint>> for FourPoint {
    type Model = Homography;
    type ModelIter = Option<Homography>;
    const MIN_SAMPLES: usize = 4;

    fn estimate<I>(&self, data: I) -> Self::ModelIter
    where
        I: Iterator<Item = FeatureMatch<KeyPoint>> + Clone,
    {
        self.from_matches(data)
    }
}
