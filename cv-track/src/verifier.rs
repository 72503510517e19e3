use crate::{ConsensusSettings, Correspondence, Ransac, TrackError};
use cv_core::{
    sample_consensus::{Consensus, Model},
    FeatureMatch, KeyPoint,
};
use four_point::{FourPoint, Homography};
use log::*;
use rand::Rng;

/// Fits a transform to point pairs and classifies every pair against it.
///
/// `source[i]` and `target[i]` form pair `i`, and flag `i` of the result must
/// classify exactly that pair.
pub trait GeometricSolver {
    type Transform;

    fn fit_and_classify(
        &mut self,
        source: &[KeyPoint],
        target: &[KeyPoint],
        settings: &ConsensusSettings,
    ) -> Option<(Self::Transform, Vec<bool>)>;
}

fn classify<M>(model: &M, matches: &[FeatureMatch<KeyPoint>], threshold: f64) -> Vec<bool>
where
    M: Model<FeatureMatch<KeyPoint>>,
{
    matches
        .iter()
        .map(|m| model.residual(m) < threshold)
        .collect()
}

/// Robust homography fitting: [`Ransac`] over [`FourPoint`] samples, optionally
/// followed by a least-squares refit on the winning inliers.
#[derive(Debug, Clone)]
pub struct HomographySolver<R> {
    pub estimator: FourPoint,
    rng: R,
}

impl<R> HomographySolver<R>
where
    R: Rng,
{
    pub fn new(rng: R) -> Self {
        Self {
            estimator: FourPoint::new(),
            rng,
        }
    }
}

impl<R> GeometricSolver for HomographySolver<R>
where
    R: Rng,
{
    type Transform = Homography;

    fn fit_and_classify(
        &mut self,
        source: &[KeyPoint],
        target: &[KeyPoint],
        settings: &ConsensusSettings,
    ) -> Option<(Homography, Vec<bool>)> {
        let matches: Vec<FeatureMatch<KeyPoint>> = source
            .iter()
            .zip(target)
            .map(|(&a, &b)| FeatureMatch(a, b))
            .collect();

        let mut ransac = Ransac::from_settings(settings, &mut self.rng);
        let (mut homography, inliers) =
            ransac.model_inliers(&self.estimator, matches.iter().copied())?;
        let mut flags = vec![false; matches.len()];
        for ix in inliers {
            flags[ix] = true;
        }

        if settings.refine {
            let inlier_matches = matches
                .iter()
                .zip(&flags)
                .filter(|&(_, &inlier)| inlier)
                .map(|(&m, _)| m);
            if let Some(refined) = self.estimator.from_matches(inlier_matches) {
                let refined_flags = classify(&refined, &matches, settings.threshold);
                let before = flags.iter().filter(|&&f| f).count();
                let after = refined_flags.iter().filter(|&&f| f).count();
                debug!("refit on {} inliers gave {} inliers", before, after);
                if after >= before {
                    homography = refined;
                    flags = refined_flags;
                }
            }
        }

        Some((homography, flags))
    }
}

/// Keeps only the correspondences consistent with one fitted transform.
///
/// The point sets handed to the solver are built from `candidates` in order, and
/// the solver's flags are read back against that same order, so a flag can only
/// ever select the correspondence it was computed for.
pub fn verify<S>(
    solver: &mut S,
    candidates: Vec<Correspondence>,
    settings: &ConsensusSettings,
    min_candidates: usize,
) -> Result<(S::Transform, Vec<Correspondence>), TrackError>
where
    S: GeometricSolver,
{
    if candidates.len() < min_candidates {
        return Err(TrackError::InsufficientCorrespondences {
            found: candidates.len(),
            required: min_candidates,
        });
    }
    let no_model = TrackError::NoModelFound {
        min_inliers: settings.min_inliers,
    };

    let (source, target): (Vec<KeyPoint>, Vec<KeyPoint>) = candidates
        .iter()
        .map(|c| (c.source_point, c.target_point))
        .unzip();
    let (transform, flags) = solver
        .fit_and_classify(&source, &target, settings)
        .ok_or(no_model)?;
    if flags.len() != candidates.len() {
        warn!(
            "solver classified {} pairs but was given {}; discarding its result",
            flags.len(),
            candidates.len()
        );
        return Err(no_model);
    }

    let inliers: Vec<Correspondence> = candidates
        .into_iter()
        .zip(flags)
        .filter_map(|(candidate, inlier)| inlier.then(|| candidate))
        .collect();
    if inliers.len() < settings.min_inliers {
        return Err(no_model);
    }
    Ok((transform, inliers))
}
