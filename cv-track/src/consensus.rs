use crate::ConsensusSettings;
use cv_core::sample_consensus::{Consensus, Estimator, Model};
use log::*;
use rand::{seq::index, Rng};

/// The number of iterations needed to draw at least one all-inlier sample with
/// probability `confidence`, given the inlier ratio seen so far.
///
/// The result never exceeds `max_iterations`. It is `0` once every datum is an inlier.
pub fn adaptive_iterations(
    inlier_ratio: f64,
    sample_size: usize,
    confidence: f64,
    max_iterations: usize,
) -> usize {
    let numerator = (1.0 - confidence).max(f64::MIN_POSITIVE).ln();
    let all_inlier_sample = inlier_ratio.powi(sample_size as i32);
    let denominator = 1.0 - all_inlier_sample;
    if denominator < f64::MIN_POSITIVE {
        return 0;
    }
    let denominator = denominator.ln();
    if denominator >= 0.0 || -numerator >= max_iterations as f64 * -denominator {
        max_iterations
    } else {
        ((numerator / denominator).round() as usize).min(max_iterations)
    }
}

fn inliers<M, Data>(model: &M, data: &[Data], threshold: f64) -> Vec<usize>
where
    M: Model<Data>,
{
    data.iter()
        .enumerate()
        .filter(|(_, datum)| model.residual(datum) < threshold)
        .map(|(ix, _)| ix)
        .collect()
}

/// Classic random sample consensus with an adaptive stopping criterion.
///
/// Every iteration draws a minimal sample without replacement, asks the estimator
/// for candidate models and keeps the model with the most inliers. Once the best
/// inlier ratio makes it likely enough (`confidence`) that an all-inlier sample has
/// been seen, sampling stops before `max_iterations`.
///
/// Inliers are reported as indices into the data in the order it was given.
#[derive(Debug, Clone)]
pub struct Ransac<R> {
    pub threshold: f64,
    pub max_iterations: usize,
    pub confidence: f64,
    pub min_inliers: usize,
    rng: R,
}

impl<R> Ransac<R>
where
    R: Rng,
{
    pub fn new(threshold: f64, rng: R) -> Self {
        Self {
            threshold,
            max_iterations: 2000,
            confidence: 0.85,
            min_inliers: 0,
            rng,
        }
    }

    pub fn from_settings(settings: &ConsensusSettings, rng: R) -> Self {
        Self::new(settings.threshold, rng)
            .max_iterations(settings.max_iterations)
            .confidence(settings.confidence)
            .min_inliers(settings.min_inliers)
    }

    #[must_use]
    pub fn max_iterations(self, max_iterations: usize) -> Self {
        Self {
            max_iterations,
            ..self
        }
    }

    #[must_use]
    pub fn confidence(self, confidence: f64) -> Self {
        Self { confidence, ..self }
    }

    /// Models supported by fewer inliers than this are never returned.
    #[must_use]
    pub fn min_inliers(self, min_inliers: usize) -> Self {
        Self {
            min_inliers,
            ..self
        }
    }
}

impl<E, R, Data> Consensus<E, Data> for Ransac<R>
where
    E: Estimator<Data>,
    R: Rng,
    Data: Clone,
{
    type Inliers = Vec<usize>;

    fn model<I>(&mut self, estimator: &E, data: I) -> Option<E::Model>
    where
        I: Iterator<Item = Data> + Clone,
    {
        self.model_inliers(estimator, data).map(|(model, _)| model)
    }

    fn model_inliers<I>(&mut self, estimator: &E, data: I) -> Option<(E::Model, Self::Inliers)>
    where
        I: Iterator<Item = Data> + Clone,
    {
        let data: Vec<Data> = data.collect();
        let sample_size = E::MIN_SAMPLES;
        if sample_size == 0 || data.len() < sample_size {
            debug!(
                "consensus needs {} samples but only has {}",
                sample_size,
                data.len()
            );
            return None;
        }

        let mut best: Option<(E::Model, Vec<usize>)> = None;
        let mut required = self.max_iterations;
        let mut iteration = 0;
        while iteration < required {
            iteration += 1;
            let sample = index::sample(&mut self.rng, data.len(), sample_size).into_vec();
            for model in estimator.estimate(sample.iter().map(|&ix| data[ix].clone())) {
                let model_inliers = inliers(&model, &data, self.threshold);
                let improves = best
                    .as_ref()
                    .map_or(true, |(_, best_inliers)| model_inliers.len() > best_inliers.len());
                if improves {
                    required = adaptive_iterations(
                        model_inliers.len() as f64 / data.len() as f64,
                        sample_size,
                        self.confidence,
                        self.max_iterations,
                    );
                    trace!(
                        "iteration {}: new best model with {} of {} inliers, {} iterations required",
                        iteration,
                        model_inliers.len(),
                        data.len(),
                        required
                    );
                    best = Some((model, model_inliers));
                }
            }
        }

        debug!(
            "consensus ran {} iterations and found {} inliers out of {}",
            iteration,
            best.as_ref().map_or(0, |(_, inliers)| inliers.len()),
            data.len()
        );
        best.filter(|(_, inliers)| inliers.len() >= self.min_inliers)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    /// Fits `y = c` through a single sample.
    struct Constant;

    #[derive(Debug, Clone, Copy)]
    struct Level(f64);

    impl Model<f64> for Level {
        fn residual(&self, data: &f64) -> f64 {
            (data - self.0).abs()
        }
    }

    impl Estimator<f64> for Constant {
        type Model = Level;
        type ModelIter = Option<Level>;
        const MIN_SAMPLES: usize = 1;

        fn estimate<I>(&self, mut data: I) -> Self::ModelIter
        where
            I: Iterator<Item = f64> + Clone,
        {
            data.next().map(Level)
        }
    }

    #[test]
    fn iteration_bounds() {
        assert_eq!(adaptive_iterations(1.0, 4, 0.99, 2000), 0);
        assert_eq!(adaptive_iterations(0.0, 4, 0.99, 2000), 2000);
        // 50% inliers, 4 samples, 99% confidence needs 71 draws.
        assert_eq!(adaptive_iterations(0.5, 4, 0.99, 2000), 71);
        assert_eq!(adaptive_iterations(0.5, 4, 0.99, 10), 10);
    }

    #[test]
    fn fewer_iterations_with_more_inliers() {
        let low = adaptive_iterations(0.3, 4, 0.85, 3000);
        let high = adaptive_iterations(0.8, 4, 0.85, 3000);
        assert!(high < low);
    }

    #[test]
    fn finds_the_majority_level() {
        let data = [1.0, 1.1, 0.9, 1.05, 7.0, -3.0, 1.0, 0.95];
        let mut ransac = Ransac::new(0.5, Pcg64::seed_from_u64(1));
        let (model, inliers) = ransac
            .model_inliers(&Constant, data.iter().copied())
            .unwrap();
        assert_relative_eq!(model.0, 1.0, epsilon = 0.2);
        assert_eq!(inliers, vec![0, 1, 2, 3, 6, 7]);
    }

    #[test]
    fn minimum_support() {
        let data = [0.0, 10.0, 20.0, 30.0];
        let mut ransac = Ransac::new(1.0, Pcg64::seed_from_u64(2)).min_inliers(2);
        assert!(ransac.model(&Constant, data.iter().copied()).is_none());
    }

    #[test]
    fn too_little_data() {
        let mut ransac = Ransac::new(1.0, Pcg64::seed_from_u64(3));
        assert!(ransac.model(&Constant, core::iter::empty::<f64>()).is_none());
    }
}
