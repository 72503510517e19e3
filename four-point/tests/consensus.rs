use arrsac::Arrsac;
use cv_core::sample_consensus::{Consensus, Model};
use cv_core::{FeatureMatch, KeyPoint};
use four_point::{FourPoint, Homography};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const INLIERS: usize = 40;
const OUTLIERS: usize = 10;

fn contaminated_matches() -> (Homography, Vec<FeatureMatch<KeyPoint>>) {
    let mut rng = Pcg64::seed_from_u64(3);
    let truth = Homography::translation(14.0, -6.0);
    let mut matches: Vec<_> = (0..INLIERS)
        .map(|_| {
            let a = KeyPoint::new(rng.gen_range(0.0..320.0), rng.gen_range(0.0..240.0));
            FeatureMatch(a, truth.transform(a).unwrap())
        })
        .collect();
    // Outliers are displaced by far more than any inlier threshold.
    matches.extend((0..OUTLIERS).map(|_| {
        let a = KeyPoint::new(rng.gen_range(0.0..320.0), rng.gen_range(0.0..240.0));
        let b = truth.transform(a).unwrap();
        FeatureMatch(a, KeyPoint::new(b.x + rng.gen_range(60.0..120.0), b.y - 80.0))
    }));
    (truth, matches)
}

#[test]
fn arrsac_separates_outliers() {
    let (truth, matches) = contaminated_matches();
    let mut arrsac = Arrsac::new(1.0, Pcg64::seed_from_u64(0));
    let (model, inliers) = arrsac
        .model_inliers(&FourPoint::new(), matches.iter().copied())
        .expect("a homography should be found");

    assert_eq!(inliers.len(), INLIERS);
    assert!(inliers.iter().all(|&ix| ix < INLIERS));
    for m in &matches[..INLIERS] {
        assert!(model.residual(m) < 1.0);
        assert!(truth.residual(m) < 1e-9);
    }
}
