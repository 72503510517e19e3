use approx::relative_eq;
use cv_core::{nalgebra::Matrix3, sample_consensus::Model, FeatureMatch, KeyPoint};
use four_point::{FourPoint, Homography};
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg64;

const SAMPLE_POINTS: usize = 16;
const RESIDUAL_THRESHOLD: f64 = 1e-6;
const IMAGE_SIZE: f64 = 640.0;

#[test]
fn randomized() {
    let mut rng = Pcg64::seed_from_u64(7);
    let successes = (0..1000).filter(|_| run_round(&mut rng)).count();
    eprintln!("successes: {}", successes);
    assert!(successes > 950);
}

#[test]
fn minimal_randomized() {
    let mut rng = Pcg64::seed_from_u64(11);
    let successes = (0..1000)
        .filter(|_| {
            let (truth, matches) = some_test_data(&mut rng, 4);
            match FourPoint::new().from_matches(matches.iter().copied()) {
                Some(h) => residuals_ok(&h, &matches) && relative_eq!(h.0, truth.0, epsilon = 1e-3),
                None => false,
            }
        })
        .count();
    eprintln!("successes: {}", successes);
    assert!(successes > 950);
}

fn run_round(rng: &mut Pcg64) -> bool {
    let (_, matches) = some_test_data(rng, SAMPLE_POINTS);
    match FourPoint::new().from_matches(matches.iter().copied()) {
        Some(h) => residuals_ok(&h, &matches),
        None => false,
    }
}

fn residuals_ok(h: &Homography, matches: &[FeatureMatch<KeyPoint>]) -> bool {
    let mut success = true;
    for m in matches {
        if h.residual(m) > RESIDUAL_THRESHOLD {
            success = false;
            eprintln!("failed residual check: {}", h.residual(m));
        }
    }
    success
}

/// Gets a random mild homography and noise-free matches through it.
fn some_test_data(rng: &mut Pcg64, count: usize) -> (Homography, Vec<FeatureMatch<KeyPoint>>) {
    let angle = rng.gen_range(-0.3..0.3f64);
    let scale = rng.gen_range(0.8..1.2);
    let (sin, cos) = angle.sin_cos();
    let truth = Homography(Matrix3::new(
        scale * cos,
        -scale * sin,
        rng.gen_range(-40.0..40.0),
        scale * sin,
        scale * cos,
        rng.gen_range(-40.0..40.0),
        rng.gen_range(-1e-4..1e-4),
        rng.gen_range(-1e-4..1e-4),
        1.0,
    ));
    let matches = (0..count)
        .map(|_| {
            let a = KeyPoint::new(rng.gen_range(0.0..IMAGE_SIZE), rng.gen_range(0.0..IMAGE_SIZE));
            FeatureMatch(a, truth.transform(a).expect("mild homography stays finite"))
        })
        .collect();
    (truth, matches)
}
