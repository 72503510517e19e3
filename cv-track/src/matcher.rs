use crate::TrackError;
use bitarray::{BitArray, Hamming};
use float_ord::FloatOrd;
use space::Metric;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// A distance between two descriptors of the same kind.
///
/// Smaller is more similar. The ratio test divides these, so they must be
/// non-negative and on a linear scale.
pub trait DescriptorMetric<D> {
    fn distance(&self, a: &D, b: &D) -> f64;
}

impl<const B: usize> DescriptorMetric<BitArray<B>> for Hamming {
    fn distance(&self, a: &BitArray<B>, b: &BitArray<B>) -> f64 {
        f64::from(<Hamming as Metric<BitArray<B>>>::distance(self, a, b))
    }
}

/// Byte-packed binary descriptors (ORB, BRIEF). Both descriptors must have the same length.
impl DescriptorMetric<Vec<u8>> for Hamming {
    fn distance(&self, a: &Vec<u8>, b: &Vec<u8>) -> f64 {
        debug_assert_eq!(a.len(), b.len(), "descriptor lengths differ");
        let bits: u32 = a.iter().zip(b).map(|(x, y)| (x ^ y).count_ones()).sum();
        f64::from(bits)
    }
}

/// Manhattan distance for float descriptors.
#[derive(Debug, Copy, Clone, Default)]
pub struct L1;

impl DescriptorMetric<Vec<f32>> for L1 {
    fn distance(&self, a: &Vec<f32>, b: &Vec<f32>) -> f64 {
        debug_assert_eq!(a.len(), b.len(), "descriptor lengths differ");
        a.iter().zip(b).map(|(&x, &y)| (x as f64 - y as f64).abs()).sum()
    }
}

/// Euclidean distance for float descriptors.
#[derive(Debug, Copy, Clone, Default)]
pub struct L2;

impl DescriptorMetric<Vec<f32>> for L2 {
    fn distance(&self, a: &Vec<f32>, b: &Vec<f32>) -> f64 {
        debug_assert_eq!(a.len(), b.len(), "descriptor lengths differ");
        a.iter()
            .zip(b)
            .map(|(&x, &y)| (x as f64 - y as f64).powi(2))
            .sum::<f64>()
            .sqrt()
    }
}

/// A train descriptor found while searching for a query descriptor.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Neighbor {
    /// Index into the train set.
    pub index: usize,
    pub distance: f64,
}

impl Neighbor {
    fn rank(&self) -> (FloatOrd<f64>, usize) {
        (FloatOrd(self.distance), self.index)
    }
}

/// Exhaustive nearest and second-nearest neighbor search.
#[derive(Debug, Copy, Clone, Default)]
pub struct BruteForceMatcher<M> {
    pub metric: M,
}

impl<M> BruteForceMatcher<M> {
    pub fn new(metric: M) -> Self {
        Self { metric }
    }

    /// Finds the two closest train descriptors for every query descriptor.
    ///
    /// The output is aligned with `query` and each pair is sorted by ascending
    /// distance. Equal distances are ordered by ascending train index, so repeated
    /// calls always give the same answer.
    ///
    /// Fails with [`TrackError::InsufficientCandidates`] if `train` has fewer than two
    /// descriptors.
    ///
    /// ```
    /// use cv_track::{BruteForceMatcher, L2};
    ///
    /// let matcher = BruteForceMatcher::new(L2);
    /// let query = vec![vec![0.0f32, 0.0], vec![5.0, 5.0]];
    /// let train = vec![vec![0.1f32, 0.0], vec![5.0, 5.2], vec![9.0, 9.0]];
    /// let neighbors = matcher.knn2(&query, &train).unwrap();
    /// assert_eq!(neighbors[0][0].index, 0);
    /// assert_eq!(neighbors[1][0].index, 1);
    /// ```
    pub fn knn2<D>(&self, query: &[D], train: &[D]) -> Result<Vec<[Neighbor; 2]>, TrackError>
    where
        M: DescriptorMetric<D> + Sync,
        D: Sync,
    {
        if train.len() < 2 {
            return Err(TrackError::InsufficientCandidates { found: train.len() });
        }

        #[cfg(not(feature = "rayon"))]
        let neighbors = query.iter().map(|q| self.two_nearest(q, train)).collect();
        #[cfg(feature = "rayon")]
        let neighbors = query.par_iter().map(|q| self.two_nearest(q, train)).collect();

        Ok(neighbors)
    }

    fn two_nearest<D>(&self, query: &D, train: &[D]) -> [Neighbor; 2]
    where
        M: DescriptorMetric<D>,
    {
        let neighbor = |index: usize| Neighbor {
            index,
            distance: self.metric.distance(query, &train[index]),
        };
        let mut best = [neighbor(0), neighbor(1)];
        if best[1].rank() < best[0].rank() {
            best.swap(0, 1);
        }
        for index in 2..train.len() {
            let candidate = neighbor(index);
            if candidate.rank() < best[0].rank() {
                best = [candidate, best[0]];
            } else if candidate.rank() < best[1].rank() {
                best[1] = candidate;
            }
        }
        best
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn hamming_on_bytes() {
        let a = vec![0b1010_1010u8, 0xFF];
        let b = vec![0b0000_1010u8, 0x0F];
        assert_eq!(DescriptorMetric::distance(&Hamming, &a, &b), 6.0);
    }

    #[test]
    fn hamming_on_bitarrays() {
        let a = BitArray::new([0u8; 64]);
        let mut bytes = [0u8; 64];
        bytes[0] = 0b111;
        bytes[63] = 0b1;
        let b = BitArray::new(bytes);
        assert_eq!(DescriptorMetric::distance(&Hamming, &a, &b), 4.0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "descriptor lengths differ")]
    fn hamming_rejects_mismatched_lengths() {
        DescriptorMetric::distance(&Hamming, &vec![0xFFu8, 0x00], &vec![0xFFu8]);
    }

    #[test]
    fn float_metrics() {
        let a = vec![0.0f32, 0.0];
        let b = vec![3.0f32, -4.0];
        assert_eq!(L1.distance(&a, &b), 7.0);
        assert_eq!(L2.distance(&a, &b), 5.0);
    }

    #[test]
    fn needs_two_candidates() {
        let matcher = BruteForceMatcher::new(L2);
        let query = vec![vec![0.0f32]];
        let train = vec![vec![1.0f32]];
        assert_eq!(
            matcher.knn2(&query, &train),
            Err(TrackError::InsufficientCandidates { found: 1 })
        );
    }

    #[test]
    fn sorted_pairs() {
        let matcher = BruteForceMatcher::new(L1);
        let query = vec![vec![10.0f32]];
        let train = vec![vec![0.0f32], vec![7.0], vec![11.0], vec![30.0]];
        let [best, second] = matcher.knn2(&query, &train).unwrap()[0];
        assert_eq!(best, Neighbor { index: 2, distance: 1.0 });
        assert_eq!(second, Neighbor { index: 1, distance: 3.0 });
    }

    #[test]
    fn ties_prefer_lower_index() {
        let matcher = BruteForceMatcher::new(L1);
        let query = vec![vec![0.0f32]];
        let train = vec![vec![5.0f32], vec![-2.0], vec![2.0], vec![-2.0]];
        let [best, second] = matcher.knn2(&query, &train).unwrap()[0];
        assert_eq!(best.index, 1);
        assert_eq!(second.index, 2);
        assert_eq!(best.distance, second.distance);
    }

    #[test]
    fn repeated_matching_is_identical() {
        let matcher = BruteForceMatcher::new(Hamming);
        let query: Vec<Vec<u8>> = (0..20u8).map(|i| vec![i, i.wrapping_mul(7)]).collect();
        let train: Vec<Vec<u8>> = (0..30u8).map(|i| vec![i.wrapping_mul(3), i]).collect();
        let first = matcher.knn2(&query, &train).unwrap();
        let second = matcher.knn2(&query, &train).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), query.len());
    }

    #[test]
    fn empty_query() {
        let matcher = BruteForceMatcher::new(L2);
        let train = vec![vec![0.0f32], vec![1.0]];
        assert!(matcher.knn2(&[], &train).unwrap().is_empty());
    }
}
