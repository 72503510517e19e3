use crate::Neighbor;

/// Lowe's ratio test over nearest/second-nearest neighbor pairs.
///
/// A match is kept only if its best neighbor is clearly better than the
/// runner-up, which discards features that look like several others.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct RatioTest {
    pub ratio: f64,
}

impl RatioTest {
    pub fn new(ratio: f64) -> Self {
        Self { ratio }
    }

    pub fn accepts(&self, [best, second]: &[Neighbor; 2]) -> bool {
        best.distance < self.ratio * second.distance
    }

    /// Returns `(query index, best neighbor)` for every accepted query, in ascending query order.
    pub fn filter(&self, neighbors: &[[Neighbor; 2]]) -> Vec<(usize, Neighbor)> {
        neighbors
            .iter()
            .enumerate()
            .filter(|(_, pair)| self.accepts(pair))
            .map(|(query, &[best, _])| (query, best))
            .collect()
    }
}

impl Default for RatioTest {
    fn default() -> Self {
        Self::new(0.75)
    }
}
