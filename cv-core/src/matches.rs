/// A pair of matched items, ordered `(source, target)`.
///
/// Estimators in this workspace consume `FeatureMatch<KeyPoint>`, while the
/// tracker uses `FeatureMatch<usize>` to refer to features by their index
/// within a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FeatureMatch<P>(pub P, pub P);

impl<P> FeatureMatch<P> {
    /// Swaps source and target.
    pub fn reversed(self) -> Self {
        let Self(a, b) = self;
        Self(b, a)
    }

    pub fn map<Q>(self, mut f: impl FnMut(P) -> Q) -> FeatureMatch<Q> {
        let Self(a, b) = self;
        FeatureMatch(f(a), f(b))
    }
}
