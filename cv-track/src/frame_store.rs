use crate::{Feature, Retention};
use cv_core::KeyPoint;
use log::*;
use std::collections::VecDeque;

/// The features of one processed frame.
///
/// Entries are only created by [`FrameStore::append`] and never change afterwards,
/// so a feature index into an entry stays valid for as long as the entry is stored.
#[derive(Debug, Clone)]
pub struct FrameEntry<D> {
    index: usize,
    keypoints: Vec<KeyPoint>,
    descriptors: Vec<D>,
}

impl<D> FrameEntry<D> {
    fn new(index: usize, features: Vec<Feature<D>>) -> Self {
        let (keypoints, descriptors): (Vec<KeyPoint>, Vec<D>) = features.into_iter().map(Feature::into_parts).unzip();
        Self {
            index,
            keypoints,
            descriptors,
        }
    }

    /// The arrival order of this frame, starting from `0`.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.keypoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keypoints.is_empty()
    }

    pub fn keypoint(&self, feature: usize) -> KeyPoint {
        self.keypoints[feature]
    }

    pub fn descriptor(&self, feature: usize) -> &D {
        &self.descriptors[feature]
    }

    pub fn keypoints(&self) -> &[KeyPoint] {
        &self.keypoints
    }

    pub fn descriptors(&self) -> &[D] {
        &self.descriptors
    }

    pub fn features(&self) -> impl Iterator<Item = (KeyPoint, &D)> + '_ {
        self.keypoints.iter().copied().zip(&self.descriptors)
    }
}

/// Append-only history of frame entries, ordered by arrival.
///
/// Nothing in the store is ever mutated. Old entries leave the store only through
/// its [`Retention`] policy or an explicit [`FrameStore::evict_before`], and the two
/// most recent entries are never dropped.
#[derive(Debug, Clone)]
pub struct FrameStore<D> {
    frames: VecDeque<FrameEntry<D>>,
    appended: usize,
    retention: Retention,
}

impl<D> Default for FrameStore<D> {
    fn default() -> Self {
        Self::new(Retention::default())
    }
}

impl<D> FrameStore<D> {
    pub fn new(retention: Retention) -> Self {
        Self {
            frames: VecDeque::new(),
            appended: 0,
            retention,
        }
    }

    /// Stores the features as the newest frame and assigns it the next index.
    pub fn append(&mut self, features: Vec<Feature<D>>) -> &FrameEntry<D> {
        let index = self.appended;
        self.appended += 1;
        self.frames.push_back(FrameEntry::new(index, features));
        if let Retention::KeepLast(keep) = self.retention {
            let keep = keep.max(2);
            while self.frames.len() > keep {
                self.frames.pop_front();
            }
        }
        trace!("frame store holds {} of {} frames", self.frames.len(), self.appended);
        &self.frames[self.frames.len() - 1]
    }

    /// The most recently appended frame.
    pub fn current(&self) -> Option<&FrameEntry<D>> {
        self.frames.back()
    }

    /// The frame appended just before [`FrameStore::current`].
    pub fn previous(&self) -> Option<&FrameEntry<D>> {
        self.frames.len().checked_sub(2).and_then(|ix| self.frames.get(ix))
    }

    /// Looks up a stored frame by its index.
    pub fn get(&self, index: usize) -> Option<&FrameEntry<D>> {
        let first = self.frames.front()?.index;
        index.checked_sub(first).and_then(|offset| self.frames.get(offset))
    }

    /// Drops stored frames with an index below `index`, keeping at least the two newest.
    ///
    /// Returns the number of evicted frames.
    pub fn evict_before(&mut self, index: usize) -> usize {
        let mut evicted = 0;
        while self.frames.len() > 2 && self.frames.front().map_or(false, |f| f.index < index) {
            self.frames.pop_front();
            evicted += 1;
        }
        if evicted != 0 {
            debug!("evicted {} frames before frame {}", evicted, index);
        }
        evicted
    }

    /// The number of frames currently stored.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// The number of frames ever appended.
    pub fn appended(&self) -> usize {
        self.appended
    }

    pub fn retention(&self) -> Retention {
        self.retention
    }

    pub fn iter(&self) -> impl Iterator<Item = &FrameEntry<D>> + '_ {
        self.frames.iter()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn features(n: usize) -> Vec<Feature<u8>> {
        (0..n)
            .map(|i| Feature::new(KeyPoint::new(i as f64, 0.0), i as u8))
            .collect()
    }

    #[test]
    fn empty_store() {
        let store = FrameStore::<u8>::default();
        assert!(store.current().is_none());
        assert!(store.previous().is_none());
        assert!(store.get(0).is_none());
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn indices_increase() {
        let mut store = FrameStore::default();
        assert_eq!(store.append(features(3)).index(), 0);
        assert!(store.previous().is_none());
        assert_eq!(store.current().unwrap().len(), 3);
        assert_eq!(store.append(features(0)).index(), 1);
        assert_eq!(store.previous().unwrap().index(), 0);
        assert_eq!(store.current().unwrap().index(), 1);
        assert!(store.current().unwrap().is_empty());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn entries_keep_feature_order() {
        let mut store = FrameStore::default();
        let entry = store.append(features(4));
        assert_eq!(entry.keypoint(2), KeyPoint::new(2.0, 0.0));
        assert_eq!(*entry.descriptor(3), 3);
        let collected: Vec<u8> = entry.features().map(|(_, &d)| d).collect();
        assert_eq!(collected, vec![0, 1, 2, 3]);
    }

    #[test]
    fn keep_last_retention() {
        let mut store = FrameStore::new(Retention::KeepLast(3));
        for _ in 0..5 {
            store.append(features(1));
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.appended(), 5);
        assert!(store.get(1).is_none());
        assert_eq!(store.get(2).unwrap().index(), 2);
        assert_eq!(store.get(4).unwrap().index(), 4);
        assert!(store.get(5).is_none());
    }

    #[test]
    fn keep_last_never_below_two() {
        let mut store = FrameStore::new(Retention::KeepLast(0));
        for _ in 0..4 {
            store.append(features(1));
        }
        assert_eq!(store.len(), 2);
        assert_eq!(store.previous().unwrap().index(), 2);
    }

    #[test]
    fn eviction_keeps_two_newest() {
        let mut store = FrameStore::default();
        for _ in 0..6 {
            store.append(features(1));
        }
        assert_eq!(store.evict_before(3), 3);
        assert_eq!(store.iter().next().unwrap().index(), 3);
        assert_eq!(store.evict_before(100), 1);
        assert_eq!(store.len(), 2);
        assert_eq!(store.previous().unwrap().index(), 4);
    }
}
