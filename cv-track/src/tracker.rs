use crate::{
    verify, BruteForceMatcher, Correspondence, DescriptorMetric, Feature, FeatureExtractor,
    FrameEntry, FrameStore, GeometricSolver, HomographySolver, QueryFrame, RatioTest,
    SettingsError, TrackError, TrackSettings,
};
use four_point::Homography;
use log::*;
use rand::Rng;
use std::time::Instant;

#[cfg(feature = "serde-serialize")]
use serde::{Deserialize, Serialize};

/// The outcome of one tracking cycle.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde-serialize", derive(Serialize, Deserialize))]
pub struct FrameTrack<T> {
    /// Index the frame received in the [`FrameStore`].
    pub frame: usize,
    /// Number of features extracted from the frame.
    pub features: usize,
    /// Number of matches that survived the ratio test.
    pub candidates: usize,
    /// Previous-to-current correspondences, verified whenever verification ran.
    pub correspondences: Vec<Correspondence>,
    /// The transform that verified `correspondences`, if verification ran and succeeded.
    pub transform: Option<T>,
    /// The condition that cut this cycle short, if any.
    pub degraded: Option<TrackError>,
}

impl<T> FrameTrack<T> {
    fn new(frame: usize, features: usize) -> Self {
        Self {
            frame,
            features,
            candidates: 0,
            correspondences: vec![],
            transform: None,
            degraded: None,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.correspondences.is_empty()
    }

    pub fn is_verified(&self) -> bool {
        self.transform.is_some()
    }
}

/// Matches `query` against `train` and keeps ratio-test survivors as
/// previous-to-current correspondences, ordered by query feature.
///
/// Nothing is matched if either frame has no features, whichever of them is the query.
fn correspond<D, M>(
    matcher: &BruteForceMatcher<M>,
    ratio_test: &RatioTest,
    query_frame: QueryFrame,
    previous: &FrameEntry<D>,
    current: &FrameEntry<D>,
) -> Result<Vec<Correspondence>, TrackError>
where
    M: DescriptorMetric<D> + Sync,
    D: Sync,
{
    if previous.is_empty() || current.is_empty() {
        return Err(TrackError::InsufficientCandidates { found: 0 });
    }
    let (query, train) = match query_frame {
        QueryFrame::Current => (current, previous),
        QueryFrame::Previous => (previous, current),
    };
    let neighbors = matcher.knn2(query.descriptors(), train.descriptors())?;
    let correspondences = ratio_test
        .filter(&neighbors)
        .into_iter()
        .map(|(query_feature, best)| {
            let (source, target) = match query_frame {
                QueryFrame::Current => (best.index, query_feature),
                QueryFrame::Previous => (query_feature, best.index),
            };
            Correspondence {
                source,
                target,
                source_point: previous.keypoint(source),
                target_point: current.keypoint(target),
                distance: best.distance,
            }
        })
        .collect();
    Ok(correspondences)
}

/// Associates the features of every incoming frame with those of the frame before it.
///
/// Each call to [`Tracker::process_frame`] runs one full cycle: extract, store,
/// match against the previous frame, ratio test, and (given enough candidates)
/// geometric verification. Cycles never fail. Whatever stopped a cycle early is
/// reported on the returned [`FrameTrack`] and the next frame starts fresh, with
/// only the frame history carried over.
///
/// Frames must be handed over in arrival order. If extraction happens elsewhere,
/// for instance on a thread pool, pass the features back in frame order through
/// [`Tracker::track_features`].
pub struct Tracker<D, X, M, S> {
    extractor: X,
    matcher: BruteForceMatcher<M>,
    ratio_test: RatioTest,
    solver: S,
    settings: TrackSettings,
    frames: FrameStore<D>,
}

impl<D, X, M, R> Tracker<D, X, M, HomographySolver<R>>
where
    M: DescriptorMetric<D> + Sync,
    D: Sync,
    R: Rng,
{
    /// A tracker that verifies correspondences against a homography.
    pub fn homography(
        extractor: X,
        metric: M,
        settings: TrackSettings,
        rng: R,
    ) -> Result<Self, SettingsError> {
        Self::new(extractor, metric, HomographySolver::new(rng), settings)
    }
}

impl<D, X, M, S> Tracker<D, X, M, S>
where
    M: DescriptorMetric<D> + Sync,
    D: Sync,
    S: GeometricSolver,
{
    pub fn new(
        extractor: X,
        metric: M,
        solver: S,
        settings: TrackSettings,
    ) -> Result<Self, SettingsError> {
        settings.validate()?;
        info!("tracker settings: {:?}", settings);
        Ok(Self {
            extractor,
            matcher: BruteForceMatcher::new(metric),
            ratio_test: RatioTest::new(settings.ratio),
            solver,
            settings,
            frames: FrameStore::new(settings.retention),
        })
    }

    /// Runs one tracking cycle on a new frame.
    ///
    /// The image is consumed. Only the extracted positions and descriptors are kept.
    pub fn process_frame<I>(&mut self, image: I) -> FrameTrack<S::Transform>
    where
        X: FeatureExtractor<I, Descriptor = D>,
    {
        let start = Instant::now();
        let features = self.extractor.extract(&image);
        drop(image);
        debug!(
            "extracted {} features in {:?}",
            features.len(),
            start.elapsed()
        );
        self.track_features(features)
    }

    /// Runs one tracking cycle on features that were already extracted.
    pub fn track_features(&mut self, features: Vec<Feature<D>>) -> FrameTrack<S::Transform> {
        let start = Instant::now();
        let entry = self.frames.append(features);
        let frame = entry.index();
        let mut track = FrameTrack::new(frame, entry.len());

        if let Err(e) = self.associate(&mut track) {
            match e {
                TrackError::InsufficientCorrespondences { .. } => {
                    debug!("frame {}: {}", frame, e)
                }
                _ => warn!("frame {}: {}", frame, e),
            }
            track.degraded = Some(e);
        }

        info!(
            "frame {}: {} features, {} candidates, {} correspondences in {:?}",
            frame,
            track.features,
            track.candidates,
            track.correspondences.len(),
            start.elapsed()
        );
        track
    }

    fn associate(&mut self, track: &mut FrameTrack<S::Transform>) -> Result<(), TrackError> {
        let current = self
            .frames
            .current()
            .ok_or(TrackError::EmptyExtraction)?;
        if current.is_empty() {
            return Err(TrackError::EmptyExtraction);
        }
        let previous = match self.frames.previous() {
            Some(previous) => previous,
            None => {
                debug!("frame {} is the first frame; nothing to match", current.index());
                return Ok(());
            }
        };

        let start = Instant::now();
        let candidates = correspond(
            &self.matcher,
            &self.ratio_test,
            self.settings.query,
            previous,
            current,
        )?;
        track.candidates = candidates.len();
        debug!(
            "matched {} against {} features into {} candidates in {:?}",
            current.len(),
            previous.len(),
            candidates.len(),
            start.elapsed()
        );

        let required = self.settings.min_verification_candidates;
        if candidates.len() < required {
            let found = candidates.len();
            track.correspondences = candidates;
            return Err(TrackError::InsufficientCorrespondences { found, required });
        }

        let start = Instant::now();
        let (transform, inliers) = verify(
            &mut self.solver,
            candidates,
            &self.settings.consensus(),
            required,
        )?;
        debug!(
            "verified {} of {} candidates in {:?}",
            inliers.len(),
            track.candidates,
            start.elapsed()
        );
        track.correspondences = inliers;
        track.transform = Some(transform);
        Ok(())
    }

    pub fn settings(&self) -> &TrackSettings {
        &self.settings
    }

    pub fn frames(&self) -> &FrameStore<D> {
        &self.frames
    }

    /// Drops stored frames before `index`; see [`FrameStore::evict_before`].
    pub fn evict_before(&mut self, index: usize) -> usize {
        self.frames.evict_before(index)
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }

    pub fn extractor(&self) -> &X {
        &self.extractor
    }
}

/// The tracker returned by [`Tracker::homography`].
pub type HomographyTracker<D, X, M, R> = Tracker<D, X, M, HomographySolver<R>>;

/// A [`FrameTrack`] produced by a [`HomographyTracker`].
pub type HomographyTrack = FrameTrack<Homography>;
