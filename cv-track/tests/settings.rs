#![cfg(feature = "serde-serialize")]

use cv_track::{
    Correspondence, Homography, HomographyTrack, KeyPoint, QueryFrame, Retention, TrackError,
    TrackSettings,
};

#[test]
fn partial_settings_fill_in_defaults() {
    let settings: TrackSettings =
        serde_json::from_str(r#"{ "ratio": 0.8, "retention": { "keep_last": 3 } }"#).unwrap();
    assert_eq!(
        settings,
        TrackSettings {
            ratio: 0.8,
            retention: Retention::KeepLast(3),
            ..Default::default()
        }
    );
    assert!(settings.validate().is_ok());
}

#[test]
fn query_frame_by_name() {
    let settings: TrackSettings = serde_json::from_str(r#"{ "query": "previous" }"#).unwrap();
    assert_eq!(settings.query, QueryFrame::Previous);
    assert_eq!(settings.reprojection_threshold, 3.0);
}

#[test]
fn settings_survive_json() {
    let settings = TrackSettings {
        min_inliers: 12,
        refine: false,
        ..Default::default()
    };
    let json = serde_json::to_string(&settings).unwrap();
    assert_eq!(serde_json::from_str::<TrackSettings>(&json).unwrap(), settings);
}

#[test]
fn frame_tracks_survive_json() {
    let source_point = KeyPoint::new(10.0, 20.0);
    let target_point = KeyPoint::new(13.0, 18.0);
    let track = HomographyTrack {
        frame: 7,
        features: 120,
        candidates: 3,
        correspondences: vec![Correspondence {
            source: 4,
            target: 9,
            source_point,
            target_point,
            distance: 12.0,
        }],
        transform: Some(Homography::translation(3.0, -2.0)),
        degraded: Some(TrackError::InsufficientCorrespondences {
            found: 3,
            required: 4,
        }),
    };
    let json = serde_json::to_string(&track).unwrap();
    assert_eq!(serde_json::from_str::<HomographyTrack>(&json).unwrap(), track);
}
