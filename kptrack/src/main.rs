use akaze::Akaze;
use cv_track::{Hamming, HomographyTrack, TrackSettings, Tracker};
use image::{imageops::FilterType, DynamicImage, GenericImageView};
use log::*;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::Serialize;
use std::{error::Error, fs::File, path::PathBuf};
use structopt::StructOpt;

#[derive(Debug, StructOpt)]
#[structopt(
    name = "kptrack",
    about = "A tool to track keypoints from frame to frame through a sequence of images"
)]
struct Opt {
    /// The file where tracking settings are specified.
    ///
    /// This is in the format of `cv_track::TrackSettings`. Defaults are used if it can't be read.
    #[structopt(short, long, default_value = "kptrack-settings.json")]
    settings: PathBuf,
    /// The akaze threshold to use.
    ///
    /// 0.01 will be very sparse and 0.0001 will be very dense.
    #[structopt(short, long, default_value = "0.001")]
    threshold: f64,
    /// The factor each image is resized by before extraction.
    #[structopt(long, default_value = "0.8")]
    scale: f64,
    /// The seed of the consensus random number generator.
    #[structopt(long, default_value = "0")]
    seed: u64,
    /// Output JSON file with one record per frame.
    #[structopt(short, long, parse(from_os_str))]
    output: Option<PathBuf>,
    /// List of image files, in frame order.
    #[structopt(parse(from_os_str))]
    images: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
struct FrameReport {
    frame: usize,
    path: PathBuf,
    features: usize,
    candidates: usize,
    inliers: usize,
    verified: bool,
    degraded: Option<String>,
}

impl FrameReport {
    fn new(path: PathBuf, track: &HomographyTrack) -> Self {
        Self {
            frame: track.frame,
            path,
            features: track.features,
            candidates: track.candidates,
            inliers: track.correspondences.len(),
            verified: track.is_verified(),
            degraded: track.degraded.map(|e| e.to_string()),
        }
    }
}

fn rescale(image: DynamicImage, scale: f64) -> DynamicImage {
    if scale == 1.0 {
        return image;
    }
    let (width, height) = image.dimensions();
    let width = ((width as f64 * scale).round() as u32).max(1);
    let height = ((height as f64 * scale).round() as u32).max(1);
    image.resize_exact(width, height, FilterType::Triangle)
}

fn run(opt: Opt) -> Result<(), Box<dyn Error>> {
    if opt.scale.is_nan() || opt.scale <= 0.0 {
        return Err(format!("scale must be positive, got {}", opt.scale).into());
    }

    let settings = File::open(&opt.settings)
        .ok()
        .and_then(|file| serde_json::from_reader(file).ok());
    if settings.is_some() {
        info!("loaded existing settings");
    } else {
        info!("used default settings");
    }
    let settings: TrackSettings = settings.unwrap_or_default();

    let mut tracker = Tracker::homography(
        Akaze::new(opt.threshold),
        Hamming,
        settings,
        Pcg64::seed_from_u64(opt.seed),
    )?;

    let mut reports = vec![];
    for path in opt.images {
        let image = rescale(image::open(&path)?, opt.scale);
        let track = tracker.process_frame(image);
        reports.push(FrameReport::new(path, &track));
    }

    let verified = reports.iter().filter(|r| r.verified).count();
    info!("verified {} of {} frames", verified, reports.len());

    if let Some(path) = opt.output {
        info!("writing report to {}", path.display());
        serde_json::to_writer_pretty(File::create(path)?, &reports)?;
    }
    Ok(())
}

fn main() {
    pretty_env_logger::init_timed();
    let opt = Opt::from_args();
    if let Err(e) = run(opt) {
        error!("{}", e);
        std::process::exit(1);
    }
}
