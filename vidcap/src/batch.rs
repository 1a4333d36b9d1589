use std::io;
use std::path::{Path, PathBuf};
use std::time::Instant;

use color_eyre::eyre::{self, Context};
use vidcap_common::utils::fsutils;

use crate::caption::{CaptionBackend, FramePolicy};
use crate::sampler;

/// Container formats worth trying to open when scanning a directory.
pub const DEFAULT_EXTENSIONS: [&str; 3] = ["mp4", "mov", "avi"];

#[derive(thiserror::Error, Debug)]
pub enum BatchError {
    #[error("path not found: {0}")]
    NotFound(PathBuf),
    #[error("io: {0}")]
    Io(#[from] io::Error),
}

/// Resolve a path to the list of videos to process. A directory yields its immediate
/// children with an allowed extension, lexicographically sorted; a file is taken as-is
/// regardless of its extension.
pub fn collect_videos(
    path: &Path,
    extensions: &[String],
) -> std::result::Result<Vec<PathBuf>, BatchError> {
    if path.is_dir() {
        let mut videos: Vec<PathBuf> = fsutils::files_in_dir(path)?
            .into_iter()
            .filter(|file| has_allowed_extension(file, extensions))
            .collect();
        videos.sort();
        Ok(videos)
    } else if path.is_file() {
        Ok(vec![path.to_path_buf()])
    } else {
        Err(BatchError::NotFound(path.to_path_buf()))
    }
}

/// What happened to one video of a batch.
pub struct Outcome {
    pub video: PathBuf,
    pub caption: eyre::Result<String>,
}

/// Caption each video in order. A failing video only fails its own outcome, the rest
/// of the batch still runs. The iterator is lazy so the caller sees outcomes as they
/// are produced.
pub fn run_batch<'a>(
    backend: &'a dyn CaptionBackend,
    policy: FramePolicy,
    num_frames: u32,
    videos: Vec<PathBuf>,
) -> impl Iterator<Item = Outcome> + 'a {
    let total = videos.len();
    videos.into_iter().enumerate().map(move |(i, video)| {
        log::info!("Progress: {}/{} videos", i + 1, total);
        let caption = process_video(backend, policy, num_frames, &video);
        Outcome { video, caption }
    })
}

/// Sample, then caption, one video.
pub fn process_video(
    backend: &dyn CaptionBackend,
    policy: FramePolicy,
    num_frames: u32,
    video: &Path,
) -> eyre::Result<String> {
    log::info!("Sampling {} frames from: {}", num_frames, video.display());
    let before = Instant::now();
    let frames =
        sampler::sample_video(video, num_frames).wrap_err("failed to extract frames")?;
    eyre::ensure!(!frames.is_empty(), "no frames could be extracted");
    log::debug!(
        "Got {} frames in {}",
        frames.len(),
        humantime::Duration::from(before.elapsed())
    );

    let frames = policy.select(&frames);
    log::info!("Requesting a caption for {} frames", frames.len());
    backend
        .caption(frames)
        .wrap_err("the captioning backend failed")
}

fn has_allowed_extension(path: &Path, extensions: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    extensions
        .iter()
        .any(|allowed| allowed.eq_ignore_ascii_case(ext))
}
