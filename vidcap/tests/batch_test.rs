mod common;

use std::fs;

use vidcap::{
    batch::{self, Outcome},
    caption::{self, CaptionBackend, FramePolicy},
    sampler::SampledFrame,
};
use vidcap_common::utils::fsutils;

/// A backend that only counts, no network involved.
struct FixedCaption;

impl CaptionBackend for FixedCaption {
    fn caption(&self, frames: &[SampledFrame]) -> caption::Result<String> {
        Ok(format!("{} frames captioned", frames.len()))
    }
}

fn exts() -> Vec<String> {
    batch::DEFAULT_EXTENSIONS.map(String::from).to_vec()
}

#[test]
fn a_failing_video_does_not_stop_the_batch() {
    let dir = tempfile::tempdir().expect("can create a tempdir");
    fs::write(dir.path().join("a.mp4"), "not a video").expect("can write");
    fs::write(dir.path().join("c.mov"), "also not a video").expect("can write");

    let videos = batch::collect_videos(dir.path(), &exts()).expect("the dir exists");
    assert_eq!(2, videos.len());

    let outcomes: Vec<Outcome> =
        batch::run_batch(&FixedCaption, FramePolicy::All, 4, videos).collect();

    // both videos were attempted even though the first one failed
    assert_eq!(2, outcomes.len());
    assert!(outcomes.iter().all(|o| o.caption.is_err()));
}

#[test]
fn mixed_directories_caption_matching_videos_in_order() {
    let Some(good) = common::create_test_video("batch_good.mp4", 2, 25) else {
        eprintln!("no usable ffmpeg CLI, skipping");
        return;
    };

    let dir = tempfile::tempdir().expect("can create a tempdir");
    fs::copy(&good, dir.path().join("a.mp4")).expect("can copy");
    fs::write(dir.path().join("b.txt"), "not a video at all").expect("can write");
    fs::write(dir.path().join("c.mov"), "looks like one but isn't").expect("can write");

    let videos = batch::collect_videos(dir.path(), &exts()).expect("the dir exists");
    let names: Vec<_> = videos.iter().map(|p| fsutils::basename(p)).collect();
    assert_eq!(vec!["a.mp4", "c.mov"], names);

    let outcomes: Vec<Outcome> =
        batch::run_batch(&FixedCaption, FramePolicy::All, 4, videos).collect();
    assert_eq!(2, outcomes.len());

    assert_eq!(
        "4 frames captioned",
        outcomes[0].caption.as_ref().expect("the good video captions")
    );
    assert!(outcomes[1].caption.is_err());
}

#[test]
fn the_first_frame_policy_reaches_the_backend() {
    let Some(good) = common::create_test_video("batch_first.mp4", 1, 5) else {
        eprintln!("no usable ffmpeg CLI, skipping");
        return;
    };

    let caption = batch::process_video(&FixedCaption, FramePolicy::First, 4, &good)
        .expect("the video captions");
    assert_eq!("1 frames captioned", caption);
}
