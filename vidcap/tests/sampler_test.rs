mod common;

use common::create_test_video;
use vidcap::sampler::{self, SampledFrame};

const LONG_VIDEO_FRAMES: u64 = 250;

#[test]
fn samples_eight_evenly_spaced_jpegs() -> sampler::Result<()> {
    let Some(video) = create_test_video("sampler_long.mp4", 10, 25) else {
        eprintln!("no usable ffmpeg CLI, skipping");
        return Ok(());
    };

    let frames = sampler::sample_video(&video, 8)?;
    assert_eq!(8, frames.len());
    assert_sane(&frames, LONG_VIDEO_FRAMES);
    Ok(())
}

#[test]
fn short_videos_yield_fewer_frames() -> sampler::Result<()> {
    let Some(video) = create_test_video("sampler_short.mp4", 1, 5) else {
        eprintln!("no usable ffmpeg CLI, skipping");
        return Ok(());
    };

    let frames = sampler::sample_video(&video, 8)?;
    assert_eq!(5, frames.len());
    assert_sane(&frames, 5);
    Ok(())
}

#[test]
fn unopenable_files_error_out() {
    let garbage = common::cargo_tmpdir().join("sampler_garbage.mp4");
    std::fs::write(&garbage, "this is not a video").expect("can write to tmpdir");
    assert!(sampler::sample_video(&garbage, 8).is_err());
}

fn assert_sane(frames: &[SampledFrame], total: u64) {
    let indices: Vec<u64> = frames.iter().map(|frame| frame.index).collect();
    assert_eq!(0, indices[0]);
    assert!(
        indices.windows(2).all(|w| w[0] < w[1]),
        "indices not increasing: {indices:?}"
    );
    assert!(
        indices.iter().all(|&i| i < total),
        "index out of bounds: {indices:?}"
    );

    for frame in frames {
        // JPEG start-of-image marker
        assert_eq!(
            &[0xff, 0xd8],
            &frame.jpeg[..2],
            "frame {} is not a jpeg",
            frame.index
        );
    }
}
