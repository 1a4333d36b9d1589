// NOTE: every test will complain about the functions it doesn't use
#![allow(unused)]

use std::path::PathBuf;
use std::process::Stdio;

/// Returns cargo's tmpdir
pub fn cargo_tmpdir() -> PathBuf {
    PathBuf::from(option_env!("CARGO_TARGET_TMPDIR").expect("no cargo tmpdir???"))
}

/// Synthesize a small test video with the ffmpeg CLI, or None if that isn't possible
/// on this machine.
pub fn create_test_video(name: &str, duration: u32, rate: u32) -> Option<PathBuf> {
    let tmpvideo = cargo_tmpdir().join(name);
    let status = std::process::Command::new("ffmpeg")
        .args([
            "-y",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=duration={duration}:rate={rate}"),
        ])
        .arg(&tmpvideo)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .stdin(Stdio::null())
        .status()
        .ok()?;

    status.success().then_some(tmpvideo)
}
