mod common;

use std::process::Command;

#[test]
fn outdir_parents_are_created() {
    let Some(video) = common::create_test_video("dump_src.mp4", 1, 5) else {
        eprintln!("no usable ffmpeg CLI, skipping");
        return;
    };

    let base = common::cargo_tmpdir().join("dump_out");
    let _ = std::fs::remove_dir_all(&base);
    let outdir = base.join("nested");

    let status = Command::new(env!("CARGO_BIN_EXE_frame-sampler"))
        .args(["--num", "2", "--outdir"])
        .arg(&outdir)
        .arg(&video)
        .status()
        .expect("can run the frame-sampler binary");
    assert!(status.success());

    let jpgs = std::fs::read_dir(&outdir).expect("the outdir exists").count();
    assert_eq!(2, jpgs);
}
