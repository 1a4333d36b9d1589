use std::num::NonZeroU32;
use std::path::PathBuf;

use clap::Parser;
use color_eyre::eyre::{self, Context};
use vidcap::sampler;
use vidcap_common::bin_common::init::{init_eyre, init_logger};

#[derive(Parser)]
#[command()]
/// Dump the frames the captioner would send, as JPEG files
struct Cli {
    /// How many evenly spaced frames to sample
    #[arg(long, default_value = "8")]
    num: NonZeroU32,

    /// Where to place the frames as images
    #[arg(long)]
    outdir: PathBuf,

    /// The video file to sample from
    videofile: PathBuf,
}

fn main() -> eyre::Result<()> {
    init_eyre()?;
    init_logger(None)?;
    let cli = Cli::parse();

    if !cli.outdir.is_dir() {
        std::fs::create_dir_all(&cli.outdir)?;
    }

    let frames = sampler::sample_video(&cli.videofile, cli.num.get())
        .wrap_err("failed to sample the video")?;
    for frame in frames {
        let filename = format!("frame_{}_{}.jpg", frame.index, frame.timestamp);
        println!("Writing {:?}", filename);
        std::fs::write(cli.outdir.join(filename), &frame.jpeg)?;
    }

    Ok(())
}
