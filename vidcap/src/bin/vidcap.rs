use std::{ffi::OsString, num::NonZeroU32, path::PathBuf, time::Duration};

use clap::Parser;
use color_eyre::eyre::{self, Context};
use vidcap::{
    batch::{self, BatchError},
    caption::{
        self, gemini::GeminiBackend, llava::LlavaBackend, BackendKind, CaptionBackend,
        FramePolicy,
    },
};
use vidcap_common::{
    bin_common::init::{init_eyre, init_logger},
    utils::fsutils,
};

#[derive(Parser, Debug)]
#[command()]
/// Generates a descriptive caption for every video in a directory by sampling evenly
/// spaced frames and sending them to a vision language model.
struct Cli {
    /// Which captioning backend to talk to
    #[arg(long, value_enum, default_value = "gemini")]
    backend: BackendKind,

    /// How many evenly spaced frames to sample from each video
    #[arg(long, default_value = "8")]
    num_frames: NonZeroU32,

    /// Whether to send all sampled frames or only the first one
    #[arg(long, value_enum, default_value = "all")]
    frame_policy: FramePolicy,

    /// Extensions to pick up when the path is a directory
    #[arg(long, value_delimiter = ',', default_values_t = batch::DEFAULT_EXTENSIONS.map(String::from))]
    extensions: Vec<String>,

    /// Give up on the backend call after this long
    #[arg(long, default_value = "2m")]
    timeout: humantime::Duration,

    /// A file to additionally write the logs to
    #[arg(long)]
    logfile: Option<PathBuf>,

    /// A video file, or a directory containing video files
    path: PathBuf,
}

fn cli_arguments() -> eyre::Result<Cli> {
    const ARGS_FILE: &str = ".vidcaprc";
    let mut args: Vec<OsString> = std::env::args_os().collect();

    if args.len() == 1 {
        if let Some(flags) = fsutils::read_optional_file(ARGS_FILE)
            .wrap_err_with(|| format!("Could not read config file at: {ARGS_FILE}"))?
        {
            args.extend(
                flags
                    .split_whitespace()
                    .map(|s| std::ffi::OsStr::new(s).to_owned()),
            );
        }
    }

    Ok(Cli::parse_from(args))
}

fn main() -> eyre::Result<()> {
    init_eyre()?;
    let cli = cli_arguments()?;
    init_logger(cli.logfile.as_deref())?;

    log::debug!("CLI arguments: {cli:#?}");

    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            log::warn!("Could not read the .env file: {e}");
        }
    }

    let credential_var = cli.backend.credential_var();
    let api_key = std::env::var(credential_var)
        .ok()
        .and_then(|raw| caption::usable_credential(&raw).map(str::to_string));
    let Some(api_key) = api_key else {
        log::error!("{credential_var} is not set");
        log::error!("Export it, or put it in a .env file next to where this is run");
        return Ok(());
    };

    let videos = match batch::collect_videos(&cli.path, &cli.extensions) {
        Ok(videos) => videos,
        Err(e @ BatchError::NotFound(_)) => {
            log::error!("{e}");
            return Ok(());
        }
        Err(e) => return Err(e).wrap_err("failed to list video files"),
    };

    if videos.is_empty() {
        log::error!("No video files found to process in: {}", cli.path.display());
        return Ok(());
    }

    let backend = make_backend(cli.backend, api_key, cli.timeout.into())
        .wrap_err("failed to create the captioning backend")?;

    log::info!("Processing {} videos", videos.len());
    let outcomes = batch::run_batch(
        backend.as_ref(),
        cli.frame_policy,
        cli.num_frames.get(),
        videos,
    );
    for outcome in outcomes {
        let name = fsutils::basename(&outcome.video);
        match outcome.caption {
            Ok(caption) => {
                println!(">>> {name}:\n{caption}\n");
            }
            Err(e) => {
                log::error!("Failed to process '{name}': {e:?}");
            }
        }
    }

    Ok(())
}

fn make_backend(
    kind: BackendKind,
    api_key: String,
    timeout: Duration,
) -> caption::Result<Box<dyn CaptionBackend>> {
    Ok(match kind {
        BackendKind::Gemini => Box::new(GeminiBackend::new(api_key, timeout)?),
        BackendKind::Llava => Box::new(LlavaBackend::new(api_key, timeout)?),
    })
}
