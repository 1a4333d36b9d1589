use std::io::Cursor;
use std::path::Path;

use image::{ImageOutputFormat, RgbImage};

use crate::frame_extractor::{
    timestamp::Timestamp, FrameExtractor, FrameExtractorError,
};

const JPEG_QUALITY: u8 = 90;

#[derive(thiserror::Error, Debug)]
pub enum SamplerError {
    #[error("extractor: {0}")]
    Extractor(#[from] FrameExtractorError),
    #[error("jpeg encoding: {0}")]
    Encode(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, SamplerError>;

/// One decoded frame, re-encoded for transport. The raw decode buffer is gone by the
/// time this exists.
#[derive(Debug, Clone)]
pub struct SampledFrame {
    pub index: u64,
    pub timestamp: Timestamp,
    pub jpeg: Vec<u8>,
}

/// The frame indices to sample to cover a `total` frames long video evenly. At most
/// `min(requested, total)` indices, in increasing order, starting at the first frame.
pub fn sample_indices(total: u64, requested: u32) -> Vec<u64> {
    let n = std::cmp::min(u64::from(requested), total);
    (0..n).map(|i| i * total / n).collect()
}

/// Sample `requested` evenly spaced frames from the video and JPEG-encode each one.
/// Frames that fail to decode are skipped, so the result can be shorter than requested,
/// and empty when the container doesn't know how many frames it has. All ffmpeg
/// resources are released before this returns.
pub fn sample_video(path: &Path, requested: u32) -> Result<Vec<SampledFrame>> {
    let mut extractor = FrameExtractor::new(path)?;
    let total = extractor.total_frames();
    log::debug!("'{}' has {} frames in total", path.display(), total);

    let mut frames = Vec::new();
    for index in sample_indices(total, requested) {
        let decoded = extractor
            .seek_to_frame(index)
            .and_then(|()| extractor.next_frame());
        match decoded {
            Ok(Some((timestamp, image))) => {
                let jpeg = encode_jpeg(&image)?;
                frames.push(SampledFrame {
                    index,
                    timestamp,
                    jpeg,
                });
            }
            Ok(None) => {
                log::warn!(
                    "Ran out of frames at index {} of '{}'",
                    index,
                    path.display()
                );
                break;
            }
            Err(e) => {
                log::warn!("Skipping frame {} of '{}': {}", index, path.display(), e);
            }
        }
    }

    Ok(frames)
}

fn encode_jpeg(image: &RgbImage) -> image::ImageResult<Vec<u8>> {
    let mut buf = Cursor::new(Vec::new());
    image.write_to(&mut buf, ImageOutputFormat::Jpeg(JPEG_QUALITY))?;
    Ok(buf.into_inner())
}
