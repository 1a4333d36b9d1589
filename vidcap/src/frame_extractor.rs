extern crate ffmpeg_next as ffmpeg;

pub mod timestamp;

use std::path::Path;
use std::sync::OnceLock;

use ffmpeg::codec::Context as CodecContext;
use ffmpeg::decoder::Video as DecoderVideo;
use ffmpeg::format::context::Input as FormatContext;
use ffmpeg::format::{input, Pixel};
use ffmpeg::frame::Video as FrameVideo;
use ffmpeg::media::Type;
use ffmpeg::software::scaling::context::Context as ScalingContext;
use ffmpeg::util::log as ffmpeglog;
use ffmpeg::{Packet as CodecPacket, Rational, Rescale};
use ffmpeg_sys_next::{AV_NOPTS_VALUE, AV_TIME_BASE_Q};
use image::RgbImage;

use self::timestamp::Timestamp;

#[derive(thiserror::Error, Debug)]
pub enum FrameExtractorError {
    #[error("ffmpeg: {0}")]
    Ffmpeg(#[from] ffmpeg::Error),
    #[error("the file has no video stream")]
    NoVideoStream,
}

pub type Result<T> = std::result::Result<T, FrameExtractorError>;

static FFMPEG_INITIALIZED: OnceLock<std::result::Result<(), ffmpeg::Error>> =
    OnceLock::new();

/// Decodes single frames from a video file, addressed by frame index. Frame indices are
/// translated to stream timestamps through the average frame rate, the same way the
/// container-reported frame count is interpreted.
pub struct FrameExtractor {
    // ffmpeg contexts
    ictx: FormatContext,
    decoder: DecoderVideo,
    converter: ScalingContext,

    // internal timestamp bookkeeping
    seek_target_timestamp: i64,
    cur_timestamp: i64,
    flushed: bool,

    // constants/metadata
    first_timestamp: i64,
    timebase: Rational,
    frame_rate: Rational,
    total_frames: u64,
    video_stream_index: usize,
}

impl FrameExtractor {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        if let Err(e) = FFMPEG_INITIALIZED.get_or_init(|| {
            ffmpeg::init()?;
            ffmpeglog::set_level(ffmpeglog::Level::Fatal);
            Ok(())
        }) {
            return Err(e.clone().into());
        }

        let ictx = input(&path)?;
        let video = ictx
            .streams()
            .best(Type::Video)
            .ok_or(FrameExtractorError::NoVideoStream)?;
        let video_stream_index = video.index();
        let timebase = video.time_base();
        let frame_rate = video.avg_frame_rate();

        // some containers don't report a start time at all
        let first_timestamp = match video.start_time() {
            AV_NOPTS_VALUE => 0,
            ts => ts,
        };

        let total_frames =
            total_frames(&video, ictx.duration(), timebase, frame_rate, first_timestamp);

        let decoder = CodecContext::from_parameters(video.parameters())?
            .decoder()
            .video()?;
        let converter = pixel_converter(&decoder)?;

        Ok(Self {
            ictx,
            decoder,
            converter,
            seek_target_timestamp: first_timestamp,
            cur_timestamp: first_timestamp,
            flushed: false,
            first_timestamp,
            timebase,
            frame_rate,
            total_frames,
            video_stream_index,
        })
    }

    /// How many frames the video claims to have. Zero when the container neither
    /// declares a frame count nor enough metadata to estimate one.
    pub fn total_frames(&self) -> u64 {
        self.total_frames
    }

    /// Position the demuxer so that the next decoded frame is the one at `index`.
    /// Decoding restarts at the keyframe at or before the target, the frames in between
    /// are decoded and discarded by [`Self::next_frame`].
    pub fn seek_to_frame(&mut self, index: u64) -> Result<()> {
        let index: i64 = index.try_into().expect("frame indices are small");
        let offset = index.rescale(self.frame_rate.invert(), self.timebase);
        let target = self.first_timestamp + offset;

        seek_keyframe_before(&mut self.ictx, self.video_stream_index, target)?;
        self.decoder.flush();
        self.flushed = false;
        self.seek_target_timestamp = target;
        Ok(())
    }

    /// The next frame at or after the seek target, or None at end of file.
    pub fn next_frame(&mut self) -> Result<Option<(Timestamp, RgbImage)>> {
        loop {
            let mut frame = FrameVideo::empty();
            match self.decoder.receive_frame(&mut frame) {
                Ok(()) => {
                    self.cur_timestamp =
                        frame.timestamp().unwrap_or(self.cur_timestamp);
                    if self.cur_timestamp < self.seek_target_timestamp {
                        continue;
                    }

                    let mut converted = FrameVideo::empty();
                    self.converter.run(&frame, &mut converted)?;
                    let ts = Timestamp::new(
                        self.cur_timestamp,
                        self.timebase,
                        self.first_timestamp,
                    );
                    return Ok(Some((ts, rgb_image(&converted))));
                }
                Err(ffmpeg::Error::Other { errno: libc::EAGAIN }) if !self.flushed => {
                    // the decoder wants another packet, fed below
                }
                Err(ffmpeg::Error::Other { errno: libc::EAGAIN })
                | Err(ffmpeg::Error::Eof) => return Ok(None),
                Err(e) => return Err(e.into()),
            }

            let mut packet = CodecPacket::empty();
            match packet.read(&mut self.ictx) {
                Ok(()) if packet.stream() == self.video_stream_index => {
                    self.decoder.send_packet(&packet)?
                }
                Ok(()) => (),
                Err(ffmpeg::Error::Eof) => {
                    self.decoder.send_eof()?;
                    self.flushed = true;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

fn total_frames(
    video: &ffmpeg::format::stream::Stream,
    container_duration: i64,
    timebase: Rational,
    frame_rate: Rational,
    first_timestamp: i64,
) -> u64 {
    if frame_rate.numerator() <= 0 {
        // without a frame rate an index can't be turned into a timestamp anyway
        return 0;
    }

    let nb_frames = video.frames();
    if nb_frames > 0 {
        return nb_frames as u64;
    }

    let duration = if video.duration() != AV_NOPTS_VALUE {
        video.duration() - first_timestamp
    } else if container_duration != AV_NOPTS_VALUE {
        container_duration.rescale(AV_TIME_BASE_Q, timebase)
    } else {
        return 0;
    };

    std::cmp::max(0, duration.rescale(timebase, frame_rate.invert())) as u64
}

fn pixel_converter(decoder: &DecoderVideo) -> Result<ScalingContext> {
    ScalingContext::get(
        decoder.format(),
        decoder.width(),
        decoder.height(),
        Pixel::RGB24,
        decoder.width(),
        decoder.height(),
        ffmpeg::software::scaling::Flags::FAST_BILINEAR,
    )
    .map_err(|e| e.into())
}

/// Seek to the keyframe at or before `ts` on the given stream.
/// FormatContext::seek can't seek on a specific stream, hence the unsafe.
fn seek_keyframe_before(
    input: &mut FormatContext,
    stream_index: usize,
    ts: i64,
) -> std::result::Result<(), ffmpeg::Error> {
    let stream_index: i32 = stream_index.try_into().expect("will not be that big");
    unsafe {
        match ffmpeg_sys_next::avformat_seek_file(
            input.as_mut_ptr(),
            stream_index,
            i64::MIN,
            ts,
            ts,
            0,
        ) {
            s if s >= 0 => Ok(()),
            e => Err(ffmpeg::Error::from(e)),
        }
    }
}

fn rgb_image(converted: &FrameVideo) -> RgbImage {
    assert_eq!(Pixel::RGB24, converted.format());
    assert_eq!(1, converted.planes());

    let src_linesize = converted.stride(0);
    let width: usize = converted.width().try_into().expect("will always fit");
    let height: usize = converted.height().try_into().expect("will always fit");
    let data = converted.data(0);
    let trg_linesize = 3 * width;
    assert!(src_linesize >= trg_linesize);

    // the rows can be padded to the right
    let mut buf = Vec::with_capacity(trg_linesize * height);
    for row in 0..height {
        let start = row * src_linesize;
        buf.extend_from_slice(&data[start..start + trg_linesize]);
    }

    RgbImage::from_vec(
        width.try_into().expect("was an u32 before"),
        height.try_into().expect("was an u32 before"),
        buf,
    )
    .expect("the buffer is big enough")
}
