#![allow(clippy::let_and_return)]
#![warn(clippy::print_stdout)]
#![warn(clippy::print_stderr)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::dbg_macro)]

//! Reads frames out of video files by running `ffmpeg` on the command line and
//! parsing its raw `rgb24` output into [`image::RgbImage`] buffers.
//!
//! `ffmpeg` and `ffprobe` must be installed and visible on the `PATH`. Use
//! [`ffmpeg_and_ffprobe_are_callable`] to check before doing any work.
//!
//! ```no_run
//! use ffmpeg_cmdline_utils::FfmpegFrameReaderBuilder;
//!
//! let (frames, info) = FfmpegFrameReaderBuilder::new("performance.mkv")
//!     .spawn_rgb()
//!     .unwrap();
//! println!("{:?} at {} fps", info.resolution(), info.frame_rate());
//! for frame in frames {
//!     assert_eq!(frame.dimensions(), info.resolution());
//! }
//! ```

mod ffmpeg_error_kind;
mod ffmpeg_ops;
mod ffmpeg_stats;

pub use ffmpeg_error_kind::FfmpegError;
pub use ffmpeg_ops::{
    ffmpeg_and_ffprobe_are_callable, get_video_stats, FfmpegFrameIterRgb, FfmpegFrameReaderBuilder,
};
pub use ffmpeg_stats::{VideoInfo, VideoInfoError};
