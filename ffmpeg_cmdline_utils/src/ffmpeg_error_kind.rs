use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::*;

/// Various causes of failure for ffmpeg/ffprobe functions.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum FfmpegError {
    /// Ffmpeg/Ffprobe command was not found. Make sure Ffmpeg is installed and can be found on the command line.
    #[error("ffmpeg/ffprobe not found. Make sure ffmpeg/ffprobe are installed and visible on the command line")]
    FfmpegNotFound,

    /// Io error occurred while executing Ffmpeg/Ffprobe command
    #[error("Ffmpeg IO error: {0}")]
    Io(String),

    /// Ffmpeg/Ffprobe did not finish within the allotted time.
    #[error("Ffmpeg/Ffprobe timed out")]
    Timeout,

    /// Ffmpeg/Ffprobe returned a nonzero exit code. Because ffmpeg sometimes prints long error strings
    /// to stderr, the resulting string contains the first few hundred characters of the error message.
    #[error("Internal Ffmpeg Failure: {0}")]
    FfmpegInternal(String),

    /// Failed to interpret Ffmpeg/Ffprobe output as a utf8-string.
    #[error("utf8 parsing/conversion failure")]
    Utf8Conversion,

    /// Ffprobe reported a zero width or height for the first video stream.
    /// Note: This usually happens when the file is audio-only.
    #[error("Ffprobe found no video stream with a valid resolution")]
    InvalidResolution,

    /// Failed to obtain video information.
    #[error("Failed to get video properties: {0}")]
    Info(#[from] VideoInfoError),
}
