use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::*;

#[derive(Debug, Deserialize, Serialize, Clone, Error)]
pub enum VideoInfoError {
    #[error("Error parsing stats: {0}")]
    JsonError(String),
    #[error("Error parsing stats: {0}")]
    ParseIntError(String),
    #[error("Error parsing stats: {0}")]
    ParseFloatError(String),
    #[error("Unexpected video rotation: {0}")]
    Rotation(String),
}

impl From<serde_json::Error> for VideoInfoError {
    fn from(e: serde_json::Error) -> Self {
        //limit maximum number of characters
        let error_string = format!("{e}").chars().take(500).collect::<String>();
        VideoInfoError::JsonError(error_string)
    }
}

impl From<std::num::ParseIntError> for VideoInfoError {
    fn from(e: std::num::ParseIntError) -> Self {
        VideoInfoError::ParseIntError(format!("{e}"))
    }
}

impl From<std::num::ParseFloatError> for VideoInfoError {
    fn from(e: std::num::ParseFloatError) -> Self {
        VideoInfoError::ParseFloatError(format!("{e}"))
    }
}

// If the video metadata declares a rotation, the raw (x, y) resolution in that metadata
// refers to the "unrotated" resolution. ffmpeg autorotates every frame it decodes, so
// x and y must be swapped if the rotation is 90 or 270
#[derive(PartialEq, Eq, Clone, Debug, Copy, Default)]
enum FfmpegVideoRotation {
    #[default]
    Rot0,
    Rot90,
    Rot180,
    Rot270,
}
use FfmpegVideoRotation::*;

/// Some of the video metadata that can be obtained by using ffprobe.
#[derive(PartialEq, Clone, Debug, Serialize, Deserialize, Default)]
pub struct VideoInfo {
    duration: std::time::Duration,
    resolution: (u32, u32),
    frame_rate: f64,
    num_frames: Option<u64>,
}

impl VideoInfo {
    /// Use ffprobe to get the duration, resolution and frame rate of a video. If the video contains
    /// multiple streams then only information about the first video stream will be returned.
    ///
    /// # errors
    /// * The file cannot be read or is not recognized as a video by ffprobe
    /// * The output from ffprobe could not be parsed as JSON
    /// * The output from ffprobe contained malformed numeric fields.
    pub fn new<P>(src_path: P) -> Result<Self, FfmpegError>
    where
        P: AsRef<Path>,
    {
        let stats_string = get_video_stats(&src_path)?;
        Self::from_ffprobe_json(&stats_string)
    }

    /// Build a VideoInfo from the JSON printed by `ffprobe -show_format -show_streams -print_format json`.
    pub fn from_ffprobe_json(stats_string: &str) -> Result<Self, FfmpegError> {
        let stats_parsed: Value =
            serde_json::from_str(stats_string).map_err(VideoInfoError::from)?;

        let duration = if let Value::String(d) = &stats_parsed["format"]["duration"] {
            std::time::Duration::from_secs_f64(d.parse().map_err(VideoInfoError::from)?)
        } else {
            std::time::Duration::from_secs_f64(0.0)
        };

        let first_video = Self::first_video(&stats_parsed);

        let rotation = match first_video.and_then(Self::rotation_of) {
            None | Some(0) => Rot0,
            Some(90) | Some(-270) => Rot90,
            Some(180) | Some(-180) => Rot180,
            Some(-90) | Some(270) => Rot270,
            Some(other) => return Err(VideoInfoError::Rotation(other.to_string()).into()),
        };

        let resolution = {
            let width = first_video.and_then(|v| Self::u32_field(v, "width")).unwrap_or(0);
            let height = first_video.and_then(|v| Self::u32_field(v, "height")).unwrap_or(0);

            if matches!(rotation, Rot0 | Rot180) {
                (width, height)
            } else {
                (height, width)
            }
        };

        // avg_frame_rate is what players report as "fps". r_frame_rate is the lowest rate
        // that can represent all timestamps and is only used when the average is missing.
        let frame_rate = first_video
            .and_then(|v| {
                Self::rational_field(v, "avg_frame_rate")
                    .or_else(|| Self::rational_field(v, "r_frame_rate"))
            })
            .unwrap_or(0.0);

        let num_frames = match first_video.map(|v| &v["nb_frames"]) {
            Some(Value::String(n)) => Some(n.parse().map_err(VideoInfoError::from)?),
            _ => None,
        };

        Ok(VideoInfo {
            duration,
            resolution,
            frame_rate,
            num_frames,
        })
    }

    /// The duration of the video
    pub fn duration(&self) -> std::time::Duration {
        self.duration
    }

    /// The resolution of the video in pixels.
    /// Note the returned value is correct for the orientation that the video is intended
    /// to be viewed. (Ffprobe returns a surprising value by default if the video is stored rotated)
    pub fn resolution(&self) -> (u32, u32) {
        self.resolution
    }

    /// Frames per second of the first video stream, or 0.0 if ffprobe did not report one.
    pub fn frame_rate(&self) -> f64 {
        self.frame_rate
    }

    /// The number of frames declared in the container, if any.
    pub fn num_frames(&self) -> Option<u64> {
        self.num_frames
    }

    fn first_video(stats_parsed: &Value) -> Option<&Value> {
        let Value::Array(streams) = &stats_parsed["streams"] else {
            return None;
        };

        streams
            .iter()
            .find(|s| matches!(&s["codec_type"], Value::String(t) if t == "video"))
    }

    fn rotation_of(video_stream: &Value) -> Option<i64> {
        let rotation = video_stream
            .get("side_data_list")
            .and_then(|list| list.get(0))
            .and_then(|side_data| side_data.get("rotation"))?;

        //the rotation may either be a JSON String or JSON number.
        match rotation {
            Value::Number(val) => val.as_i64(),
            Value::String(val) => val.parse::<i64>().ok(),
            _ => None,
        }
    }

    fn u32_field(video_stream: &Value, field_name: &str) -> Option<u32> {
        match &video_stream[field_name] {
            Value::Number(v) => u32::try_from(v.as_u64()?).ok(),
            _ => None,
        }
    }

    // ffprobe prints rates as "num/den", e.g "30000/1001". "0/0" means unknown.
    fn rational_field(video_stream: &Value, field_name: &str) -> Option<f64> {
        let Value::String(s) = &video_stream[field_name] else {
            return None;
        };

        let (num, den) = s.split_once('/')?;
        let num = num.trim().parse::<f64>().ok()?;
        let den = den.trim().parse::<f64>().ok()?;

        (den > 0.0 && num > 0.0).then(|| num / den)
    }
}
