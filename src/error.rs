use std::path::{Path, PathBuf};

use ffmpeg_cmdline_utils::FfmpegError;
use serde::Serialize;
use thiserror::Error;

/// An error that stops a whole stage. Raised before any output is written
/// whenever the problem can be detected up front.
#[derive(Error, Debug)]
pub enum Error {
    /// The input directory does not exist or is not a directory.
    #[error("Input directory not found: {0}")]
    InputDirNotFound(PathBuf),

    #[error("Failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to create output directory {path}: {source}")]
    CreateOutputDir {
        path: PathBuf,
        source: std::io::Error,
    },

    /// `ffmpeg`/`ffprobe` could not be run at all.
    #[error("ffmpeg and ffprobe must be installed and visible on the command line")]
    FfmpegUnavailable,

    #[error("Cannot open video {path}: {source}")]
    OpenVideo { path: PathBuf, source: FfmpegError },

    /// A configuration value would produce degenerate output.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to write frame {path}: {source}")]
    WriteFrame {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to load image {path}: {source}")]
    LoadImage {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to move {from} to {to}: {source}")]
    Rename {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },

    /// A planned rename can no longer be carried out because neither its source nor its
    /// staged copy exist, or its destination is already taken.
    #[error("Renumbering cannot continue at {path}: {reason}")]
    RenumberConflict { path: PathBuf, reason: String },

    #[error("Renumbering plan {path} could not be used: {reason}")]
    RenumberPlan { path: PathBuf, reason: String },

    #[error("Failed to write PDF {path}: {reason}")]
    Pdf { path: PathBuf, reason: String },
}

/// A failure confined to a single image of a batch. The batch carries on with
/// the remaining images and lists the failure in its report.
#[derive(Error, Debug)]
pub enum ItemError {
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Cannot remove {rows} rows from {path}: image is only {height} pixels high")]
    CropTooLarge {
        path: PathBuf,
        rows: u32,
        height: u32,
    },

    #[error("Failed to save {path}: {source}")]
    Save {
        path: PathBuf,
        source: image::ImageError,
    },
}

impl ItemError {
    pub fn path(&self) -> &Path {
        match self {
            Self::Decode { path, .. } | Self::CropTooLarge { path, .. } | Self::Save { path, .. } => {
                path
            }
        }
    }
}

/// The serializable trace of an [`ItemError`] kept in batch reports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailedItem {
    pub path: PathBuf,
    pub reason: String,
}

impl From<&ItemError> for FailedItem {
    fn from(e: &ItemError) -> Self {
        Self {
            path: e.path().to_path_buf(),
            reason: e.to_string(),
        }
    }
}
