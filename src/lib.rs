#![warn(clippy::print_stdout, clippy::print_stderr)]

//! # Overview
//! vid2sheet_lib turns a screen recording of a piano performance (the kind where the
//! score scrolls past with a coloured playback marker drawn over it) into a printable
//! sheet-music PDF.
//!
//! # How it works
//! The work is split into independent stages, each reading and writing plain
//! directories of `frame_NNNNN.png` images, so that frames can be inspected, added or
//! deleted by hand between any two stages:
//! 1. [`extract_frames`]: sample one frame every few seconds of video and keep the upper
//!    part of it, where the score is.
//! 2. [`LineColorFilter`] run with [`process_dir`]: paint over the coloured playback
//!    marker, and a one pixel border around it, with a near-white fill.
//! 3. [`TopCropCfg`] run with [`process_dir`]: trim a fixed band of rows off the top of
//!    every frame.
//! 4. [`renumber_frames`]: after frames were deleted by hand, close the gaps so frames are
//!    numbered `0..n` again.
//! 5. [`assemble_pdf`]: stack the frames onto portrait pages, optionally under a title.
//!
//! ```no_run
//! use vid2sheet_lib::{LineColorFilter, PdfCfg, SamplerCfg, TopCropCfg};
//!
//! vid2sheet_lib::extract_frames("performance.mp4", "frames", &SamplerCfg::default())?;
//! vid2sheet_lib::process_dir("frames", "frames_noline", &LineColorFilter::default())?;
//! vid2sheet_lib::process_dir("frames_noline", "final_frames", &TopCropCfg::default())?;
//!
//! let cfg = PdfCfg {
//!     title: Some("Gymnopédie No. 1".to_string()),
//!     ..PdfCfg::default()
//! };
//! vid2sheet_lib::assemble_pdf("final_frames", "sheet_music.pdf", &cfg)?;
//! # Ok::<(), vid2sheet_lib::Error>(())
//! ```
//!
//! # Errors
//! Problems that make a whole stage pointless (a missing input directory, a video that
//! cannot be opened, a degenerate configuration) are returned as an [`Error`] before
//! anything is written. A single unreadable frame in a batch is only logged and listed in
//! the [`BatchReport`]; the rest of the batch still runs. An input directory without any
//! frames is not an error at all, and gives [`StageOutcome::NoInput`].
//!
//! # Prerequisites
//! Frame extraction calls Ffmpeg from the command line. You must make Ffmpeg and Ffprobe
//! available on the command line, for example:
//!
//! * Debian-based systems: ```# apt-get install ffmpeg```
//! * Yum-based systems: ```# yum install ffmpeg```
//! * Windows:
//!     1) Download the correct installer from <https://ffmpeg.org/download.html>
//!     2) Run the installer and install ffmpeg to any directory
//!     3) Add the directory into the PATH environment variable
//!
//! All other stages only need the images on disk.

#[macro_use]
extern crate log;

pub(crate) mod batch;
pub(crate) mod crop;
pub(crate) mod definitions;
pub(crate) mod error;
pub(crate) mod frame_name;
pub(crate) mod frame_sampler;
pub(crate) mod line_removal;
pub(crate) mod pdf;
pub(crate) mod renumber;
pub(crate) mod top_crop;

pub use batch::{list_png_files, process_dir, BatchReport, FrameTransform, StageOutcome};
pub use crop::Crop;
pub use definitions::*;
pub use error::{Error, FailedItem, ItemError};
pub use frame_name::{frame_file_name, parse_frame_number};
pub use frame_sampler::{
    extract_frames, save_sampled_frames, FrameSampler, SampleReport, SampledFrame, SamplerCfg,
};
pub use line_removal::{dilate_8_connected, hsv_from_rgb, LineColorFilter};
pub use pdf::{
    assemble_pdf, helvetica_bold_width, PageGeometry, PageLayout, PageSize, PdfCfg, PdfReport,
    Placement,
};
pub use renumber::{renumber_frames, RenumberReport, STAGING_DIR_NAME};
pub use top_crop::TopCropCfg;
