use std::path::{Path, PathBuf};

use image::DynamicImage;
use itertools::Itertools;
use serde::Serialize;

use crate::{definitions::FRAME_EXTENSION, Error, FailedItem, ItemError};

/// A per-image operation that can be run over a whole directory of frames.
pub trait FrameTransform {
    /// Short description used in progress messages.
    fn describe(&self) -> &'static str;

    /// Reject a configuration that could only produce degenerate output. Called once,
    /// before anything is read or written.
    fn validate(&self) -> Result<(), Error> {
        Ok(())
    }

    /// Transform one decoded image. The pixel format it returns is the one saved.
    fn apply(&self, src_path: &Path, img: DynamicImage) -> Result<DynamicImage, ItemError>;
}

/// How a stage ended when it did not fail outright.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageOutcome<R> {
    /// There was nothing to do. Not an error, and nothing was written.
    NoInput { searched: PathBuf },
    Completed(R),
}

impl<R> StageOutcome<R> {
    pub fn completed(self) -> Option<R> {
        match self {
            Self::NoInput { .. } => None,
            Self::Completed(report) => Some(report),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchReport {
    pub operation: &'static str,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub processed: usize,
    pub failed: Vec<FailedItem>,
}

/// All `*.png` files directly inside `dir`, sorted by file name.
pub fn list_png_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>, Error> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::InputDirNotFound(dir.to_path_buf()));
    }

    let read_dir_err = |source| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut paths = vec![];
    for entry in std::fs::read_dir(dir).map_err(read_dir_err)? {
        let path = entry.map_err(read_dir_err)?.path();
        let is_png = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case(FRAME_EXTENSION));
        if is_png && path.is_file() {
            paths.push(path);
        }
    }

    Ok(paths
        .into_iter()
        .sorted_by(|a, b| a.file_name().cmp(&b.file_name()))
        .collect())
}

pub(crate) fn create_output_dir(dir: &Path) -> Result<(), Error> {
    std::fs::create_dir_all(dir).map_err(|source| Error::CreateOutputDir {
        path: dir.to_path_buf(),
        source,
    })
}

/// Run `transform` over every PNG in `input_dir`, writing results under the same file
/// name into `output_dir` (which is created if missing, and may equal `input_dir`).
///
/// A failure on one image is logged and recorded in the report, and the batch continues.
///
/// # errors
/// * the transform's configuration is invalid
/// * `input_dir` is missing or cannot be listed
/// * `output_dir` cannot be created
pub fn process_dir(
    input_dir: impl AsRef<Path>,
    output_dir: impl AsRef<Path>,
    transform: &impl FrameTransform,
) -> Result<StageOutcome<BatchReport>, Error> {
    let input_dir = input_dir.as_ref();
    let output_dir = output_dir.as_ref();

    transform.validate()?;
    let png_files = list_png_files(input_dir)?;
    if png_files.is_empty() {
        info!("No PNG files found in {}", input_dir.display());
        return Ok(StageOutcome::NoInput {
            searched: input_dir.to_path_buf(),
        });
    }

    create_output_dir(output_dir)?;

    info!(
        "{}: processing {} images...",
        transform.describe(),
        png_files.len()
    );

    let mut processed = 0;
    let mut failed = vec![];
    for src_path in &png_files {
        match process_one(src_path, output_dir, transform) {
            Ok(()) => processed += 1,
            Err(e) => {
                warn!("{e}");
                failed.push(FailedItem::from(&e));
            }
        }
    }

    info!(
        "Done! {} images saved to {}",
        processed,
        output_dir.display()
    );
    if !failed.is_empty() {
        warn!("{} images could not be processed", failed.len());
    }

    Ok(StageOutcome::Completed(BatchReport {
        operation: transform.describe(),
        input_dir: input_dir.to_path_buf(),
        output_dir: output_dir.to_path_buf(),
        processed,
        failed,
    }))
}

fn process_one(
    src_path: &Path,
    output_dir: &Path,
    transform: &impl FrameTransform,
) -> Result<(), ItemError> {
    // list_png_files only returns paths with a file name
    let file_name = src_path.file_name().unwrap_or_default();
    info!("Processing: {}", file_name.to_string_lossy());

    let img = image::open(src_path).map_err(|source| ItemError::Decode {
        path: src_path.to_path_buf(),
        source,
    })?;

    let out = transform.apply(src_path, img)?;

    let dst_path = output_dir.join(file_name);
    out.save(&dst_path).map_err(|source| ItemError::Save {
        path: dst_path.clone(),
        source,
    })
}
