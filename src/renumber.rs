//! Renumbering of `frame_<digits>.png` files into a gapless `frame_00000.png..` sequence.
//!
//! Old and new names usually overlap, so files are never renamed in place. The full
//! rename plan is first written to a staging directory inside the frame directory, then
//! every file is moved into staging under its new name, then everything is moved back.
//! The plan records which of the two phases is running, so an interrupted run is picked
//! up from the plan on the next invocation instead of starting over.

use std::{
    fs,
    path::{Path, PathBuf},
};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::{
    batch::{create_output_dir, StageOutcome},
    frame_name::{frame_file_name, parse_frame_number},
    Error,
};

/// Name of the staging directory created inside the frame directory.
pub const STAGING_DIR_NAME: &str = ".renumber_staging";

const PLAN_FILE_NAME: &str = "plan.json";
/// Written first and renamed over the plan. Left behind if a run stops in between.
const PLAN_TMP_FILE_NAME: &str = "plan.json.tmp";
const PROGRESS_EVERY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
enum Phase {
    /// Files are being moved from the frame directory into staging.
    Staging,
    /// Files are being moved from staging back into the frame directory.
    Restoring,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PlannedMove {
    old_number: u64,
    from: String,
    to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct RenamePlan {
    phase: Phase,
    moves: Vec<PlannedMove>,
}

impl RenamePlan {
    /// Sorted by embedded number, ties broken by file name.
    fn for_frames(frames: Vec<(u64, String)>) -> Self {
        let moves = frames
            .into_iter()
            .sorted()
            .enumerate()
            .map(|(new_index, (old_number, from))| PlannedMove {
                old_number,
                from,
                to: frame_file_name(new_index as u64),
            })
            .collect();

        Self {
            phase: Phase::Staging,
            moves,
        }
    }

    fn report(&self, dir: &Path, resumed: bool) -> RenumberReport {
        let old_range = match (self.moves.first(), self.moves.last()) {
            (Some(first), Some(last)) => (first.old_number, last.old_number),
            _ => (0, 0),
        };
        RenumberReport {
            dir: dir.to_path_buf(),
            count: self.moves.len(),
            old_range,
            new_range: (0, self.moves.len().saturating_sub(1) as u64),
            resumed,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenumberReport {
    pub dir: PathBuf,
    pub count: usize,
    /// Lowest and highest frame number before renumbering.
    pub old_range: (u64, u64),
    /// Always starts at 0.
    pub new_range: (u64, u64),
    /// Whether an interrupted run was completed rather than a fresh one started.
    pub resumed: bool,
}

/// Renumber every `frame_<digits>.png` file directly inside `dir` to `frame_00000.png`,
/// `frame_00001.png`, ... ordered by the number embedded in the old name. Other files are
/// left untouched.
///
/// # errors
/// * `dir` is missing or cannot be listed
/// * a staging directory from an earlier run exists but holds no usable plan
/// * a file cannot be moved, or the directory changed underneath an interrupted run
pub fn renumber_frames(dir: impl AsRef<Path>) -> Result<StageOutcome<RenumberReport>, Error> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(Error::InputDirNotFound(dir.to_path_buf()));
    }

    let staging = dir.join(STAGING_DIR_NAME);
    let plan_path = staging.join(PLAN_FILE_NAME);

    if plan_path.is_file() {
        let plan = read_plan(&plan_path)?;
        warn!(
            "Found an interrupted renumbering of {} files in {}. Resuming it",
            plan.moves.len(),
            dir.display()
        );
        execute_plan(dir, &staging, plan, true).map(StageOutcome::Completed)
    } else {
        if staging.exists() && holds_staged_files(&staging)? {
            return Err(Error::RenumberConflict {
                path: staging,
                reason: "staging directory is not empty but has no rename plan".to_string(),
            });
        }

        let frames = list_numbered_frames(dir)?;
        if frames.is_empty() {
            info!("No frame_<number>.png files found in {}", dir.display());
            return Ok(StageOutcome::NoInput {
                searched: dir.to_path_buf(),
            });
        }

        let plan = RenamePlan::for_frames(frames);
        info!("Found {} frame files", plan.moves.len());
        if let (Some(first), Some(last)) = (plan.moves.first(), plan.moves.last()) {
            info!(
                "Original range: {} to {}",
                frame_file_name(first.old_number),
                frame_file_name(last.old_number)
            );
        }

        create_output_dir(&staging)?;
        write_plan(&plan_path, &plan)?;
        execute_plan(dir, &staging, plan, false).map(StageOutcome::Completed)
    }
}

/// `(number, file name)` of each matching regular file in `dir`.
fn list_numbered_frames(dir: &Path) -> Result<Vec<(u64, String)>, Error> {
    let read_dir_err = |source| Error::ReadDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut frames = vec![];
    for entry in fs::read_dir(dir).map_err(read_dir_err)? {
        let entry = entry.map_err(read_dir_err)?;
        let Some(name) = entry.file_name().to_str().map(str::to_string) else {
            continue;
        };
        if let Some(number) = parse_frame_number(&name) {
            if entry.path().is_file() {
                frames.push((number, name));
            }
        }
    }
    Ok(frames)
}

/// Whether `staging` holds anything besides an unfinished plan file.
fn holds_staged_files(staging: &Path) -> Result<bool, Error> {
    let read_dir_err = |source| Error::ReadDir {
        path: staging.to_path_buf(),
        source,
    };

    for entry in fs::read_dir(staging).map_err(read_dir_err)? {
        if entry.map_err(read_dir_err)?.file_name() != PLAN_TMP_FILE_NAME {
            return Ok(true);
        }
    }
    Ok(false)
}

fn read_plan(plan_path: &Path) -> Result<RenamePlan, Error> {
    let plan_err = |reason: String| Error::RenumberPlan {
        path: plan_path.to_path_buf(),
        reason,
    };

    let text = fs::read_to_string(plan_path).map_err(|e| plan_err(e.to_string()))?;
    serde_json::from_str(&text).map_err(|e| plan_err(e.to_string()))
}

/// Replace the plan file atomically, so a crash leaves either the old or the new plan.
fn write_plan(plan_path: &Path, plan: &RenamePlan) -> Result<(), Error> {
    let plan_err = |reason: String| Error::RenumberPlan {
        path: plan_path.to_path_buf(),
        reason,
    };

    let text = serde_json::to_string_pretty(plan).map_err(|e| plan_err(e.to_string()))?;
    let tmp_path = plan_path.with_file_name(PLAN_TMP_FILE_NAME);
    fs::write(&tmp_path, text).map_err(|e| plan_err(e.to_string()))?;
    fs::rename(&tmp_path, plan_path).map_err(|e| plan_err(e.to_string()))
}

fn rename(from: &Path, to: &Path) -> Result<(), Error> {
    fs::rename(from, to).map_err(|source| Error::Rename {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })
}

fn execute_plan(
    dir: &Path,
    staging: &Path,
    mut plan: RenamePlan,
    resumed: bool,
) -> Result<RenumberReport, Error> {
    let total = plan.moves.len();
    let plan_path = staging.join(PLAN_FILE_NAME);

    if plan.phase == Phase::Staging {
        for (i, mv) in plan.moves.iter().enumerate() {
            let src = dir.join(&mv.from);
            let staged = staging.join(&mv.to);

            // Only this phase puts files into staging, so a staged file means the move
            // happened before an interruption.
            if staged.exists() {
                trace!("{} already staged", mv.from);
            } else if src.is_file() {
                rename(&src, &staged)?;
            } else {
                return Err(Error::RenumberConflict {
                    path: src,
                    reason: format!("file disappeared before it was staged as {}", mv.to),
                });
            }

            if (i + 1) % PROGRESS_EVERY == 0 || i + 1 == total {
                info!("Renamed {}/{} files...", i + 1, total);
            }
        }

        plan.phase = Phase::Restoring;
        write_plan(&plan_path, &plan)?;
    }

    for mv in &plan.moves {
        let staged = staging.join(&mv.to);
        let dst = dir.join(&mv.to);

        if staged.exists() {
            if dst.exists() {
                return Err(Error::RenumberConflict {
                    path: dst,
                    reason: "destination was created while renumbering".to_string(),
                });
            }
            rename(&staged, &dst)?;
        } else if !dst.is_file() {
            return Err(Error::RenumberConflict {
                path: staged,
                reason: "staged file is missing".to_string(),
            });
        }
    }

    let cleanup_err = |path: &Path, e: std::io::Error| Error::RenumberConflict {
        path: path.to_path_buf(),
        reason: format!("could not remove after renumbering: {e}"),
    };
    fs::remove_file(&plan_path).map_err(|e| cleanup_err(&plan_path, e))?;
    let tmp_path = staging.join(PLAN_TMP_FILE_NAME);
    if tmp_path.exists() {
        fs::remove_file(&tmp_path).map_err(|e| cleanup_err(&tmp_path, e))?;
    }
    fs::remove_dir(staging).map_err(|e| cleanup_err(staging, e))?;

    let report = plan.report(dir, resumed);
    info!("Renumbering complete!");
    info!(
        "New range: {} to {}",
        frame_file_name(report.new_range.0),
        frame_file_name(report.new_range.1)
    );
    info!("All {} frames are now consecutively numbered", report.count);

    Ok(report)
}
