use std::io::Write;

use serde::Serialize;
use vid2sheet_lib::*;

use crate::app::*;

/// The result of a stage as printed on stdout once it is finished.
pub trait ReportOutput: Serialize {
    /// Human readable summary, one entry per line.
    fn summary(&self) -> Vec<String>;
}

impl ReportOutput for SampleReport {
    fn summary(&self) -> Vec<String> {
        let (width, height) = self.resolution;
        vec![
            format!("Video: {} ({width}x{height}, {:.2} fps)", self.video.display(), self.fps),
            format!(
                "Sampled every {}s ({} frames): {} of {} frames saved to {}",
                self.interval_secs,
                self.frame_interval,
                self.frames_saved,
                self.frames_read,
                self.output_dir.display()
            ),
        ]
    }
}

impl ReportOutput for BatchReport {
    fn summary(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{}: {} images written to {}",
            self.operation,
            self.processed,
            self.output_dir.display()
        )];

        if !self.failed.is_empty() {
            lines.push(format!("{} images failed:", self.failed.len()));
            lines.extend(self.failed.iter().map(|item| format!("    {}", item.reason)));
        }
        lines
    }
}

impl ReportOutput for RenumberReport {
    fn summary(&self) -> Vec<String> {
        let mut lines = vec![];
        if self.resumed {
            lines.push("Completed an interrupted renumbering".to_string());
        }
        lines.push(format!(
            "{} frames in {} renumbered: {}..{} -> {}..{}",
            self.count,
            self.dir.display(),
            frame_file_name(self.old_range.0),
            frame_file_name(self.old_range.1),
            frame_file_name(self.new_range.0),
            frame_file_name(self.new_range.1),
        ));
        lines
    }
}

impl ReportOutput for PdfReport {
    fn summary(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "{} frames on {} pages written to {}",
            self.images,
            self.pages,
            self.output.display()
        )];
        if let Some(title) = &self.title {
            lines.push(format!("Song name: {title}"));
        }
        if self.oversized > 0 {
            lines.push(format!(
                "{} frames were too tall for a page and were shrunk",
                self.oversized
            ));
        }
        lines
    }
}

pub fn print_outcome<R: ReportOutput>(
    outcome: &StageOutcome<R>,
    format: OutputFormat,
) -> Result<(), AppError> {
    let stdout = std::io::stdout();
    let mut stdout = stdout.lock();

    match format {
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut stdout, outcome)?;
            writeln!(stdout)?;
        }
        OutputFormat::Normal => match outcome {
            StageOutcome::NoInput { searched } => {
                writeln!(stdout, "Nothing to do: no frames found in {}", searched.display())?;
            }
            StageOutcome::Completed(report) => {
                for line in report.summary() {
                    writeln!(stdout, "{line}")?;
                }
            }
        },
    }

    Ok(())
}
