use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Stage(#[from] vid2sheet_lib::Error),

    #[error("Failed to write report: {0}")]
    ReportError(#[from] serde_json::Error),

    #[error("Failed to write report: {0}")]
    ReportIoError(#[from] std::io::Error),
}
