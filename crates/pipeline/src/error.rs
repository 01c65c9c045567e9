use thiserror::Error;

/// Pipeline failures, one variant per stage of the flow
#[derive(Debug, Error)]
pub enum Error {
    #[error("upload failed: {0}")]
    Upload(String),

    #[error("job submission failed: {0}")]
    Submission(String),

    #[error("status check failed: {0}")]
    Poll(String),

    #[error("job failed: {0}")]
    JobFailed(String),

    #[error("job timed out after {0} polls")]
    JobTimeout(u32),

    #[error("completed job has no output url")]
    MissingResult,

    /// Internal to the download fallback chain; tiers log and swallow it.
    #[error("download failed: {0}")]
    Download(String),

    #[error("another operation is already in progress")]
    Busy,

    #[error("no uploaded image to generate from")]
    NoUpload,

    #[error("operation cancelled")]
    Cancelled,

    #[error("failed to build http client: {0}")]
    Init(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
