use thiserror::Error;

const NOT_FOUND_HINT: &str = "\n\n\
    Check that the `url` and `strip_prefix` in the source configuration point at an \
    existing release asset. The archive must be uploaded as part of the release itself, \
    not attached after the release was published.";

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Unsupported archive format: .{extension}")]
    UnsupportedFormat { extension: String },

    #[error("Failed to download release archive from {url}: HTTP {status}{hint}")]
    DownloadFailed {
        url: String,
        status: u16,
        hint: &'static str,
    },

    #[error("No response received from {url}: {reason}")]
    NoResponse { url: String, reason: String },

    #[error("Request to {url} failed: {reason}")]
    Request { url: String, reason: String },

    #[error(
        "Could not find MODULE.bazel in the release archive at {path}.\n\
         Is the configured strip prefix correct? (currently '{strip_prefix}')"
    )]
    MissingModuleFile { path: String, strip_prefix: String },

    #[error("Invalid archive URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Release archive has already been extracted")]
    AlreadyExtracted,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ArchiveError {
    /// Build a download failure for a terminal HTTP status.
    pub fn download_failed(url: impl Into<String>, status: u16) -> Self {
        ArchiveError::DownloadFailed {
            url: url.into(),
            status,
            hint: if status == 404 { NOT_FOUND_HINT } else { "" },
        }
    }

    /// HTTP status carried by a download failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            ArchiveError::DownloadFailed { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Whether the failure can be fixed by the user changing their configuration.
    pub fn is_user_actionable(&self) -> bool {
        matches!(
            self,
            ArchiveError::UnsupportedFormat { .. }
                | ArchiveError::DownloadFailed { .. }
                | ArchiveError::MissingModuleFile { .. }
                | ArchiveError::InvalidUrl { .. }
                | ArchiveError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, ArchiveError>;
