use std::path::PathBuf;

/// Typed failure surface for a sync run. Each external collaborator maps
/// to one variant so the CLI can report which side of the pipeline broke.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Credentials file unreadable, or a required key is missing.
    #[error("credential error: {message}")]
    Credential { message: String },

    /// Spreadsheet missing, malformed, or carrying non-date cells in the
    /// date columns.
    #[error("source data error: {message}")]
    SourceData { message: String },

    /// Confluence REST call failed (network, auth, or response shape).
    #[error("remote service error: {message}")]
    RemoteService { message: String },

    /// Configuration incomplete or inconsistent before the run started.
    #[error("validation error: {message}")]
    Validation { message: String },

    /// Filesystem I/O outside the collaborators above.
    #[error("I/O error at {}: {}", .path.display(), .source)]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, SyncError>;

impl SyncError {
    pub fn credential(message: impl Into<String>) -> Self {
        Self::Credential {
            message: message.into(),
        }
    }

    pub fn source_data(message: impl Into<String>) -> Self {
        Self::SourceData {
            message: message.into(),
        }
    }

    pub fn remote(message: impl Into<String>) -> Self {
        Self::RemoteService {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_names_the_failing_collaborator() {
        let error = SyncError::credential("missing API_TOKEN");
        assert_eq!(error.to_string(), "credential error: missing API_TOKEN");

        let error = SyncError::source_data("row 4 column 3 is not a date");
        assert!(error.to_string().starts_with("source data error:"));

        let error = SyncError::remote("HTTP 401");
        assert!(error.to_string().contains("HTTP 401"));
    }
}
