// Error types for flow definition analysis
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{name} cannot be null or empty")]
    InvalidArgument { name: &'static str },

    #[error("the specified solution directory '{}' does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("could not read '{}': {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("could not parse JSON file '{file}': {source}")]
    Parse {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot search actions only and triggers only at the same time")]
    ConflictingScope,

    #[error("invalid field reference pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Reject blank required arguments before any file is touched.
pub fn require_non_blank(value: &str, name: &'static str) -> Result<(), AnalysisError> {
    if value.trim().is_empty() {
        return Err(AnalysisError::InvalidArgument { name });
    }
    Ok(())
}
