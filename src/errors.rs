use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by the capture-pipeline tools.
///
/// Each variant carries the context of its failure domain (filesystem,
/// external tool, configuration) so callers never have to parse message
/// strings. External tools are opaque, single-attempt operations: a non-zero
/// exit is reported as-is and never retried.
#[derive(Error, Debug)]
pub enum ScanOpsError {
    #[error("input directory not found: {path:?}")]
    InputNotFound { path: PathBuf },

    #[error("filesystem error: {operation} failed for {path:?}")]
    FileSystem {
        path: PathBuf,
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to launch {program}")]
    ToolLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with code {code}: {stderr}")]
    ToolFailed {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("cancelled while running {program}")]
    Cancelled { program: String },

    #[error("configuration error: {message}")]
    Configuration { message: String },
}

pub type Result<T> = std::result::Result<T, ScanOpsError>;
