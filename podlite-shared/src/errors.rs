//! Error taxonomy for podlite.
//!
//! Every fallible operation in the runtime returns [`PodliteResult`]. At the
//! gRPC boundary errors are converted into [`tonic::Status`] with a code that
//! reflects the error class.

use thiserror::Error;

/// Result alias used throughout podlite.
pub type PodliteResult<T> = Result<T, PodliteError>;

#[derive(Debug, Error)]
pub enum PodliteError {
    /// Lookup of a sandbox or container by id found no record.
    #[error("{0} does not exist")]
    NotFound(String),

    /// An external tool exited unsuccessfully (or could not be spawned).
    #[error("{tool} {} failed ({status}): {stderr}", .args.join(" "))]
    ExternalTool {
        tool: String,
        args: Vec<String>,
        status: String,
        stderr: String,
    },

    /// OCI bundle config could not be loaded, mutated or saved, or runtime
    /// output could not be parsed.
    #[error("config error: {0}")]
    Config(String),

    /// Identifier derivation received input it cannot handle.
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Filesystem failure under the image or runtime root.
    #[error("storage error: {0}")]
    Storage(String),

    /// An external tool did not finish within the configured timeout.
    #[error("timed out: {0}")]
    Timeout(String),

    /// A request or option is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl From<std::io::Error> for PodliteError {
    fn from(err: std::io::Error) -> Self {
        PodliteError::Storage(err.to_string())
    }
}

impl From<PodliteError> for tonic::Status {
    fn from(err: PodliteError) -> Self {
        let message = err.to_string();
        match err {
            PodliteError::NotFound(_) => tonic::Status::not_found(message),
            PodliteError::MalformedInput(_) | PodliteError::InvalidArgument(_) => {
                tonic::Status::invalid_argument(message)
            }
            PodliteError::Timeout(_) => tonic::Status::deadline_exceeded(message),
            PodliteError::Config(_) => tonic::Status::failed_precondition(message),
            PodliteError::ExternalTool { .. }
            | PodliteError::Storage(_)
            | PodliteError::Internal(_) => tonic::Status::internal(message),
        }
    }
}
