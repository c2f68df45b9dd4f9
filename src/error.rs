//! Standard error type for the runtime.
//!

use crate::functions::{ApiError, ApiWrapperError};
use crate::Status;


/// Runtime error result type.
pub type Result<T> = ::std::result::Result<T, Error>;

/// Result type used below the entry layer. The error is the raw OpenCL
/// status the entry point will eventually report.
pub type ClResult<T> = ::std::result::Result<T, Status>;


/// An enum one of several error types.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    // String: An arbitrary error:
    #[error("{0}")]
    String(String),
    // Api:
    #[error("{0}")]
    Api(ApiError),
    // ApiWrapper:
    #[error("{0}")]
    ApiWrapper(ApiWrapperError),
}

impl Error {
    /// Returns the error status code for `Status` variants.
    pub fn api_status(&self) -> Option<Status> {
        match *self {
            Error::Api(ref err) => Some(err.status()),
            _ => None,
        }
    }

    /// Returns the error kind of the contained status, if any.
    pub fn kind(&self) -> Option<ErrorKind> {
        self.api_status().map(|s| s.kind())
    }
}

impl From<String> for Error {
    fn from(desc: String) -> Self {
        Error::String(desc)
    }
}

impl From<ApiError> for Error {
    fn from(err: ApiError) -> Self {
        Error::Api(err)
    }
}

impl From<ApiWrapperError> for Error {
    fn from(err: ApiWrapperError) -> Self {
        Error::ApiWrapper(err)
    }
}


/// Coarse classification of a failure, independent of the numeric code.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A context, memory object, queue or event handle is not live.
    InvalidHandle,
    /// A flag combination, pointer or size argument is not acceptable.
    InvalidArgument,
    /// A region, offset or image dimension is out of bounds or misaligned.
    InvalidGeometry,
    /// The pixel format has no translation or no device accepts it.
    UnsupportedFormat,
    /// Native resource already wrapped, or copy regions overlap.
    ResourceConflict,
    /// Host or device memory could not be obtained.
    AllocationFailure,
    /// Host access flags forbid the operation, or the device cannot do it.
    OperationNotPermitted,
    /// Command or wait-list execution failure.
    ExecutionFailure,
}
