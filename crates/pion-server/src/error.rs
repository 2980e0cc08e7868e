//! Server and service errors.

use pion_codec::CodecError;
use pion_types::ErrorCode;
use thiserror::Error;

/// Server lifecycle and socket error.
#[derive(Debug, Error)]
pub enum ServerError {
    /// `start` was called while the server was listening.
    #[error("server is already running")]
    AlreadyRunning,

    /// The server must be listening for this operation.
    #[error("server is not running")]
    NotRunning,

    /// Socket setup or accept failure.
    #[error("server i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl ErrorCode for ServerError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRunning => "SERVER_ALREADY_RUNNING",
            Self::NotRunning => "SERVER_NOT_RUNNING",
            Self::Io(_) => "SERVER_IO",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// Failure raised by a service handler.
///
/// Caught at the dispatch boundary: logged with the request path and
/// converted to a 500 response.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The request cannot be served.
    #[error("service failure: {0}")]
    Internal(String),

    /// Codec failure while translating a request body.
    #[error(transparent)]
    Codec(#[from] CodecError),
}

impl ErrorCode for ServiceError {
    fn code(&self) -> &'static str {
        match self {
            Self::Internal(_) => "SERVICE_INTERNAL",
            Self::Codec(err) => err.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Internal(_) => false,
            Self::Codec(err) => err.is_recoverable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pion_types::assert_error_code;

    #[test]
    fn server_error_codes() {
        assert_error_code(&ServerError::AlreadyRunning, "SERVER_");
        assert_error_code(&ServerError::NotRunning, "SERVER_");
        assert_error_code(&ServerError::Io(std::io::Error::other("x")), "SERVER_");
    }

    #[test]
    fn service_error_codes() {
        assert_error_code(&ServiceError::Internal("x".into()), "SERVICE_");
    }
}
