//! Reactor layer errors.
//!
//! All errors implement [`ErrorCode`] for unified handling.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`ReactorError::InvalidConfig`] | `REACTOR_INVALID_CONFIG` | No |
//! | [`ReactorError::NotSupported`] | `REACTOR_NOT_SUPPORTED` | No |
//! | [`ReactorError::AlreadyRunning`] | `REACTOR_ALREADY_RUNNING` | No |
//! | [`ReactorError::NotRunning`] | `REACTOR_NOT_RUNNING` | No |
//! | [`ReactorError::Io`] | `REACTOR_IO` | Yes |
//! | [`ReactorError::Internal`] | `REACTOR_INTERNAL` | No |

use pion_codec::CodecError;
use pion_event::{EventError, VocabError};
use pion_types::ErrorCode;
use thiserror::Error;

/// Reactor layer error.
#[derive(Debug, Error)]
pub enum ReactorError {
    /// Plugin-specific configuration is invalid.
    #[error("invalid reactor configuration: {0}")]
    InvalidConfig(String),

    /// The operation is not supported by this reactor type, e.g.
    /// external `process` on a collection reactor.
    #[error("operation not supported: {0}")]
    NotSupported(String),

    /// `start` was called while the reactor was running.
    #[error("reactor is already running")]
    AlreadyRunning,

    /// The reactor must be running for this operation.
    #[error("reactor is not running")]
    NotRunning,

    /// Underlying stream or file failure.
    #[error("reactor i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Codec failure while reading or writing events.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Event accessor failure.
    #[error(transparent)]
    Event(#[from] EventError),

    /// Vocabulary lookup failure.
    #[error(transparent)]
    Vocab(#[from] VocabError),

    /// The plugin raised something unexpected.
    #[error("internal reactor error: {0}")]
    Internal(String),
}

impl ErrorCode for ReactorError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "REACTOR_INVALID_CONFIG",
            Self::NotSupported(_) => "REACTOR_NOT_SUPPORTED",
            Self::AlreadyRunning => "REACTOR_ALREADY_RUNNING",
            Self::NotRunning => "REACTOR_NOT_RUNNING",
            Self::Io(_) => "REACTOR_IO",
            Self::Codec(err) => err.code(),
            Self::Event(err) => err.code(),
            Self::Vocab(err) => err.code(),
            Self::Internal(_) => "REACTOR_INTERNAL",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Codec(err) => err.is_recoverable(),
            Self::Event(err) => err.is_recoverable(),
            Self::Vocab(err) => err.is_recoverable(),
            _ => false,
        }
    }
}
