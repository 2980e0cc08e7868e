//! Platform assembly errors.

use pion_engine::{EngineError, SchedulerError};
use pion_event::VocabError;
use pion_server::ServerError;
use pion_types::ErrorCode;
use thiserror::Error;

/// Failure while loading configuration or assembling the platform.
#[derive(Debug, Error)]
pub enum PlatformError {
    /// Configuration file could not be read or parsed.
    #[error("configuration error: {0}")]
    Config(String),

    /// A server section references an unknown service plugin.
    #[error("unknown service plugin: {0}")]
    UnknownService(String),

    /// Engine assembly failure (codecs, reactors, plugin loading).
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// Scheduler lifecycle failure.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// Vocabulary population failure.
    #[error(transparent)]
    Vocab(#[from] VocabError),

    /// Server lifecycle failure.
    #[error(transparent)]
    Server(#[from] ServerError),
}

impl ErrorCode for PlatformError {
    fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "PLATFORM_CONFIG",
            Self::UnknownService(_) => "PLATFORM_UNKNOWN_SERVICE",
            Self::Engine(err) => err.code(),
            Self::Scheduler(err) => err.code(),
            Self::Vocab(err) => err.code(),
            Self::Server(err) => err.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Config(_) | Self::UnknownService(_) => false,
            Self::Engine(err) => err.is_recoverable(),
            Self::Scheduler(err) => err.is_recoverable(),
            Self::Vocab(err) => err.is_recoverable(),
            Self::Server(err) => err.is_recoverable(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pion_types::assert_error_code;

    #[test]
    fn platform_error_codes() {
        assert_error_code(&PlatformError::Config("x".into()), "PLATFORM_");
        assert_error_code(&PlatformError::UnknownService("x".into()), "PLATFORM_");
    }
}
