//! Runtime layer errors.
//!
//! All errors implement [`ErrorCode`] for unified handling.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`SchedulerError::AlreadyRunning`] | `SCHEDULER_ALREADY_RUNNING` | No |
//! | [`SchedulerError::NotRunning`] | `SCHEDULER_NOT_RUNNING` | No |
//! | [`SchedulerError::Startup`] | `SCHEDULER_STARTUP` | Yes |
//! | [`PluginError::NotFound`] | `PLUGIN_NOT_FOUND` | No |
//! | [`PluginError::Library`] | `PLUGIN_LIBRARY` | No |
//! | [`PluginError::Symbol`] | `PLUGIN_SYMBOL` | No |
//! | [`RegistryError::DuplicateId`] | `REGISTRY_DUPLICATE_ID` | No |
//! | [`RegistryError::NotFound`] | `REGISTRY_NOT_FOUND` | No |
//! | [`EngineError::AlreadyRunning`] | `ENGINE_ALREADY_RUNNING` | No |
//! | [`EngineError::NotRunning`] | `ENGINE_NOT_RUNNING` | No |
//! | [`EngineError::ReactorNotFound`] | `ENGINE_REACTOR_NOT_FOUND` | No |

use pion_codec::CodecError;
use pion_event::VocabError;
use pion_reactor::ReactorError;
use pion_types::{ErrorCode, PluginId};
use thiserror::Error;

/// Scheduler lifecycle error.
#[derive(Debug, Clone, Error)]
pub enum SchedulerError {
    /// `startup` was called while the worker pool was running.
    #[error("scheduler is already running")]
    AlreadyRunning,

    /// The scheduler must be running for this operation.
    #[error("scheduler is not running")]
    NotRunning,

    /// The worker pool could not be built.
    #[error("scheduler startup failed: {0}")]
    Startup(String),
}

impl ErrorCode for SchedulerError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRunning => "SCHEDULER_ALREADY_RUNNING",
            Self::NotRunning => "SCHEDULER_NOT_RUNNING",
            Self::Startup(_) => "SCHEDULER_STARTUP",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::Startup(_))
    }
}

/// Plugin loading error.
#[derive(Debug, Clone, Error)]
pub enum PluginError {
    /// No static factory and no loadable library matched the type name.
    #[error("plugin not found: {plugin}")]
    NotFound {
        /// Requested plugin type name.
        plugin: String,
    },

    /// The shared library could not be opened, or its factory returned
    /// nothing.
    #[error("plugin library error for '{plugin}': {message}")]
    Library {
        /// Requested plugin type name.
        plugin: String,
        /// Loader-supplied description.
        message: String,
    },

    /// A required entry point is missing from the library.
    #[error("plugin symbol '{symbol}' not found: {message}")]
    Symbol {
        /// The unresolved symbol name.
        symbol: String,
        /// Loader-supplied description.
        message: String,
    },
}

impl ErrorCode for PluginError {
    fn code(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "PLUGIN_NOT_FOUND",
            Self::Library { .. } => "PLUGIN_LIBRARY",
            Self::Symbol { .. } => "PLUGIN_SYMBOL",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Plugin registry error.
#[derive(Debug, Clone, Error)]
pub enum RegistryError {
    /// A plugin is already registered under the id.
    #[error("plugin id already registered: {0}")]
    DuplicateId(PluginId),

    /// No plugin is registered under the id.
    #[error("plugin id not found: {0}")]
    NotFound(PluginId),
}

impl ErrorCode for RegistryError {
    fn code(&self) -> &'static str {
        match self {
            Self::DuplicateId(_) => "REGISTRY_DUPLICATE_ID",
            Self::NotFound(_) => "REGISTRY_NOT_FOUND",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

/// Reaction engine error.
#[derive(Debug, Error)]
pub enum EngineError {
    /// `start` was called while the engine was running.
    #[error("engine is already running")]
    AlreadyRunning,

    /// The engine must be running for this operation.
    #[error("engine is not running")]
    NotRunning,

    /// No reactor is registered under the id.
    #[error("no reactor found for identifier: {0}")]
    ReactorNotFound(PluginId),

    /// Scheduler failure.
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),

    /// Plugin loading failure.
    #[error(transparent)]
    Plugin(#[from] PluginError),

    /// Registry failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// Codec configuration or lookup failure.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// Reactor configuration or lifecycle failure.
    #[error(transparent)]
    Reactor(#[from] ReactorError),

    /// Vocabulary failure.
    #[error(transparent)]
    Vocab(#[from] VocabError),
}

impl ErrorCode for EngineError {
    fn code(&self) -> &'static str {
        match self {
            Self::AlreadyRunning => "ENGINE_ALREADY_RUNNING",
            Self::NotRunning => "ENGINE_NOT_RUNNING",
            Self::ReactorNotFound(_) => "ENGINE_REACTOR_NOT_FOUND",
            Self::Scheduler(err) => err.code(),
            Self::Plugin(err) => err.code(),
            Self::Registry(err) => err.code(),
            Self::Codec(err) => err.code(),
            Self::Reactor(err) => err.code(),
            Self::Vocab(err) => err.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Scheduler(err) => err.is_recoverable(),
            Self::Codec(err) => err.is_recoverable(),
            Self::Reactor(err) => err.is_recoverable(),
            Self::Vocab(err) => err.is_recoverable(),
            _ => false,
        }
    }
}
