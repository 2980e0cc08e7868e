//! Codec layer errors.
//!
//! All errors implement [`ErrorCode`] for unified handling.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`CodecError::InvalidConfig`] | `CODEC_INVALID_CONFIG` | No |
//! | [`CodecError::UnknownEventType`] | `CODEC_UNKNOWN_EVENT_TYPE` | No |
//! | [`CodecError::NotAnObject`] | `CODEC_NOT_AN_OBJECT` | No |
//! | [`CodecError::UnknownTerm`] | `CODEC_UNKNOWN_TERM` | No |
//! | [`CodecError::WrongEventType`] | `CODEC_WRONG_EVENT_TYPE` | No |
//! | [`CodecError::TermNoLongerDefined`] | `CODEC_TERM_NO_LONGER_DEFINED` | No |
//! | [`CodecError::Malformed`] | `CODEC_MALFORMED` | No |
//! | [`CodecError::NotFound`] | `CODEC_NOT_FOUND` | No |
//! | [`CodecError::Io`] | `CODEC_IO` | Yes |

use pion_event::{EventError, TermRef, VocabError};
use pion_types::{ErrorCode, PluginId};
use thiserror::Error;

/// Codec layer error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// Configuration is structurally invalid (missing element, bad
    /// delimiter, field of a composite type).
    #[error("invalid codec configuration: {0}")]
    InvalidConfig(String),

    /// The configured event-type URN is not in the vocabulary.
    #[error("unknown event type: {0}")]
    UnknownEventType(String),

    /// The configured event-type term is not of type `object`.
    #[error("event type is not an object: {0}")]
    NotAnObject(String),

    /// A field references a URN that is not in the vocabulary.
    #[error("unknown term: {0}")]
    UnknownTerm(String),

    /// The event handed to `read` is not of this codec's event-type.
    #[error("wrong event type: expected ref {expected}, got ref {actual}")]
    WrongEventType {
        /// The codec's configured event-type reference.
        expected: TermRef,
        /// The event's actual event-type reference.
        actual: TermRef,
    },

    /// A term referenced by this codec was removed from the vocabulary.
    #[error("term is no longer defined: {urn}")]
    TermNoLongerDefined {
        /// URN of the vanished term.
        urn: String,
    },

    /// Input bytes could not be parsed as a record.
    #[error("malformed record: {0}")]
    Malformed(String),

    /// No codec registered under the id.
    #[error("codec not found: {0}")]
    NotFound(PluginId),

    /// Underlying stream failure.
    #[error("codec i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Event accessor failure while serializing.
    #[error(transparent)]
    Event(#[from] EventError),

    /// Vocabulary lookup failure during configuration.
    #[error(transparent)]
    Vocab(#[from] VocabError),
}

impl ErrorCode for CodecError {
    fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "CODEC_INVALID_CONFIG",
            Self::UnknownEventType(_) => "CODEC_UNKNOWN_EVENT_TYPE",
            Self::NotAnObject(_) => "CODEC_NOT_AN_OBJECT",
            Self::UnknownTerm(_) => "CODEC_UNKNOWN_TERM",
            Self::WrongEventType { .. } => "CODEC_WRONG_EVENT_TYPE",
            Self::TermNoLongerDefined { .. } => "CODEC_TERM_NO_LONGER_DEFINED",
            Self::Malformed(_) => "CODEC_MALFORMED",
            Self::NotFound(_) => "CODEC_NOT_FOUND",
            Self::Io(_) => "CODEC_IO",
            Self::Event(err) => err.code(),
            Self::Vocab(err) => err.code(),
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            Self::Io(_) => true,
            Self::Event(err) => err.is_recoverable(),
            Self::Vocab(err) => err.is_recoverable(),
            _ => false,
        }
    }
}
