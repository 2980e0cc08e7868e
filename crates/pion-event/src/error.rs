//! Vocabulary and event layer errors.
//!
//! All errors implement [`ErrorCode`] for unified handling.
//!
//! # Error Codes
//!
//! | Variant | Code | Recoverable |
//! |---------|------|-------------|
//! | [`VocabError::NamespaceNotFound`] | `VOCAB_NAMESPACE_NOT_FOUND` | No |
//! | [`VocabError::NamespaceLocked`] | `VOCAB_NAMESPACE_LOCKED` | Yes |
//! | [`VocabError::DuplicateNamespace`] | `VOCAB_DUPLICATE_NAMESPACE` | No |
//! | [`VocabError::DuplicateTerm`] | `VOCAB_DUPLICATE_TERM` | No |
//! | [`VocabError::TermNotFound`] | `VOCAB_TERM_NOT_FOUND` | No |
//! | [`VocabError::ObserverRejected`] | `VOCAB_OBSERVER_REJECTED` | No |
//! | [`EventError::UndefinedTerm`] | `EVENT_UNDEFINED_TERM` | No |
//! | [`EventError::TypeMismatch`] | `EVENT_TYPE_MISMATCH` | No |

use crate::term::{TermRef, TermType};
use pion_types::ErrorCode;
use thiserror::Error;

/// Vocabulary layer error.
#[derive(Debug, Clone, Error)]
pub enum VocabError {
    /// The term URN does not name a registered namespace.
    #[error("namespace not found: {0}")]
    NamespaceNotFound(String),

    /// The namespace is locked against mutation.
    ///
    /// **Recoverable** - unlock the namespace first.
    #[error("namespace is locked: {0}")]
    NamespaceLocked(String),

    /// A namespace with this name is already registered.
    #[error("namespace already registered: {0}")]
    DuplicateNamespace(String),

    /// A term with this URN is already registered.
    #[error("term already registered: {0}")]
    DuplicateTerm(String),

    /// No term with this URN or reference exists.
    #[error("term not found: {0}")]
    TermNotFound(String),

    /// An observer refused the new vocabulary snapshot.
    #[error("observer '{observer}' rejected vocabulary update: {reason}")]
    ObserverRejected {
        /// Key the observer registered under.
        observer: String,
        /// Observer-supplied failure description.
        reason: String,
    },
}

impl ErrorCode for VocabError {
    fn code(&self) -> &'static str {
        match self {
            Self::NamespaceNotFound(_) => "VOCAB_NAMESPACE_NOT_FOUND",
            Self::NamespaceLocked(_) => "VOCAB_NAMESPACE_LOCKED",
            Self::DuplicateNamespace(_) => "VOCAB_DUPLICATE_NAMESPACE",
            Self::DuplicateTerm(_) => "VOCAB_DUPLICATE_TERM",
            Self::TermNotFound(_) => "VOCAB_TERM_NOT_FOUND",
            Self::ObserverRejected { .. } => "VOCAB_OBSERVER_REJECTED",
        }
    }

    fn is_recoverable(&self) -> bool {
        matches!(self, Self::NamespaceLocked(_))
    }
}

/// Event layer error.
#[derive(Debug, Clone, Error)]
pub enum EventError {
    /// A typed getter was called for a term the event does not define.
    #[error("term reference {0} is not defined in this event")]
    UndefinedTerm(TermRef),

    /// The stored value tag does not match the requested type.
    #[error("term reference {term}: expected {expected}, found {actual}")]
    TypeMismatch {
        /// Term the getter asked for.
        term: TermRef,
        /// Type the getter expected.
        expected: TermType,
        /// Type actually stored.
        actual: TermType,
    },
}

impl ErrorCode for EventError {
    fn code(&self) -> &'static str {
        match self {
            Self::UndefinedTerm(_) => "EVENT_UNDEFINED_TERM",
            Self::TypeMismatch { .. } => "EVENT_TYPE_MISMATCH",
        }
    }

    fn is_recoverable(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pion_types::assert_error_codes;

    #[test]
    fn vocab_error_codes() {
        assert_error_codes(
            &[
                VocabError::NamespaceNotFound("x".into()),
                VocabError::NamespaceLocked("x".into()),
                VocabError::DuplicateNamespace("x".into()),
                VocabError::DuplicateTerm("x".into()),
                VocabError::TermNotFound("x".into()),
                VocabError::ObserverRejected {
                    observer: "codecs".into(),
                    reason: "term vanished".into(),
                },
            ],
            "VOCAB_",
        );
    }

    #[test]
    fn event_error_codes() {
        assert_error_codes(
            &[
                EventError::UndefinedTerm(3),
                EventError::TypeMismatch {
                    term: 3,
                    expected: TermType::UInt,
                    actual: TermType::String,
                },
            ],
            "EVENT_",
        );
    }

    #[test]
    fn locked_is_recoverable() {
        assert!(VocabError::NamespaceLocked("ns".into()).is_recoverable());
        assert!(!VocabError::TermNotFound("t".into()).is_recoverable());
    }
}
