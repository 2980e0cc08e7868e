//! Typed terms, the atoms of the vocabulary.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable reference to a term within a [`Vocabulary`](crate::Vocabulary).
///
/// References are assigned in registration order and never reused.
/// They stay valid across vocabulary updates until the owning namespace
/// is unlocked and the term is removed.
pub type TermRef = u32;

/// Reserved reference meaning "no term".
///
/// Events created before their type is known carry this as their
/// event-type; codecs treat reads into such events specially.
pub const UNDEFINED_TERM_REF: TermRef = 0;

/// The value type tag carried by a term.
///
/// Every value stored in an [`Event`](crate::Event) must match the tag
/// of the term it is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TermType {
    /// No value; placeholder for undefined terms.
    Null,
    /// UTF-8 text.
    String,
    /// Unsigned 64-bit integer.
    UInt,
    /// Signed 64-bit integer.
    Int,
    /// 32-bit floating point.
    Float,
    /// 64-bit floating point.
    Double,
    /// Calendar date and time of day (no timezone).
    DateTime,
    /// Composite marker; the type tag of event-type terms.
    Object,
}

impl TermType {
    /// Returns the configuration-file spelling of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::String => "string",
            Self::UInt => "uint",
            Self::Int => "int",
            Self::Float => "float",
            Self::Double => "double",
            Self::DateTime => "datetime",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for TermType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A registered vocabulary term.
///
/// Terms are identified by URN (`urn:vocab:<namespace>#<name>`) and
/// addressed at runtime by their [`TermRef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Term {
    /// Stable reference assigned at registration.
    pub term_ref: TermRef,
    /// Full URN, unique within the vocabulary.
    pub urn: String,
    /// Value type tag.
    pub term_type: TermType,
    /// Human-readable description.
    #[serde(default)]
    pub comment: String,
    /// Optional format pattern (datetime terms).
    #[serde(default)]
    pub format: Option<String>,
}

impl Term {
    /// Returns the namespace portion of the URN (everything before `#`).
    #[must_use]
    pub fn namespace(&self) -> &str {
        namespace_of(&self.urn)
    }

    /// Returns the local name portion of the URN (everything after `#`).
    #[must_use]
    pub fn local_name(&self) -> &str {
        self.urn
            .split_once('#')
            .map_or(self.urn.as_str(), |(_, name)| name)
    }
}

/// Extracts the namespace portion of a term URN.
pub(crate) fn namespace_of(urn: &str) -> &str {
    urn.split_once('#').map_or(urn, |(ns, _)| ns)
}
