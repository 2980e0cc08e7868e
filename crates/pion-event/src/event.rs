//! Typed, insertion-ordered event records.

use crate::error::EventError;
use crate::term::{TermRef, TermType, UNDEFINED_TERM_REF};
use chrono::NaiveDateTime;
use std::sync::Arc;

/// Shared-ownership handle to an event.
///
/// Events are created per inbound record and may be retained by any
/// number of downstream reactors; the record is freed when the last
/// holder releases it.
pub type EventPtr = Arc<Event>;

/// A value stored in an event, tagged with its type.
#[derive(Debug, Clone, PartialEq)]
pub enum EventValue {
    /// Unsigned 64-bit integer.
    UInt(u64),
    /// Signed 64-bit integer.
    Int(i64),
    /// 32-bit floating point.
    Float(f32),
    /// 64-bit floating point.
    Double(f64),
    /// UTF-8 text.
    Str(String),
    /// Calendar date and time (no timezone).
    DateTime(NaiveDateTime),
}

impl EventValue {
    /// Returns the type tag of the stored value.
    #[must_use]
    pub fn term_type(&self) -> TermType {
        match self {
            Self::UInt(_) => TermType::UInt,
            Self::Int(_) => TermType::Int,
            Self::Float(_) => TermType::Float,
            Self::Double(_) => TermType::Double,
            Self::Str(_) => TermType::String,
            Self::DateTime(_) => TermType::DateTime,
        }
    }
}

/// A typed multimap from term reference to value.
///
/// Entries keep insertion order, and a term may appear more than once.
/// Equality is pairwise entry equality in order plus the event-type.
///
/// # Example
///
/// ```
/// use pion_event::{Event, EventValue};
///
/// let mut event = Event::new(9);
/// event.set_string(1, "10.0.19.111");
/// event.set_uint(2, 404);
///
/// assert_eq!(event.string(1).unwrap(), "10.0.19.111");
/// assert_eq!(event.uint(2).unwrap(), 404);
/// assert!(event.uint(1).is_err()); // wrong type
/// assert!(!event.is_defined(3));
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Event {
    event_type: TermRef,
    entries: Vec<(TermRef, EventValue)>,
}

impl Event {
    /// Creates an empty event of the given event-type.
    #[must_use]
    pub fn new(event_type: TermRef) -> Self {
        Self {
            event_type,
            entries: Vec::new(),
        }
    }

    /// Creates an empty event of the undefined event-type.
    #[must_use]
    pub fn undefined() -> Self {
        Self::new(UNDEFINED_TERM_REF)
    }

    /// Returns the event-type reference.
    #[must_use]
    pub fn event_type(&self) -> TermRef {
        self.event_type
    }

    /// Returns whether the event holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of entries (counting duplicates).
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Removes all entries, keeping the event-type.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Appends a value under a term. Duplicate terms are permitted.
    pub fn insert(&mut self, term: TermRef, value: EventValue) {
        self.entries.push((term, value));
    }

    /// Appends an unsigned integer value.
    pub fn set_uint(&mut self, term: TermRef, value: u64) {
        self.insert(term, EventValue::UInt(value));
    }

    /// Appends a signed integer value.
    pub fn set_int(&mut self, term: TermRef, value: i64) {
        self.insert(term, EventValue::Int(value));
    }

    /// Appends a 32-bit float value.
    pub fn set_float(&mut self, term: TermRef, value: f32) {
        self.insert(term, EventValue::Float(value));
    }

    /// Appends a 64-bit float value.
    pub fn set_double(&mut self, term: TermRef, value: f64) {
        self.insert(term, EventValue::Double(value));
    }

    /// Appends a string value.
    pub fn set_string(&mut self, term: TermRef, value: impl Into<String>) {
        self.insert(term, EventValue::Str(value.into()));
    }

    /// Appends a datetime value.
    pub fn set_datetime(&mut self, term: TermRef, value: NaiveDateTime) {
        self.insert(term, EventValue::DateTime(value));
    }

    /// Returns whether at least one value is stored under the term.
    #[must_use]
    pub fn is_defined(&self, term: TermRef) -> bool {
        self.entries.iter().any(|(t, _)| *t == term)
    }

    /// Returns the first value stored under the term.
    #[must_use]
    pub fn value(&self, term: TermRef) -> Option<&EventValue> {
        self.entries
            .iter()
            .find(|(t, _)| *t == term)
            .map(|(_, v)| v)
    }

    /// Iterates all values stored under the term, in insertion order.
    pub fn values(&self, term: TermRef) -> impl Iterator<Item = &EventValue> {
        self.entries
            .iter()
            .filter(move |(t, _)| *t == term)
            .map(|(_, v)| v)
    }

    /// Iterates all entries in insertion order.
    pub fn iter(&self) -> std::slice::Iter<'_, (TermRef, EventValue)> {
        self.entries.iter()
    }

    /// Returns the first unsigned integer stored under the term.
    ///
    /// # Errors
    ///
    /// `EVENT_UNDEFINED_TERM` when absent, `EVENT_TYPE_MISMATCH` when
    /// the stored tag differs.
    pub fn uint(&self, term: TermRef) -> Result<u64, EventError> {
        match self.require(term)? {
            EventValue::UInt(v) => Ok(*v),
            other => Err(self.mismatch(term, TermType::UInt, other)),
        }
    }

    /// Returns the first signed integer stored under the term.
    ///
    /// # Errors
    ///
    /// See [`uint`](Self::uint).
    pub fn int(&self, term: TermRef) -> Result<i64, EventError> {
        match self.require(term)? {
            EventValue::Int(v) => Ok(*v),
            other => Err(self.mismatch(term, TermType::Int, other)),
        }
    }

    /// Returns the first 32-bit float stored under the term.
    ///
    /// # Errors
    ///
    /// See [`uint`](Self::uint).
    pub fn float(&self, term: TermRef) -> Result<f32, EventError> {
        match self.require(term)? {
            EventValue::Float(v) => Ok(*v),
            other => Err(self.mismatch(term, TermType::Float, other)),
        }
    }

    /// Returns the first 64-bit float stored under the term.
    ///
    /// # Errors
    ///
    /// See [`uint`](Self::uint).
    pub fn double(&self, term: TermRef) -> Result<f64, EventError> {
        match self.require(term)? {
            EventValue::Double(v) => Ok(*v),
            other => Err(self.mismatch(term, TermType::Double, other)),
        }
    }

    /// Returns the first string stored under the term.
    ///
    /// # Errors
    ///
    /// See [`uint`](Self::uint).
    pub fn string(&self, term: TermRef) -> Result<&str, EventError> {
        match self.require(term)? {
            EventValue::Str(v) => Ok(v.as_str()),
            other => Err(self.mismatch(term, TermType::String, other)),
        }
    }

    /// Returns the first datetime stored under the term.
    ///
    /// # Errors
    ///
    /// See [`uint`](Self::uint).
    pub fn datetime(&self, term: TermRef) -> Result<NaiveDateTime, EventError> {
        match self.require(term)? {
            EventValue::DateTime(v) => Ok(*v),
            other => Err(self.mismatch(term, TermType::DateTime, other)),
        }
    }

    fn require(&self, term: TermRef) -> Result<&EventValue, EventError> {
        self.value(term).ok_or(EventError::UndefinedTerm(term))
    }

    fn mismatch(&self, term: TermRef, expected: TermType, actual: &EventValue) -> EventError {
        EventError::TypeMismatch {
            term,
            expected,
            actual: actual.term_type(),
        }
    }
}
