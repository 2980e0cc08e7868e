//! Event system for the Pion platform.
//!
//! This crate provides the data model that flows through the reaction
//! engine: typed [`Term`]s collected into a lockable [`Vocabulary`],
//! and [`Event`] records that pair term references with typed values.
//!
//! # Data Model
//!
//! ```text
//! Vocabulary                          Event
//! ┌──────────────────────────┐        ┌───────────────────────────┐
//! │ ref  urn            type │        │ event_type: TermRef       │
//! │  1   ...#remotehost  str │◄───────│ (1, "10.0.19.111")        │
//! │  2   ...#status     uint │        │ (2, 404)                  │
//! │  3   ...#date   datetime │        │ (3, 2007-04-05T05:37:11)  │
//! │  ...                     │        │  ... insertion ordered    │
//! └──────────────────────────┘        └───────────────────────────┘
//! ```
//!
//! Terms are registered once and addressed afterwards by [`TermRef`],
//! a small stable integer. Events never store URNs; codecs translate
//! between wire field names and term references using their field maps.
//!
//! # Vocabulary Changes
//!
//! Mutations go through the [`VocabularyManager`], which maintains a
//! copy-on-write snapshot (`Arc<Vocabulary>`) and notifies registered
//! [`VocabularyObserver`]s with the new snapshot after every change.
//! Namespaces are locked by default in production configurations;
//! mutating a locked namespace is an error.
//!
//! # Example
//!
//! ```
//! use pion_event::{Event, TermType, Vocabulary};
//!
//! let mut vocab = Vocabulary::new();
//! vocab.add_namespace("urn:vocab:clickstream", false).unwrap();
//! let status = vocab
//!     .add_term("urn:vocab:clickstream#status", TermType::UInt)
//!     .unwrap();
//! let event_type = vocab
//!     .add_term("urn:vocab:clickstream#http-request", TermType::Object)
//!     .unwrap();
//!
//! let mut event = Event::new(event_type);
//! event.set_uint(status, 404);
//! assert_eq!(event.uint(status).unwrap(), 404);
//! ```

mod error;
mod event;
mod manager;
mod term;
mod vocabulary;

pub use error::{EventError, VocabError};
pub use event::{Event, EventPtr, EventValue};
pub use manager::{VocabularyManager, VocabularyObserver};
pub use term::{Term, TermRef, TermType, UNDEFINED_TERM_REF};
pub use vocabulary::Vocabulary;
