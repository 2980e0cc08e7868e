//! Codec layer for the Pion platform.
//!
//! A codec translates between a byte stream and [`Event`]s of one
//! specific event-type, driven by an ordered field map that binds wire
//! field names to vocabulary terms.
//!
//! # Contract
//!
//! Every codec implements [`Codec`]:
//!
//! | Method | Purpose |
//! |--------|---------|
//! | `read` | Consume one record, populate the event; `false` at end of stream |
//! | `write` | Serialize one record |
//! | `finish` | Emit any trailer (array bracket, document root) |
//! | `clone_codec` | Independent instance with identical config, fresh framing state |
//! | `update_vocabulary` | Refresh term references after a vocabulary change |
//!
//! The round-trip invariant holds for every built-in codec: writing an
//! event and reading it back yields an equal event, modulo terms not
//! declared in the field map.
//!
//! # Built-in codecs
//!
//! - [`LogCodec`]: line-oriented log records (Common/Combined/Extended
//!   log formats), `text/ascii`
//! - [`JsonCodec`]: one JSON object per event with array framing,
//!   `text/json`
//! - [`XmlCodec`]: one element per event with document framing,
//!   `text/xml`
//!
//! # Example
//!
//! ```
//! use pion_codec::{Codec, CodecConfig, FieldConfig, LogCodec};
//! use pion_event::{Event, TermType, Vocabulary};
//!
//! let mut vocab = Vocabulary::new();
//! vocab.add_namespace("urn:vocab:clickstream", false).unwrap();
//! let event_type = vocab
//!     .add_term("urn:vocab:clickstream#http-request", TermType::Object)
//!     .unwrap();
//! let bytes = vocab
//!     .add_term("urn:vocab:clickstream#bytes", TermType::UInt)
//!     .unwrap();
//!
//! let config = CodecConfig {
//!     name: "Test Codec".into(),
//!     event_type: "urn:vocab:clickstream#http-request".into(),
//!     fields: vec![FieldConfig::new("urn:vocab:clickstream#bytes", "bytes")],
//!     ..CodecConfig::for_plugin("LogCodec")
//! };
//!
//! let mut codec = LogCodec::new();
//! codec.set_config(&vocab, &config).unwrap();
//!
//! let mut event = Event::new(event_type);
//! event.set_uint(bytes, 42);
//!
//! let mut out = Vec::new();
//! codec.write(&mut out, &event).unwrap();
//! assert_eq!(out, b"42\n");
//!
//! let mut input: &[u8] = &out;
//! let mut back = Event::new(event_type);
//! assert!(codec.read(&mut input, &mut back).unwrap());
//! assert_eq!(back, event);
//! ```

mod codec;
mod config;
mod error;
mod json;
mod log;
mod xml;

pub use codec::{Codec, CodecProvider};
pub use config::{CodecConfig, FieldConfig};
pub use error::CodecError;
pub use json::JsonCodec;
pub use log::LogCodec;
pub use xml::XmlCodec;
