//! Core types shared by every Pion crate.
//!
//! This crate is the bottom of the dependency stack. It provides:
//!
//! - [`PluginId`]: the identifier for configured plugin instances
//!   (codecs, reactors, services)
//! - [`ErrorCode`]: the unified error interface implemented by all
//!   Pion error types
//!
//! # Crate Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Plugin SDK Layer                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  pion-types    : PluginId, ErrorCode  ◄── HERE              │
//! │  pion-event    : Term, Vocabulary, Event                    │
//! │  pion-codec    : Codec trait, built-in codecs               │
//! │  pion-reactor  : Reactor trait, statistics                  │
//! └─────────────────────────────────────────────────────────────┘
//!                               ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Runtime Layer                         │
//! │  pion-engine   : Scheduler, plugin loading, ReactionEngine  │
//! │  pion-server   : TCP/HTTP server, service dispatch          │
//! └─────────────────────────────────────────────────────────────┘
//! ```

mod error;
mod id;

pub use error::{assert_error_code, assert_error_codes, ErrorCode};
pub use id::PluginId;
