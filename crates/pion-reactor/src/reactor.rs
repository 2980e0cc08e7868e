//! The reactor trait.

use crate::config::ReactorConfig;
use crate::context::ReactorContext;
use crate::core::ReactorCore;
use crate::error::ReactorError;
use pion_codec::CodecProvider;
use pion_event::{EventPtr, Vocabulary};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Classification of a reactor's role in the graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactorType {
    /// Produces events from external sources; never receives external
    /// `process` calls.
    Collection,
    /// Transforms and forwards events.
    Processing,
    /// Consumes events terminally.
    Storage,
}

impl fmt::Display for ReactorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Collection => "collection",
            Self::Processing => "processing",
            Self::Storage => "storage",
        };
        f.write_str(name)
    }
}

/// An event-processing node in the reaction graph.
///
/// # Lifecycle
///
/// ```text
/// loaded → set_config → start → process × N → stop → dropped
///                         │                     ▲
///                         └── update_vocabulary ┘  (any time while configured)
/// ```
///
/// # Threading
///
/// `process` takes `&self` and must be reentrant: the engine may run it
/// concurrently on any worker thread. Keep mutable state behind
/// interior mutability and the statistics on the [`ReactorCore`].
///
/// # Failure
///
/// A `process` error is caught at the engine boundary: it is logged
/// with the reactor id, recorded as the core's last error, the event is
/// dropped without redelivery, and the reactor keeps running.
pub trait Reactor: Send + Sync {
    /// The reactor's shared state (identity, connections, statistics).
    fn core(&self) -> &ReactorCore;

    /// Applies a configuration against a vocabulary snapshot.
    ///
    /// Called once before the reactor is registered; the engine
    /// resolves the configuration's id first.
    ///
    /// # Errors
    ///
    /// `REACTOR_INVALID_CONFIG` and vocabulary lookup failures.
    fn set_config(&mut self, vocab: &Vocabulary, config: &ReactorConfig)
        -> Result<(), ReactorError>;

    /// Transitions into the running state.
    ///
    /// Collection reactors typically spawn their source task here via
    /// the context's spawner.
    ///
    /// # Errors
    ///
    /// `REACTOR_ALREADY_RUNNING` and plugin-specific failures.
    fn start(&self, ctx: &ReactorContext) -> Result<(), ReactorError>;

    /// Transitions out of the running state.
    ///
    /// # Errors
    ///
    /// Plugin-specific failures; stopping a stopped reactor is a no-op.
    fn stop(&self) -> Result<(), ReactorError>;

    /// Processes one event and returns the events produced for
    /// downstream delivery.
    ///
    /// Storage reactors return an empty vector; a pass-through
    /// processing reactor returns the input event.
    ///
    /// # Errors
    ///
    /// Any; see the trait-level failure contract.
    fn process(&self, event: EventPtr) -> Result<Vec<EventPtr>, ReactorError>;

    /// Refreshes term references after a vocabulary change.
    ///
    /// # Errors
    ///
    /// `CODEC_TERM_NO_LONGER_DEFINED` style failures when a referenced
    /// term vanished.
    fn update_vocabulary(&self, _vocab: &Arc<Vocabulary>) -> Result<(), ReactorError> {
        Ok(())
    }

    /// Refreshes codec references after a codec configuration change.
    ///
    /// # Errors
    ///
    /// Plugin-specific failures.
    fn update_codecs(&self, _codecs: &dyn CodecProvider) -> Result<(), ReactorError> {
        Ok(())
    }
}
