//! Seams reactors use to reach the rest of the platform.
//!
//! Reactors never hold the engine or the scheduler directly. They
//! receive a [`ReactorContext`] at start, built from three trait
//! objects:
//!
//! - [`EventSink`]: posts events to reactors by id (implemented by the
//!   reaction engine's route table)
//! - [`CodecProvider`](pion_codec::CodecProvider): hands out codec
//!   clones by id
//! - [`TaskSpawner`]: runs background work on the shared scheduler

use crate::core::ReactorCore;
use pion_codec::CodecProvider;
use pion_event::EventPtr;
use pion_types::PluginId;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// Posts events to reactors by id.
///
/// Delivery is at-most-once and non-blocking: an unknown or removed id
/// is a silent drop, racing with reactor removal is expected.
pub trait EventSink: Send + Sync {
    /// Enqueues the event for the reactor's `process`.
    fn send(&self, reactor_id: &PluginId, event: EventPtr);
}

/// Cheap-clone handle posting events into the reaction graph.
#[derive(Clone)]
pub struct EngineHandle {
    sink: Arc<dyn EventSink>,
}

impl EngineHandle {
    /// Wraps an event sink.
    #[must_use]
    pub fn new(sink: Arc<dyn EventSink>) -> Self {
        Self { sink }
    }

    /// Enqueues the event for the reactor's `process`.
    pub fn send(&self, reactor_id: &PluginId, event: EventPtr) {
        self.sink.send(reactor_id, event);
    }
}

/// Runs background work on the shared scheduler.
///
/// Handlers must not block a worker; file-reading collection reactors
/// use [`spawn_blocking_task`](Self::spawn_blocking_task) so their
/// synchronous I/O runs off the async workers.
pub trait TaskSpawner: Send + Sync {
    /// Spawns a future onto the worker pool.
    fn spawn_task(&self, task: Pin<Box<dyn Future<Output = ()> + Send>>);

    /// Spawns a synchronous closure onto the blocking pool.
    fn spawn_blocking_task(&self, task: Box<dyn FnOnce() + Send>);
}

/// Everything a reactor needs at start.
#[derive(Clone)]
pub struct ReactorContext {
    /// Delivery into the reaction graph.
    pub engine: EngineHandle,
    /// Codec clones by id.
    pub codecs: Arc<dyn CodecProvider>,
    /// Background work on the shared scheduler.
    pub spawner: Arc<dyn TaskSpawner>,
}

impl ReactorContext {
    /// Delivers a spontaneously produced event downstream.
    ///
    /// Counts the event once on the core and posts it to every
    /// configured connection; with no connections nothing is delivered
    /// and nothing is counted. Collection reactors call this from their
    /// source tasks; processing reactors return events from `process`
    /// instead and let the engine runner do the same bookkeeping.
    pub fn deliver(&self, core: &ReactorCore, event: EventPtr) {
        let connections = core.connections();
        if connections.is_empty() {
            return;
        }
        core.add_events_out(1);
        for downstream in connections {
            self.engine.send(&downstream, event.clone());
        }
    }
}
