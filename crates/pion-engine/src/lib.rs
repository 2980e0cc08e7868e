//! Runtime layer of the Pion platform.
//!
//! This crate hosts the pieces that make configured plugins run:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                   Runtime Layer (THIS CRATE)                │
//! ├─────────────────────────────────────────────────────────────┤
//! │  scheduler : shared worker pool (Scheduler, handle)         │
//! │  plugin    : loader (static + shared-library ABI), registry │
//! │  codecs    : CodecFactory, configured codec prototypes      │
//! │  engine    : ReactionEngine, per-reactor delivery queues    │
//! │  reactors  : built-in reactor types                         │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! One scheduler serves the process. The reaction engine routes events
//! between reactors exclusively by posting onto per-reactor queues, so
//! reactor graphs may contain cycles without recursing, and delivery
//! order from one producer to one reactor is preserved.

mod codecs;
mod engine;
mod error;
mod plugin;
mod reactors;
mod scheduler;

pub use codecs::CodecFactory;
pub use engine::ReactionEngine;
pub use error::{EngineError, PluginError, RegistryError, SchedulerError};
pub use plugin::{CreateFn, DestroyFn, PluginInstance, PluginLoader, PluginRegistry};
pub use reactors::{FilterReactor, LogInputReactor, LogOutputReactor};
pub use scheduler::{Scheduler, SchedulerHandle};
