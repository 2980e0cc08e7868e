//! Reactor contract for the Pion reaction engine.
//!
//! A reactor is a configured event-processing node in the reaction
//! graph. This crate defines the contract reactors implement and the
//! seams they use to reach the rest of the platform; the engine that
//! routes events between them lives in `pion-engine`.
//!
//! # Reactor Types
//!
//! | Type | Role | `process` called externally |
//! |------|------|------------------------------|
//! | [`Collection`](ReactorType::Collection) | Produces events from external sources | No |
//! | [`Processing`](ReactorType::Processing) | Transforms and forwards | Yes |
//! | [`Storage`](ReactorType::Storage) | Consumes terminally | Yes |
//!
//! # Delivery
//!
//! Reactors never call each other directly. `process` returns the
//! events it produced; the engine's runner posts each one to the
//! reactor's configured downstream ids through the shared scheduler.
//! Collection reactors push spontaneous events the same way via
//! [`ReactorContext::deliver`]. Posting instead of recursing keeps
//! cycles in the reactor graph stack-safe.
//!
//! # Example
//!
//! ```
//! use pion_event::EventPtr;
//! use pion_reactor::{Reactor, ReactorConfig, ReactorContext, ReactorCore, ReactorError, ReactorType};
//! use pion_event::Vocabulary;
//! use std::sync::Arc;
//!
//! /// Forwards every event unchanged.
//! struct PassThrough {
//!     core: Arc<ReactorCore>,
//! }
//!
//! impl Reactor for PassThrough {
//!     fn core(&self) -> &ReactorCore {
//!         &self.core
//!     }
//!
//!     fn set_config(&mut self, _vocab: &Vocabulary, config: &ReactorConfig) -> Result<(), ReactorError> {
//!         self.core = Arc::new(ReactorCore::from_config(ReactorType::Processing, config));
//!         Ok(())
//!     }
//!
//!     fn start(&self, _ctx: &ReactorContext) -> Result<(), ReactorError> {
//!         self.core.set_running(true);
//!         Ok(())
//!     }
//!
//!     fn stop(&self) -> Result<(), ReactorError> {
//!         self.core.set_running(false);
//!         Ok(())
//!     }
//!
//!     fn process(&self, event: EventPtr) -> Result<Vec<EventPtr>, ReactorError> {
//!         Ok(vec![event])
//!     }
//! }
//! ```

mod config;
mod context;
mod core;
mod error;
mod reactor;

pub use config::ReactorConfig;
pub use context::{EngineHandle, EventSink, ReactorContext, TaskSpawner};
pub use core::ReactorCore;
pub use error::ReactorError;
pub use reactor::{Reactor, ReactorType};
