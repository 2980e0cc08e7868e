//! Plugin loading and the keyed plugin registry.
//!
//! Plugins come from two sources:
//!
//! - **Static factories**, registered at assembly time for the built-in
//!   codecs, reactors, and services. No dynamic loading involved.
//! - **Shared libraries** on the configured search path, exposing the
//!   platform ABI: a `create_<Name>` constructor and a `destroy_<Name>`
//!   destructor with C linkage.
//!
//! Live plugins are held in a [`PluginRegistry`], a keyed container of
//! shared handles with uniform statistics aggregation.

mod loader;
mod registry;

pub use loader::{CreateFn, DestroyFn, PluginInstance, PluginLoader};
pub use registry::PluginRegistry;
