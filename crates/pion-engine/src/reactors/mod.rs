//! Built-in reactor types.
//!
//! One of each role ships with the engine:
//!
//! - [`LogInputReactor`] (collection): reads events out of a log file
//!   through a configured codec
//! - [`FilterReactor`] (processing): forwards events matching a rule
//!   set
//! - [`LogOutputReactor`] (storage): appends events to a log file
//!   through a configured codec
//!
//! Further reactor types load through the plugin ABI.

mod filter;
mod log_input;
mod log_output;

pub use filter::FilterReactor;
pub use log_input::LogInputReactor;
pub use log_output::LogOutputReactor;
