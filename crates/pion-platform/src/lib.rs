//! Application layer: configuration model and platform assembly.
//!
//! A [`PlatformConfig`] describes one deployment: worker count,
//! vocabulary, codecs, reactors, and HTTP servers with their services.
//! [`Platform::build`] wires everything in dependency order:
//!
//! ```text
//! scheduler ──► vocabulary ──► codec factory ──► reaction engine ──► servers
//!                   │               ▲ observer        ▲ observer
//!                   └───────────────┴─────────────────┘
//! ```
//!
//! `start`/`stop` orchestrate the same order (servers last up, first
//! down); the platform owns the scheduler, so both are synchronous
//! entry points for a `main`.

mod config;
mod error;
mod platform;

pub use config::{
    NamespaceConfig, PlatformConfig, SchedulerConfig, ServerSection, ServiceConfig, TermConfig,
    VocabularyConfig,
};
pub use error::PlatformError;
pub use platform::Platform;
