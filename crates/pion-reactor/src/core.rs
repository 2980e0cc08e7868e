//! Shared reactor state: identity, connections, and statistics.

use crate::config::ReactorConfig;
use crate::reactor::ReactorType;
use parking_lot::{Mutex, RwLock};
use pion_types::PluginId;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// State every reactor carries: id, type, downstream connections,
/// running flag, and statistics.
///
/// Counters are independent atomics. A snapshot may observe
/// `events_in` and `events_out` mid-update relative to each other, but
/// never a torn value.
#[derive(Debug)]
pub struct ReactorCore {
    id: PluginId,
    name: String,
    comment: String,
    reactor_type: ReactorType,
    connections: RwLock<Vec<PluginId>>,
    running: AtomicBool,
    events_in: AtomicU64,
    events_out: AtomicU64,
    last_error: Mutex<Option<String>>,
}

impl ReactorCore {
    /// Creates a core from a configuration.
    ///
    /// The configuration's id must be resolved by the caller (the
    /// engine assigns one before configuring when it is omitted).
    #[must_use]
    pub fn from_config(reactor_type: ReactorType, config: &ReactorConfig) -> Self {
        Self {
            id: config.id.clone().unwrap_or_else(PluginId::generate),
            name: config.name.clone(),
            comment: config.comment.clone(),
            reactor_type,
            connections: RwLock::new(config.connections.clone()),
            running: AtomicBool::new(false),
            events_in: AtomicU64::new(0),
            events_out: AtomicU64::new(0),
            last_error: Mutex::new(None),
        }
    }

    /// Placeholder core for reactors that have not been configured yet.
    #[must_use]
    pub fn unconfigured(reactor_type: ReactorType) -> Self {
        Self::from_config(reactor_type, &ReactorConfig::for_plugin("").with_id(""))
    }

    /// Registry id.
    #[must_use]
    pub fn id(&self) -> &PluginId {
        &self.id
    }

    /// Display name from configuration.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form comment from configuration.
    #[must_use]
    pub fn comment(&self) -> &str {
        &self.comment
    }

    /// Collection, processing, or storage.
    #[must_use]
    pub fn reactor_type(&self) -> ReactorType {
        self.reactor_type
    }

    /// Snapshot of the downstream reactor ids.
    #[must_use]
    pub fn connections(&self) -> Vec<PluginId> {
        self.connections.read().clone()
    }

    /// Replaces the downstream reactor ids.
    pub fn set_connections(&self, connections: Vec<PluginId>) {
        *self.connections.write() = connections;
    }

    /// Whether the reactor is started.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Flips the running flag.
    pub fn set_running(&self, running: bool) {
        self.running.store(running, Ordering::SeqCst);
    }

    /// Events successfully processed.
    #[must_use]
    pub fn events_in(&self) -> u64 {
        self.events_in.load(Ordering::Relaxed)
    }

    /// Events produced for downstream delivery.
    #[must_use]
    pub fn events_out(&self) -> u64 {
        self.events_out.load(Ordering::Relaxed)
    }

    /// Adds to the processed-events counter.
    pub fn add_events_in(&self, n: u64) {
        self.events_in.fetch_add(n, Ordering::Relaxed);
    }

    /// Adds to the produced-events counter.
    pub fn add_events_out(&self, n: u64) {
        self.events_out.fetch_add(n, Ordering::Relaxed);
    }

    /// Last processing error, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.last_error.lock().clone()
    }

    /// Records a processing error.
    pub fn record_error(&self, message: impl Into<String>) {
        *self.last_error.lock() = Some(message.into());
    }

    /// Resets counters and the last error.
    pub fn clear_stats(&self) {
        self.events_in.store(0, Ordering::Relaxed);
        self.events_out.store(0, Ordering::Relaxed);
        *self.last_error.lock() = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn core() -> ReactorCore {
        let config = ReactorConfig::for_plugin("FilterReactor")
            .with_id("f1")
            .connect_to("sink");
        ReactorCore::from_config(ReactorType::Processing, &config)
    }

    #[test]
    fn carries_identity_and_connections() {
        let core = core();
        assert_eq!(core.id().as_str(), "f1");
        assert_eq!(core.reactor_type(), ReactorType::Processing);
        assert_eq!(core.connections().len(), 1);
    }

    #[test]
    fn missing_id_is_generated() {
        let config = ReactorConfig::for_plugin("FilterReactor");
        let core = ReactorCore::from_config(ReactorType::Processing, &config);
        assert!(!core.id().as_str().is_empty());
    }

    #[test]
    fn counters_accumulate_and_clear() {
        let core = core();
        core.add_events_in(2);
        core.add_events_out(1);
        core.record_error("boom");

        assert_eq!(core.events_in(), 2);
        assert_eq!(core.events_out(), 1);
        assert_eq!(core.last_error().as_deref(), Some("boom"));

        core.clear_stats();
        assert_eq!(core.events_in(), 0);
        assert_eq!(core.events_out(), 0);
        assert!(core.last_error().is_none());
    }

    #[test]
    fn running_flag_round_trips() {
        let core = core();
        assert!(!core.is_running());
        core.set_running(true);
        assert!(core.is_running());
    }
}
