//! The reaction engine: a graph of reactors routing events through the
//! shared scheduler.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                       ReactionEngine                         │
//! │                                                              │
//! │  registry: id → Arc<reactor>     routes: id → queue sender   │
//! │                                                              │
//! │   send(id, event) ──► route queue ──► runner task            │
//! │                                        │  reactor.process()  │
//! │                                        ▼                     │
//! │                            produced events ──► send(...)     │
//! │                            (one hop per queue, never         │
//! │                             recursion, cycles are safe)      │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each reactor gets one unbounded queue and one runner task on the
//! scheduler. Events posted by one producer to one reactor keep their
//! order because they traverse a single queue; across producers there
//! is no ordering.
//!
//! # Failure
//!
//! A reactor error during `process` is logged with the reactor id and
//! error code, recorded on the reactor, and the event is dropped. The
//! reactor keeps running; statistics are not incremented for the failed
//! event. `send` to an unknown or removed id is a silent drop.

use crate::codecs::CodecFactory;
use crate::error::EngineError;
use crate::plugin::{PluginInstance, PluginLoader, PluginRegistry};
use crate::reactors::{FilterReactor, LogInputReactor, LogOutputReactor};
use crate::scheduler::SchedulerHandle;
use parking_lot::{Mutex, RwLock};
use pion_event::{EventPtr, Vocabulary, VocabularyManager, VocabularyObserver};
use pion_reactor::{EngineHandle, EventSink, Reactor, ReactorConfig, ReactorContext};
use pion_types::{ErrorCode, PluginId};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type SharedReactor = Arc<PluginInstance<dyn Reactor>>;

/// Queue senders per reactor; the single delivery path.
struct RouteTable {
    routes: RwLock<HashMap<PluginId, mpsc::UnboundedSender<EventPtr>>>,
}

impl RouteTable {
    fn new() -> Self {
        Self {
            routes: RwLock::new(HashMap::new()),
        }
    }

    fn send(&self, reactor_id: &PluginId, event: EventPtr) {
        match self.routes.read().get(reactor_id) {
            Some(queue) => {
                // a closed queue means the runner is quitting; same drop
                let _ = queue.send(event);
            }
            None => debug!(reactor = %reactor_id, "event for unknown reactor dropped"),
        }
    }

    fn insert(&self, reactor_id: PluginId, queue: mpsc::UnboundedSender<EventPtr>) {
        self.routes.write().insert(reactor_id, queue);
    }

    fn remove(&self, reactor_id: &PluginId) {
        self.routes.write().remove(reactor_id);
    }

    fn clear(&self) {
        self.routes.write().clear();
    }
}

impl EventSink for RouteTable {
    fn send(&self, reactor_id: &PluginId, event: EventPtr) {
        RouteTable::send(self, reactor_id, event);
    }
}

/// Manages the registered reactors and routes events between them.
pub struct ReactionEngine {
    vocab: Arc<VocabularyManager>,
    codecs: Arc<CodecFactory>,
    scheduler: SchedulerHandle,
    loader: PluginLoader<dyn Reactor>,
    reactors: PluginRegistry<PluginInstance<dyn Reactor>>,
    routes: Arc<RouteTable>,
    running: AtomicBool,
    runners: Mutex<Vec<JoinHandle<()>>>,
}

impl ReactionEngine {
    /// Creates an engine with the built-in reactor types registered.
    #[must_use]
    pub fn new(
        vocab: Arc<VocabularyManager>,
        codecs: Arc<CodecFactory>,
        scheduler: SchedulerHandle,
    ) -> Self {
        let loader: PluginLoader<dyn Reactor> = PluginLoader::new();
        loader.register_static("FilterReactor", || {
            Box::new(FilterReactor::new()) as Box<dyn Reactor>
        });
        loader.register_static("LogInputReactor", || {
            Box::new(LogInputReactor::new()) as Box<dyn Reactor>
        });
        loader.register_static("LogOutputReactor", || {
            Box::new(LogOutputReactor::new()) as Box<dyn Reactor>
        });
        Self {
            vocab,
            codecs,
            scheduler,
            loader,
            reactors: PluginRegistry::new(),
            routes: Arc::new(RouteTable::new()),
            running: AtomicBool::new(false),
            runners: Mutex::new(Vec::new()),
        }
    }

    /// The underlying loader, for search paths and custom factories.
    #[must_use]
    pub fn loader(&self) -> &PluginLoader<dyn Reactor> {
        &self.loader
    }

    /// Whether event processing is started.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// A post-only handle for services injecting events.
    #[must_use]
    pub fn handle(&self) -> EngineHandle {
        EngineHandle::new(self.routes.clone() as Arc<dyn EventSink>)
    }

    fn context(&self) -> ReactorContext {
        ReactorContext {
            engine: self.handle(),
            codecs: self.codecs.clone(),
            spawner: Arc::new(self.scheduler.clone()),
        }
    }

    /// Loads and configures a reactor, returning its id.
    ///
    /// When the engine is running the reactor is started and wired
    /// immediately.
    ///
    /// # Errors
    ///
    /// `PLUGIN_NOT_FOUND`, reactor configuration errors, or
    /// `REGISTRY_DUPLICATE_ID`.
    pub fn add_reactor(&self, config: ReactorConfig) -> Result<PluginId, EngineError> {
        let mut instance = self.loader.create(&config.plugin)?;
        let id = config.id.clone().unwrap_or_else(PluginId::generate);
        let mut config = config;
        config.id = Some(id.clone());
        instance.set_config(&self.vocab.snapshot(), &config)?;

        let reactor: SharedReactor = Arc::new(instance);
        self.reactors.add(Some(id.clone()), reactor.clone())?;

        if self.is_running() {
            if let Err(err) = reactor.start(&self.context()) {
                let _ = self.reactors.remove(&id);
                return Err(err.into());
            }
            let (queue, receiver) = mpsc::unbounded_channel();
            self.routes.insert(id.clone(), queue);
            self.spawn_runner(id.clone(), reactor, receiver);
        }

        info!(reactor = %id, plugin = %config.plugin, "reactor added");
        Ok(id)
    }

    /// Removes a reactor.
    ///
    /// In-flight handles stay valid; the reactor is destroyed when the
    /// last holder releases. Events already queued for it are dropped.
    ///
    /// # Errors
    ///
    /// `REGISTRY_NOT_FOUND` when the id is unknown.
    pub fn remove_reactor(&self, id: &PluginId) -> Result<(), EngineError> {
        self.routes.remove(id);
        let reactor = self.reactors.remove(id)?;
        if reactor.core().is_running() {
            if let Err(err) = reactor.stop() {
                warn!(reactor = %id, error = %err, "reactor failed to stop on removal");
            }
        }
        info!(reactor = %id, "reactor removed");
        Ok(())
    }

    /// Replaces a reactor's configuration, restarting it if running.
    ///
    /// The old instance is unregistered before the replacement is
    /// configured, so no dispatch can reach a half-updated reactor.
    ///
    /// # Errors
    ///
    /// `ENGINE_REACTOR_NOT_FOUND` and the `add_reactor` errors.
    pub fn set_reactor_config(
        &self,
        id: &PluginId,
        config: ReactorConfig,
    ) -> Result<PluginId, EngineError> {
        if !self.reactors.contains(id) {
            return Err(EngineError::ReactorNotFound(id.clone()));
        }
        self.remove_reactor(id)?;
        let mut config = config;
        config.id = Some(id.clone());
        self.add_reactor(config)
    }

    /// Registered reactor ids.
    #[must_use]
    pub fn reactor_ids(&self) -> Vec<PluginId> {
        self.reactors.ids()
    }

    /// Returns whether a reactor id is registered.
    #[must_use]
    pub fn has_reactor(&self, id: &PluginId) -> bool {
        self.reactors.contains(id)
    }

    /// Schedules an event for a reactor's `process`.
    ///
    /// At-most-once: if the reactor was removed between post and
    /// execution the event is dropped silently.
    pub fn send(&self, reactor_id: &PluginId, event: EventPtr) {
        self.routes.send(reactor_id, event);
    }

    /// Starts all event processing.
    ///
    /// # Errors
    ///
    /// `ENGINE_ALREADY_RUNNING`, or the first reactor start failure
    /// (in which case the engine rolls back to stopped).
    pub fn start(&self) -> Result<(), EngineError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Err(EngineError::AlreadyRunning);
        }
        info!("reaction engine starting");

        // wire every queue before any reactor runs, so collection
        // sources can deliver downstream from the first record
        let mut pending = Vec::new();
        for id in self.reactors.ids() {
            if let Some(reactor) = self.reactors.get(&id) {
                let (queue, receiver) = mpsc::unbounded_channel();
                self.routes.insert(id.clone(), queue);
                pending.push((id, reactor, receiver));
            }
        }

        let ctx = self.context();
        let mut started: Vec<SharedReactor> = Vec::new();
        for (id, reactor, _) in &pending {
            if let Err(err) = reactor.start(&ctx) {
                warn!(reactor = %id, error = %err, "reactor failed to start; rolling back");
                for other in &started {
                    let _ = other.stop();
                }
                self.routes.clear();
                self.running.store(false, Ordering::SeqCst);
                return Err(err.into());
            }
            started.push(reactor.clone());
        }

        for (id, reactor, receiver) in pending {
            self.spawn_runner(id, reactor, receiver);
        }
        Ok(())
    }

    /// Stops all event processing.
    ///
    /// Quiesces by closing every delivery queue, draining the runner
    /// tasks, and stopping each reactor. After this returns no further
    /// `process` or delivery callbacks occur. Stopping a stopped engine
    /// is a no-op.
    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!("reaction engine stopping");

        self.routes.clear();
        self.reactors.for_each(|id, reactor| {
            if reactor.core().is_running() {
                if let Err(err) = reactor.stop() {
                    warn!(reactor = %id, error = %err, "reactor failed to stop");
                }
            }
        });

        let handles: Vec<JoinHandle<()>> = self.runners.lock().drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
    }

    /// Events received by a reactor.
    ///
    /// # Errors
    ///
    /// `ENGINE_REACTOR_NOT_FOUND`.
    pub fn events_in(&self, id: &PluginId) -> Result<u64, EngineError> {
        self.reactors
            .get(id)
            .map(|r| r.core().events_in())
            .ok_or_else(|| EngineError::ReactorNotFound(id.clone()))
    }

    /// Events delivered by a reactor.
    ///
    /// # Errors
    ///
    /// `ENGINE_REACTOR_NOT_FOUND`.
    pub fn events_out(&self, id: &PluginId) -> Result<u64, EngineError> {
        self.reactors
            .get(id)
            .map(|r| r.core().events_out())
            .ok_or_else(|| EngineError::ReactorNotFound(id.clone()))
    }

    /// Total events processed across all reactors.
    #[must_use]
    pub fn total_operations(&self) -> u64 {
        self.reactors.aggregate(|r| r.core().events_in())
    }

    /// Resets every reactor's statistics.
    pub fn clear_stats(&self) {
        self.reactors.for_each(|_, reactor| reactor.core().clear_stats());
    }

    /// Resets one reactor's statistics.
    ///
    /// # Errors
    ///
    /// `ENGINE_REACTOR_NOT_FOUND`.
    pub fn clear_reactor_stats(&self, id: &PluginId) -> Result<(), EngineError> {
        self.reactors
            .get(id)
            .map(|r| r.core().clear_stats())
            .ok_or_else(|| EngineError::ReactorNotFound(id.clone()))
    }

    /// Notifies every reactor that codec configurations changed.
    pub fn update_codecs(&self) {
        self.reactors.for_each(|id, reactor| {
            if let Err(err) = reactor.update_codecs(self.codecs.as_ref()) {
                reactor.core().record_error(err.to_string());
                warn!(reactor = %id, error = %err, "reactor failed to refresh codecs");
            }
        });
    }

    fn spawn_runner(
        &self,
        id: PluginId,
        reactor: SharedReactor,
        mut receiver: mpsc::UnboundedReceiver<EventPtr>,
    ) {
        let routes = Arc::clone(&self.routes);
        let handle = self.scheduler.spawn(async move {
            while let Some(event) = receiver.recv().await {
                match reactor.process(event) {
                    Ok(produced) => {
                        let core = reactor.core();
                        core.add_events_in(1);
                        let connections = core.connections();
                        if !connections.is_empty() {
                            core.add_events_out(produced.len() as u64);
                            for event in produced {
                                for downstream in &connections {
                                    routes.send(downstream, event.clone());
                                }
                            }
                        }
                    }
                    Err(err) => {
                        reactor.core().record_error(err.to_string());
                        warn!(
                            reactor = %id,
                            code = err.code(),
                            error = %err,
                            "reactor failed to process event; event dropped"
                        );
                    }
                }
            }
        });
        self.runners.lock().push(handle);
    }
}

impl VocabularyObserver for ReactionEngine {
    fn observer_key(&self) -> &str {
        "reaction-engine"
    }

    fn vocabulary_updated(
        &self,
        vocab: &Arc<Vocabulary>,
    ) -> Result<(), pion_event::VocabError> {
        let mut first_failure: Option<(PluginId, String)> = None;
        self.reactors.for_each(|id, reactor| {
            if let Err(err) = reactor.update_vocabulary(vocab) {
                reactor.core().record_error(err.to_string());
                warn!(reactor = %id, error = %err, "reactor rejected vocabulary update");
                first_failure.get_or_insert((id.clone(), err.to_string()));
            }
        });
        match first_failure {
            None => Ok(()),
            Some((id, reason)) => Err(pion_event::VocabError::ObserverRejected {
                observer: format!("reactor:{id}"),
                reason,
            }),
        }
    }
}
