//! Assembly and lifecycle of a configured deployment.

use crate::config::{PlatformConfig, ServiceConfig};
use crate::error::PlatformError;
use pion_codec::CodecProvider;
use pion_engine::{CodecFactory, ReactionEngine, Scheduler};
use pion_event::{VocabularyManager, VocabularyObserver};
use pion_server::{HelloService, HttpServer, HttpService, IngestService};
use pion_types::PluginId;
use serde::Deserialize;
use std::sync::{Arc, Weak};
use tracing::info;

#[derive(Debug, Deserialize)]
struct IngestOptions {
    codec: PluginId,
    reactor: PluginId,
}

/// A fully wired deployment: scheduler, vocabulary, codecs, engine,
/// and servers.
///
/// The platform owns the scheduler, so `start`, `stop`, and
/// [`wait_for_interrupt`](Self::wait_for_interrupt) are synchronous and
/// intended to be called from `main`, outside any runtime.
pub struct Platform {
    scheduler: Arc<Scheduler>,
    vocab: Arc<VocabularyManager>,
    codecs: Arc<CodecFactory>,
    engine: Arc<ReactionEngine>,
    servers: Vec<Arc<HttpServer>>,
}

impl std::fmt::Debug for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Platform").finish_non_exhaustive()
    }
}

impl Platform {
    /// Assembles a platform from a configuration.
    ///
    /// The scheduler is started here; everything else is wired but not
    /// yet processing until [`start`](Self::start).
    ///
    /// # Errors
    ///
    /// Any configuration-time failure: vocabulary population, codec or
    /// reactor configuration, unknown service plugins.
    pub fn build(config: PlatformConfig) -> Result<Self, PlatformError> {
        let scheduler = Arc::new(match config.scheduler.threads {
            Some(threads) => Scheduler::with_threads(threads),
            None => Scheduler::new(),
        });
        scheduler.startup()?;

        let vocab = Arc::new(VocabularyManager::new());
        for ns in &config.vocabulary.namespaces {
            vocab.add_namespace(&ns.name, false)?;
            for term in &ns.terms {
                vocab.mutate(|v| {
                    v.add_term_full(
                        &term.urn,
                        term.term_type,
                        term.comment.clone(),
                        term.format.clone(),
                    )
                })?;
            }
        }
        for ns in &config.vocabulary.namespaces {
            if ns.locked {
                vocab.set_locked(&ns.name, true)?;
            }
        }

        let codecs = Arc::new(CodecFactory::new(vocab.clone()));
        vocab.register_observer(Arc::downgrade(&codecs) as Weak<dyn VocabularyObserver>);
        for codec in config.codecs {
            codecs.add_codec(codec)?;
        }

        let engine = Arc::new(ReactionEngine::new(
            vocab.clone(),
            codecs.clone(),
            scheduler.handle()?,
        ));
        vocab.register_observer(Arc::downgrade(&engine) as Weak<dyn VocabularyObserver>);
        for reactor in config.reactors {
            engine.add_reactor(reactor)?;
        }

        let mut servers = Vec::new();
        for section in config.servers {
            let server = HttpServer::new(section.server);
            for binding in &section.services {
                let service = build_service(binding, &codecs, &engine)?;
                server.add_service(binding.path.clone(), service);
            }
            servers.push(Arc::new(server));
        }

        info!(
            codecs = codecs.len(),
            reactors = engine.reactor_ids().len(),
            servers = servers.len(),
            "platform assembled"
        );
        Ok(Self {
            scheduler,
            vocab,
            codecs,
            engine,
            servers,
        })
    }

    /// Starts event processing, then the servers.
    ///
    /// # Errors
    ///
    /// The first engine or server start failure.
    pub fn start(&self) -> Result<(), PlatformError> {
        self.engine.start()?;
        let handle = self.scheduler.handle()?;
        for server in &self.servers {
            server.start(&handle)?;
        }
        Ok(())
    }

    /// Stops servers, then the engine, then the worker pool.
    ///
    /// Idempotent; safe to call on a partially started platform.
    pub fn stop(&self) {
        if self.scheduler.is_running() {
            for server in &self.servers {
                let server = server.clone();
                let _ = self.scheduler.block_on(async move { server.stop().await });
            }
            let engine = self.engine.clone();
            let _ = self.scheduler.block_on(async move { engine.stop().await });
        }
        self.scheduler.shutdown();
    }

    /// Blocks the calling thread until ctrl-c.
    ///
    /// # Errors
    ///
    /// `SCHEDULER_NOT_RUNNING` when called on a stopped platform.
    pub fn wait_for_interrupt(&self) -> Result<(), PlatformError> {
        self.scheduler.block_on(async {
            let _ = tokio::signal::ctrl_c().await;
        })?;
        Ok(())
    }

    /// The shared scheduler.
    #[must_use]
    pub fn scheduler(&self) -> &Arc<Scheduler> {
        &self.scheduler
    }

    /// The vocabulary manager.
    #[must_use]
    pub fn vocabulary(&self) -> &Arc<VocabularyManager> {
        &self.vocab
    }

    /// The codec factory.
    #[must_use]
    pub fn codecs(&self) -> &Arc<CodecFactory> {
        &self.codecs
    }

    /// The reaction engine.
    #[must_use]
    pub fn engine(&self) -> &Arc<ReactionEngine> {
        &self.engine
    }

    /// The configured servers.
    #[must_use]
    pub fn servers(&self) -> &[Arc<HttpServer>] {
        &self.servers
    }
}

fn build_service(
    binding: &ServiceConfig,
    codecs: &Arc<CodecFactory>,
    engine: &Arc<ReactionEngine>,
) -> Result<Arc<dyn HttpService>, PlatformError> {
    match binding.plugin.as_str() {
        "HelloService" => Ok(Arc::new(HelloService)),
        "IngestService" => {
            let options: IngestOptions = toml::Value::Table(binding.options.clone())
                .try_into()
                .map_err(|err| {
                    PlatformError::Config(format!(
                        "service '{}' options: {err}",
                        binding.plugin
                    ))
                })?;
            Ok(Arc::new(IngestService::new(
                codecs.clone() as Arc<dyn CodecProvider>,
                engine.handle(),
                options.codec,
                options.reactor,
            )))
        }
        other => Err(PlatformError::UnknownService(other.to_owned())),
    }
}
