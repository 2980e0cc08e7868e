//! The shared codec factory.
//!
//! Owns one configured prototype per codec id. Consumers never share a
//! prototype: [`CodecFactory::get_codec`] hands out an independent
//! clone, so per-stream parser state stays private to each worker.
//!
//! The factory registers itself as a vocabulary observer; on every
//! vocabulary change it pushes the new snapshot into each prototype,
//! surfacing vanished terms as a rejected update.

use crate::error::EngineError;
use crate::plugin::{PluginInstance, PluginLoader, PluginRegistry};
use parking_lot::Mutex;
use pion_codec::{Codec, CodecConfig, CodecError, CodecProvider, JsonCodec, LogCodec, XmlCodec};
use pion_event::{Vocabulary, VocabularyManager, VocabularyObserver};
use pion_types::{ErrorCode, PluginId};
use std::sync::Arc;
use tracing::warn;

type CodecSlot = Mutex<PluginInstance<dyn Codec>>;

/// Factory and registry of configured codecs.
pub struct CodecFactory {
    vocab: Arc<VocabularyManager>,
    loader: PluginLoader<dyn Codec>,
    codecs: PluginRegistry<CodecSlot>,
}

impl CodecFactory {
    /// Creates a factory with the built-in codec types registered.
    #[must_use]
    pub fn new(vocab: Arc<VocabularyManager>) -> Self {
        let loader: PluginLoader<dyn Codec> = PluginLoader::new();
        loader.register_static("LogCodec", || Box::new(LogCodec::new()) as Box<dyn Codec>);
        loader.register_static("JSONCodec", || Box::new(JsonCodec::new()) as Box<dyn Codec>);
        loader.register_static("XMLCodec", || Box::new(XmlCodec::new()) as Box<dyn Codec>);
        Self {
            vocab,
            loader,
            codecs: PluginRegistry::new(),
        }
    }

    /// The underlying loader, for search paths and custom factories.
    #[must_use]
    pub fn loader(&self) -> &PluginLoader<dyn Codec> {
        &self.loader
    }

    /// Loads and configures a codec, returning its id.
    ///
    /// # Errors
    ///
    /// `PLUGIN_NOT_FOUND` for unknown plugin types, codec configuration
    /// errors, `REGISTRY_DUPLICATE_ID` for an id collision.
    pub fn add_codec(&self, config: CodecConfig) -> Result<PluginId, EngineError> {
        let mut instance = self.loader.create(&config.plugin)?;
        let id = config.id.clone().unwrap_or_else(PluginId::generate);
        let mut config = config;
        config.id = Some(id.clone());
        instance.set_config(&self.vocab.snapshot(), &config)?;
        self.codecs
            .add(Some(id.clone()), Arc::new(Mutex::new(instance)))?;
        Ok(id)
    }

    /// Reconfigures a codec in place.
    ///
    /// The prototype is locked for the swap and released before any
    /// further clone is handed out; clones already in circulation keep
    /// the old configuration.
    ///
    /// # Errors
    ///
    /// `CODEC_NOT_FOUND` and codec configuration errors.
    pub fn set_codec_config(&self, id: &PluginId, config: CodecConfig) -> Result<(), EngineError> {
        let slot = self
            .codecs
            .get(id)
            .ok_or_else(|| CodecError::NotFound(id.clone()))?;
        let mut config = config;
        config.id = Some(id.clone());
        slot.lock().set_config(&self.vocab.snapshot(), &config)?;
        Ok(())
    }

    /// Removes a codec configuration.
    ///
    /// Clones already handed out stay usable until dropped.
    ///
    /// # Errors
    ///
    /// `REGISTRY_NOT_FOUND` when the id is unknown.
    pub fn remove_codec(&self, id: &PluginId) -> Result<(), EngineError> {
        self.codecs.remove(id)?;
        Ok(())
    }

    /// Returns an independent clone of a configured codec.
    ///
    /// # Errors
    ///
    /// `CODEC_NOT_FOUND` when the id is unknown.
    pub fn get_codec(&self, id: &PluginId) -> Result<Box<dyn Codec>, CodecError> {
        let slot = self
            .codecs
            .get(id)
            .ok_or_else(|| CodecError::NotFound(id.clone()))?;
        let clone = slot.lock().clone_codec();
        Ok(clone)
    }

    /// Snapshot of the configured codec ids.
    #[must_use]
    pub fn ids(&self) -> Vec<PluginId> {
        self.codecs.ids()
    }

    /// Number of configured codecs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Returns whether no codecs are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }
}

impl CodecProvider for CodecFactory {
    fn codec(&self, id: &PluginId) -> Result<Box<dyn Codec>, CodecError> {
        self.get_codec(id)
    }
}

impl VocabularyObserver for CodecFactory {
    fn observer_key(&self) -> &str {
        "codec-factory"
    }

    fn vocabulary_updated(
        &self,
        vocab: &Arc<Vocabulary>,
    ) -> Result<(), pion_event::VocabError> {
        let mut first_failure: Option<(PluginId, CodecError)> = None;
        self.codecs.for_each(|id, slot| {
            if let Err(err) = slot.lock().update_vocabulary(vocab) {
                warn!(codec = %id, code = err.code(), error = %err, "codec rejected vocabulary update");
                first_failure.get_or_insert((id.clone(), err));
            }
        });
        match first_failure {
            None => Ok(()),
            Some((id, err)) => Err(pion_event::VocabError::ObserverRejected {
                observer: format!("codec:{id}"),
                reason: err.to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pion_codec::FieldConfig;
    use pion_event::TermType;
    use std::sync::Weak;

    fn vocab_manager() -> Arc<VocabularyManager> {
        let mgr = VocabularyManager::new();
        mgr.add_namespace("urn:vocab:test", false).unwrap();
        mgr.add_term("urn:vocab:test#http-request", TermType::Object)
            .unwrap();
        mgr.add_term("urn:vocab:test#bytes", TermType::UInt).unwrap();
        Arc::new(mgr)
    }

    fn config() -> CodecConfig {
        CodecConfig {
            name: "Test Codec".into(),
            event_type: "urn:vocab:test#http-request".into(),
            fields: vec![FieldConfig::new("urn:vocab:test#bytes", "bytes")],
            ..CodecConfig::for_plugin("LogCodec")
        }
    }

    #[test]
    fn add_and_clone_per_caller() {
        let factory = CodecFactory::new(vocab_manager());
        let id = factory.add_codec(config()).unwrap();

        let a = factory.get_codec(&id).unwrap();
        let b = factory.get_codec(&id).unwrap();
        assert_eq!(a.event_type(), b.event_type());
        assert_eq!(a.name(), "Test Codec");
        assert_eq!(a.id(), &id);
    }

    #[test]
    fn each_builtin_type_loads() {
        let factory = CodecFactory::new(vocab_manager());
        for plugin in ["LogCodec", "JSONCodec", "XMLCodec"] {
            let mut cfg = config();
            cfg.plugin = plugin.into();
            cfg.id = Some(PluginId::from(plugin));
            factory.add_codec(cfg).unwrap();
        }
        assert_eq!(factory.len(), 3);
    }

    #[test]
    fn unknown_plugin_rejected() {
        let factory = CodecFactory::new(vocab_manager());
        let mut cfg = config();
        cfg.plugin = "UnknownCodec".into();
        let err = factory.add_codec(cfg).unwrap_err();
        assert_eq!(err.code(), "PLUGIN_NOT_FOUND");
    }

    #[test]
    fn get_and_remove_unknown_id_rejected() {
        let factory = CodecFactory::new(vocab_manager());
        let ghost = PluginId::from("ghost");
        assert_eq!(
            factory.get_codec(&ghost).unwrap_err().code(),
            "CODEC_NOT_FOUND"
        );
        assert_eq!(
            factory.remove_codec(&ghost).unwrap_err().code(),
            "REGISTRY_NOT_FOUND"
        );
    }

    #[test]
    fn reconfigure_changes_future_clones() {
        let factory = CodecFactory::new(vocab_manager());
        let id = factory.add_codec(config()).unwrap();

        let mut cfg = config();
        cfg.name = "Renamed".into();
        factory.set_codec_config(&id, cfg).unwrap();

        assert_eq!(factory.get_codec(&id).unwrap().name(), "Renamed");
    }

    #[test]
    fn vocabulary_removal_propagates_to_codecs() {
        let vocab = vocab_manager();
        let factory = Arc::new(CodecFactory::new(vocab.clone()));
        vocab.register_observer(
            Arc::downgrade(&factory) as Weak<dyn VocabularyObserver>
        );
        factory.add_codec(config()).unwrap();

        // removal succeeds; the factory's rejection is logged, and the
        // prototype reports the vanished term on direct update too
        vocab.remove_term("urn:vocab:test#bytes").unwrap();

        let mut codec = factory.get_codec(&factory.ids()[0]).unwrap();
        let err = codec.update_vocabulary(&vocab.snapshot()).unwrap_err();
        assert_eq!(err.code(), "CODEC_TERM_NO_LONGER_DEFINED");
    }
}
