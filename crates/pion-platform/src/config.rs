//! The deployment configuration model.
//!
//! One TOML document describes a whole platform:
//!
//! ```toml
//! [scheduler]
//! threads = 4
//!
//! [[vocabulary.namespaces]]
//! name = "urn:vocab:clickstream"
//! locked = true
//!
//! [[vocabulary.namespaces.terms]]
//! urn = "urn:vocab:clickstream#http-request"
//! type = "object"
//!
//! [[codecs]]
//! id = "common-log"
//! plugin = "LogCodec"
//! name = "Common Log Format"
//! event_type = "urn:vocab:clickstream#http-request"
//!
//! [[codecs.fields]]
//! term = "urn:vocab:clickstream#status"
//! name = "status"
//!
//! [[reactors]]
//! id = "only-404"
//! plugin = "FilterReactor"
//! connections = ["archive"]
//!
//! [[servers]]
//! port = 8080
//!
//! [[servers.services]]
//! path = "/"
//! plugin = "HelloService"
//! ```

use crate::error::PlatformError;
use pion_codec::CodecConfig;
use pion_event::TermType;
use pion_reactor::ReactorConfig;
use pion_server::ServerConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Root configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformConfig {
    /// Worker pool sizing.
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    /// Term catalog.
    #[serde(default)]
    pub vocabulary: VocabularyConfig,
    /// Codec configurations, applied in order.
    #[serde(default)]
    pub codecs: Vec<CodecConfig>,
    /// Reactor configurations, applied in order.
    #[serde(default)]
    pub reactors: Vec<ReactorConfig>,
    /// HTTP servers with their service bindings.
    #[serde(default)]
    pub servers: Vec<ServerSection>,
}

impl PlatformConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// `PLATFORM_CONFIG` with the parser's message.
    pub fn from_toml(text: &str) -> Result<Self, PlatformError> {
        toml::from_str(text).map_err(|err| PlatformError::Config(err.to_string()))
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// `PLATFORM_CONFIG` for read and parse failures.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PlatformError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|err| {
            PlatformError::Config(format!("cannot read {}: {err}", path.display()))
        })?;
        Self::from_toml(&text)
    }
}

/// Worker pool sizing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Worker threads; hardware concurrency when omitted.
    #[serde(default)]
    pub threads: Option<usize>,
}

/// Term catalog section.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VocabularyConfig {
    /// Namespaces with their terms.
    #[serde(default)]
    pub namespaces: Vec<NamespaceConfig>,
}

/// One vocabulary namespace.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Namespace URN prefix, e.g. `urn:vocab:clickstream`.
    pub name: String,
    /// Lock the namespace after loading its terms.
    #[serde(default)]
    pub locked: bool,
    /// Terms registered under this namespace.
    #[serde(default)]
    pub terms: Vec<TermConfig>,
}

/// One vocabulary term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TermConfig {
    /// Full term URN.
    pub urn: String,
    /// Value type tag.
    #[serde(rename = "type")]
    pub term_type: TermType,
    /// Human-readable description.
    #[serde(default)]
    pub comment: String,
    /// Format pattern (datetime terms).
    #[serde(default)]
    pub format: Option<String>,
}

/// One HTTP server with its service bindings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSection {
    /// Port and limits.
    #[serde(flatten)]
    pub server: ServerConfig,
    /// Services bound to path prefixes.
    #[serde(default)]
    pub services: Vec<ServiceConfig>,
}

/// One service binding.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Path prefix, e.g. `/` or `/ingest`.
    pub path: String,
    /// Service plugin type name.
    pub plugin: String,
    /// Plugin-specific options.
    #[serde(default)]
    pub options: toml::Table,
}
