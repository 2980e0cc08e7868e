//! Identifier type for configured plugin instances.
//!
//! Every configured codec, reactor, and service carries a [`PluginId`].
//! Ids usually come from configuration; when a configuration omits one,
//! the owning registry generates a random UUID-backed id so the instance
//! stays addressable.

use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use uuid::Uuid;

/// Identifier for a configured plugin instance.
///
/// A `PluginId` is an opaque, stable string. Configurations typically
/// use human-readable names (`"common-log"`, `"click-filter"`) or the
/// UUIDs carried over from older deployments.
///
/// # Example
///
/// ```
/// use pion_types::PluginId;
///
/// let id = PluginId::from("common-log");
/// assert_eq!(id.as_str(), "common-log");
///
/// let generated = PluginId::generate();
/// assert!(!generated.as_str().is_empty());
/// assert_ne!(generated, PluginId::generate());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PluginId(String);

impl PluginId {
    /// Creates an id from an explicit string.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generates a fresh random id (UUID v4).
    ///
    /// Used by registries when a configuration does not supply an id.
    #[must_use]
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    /// Returns the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PluginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PluginId {
    fn from(id: &str) -> Self {
        Self(id.to_owned())
    }
}

impl From<String> for PluginId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl Borrow<str> for PluginId {
    fn borrow(&self) -> &str {
        &self.0
    }
}
