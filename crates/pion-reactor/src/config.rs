//! Reactor configuration model.

use pion_types::PluginId;
use serde::{Deserialize, Serialize};

/// Declarative configuration of one reactor instance.
///
/// Mirrors the platform's reactor configuration element: plugin type,
/// display name, comment, downstream connections, and a plugin-specific
/// options table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReactorConfig {
    /// Registry id; generated when omitted.
    #[serde(default)]
    pub id: Option<PluginId>,
    /// Plugin type name, e.g. `"FilterReactor"`.
    pub plugin: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Free-form description.
    #[serde(default)]
    pub comment: String,
    /// Ids of downstream reactors receiving this reactor's output.
    #[serde(default)]
    pub connections: Vec<PluginId>,
    /// Plugin-specific options, passed through verbatim.
    #[serde(default)]
    pub options: toml::Table,
}

impl ReactorConfig {
    /// Starts a configuration for a plugin type with empty defaults.
    #[must_use]
    pub fn for_plugin(plugin: impl Into<String>) -> Self {
        Self {
            id: None,
            plugin: plugin.into(),
            name: String::new(),
            comment: String::new(),
            connections: Vec::new(),
            options: toml::Table::new(),
        }
    }

    /// Sets the id.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<PluginId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Appends a downstream connection.
    #[must_use]
    pub fn connect_to(mut self, id: impl Into<PluginId>) -> Self {
        self.connections.push(id.into());
        self
    }

    /// Deserializes the options table into a plugin's option struct.
    ///
    /// # Errors
    ///
    /// `REACTOR_INVALID_CONFIG` describing the offending key.
    pub fn parse_options<T: serde::de::DeserializeOwned>(
        &self,
    ) -> Result<T, crate::ReactorError> {
        toml::Value::Table(self.options.clone())
            .try_into()
            .map_err(|err| crate::ReactorError::InvalidConfig(err.to_string()))
    }
}
