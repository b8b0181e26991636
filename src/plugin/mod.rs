//! Geo-fixing plugin registry
//!
//! Each strategy is exposed through an [`OperatorFactory`] registered under a
//! stable name. The pipeline picks one by name when it is assembled and keeps
//! the built operator for the whole run; nothing is looked up per message.
//!
//! ## Plugins
//!
//! - **fromprofile**: coordinates from the author's stored profile

pub mod from_profile;

pub use from_profile::{FromProfilePlugin, FROM_PROFILE_PLUGIN};

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

use crate::geofix::MessageOperator;
use crate::storage::{ProfileStore, RepositoryError};

/// Builds operator instances from a plugin's TOML option table.
pub trait OperatorFactory: Send + Sync {
    /// Stable registration name
    fn name(&self) -> &'static str;

    fn build(&self, options: &toml::Value) -> Result<Arc<dyn MessageOperator>, PluginError>;
}

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("unknown plugin '{name}' (available: {available})")]
    UnknownPlugin { name: String, available: String },
    #[error("plugin '{0}' is already registered")]
    DuplicatePlugin(&'static str),
    #[error("invalid options for plugin '{plugin}': {reason}")]
    InvalidOptions { plugin: &'static str, reason: String },
    #[error("plugin '{plugin}' could not open its profile store: {source}")]
    Store {
        plugin: &'static str,
        #[source]
        source: RepositoryError,
    },
}

/// Name-to-factory mapping.
#[derive(Default)]
pub struct PluginRegistry {
    factories: BTreeMap<&'static str, Box<dyn OperatorFactory>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in plugin, reading profiles from `store`.
    pub fn with_defaults(store: Arc<dyn ProfileStore>) -> Self {
        let mut registry = Self::new();
        // Empty registry: cannot collide
        let _ = registry.register(FromProfilePlugin::new(store));
        registry
    }

    pub fn register(&mut self, factory: impl OperatorFactory + 'static) -> Result<(), PluginError> {
        let name = factory.name();
        if self.factories.contains_key(name) {
            return Err(PluginError::DuplicatePlugin(name));
        }
        self.factories.insert(name, Box::new(factory));
        Ok(())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered plugin names, sorted.
    pub fn names(&self) -> Vec<&'static str> {
        self.factories.keys().copied().collect()
    }

    /// Build the operator registered under `name`.
    pub fn build(
        &self,
        name: &str,
        options: &toml::Value,
    ) -> Result<Arc<dyn MessageOperator>, PluginError> {
        let factory = self
            .factories
            .get(name)
            .ok_or_else(|| PluginError::UnknownPlugin {
                name: name.to_string(),
                available: self.names().join(", "),
            })?;

        let operator = factory.build(options)?;
        info!(plugin = name, "Geo-fixing operator ready");
        Ok(operator)
    }
}
