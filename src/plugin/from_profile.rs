//! `fromprofile` plugin: geo-fix messages from the author's profile

use std::sync::Arc;
use tracing::info;

use super::{OperatorFactory, PluginError};
use crate::config::FromProfileOptions;
use crate::geofix::{GeoFixOperator, MessageOperator, ProfileCoordinateResolver};
use crate::storage::ProfileStore;

/// Registration name of the profile-based strategy.
pub const FROM_PROFILE_PLUGIN: &str = "fromprofile";

/// Builds a [`GeoFixOperator`] over the profile repository of the
/// configured store.
pub struct FromProfilePlugin {
    store: Arc<dyn ProfileStore>,
}

impl FromProfilePlugin {
    pub fn new(store: Arc<dyn ProfileStore>) -> Self {
        Self { store }
    }

    /// Typed counterpart of [`OperatorFactory::build`].
    pub fn build_with(&self, options: &FromProfileOptions) -> Result<Arc<dyn MessageOperator>, PluginError> {
        let problems = options.problems();
        if !problems.is_empty() {
            return Err(PluginError::InvalidOptions {
                plugin: FROM_PROFILE_PLUGIN,
                reason: problems.join("; "),
            });
        }

        let selector = options.store_selector();
        let repository = self
            .store
            .repository(&selector)
            .map_err(|source| PluginError::Store {
                plugin: FROM_PROFILE_PLUGIN,
                source,
            })?;

        info!(
            store = %selector,
            backend = repository.backend_name(),
            "Profile geo-fixer using profile store"
        );

        Ok(Arc::new(GeoFixOperator::new(
            FROM_PROFILE_PLUGIN,
            ProfileCoordinateResolver::new(repository),
        )))
    }
}

impl OperatorFactory for FromProfilePlugin {
    fn name(&self) -> &'static str {
        FROM_PROFILE_PLUGIN
    }

    fn build(&self, options: &toml::Value) -> Result<Arc<dyn MessageOperator>, PluginError> {
        let options = FromProfileOptions::from_toml(options).map_err(|e| PluginError::InvalidOptions {
            plugin: FROM_PROFILE_PLUGIN,
            reason: e.to_string(),
        })?;
        self.build_with(&options)
    }
}
