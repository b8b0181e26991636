//! Profile storage interfaces
//!
//! Geo-fixing only ever reads profiles. The traits here abstract the backing
//! store so different backends can be swapped without touching the operator:
//! - `InMemoryProfileStore`: HashMap-backed, for tests and minimal deployments
//! - `SledProfileStore`: embedded sled database, one tree per store selector

pub mod memory;
pub mod sled_store;

pub use memory::{InMemoryProfileRepository, InMemoryProfileStore};
pub use sled_store::{ImportStats, SledProfileRepository, SledProfileStore};

use async_trait::async_trait;
use std::sync::Arc;

use crate::types::Profile;

/// Keyed read access to author profiles.
///
/// Implementations must be thread-safe (Send + Sync): the pipeline runs many
/// lookups concurrently against one shared repository.
#[async_trait]
pub trait ProfileRepository: Send + Sync {
    /// Find the profile whose username matches `username` exactly.
    ///
    /// `Ok(None)` means no such profile. Every infrastructure problem
    /// (unreachable backend, corrupt record, timeout) is an `Err`.
    async fn get_by_username(&self, username: &str) -> Result<Option<Profile>, RepositoryError>;

    /// Backend name for logging
    fn backend_name(&self) -> &'static str;
}

#[async_trait]
impl<T: ProfileRepository + ?Sized> ProfileRepository for Arc<T> {
    async fn get_by_username(&self, username: &str) -> Result<Option<Profile>, RepositoryError> {
        (**self).get_by_username(username).await
    }

    fn backend_name(&self) -> &'static str {
        (**self).backend_name()
    }
}

/// Hands out the repository for a configured store selector.
///
/// Called once at pipeline assembly time, not per message.
pub trait ProfileStore: Send + Sync {
    fn repository(
        &self,
        selector: &StoreSelector,
    ) -> Result<Arc<dyn ProfileRepository>, RepositoryError>;
}

/// Which backing store to query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum StoreSelector {
    #[default]
    Default,
    Named(String),
}

impl StoreSelector {
    /// Build a selector from an optional configured name.
    ///
    /// A missing or blank name selects the default store.
    pub fn from_name(name: Option<&str>) -> Self {
        match name.map(str::trim) {
            Some(n) if !n.is_empty() => Self::Named(n.to_string()),
            _ => Self::Default,
        }
    }

    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Default => None,
            Self::Named(n) => Some(n),
        }
    }
}

impl std::fmt::Display for StoreSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Default => write!(f, "<default>"),
            Self::Named(n) => write!(f, "{n}"),
        }
    }
}

/// Profile lookup failures.
///
/// None of these mean "no profile": absence is `Ok(None)`.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("profile store unavailable: {0}")]
    Unavailable(String),
    #[error("profile store error: {0}")]
    Backend(String),
    #[error("corrupt profile record for '{username}': {reason}")]
    Corrupt { username: String, reason: String },
    #[error("profile lookup timed out")]
    Timeout,
    #[error("profile lookup cancelled")]
    Cancelled,
}

impl From<sled::Error> for RepositoryError {
    fn from(err: sled::Error) -> Self {
        match err {
            sled::Error::Io(e) => RepositoryError::Unavailable(e.to_string()),
            other => RepositoryError::Backend(other.to_string()),
        }
    }
}
