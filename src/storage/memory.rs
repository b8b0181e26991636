//! In-memory profile store for testing and minimal deployments
//!
//! Thread-safe via `RwLock`. Not durable: data lost on restart.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use super::{ProfileRepository, ProfileStore, RepositoryError, StoreSelector};
use crate::types::Profile;

/// Profiles keyed by username.
#[derive(Default)]
pub struct InMemoryProfileRepository {
    profiles: RwLock<HashMap<String, Profile>>,
}

impl InMemoryProfileRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_profiles(profiles: impl IntoIterator<Item = Profile>) -> Self {
        let repo = Self::new();
        for profile in profiles {
            // Fresh lock, cannot be poisoned
            let _ = repo.insert(profile);
        }
        repo
    }

    /// Insert or replace a profile, keyed by its username.
    pub fn insert(&self, profile: Profile) -> Result<(), RepositoryError> {
        let mut store = self
            .profiles
            .write()
            .map_err(|e| RepositoryError::Backend(e.to_string()))?;
        store.insert(profile.username.clone(), profile);
        Ok(())
    }

    pub fn len(&self) -> Result<usize, RepositoryError> {
        let store = self
            .profiles
            .read()
            .map_err(|e| RepositoryError::Backend(e.to_string()))?;
        Ok(store.len())
    }

    pub fn is_empty(&self) -> Result<bool, RepositoryError> {
        Ok(self.len()? == 0)
    }
}

#[async_trait]
impl ProfileRepository for InMemoryProfileRepository {
    async fn get_by_username(&self, username: &str) -> Result<Option<Profile>, RepositoryError> {
        let store = self
            .profiles
            .read()
            .map_err(|e| RepositoryError::Backend(e.to_string()))?;
        Ok(store.get(username).cloned())
    }

    fn backend_name(&self) -> &'static str {
        "InMemory"
    }
}

/// A set of in-memory repositories, one per store selector.
///
/// Selecting a store that was never populated yields an empty repository.
#[derive(Default)]
pub struct InMemoryProfileStore {
    stores: RwLock<HashMap<StoreSelector, Arc<InMemoryProfileRepository>>>,
}

impl InMemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (creating if needed) the repository behind `selector`.
    pub fn repository_for(
        &self,
        selector: &StoreSelector,
    ) -> Result<Arc<InMemoryProfileRepository>, RepositoryError> {
        let mut stores = self
            .stores
            .write()
            .map_err(|e| RepositoryError::Backend(e.to_string()))?;
        Ok(Arc::clone(stores.entry(selector.clone()).or_default()))
    }
}

impl ProfileStore for InMemoryProfileStore {
    fn repository(
        &self,
        selector: &StoreSelector,
    ) -> Result<Arc<dyn ProfileRepository>, RepositoryError> {
        let repo: Arc<dyn ProfileRepository> = self.repository_for(selector)?;
        Ok(repo)
    }
}
