//! Sled-backed profile store
//!
//! One sled database holds every store. Each store selector maps to its own
//! named tree (`profiles` for the default store, `profiles.<name>` otherwise),
//! so selecting a store never mixes authors across deployments.
//!
//! Records are keyed by the raw username bytes and stored as JSON.

use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{ProfileRepository, ProfileStore, RepositoryError, StoreSelector};
use crate::types::Profile;

/// Tree name for the default store
const DEFAULT_TREE: &str = "profiles";

/// Prefix for named store trees
const NAMED_TREE_PREFIX: &str = "profiles.";

/// Summary of a bulk profile import.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportStats {
    pub imported: usize,
    pub skipped: usize,
}

/// Handle to the on-disk profile database.
#[derive(Clone)]
pub struct SledProfileStore {
    db: Arc<sled::Db>,
}

impl SledProfileStore {
    /// Open or create the profile database at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, RepositoryError> {
        let path_ref = path.as_ref();
        let db = sled::open(path_ref)?;

        info!("Profile store opened at {:?}", path_ref);

        Ok(Self { db: Arc::new(db) })
    }

    /// Open a throwaway store that is removed when dropped.
    pub fn temporary() -> Result<Self, RepositoryError> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db: Arc::new(db) })
    }

    /// Open the concrete repository for `selector`.
    pub fn open_repository(
        &self,
        selector: &StoreSelector,
    ) -> Result<SledProfileRepository, RepositoryError> {
        let tree_name = tree_name(selector);
        let tree = self.db.open_tree(&tree_name)?;
        debug!(tree = %tree_name, store = %selector, "Opened profile tree");
        Ok(SledProfileRepository { tree })
    }
}

impl ProfileStore for SledProfileStore {
    fn repository(
        &self,
        selector: &StoreSelector,
    ) -> Result<Arc<dyn ProfileRepository>, RepositoryError> {
        Ok(Arc::new(self.open_repository(selector)?))
    }
}

fn tree_name(selector: &StoreSelector) -> String {
    match selector {
        StoreSelector::Default => DEFAULT_TREE.to_string(),
        StoreSelector::Named(name) => format!("{NAMED_TREE_PREFIX}{name}"),
    }
}

/// Profiles of a single store, backed by one sled tree.
#[derive(Clone)]
pub struct SledProfileRepository {
    tree: sled::Tree,
}

impl SledProfileRepository {
    /// Insert or replace a profile, keyed by its username.
    pub fn upsert(&self, profile: &Profile) -> Result<(), RepositoryError> {
        let value = serde_json::to_vec(profile).map_err(|e| RepositoryError::Corrupt {
            username: profile.username.clone(),
            reason: e.to_string(),
        })?;
        self.tree.insert(profile.username.as_bytes(), value)?;
        Ok(())
    }

    /// Load newline-delimited JSON profiles.
    ///
    /// Blank lines are ignored. Lines that do not parse as a profile are logged
    /// and counted as skipped; they do not abort the import.
    pub fn import_json_lines(&self, contents: &str) -> Result<ImportStats, RepositoryError> {
        let mut stats = ImportStats::default();

        for (idx, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match serde_json::from_str::<Profile>(line) {
                Ok(profile) => {
                    self.upsert(&profile)?;
                    stats.imported += 1;
                }
                Err(e) => {
                    warn!(line = idx + 1, error = %e, "Skipping malformed profile");
                    stats.skipped += 1;
                }
            }
        }

        self.tree.flush()?;
        Ok(stats)
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    fn lookup(tree: &sled::Tree, username: &str) -> Result<Option<Profile>, RepositoryError> {
        match tree.get(username.as_bytes())? {
            Some(value) => serde_json::from_slice::<Profile>(&value)
                .map(Some)
                .map_err(|e| RepositoryError::Corrupt {
                    username: username.to_string(),
                    reason: e.to_string(),
                }),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl ProfileRepository for SledProfileRepository {
    async fn get_by_username(&self, username: &str) -> Result<Option<Profile>, RepositoryError> {
        let tree = self.tree.clone();
        let username = username.to_string();

        tokio::task::spawn_blocking(move || Self::lookup(&tree, &username))
            .await
            .map_err(|e| {
                if e.is_cancelled() {
                    RepositoryError::Cancelled
                } else {
                    RepositoryError::Backend(format!("lookup task failed: {e}"))
                }
            })?
    }

    fn backend_name(&self) -> &'static str {
        "Sled"
    }
}
