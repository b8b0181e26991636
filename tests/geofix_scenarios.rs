//! Geo-fixing Scenario Tests
//!
//! Exercises the `fromprofile` operator end to end through the public API:
//! profile store → plugin registry → operator → messages.
//!
//! Covers the author scenarios (alice/bob/carol/dave/erin) and the
//! pass-through guarantees of the operator.

use async_trait::async_trait;
use geofix::config::FromProfileOptions;
use geofix::geofix::{GeoFixError, GeoFixOperator, ProfileCoordinateResolver};
use geofix::plugin::{FromProfilePlugin, PluginRegistry};
use geofix::storage::{
    InMemoryProfileRepository, InMemoryProfileStore, ProfileRepository, RepositoryError,
    StoreSelector,
};
use geofix::types::{Coordinates, Message, Profile};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Profiles used by every scenario.
fn profiles() -> Vec<Profile> {
    vec![
        Profile::new("alice").with_position(Some(40.7), Some(-74.0)),
        Profile::new("carol").with_position(Some(10.0), None),
        Profile::new("dave").with_position(Some(50.0), Some(8.0)),
    ]
}

/// Repository that reports a connectivity failure for "erin" and counts lookups.
struct FlakyRepository {
    inner: InMemoryProfileRepository,
    lookups: AtomicUsize,
}

impl FlakyRepository {
    fn new() -> Self {
        Self {
            inner: InMemoryProfileRepository::with_profiles(profiles()),
            lookups: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl ProfileRepository for FlakyRepository {
    async fn get_by_username(&self, username: &str) -> Result<Option<Profile>, RepositoryError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if username == "erin" {
            return Err(RepositoryError::Unavailable("connection refused".to_string()));
        }
        self.inner.get_by_username(username).await
    }

    fn backend_name(&self) -> &'static str {
        "Flaky"
    }
}

fn operator() -> (
    GeoFixOperator<ProfileCoordinateResolver<Arc<FlakyRepository>>>,
    Arc<FlakyRepository>,
) {
    let repo = Arc::new(FlakyRepository::new());
    let op = GeoFixOperator::new("fromprofile", ProfileCoordinateResolver::new(Arc::clone(&repo)));
    (op, repo)
}

#[tokio::test]
async fn alice_gets_profile_coordinates() {
    let (op, _) = operator();
    let message = Message::from_author("alice").with_id("m1").with_text("hello from nyc");

    let fixed = op.apply(message.clone()).await.unwrap();

    assert_eq!(fixed.coordinates(), Some(Coordinates::new(40.7, -74.0)));
    // Everything else untouched
    let mut expected = message;
    expected.set_coordinates(Coordinates::new(40.7, -74.0));
    assert_eq!(fixed, expected);
}

#[tokio::test]
async fn bob_without_profile_passes_through() {
    let (op, _) = operator();
    let message = Message::from_author("bob");

    assert_eq!(op.apply(message.clone()).await.unwrap(), message);
}

#[tokio::test]
async fn carol_with_latitude_only_passes_through() {
    let (op, _) = operator();
    let message = Message::from_author("carol");

    let out = op.apply(message.clone()).await.unwrap();

    assert_eq!(out, message);
    assert!(out.coordinates().is_none());
}

#[tokio::test]
async fn dave_keeps_existing_coordinates_without_lookup() {
    let (op, repo) = operator();
    let message = Message::from_author("dave").with_coordinates(Coordinates::new(1.0, 2.0));

    let out = op.apply(message.clone()).await.unwrap();

    assert_eq!(out, message);
    assert_eq!(repo.lookups.load(Ordering::SeqCst), 0, "resolver must not be consulted");
}

#[tokio::test]
async fn erin_lookup_failure_is_surfaced() {
    let (op, _) = operator();

    let err = op.apply(Message::from_author("erin")).await.unwrap_err();

    match err {
        GeoFixError::LookupFailure { author, source } => {
            assert_eq!(author, "erin");
            assert!(matches!(source, RepositoryError::Unavailable(_)));
        }
    }
}

#[tokio::test]
async fn missing_author_passes_through_without_lookup() {
    let (op, repo) = operator();
    let mut message = Message::from_author("   ");

    assert_eq!(op.apply(message.clone()).await.unwrap(), message);
    message.from_user = None;
    assert_eq!(op.apply(message.clone()).await.unwrap(), message);

    assert_eq!(repo.lookups.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn padded_author_is_not_matched_to_trimmed_username() {
    let (op, repo) = operator();
    let message = Message::from_author(" alice ");

    assert_eq!(op.apply(message.clone()).await.unwrap(), message);
    assert_eq!(repo.lookups.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn concurrent_applications_are_independent() {
    let (op, _) = operator();
    let op = Arc::new(op);

    let authors = ["alice", "bob", "carol", "alice", "bob", "carol"];
    let handles: Vec<_> = authors
        .iter()
        .map(|author| {
            let op = Arc::clone(&op);
            let message = Message::from_author(*author);
            tokio::spawn(async move { op.apply(message).await })
        })
        .collect();

    for (author, handle) in authors.iter().zip(handles) {
        let out = handle.await.unwrap().unwrap();
        assert_eq!(out.author(), Some(*author));
        assert_eq!(out.has_coordinates(), *author == "alice");
    }
}

#[tokio::test]
async fn registry_builds_fromprofile_against_named_store() {
    let store = Arc::new(InMemoryProfileStore::new());
    let crowd = StoreSelector::Named("crowd".to_string());
    for profile in profiles() {
        store.repository_for(&crowd).unwrap().insert(profile).unwrap();
    }

    let registry = PluginRegistry::with_defaults(store);
    let options: toml::Value = toml::from_str("db = \"crowd\"").unwrap();
    let op = registry.build("fromprofile", &options).unwrap();

    let fixed = op.apply(Message::from_author("alice")).await.unwrap();
    assert_eq!(fixed.coordinates(), Some(Coordinates::new(40.7, -74.0)));
}

#[test]
fn plugin_can_be_driven_from_blocking_code() {
    let store = Arc::new(InMemoryProfileStore::new());
    store
        .repository_for(&StoreSelector::Default)
        .unwrap()
        .insert(Profile::new("alice").with_position(Some(40.7), Some(-74.0)))
        .unwrap();

    let op = FromProfilePlugin::new(store)
        .build_with(&FromProfileOptions::default())
        .unwrap();

    let fixed = tokio_test::block_on(op.apply(Message::from_author("alice"))).unwrap();
    assert!(fixed.has_coordinates());
}
