//! Coordinates from the author's stored profile

use async_trait::async_trait;
use tracing::trace;

use super::{CoordinateResolver, GeoFixError};
use crate::storage::ProfileRepository;
use crate::types::{Coordinates, Message};

/// Resolves a message's position to the latitude/longitude stored in its
/// author's profile.
///
/// A missing author, a missing profile, or a profile with only one of the two
/// values all resolve to `None`.
pub struct ProfileCoordinateResolver<P> {
    profiles: P,
}

impl<P: ProfileRepository> ProfileCoordinateResolver<P> {
    pub const fn new(profiles: P) -> Self {
        Self { profiles }
    }
}

#[async_trait]
impl<P: ProfileRepository> CoordinateResolver for ProfileCoordinateResolver<P> {
    async fn resolve(&self, message: &Message) -> Result<Option<Coordinates>, GeoFixError> {
        let Some(author) = message.author() else {
            trace!("Message has no author, nothing to resolve");
            return Ok(None);
        };

        let profile = self
            .profiles
            .get_by_username(author)
            .await
            .map_err(|e| GeoFixError::lookup(author, e))?;

        Ok(profile.and_then(|p| p.coordinates()))
    }

    fn resolver_name(&self) -> &str {
        "profile"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryProfileRepository, RepositoryError};
    use crate::types::Profile;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Counts lookups and never finds anyone.
    #[derive(Default)]
    struct CountingRepository {
        lookups: AtomicUsize,
    }

    #[async_trait]
    impl ProfileRepository for CountingRepository {
        async fn get_by_username(&self, _username: &str) -> Result<Option<Profile>, RepositoryError> {
            self.lookups.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }

        fn backend_name(&self) -> &'static str {
            "Counting"
        }
    }

    struct DownRepository;

    #[async_trait]
    impl ProfileRepository for DownRepository {
        async fn get_by_username(&self, _username: &str) -> Result<Option<Profile>, RepositoryError> {
            Err(RepositoryError::Unavailable("connection refused".to_string()))
        }

        fn backend_name(&self) -> &'static str {
            "Down"
        }
    }

    fn repo() -> InMemoryProfileRepository {
        InMemoryProfileRepository::with_profiles([
            Profile::new("alice").with_position(Some(40.7), Some(-74.0)),
            Profile::new("carol").with_position(Some(10.0), None),
            Profile::new("frank").with_position(None, Some(12.5)),
        ])
    }

    #[tokio::test]
    async fn test_full_profile_position() {
        let resolver = ProfileCoordinateResolver::new(repo());
        let coords = resolver.resolve(&Message::from_author("alice")).await.unwrap();
        assert_eq!(coords, Some(Coordinates::new(40.7, -74.0)));
    }

    #[tokio::test]
    async fn test_partial_profile_positions_are_absent() {
        let resolver = ProfileCoordinateResolver::new(repo());
        assert!(resolver.resolve(&Message::from_author("carol")).await.unwrap().is_none());
        assert!(resolver.resolve(&Message::from_author("frank")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unknown_author_is_absent() {
        let resolver = ProfileCoordinateResolver::new(repo());
        assert!(resolver.resolve(&Message::from_author("bob")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_username_match_is_exact() {
        let resolver = ProfileCoordinateResolver::new(repo());
        assert!(resolver.resolve(&Message::from_author(" alice ")).await.unwrap().is_none());
        assert!(resolver.resolve(&Message::from_author("Alice")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_username_with_trailing_space_is_found() {
        let repo = InMemoryProfileRepository::with_profiles([
            Profile::new("alice ").with_position(Some(1.5), Some(2.5)),
        ]);
        let resolver = ProfileCoordinateResolver::new(repo);

        let coords = resolver.resolve(&Message::from_author("alice ")).await.unwrap();
        assert_eq!(coords, Some(Coordinates::new(1.5, 2.5)));
        assert!(resolver.resolve(&Message::from_author("alice")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_blank_author_skips_lookup() {
        let resolver = ProfileCoordinateResolver::new(CountingRepository::default());

        let mut no_author = Message::from_author("");
        assert!(resolver.resolve(&no_author).await.unwrap().is_none());
        no_author.from_user = Some(" \t ".to_string());
        assert!(resolver.resolve(&no_author).await.unwrap().is_none());
        no_author.from_user = None;
        assert!(resolver.resolve(&no_author).await.unwrap().is_none());

        assert_eq!(resolver.profiles.lookups.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_repository_failure_is_not_absence() {
        let resolver = ProfileCoordinateResolver::new(DownRepository);
        let err = resolver.resolve(&Message::from_author("erin")).await.unwrap_err();

        let GeoFixError::LookupFailure { author, source } = err;
        assert_eq!(author, "erin");
        assert!(matches!(source, RepositoryError::Unavailable(_)));
    }
}
