//! Geo-fixing operator and coordinate resolvers
//!
//! [`GeoFixOperator`] is a 1-in/1-out message transform. It leaves messages
//! that already carry coordinates alone, and asks its injected
//! [`CoordinateResolver`] for the rest.
//!
//! ## Resolvers
//!
//! - [`ProfileCoordinateResolver`]: position stored in the author's profile
//! - [`ResolverChain`]: first answer from an ordered list of resolvers
//!
//! Absence of coordinates is never an error. A resolver failure always is,
//! and the operator hands it back to the caller instead of forwarding the
//! message unchanged.

pub mod chain;
pub mod from_profile;

pub use chain::ResolverChain;
pub use from_profile::ProfileCoordinateResolver;

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, trace};

use crate::storage::RepositoryError;
use crate::types::{Coordinates, Message};

/// Failures that stop a message from being geo-fixed.
#[derive(Debug, thiserror::Error)]
pub enum GeoFixError {
    #[error("profile lookup failed for author '{author}': {source}")]
    LookupFailure {
        author: String,
        #[source]
        source: RepositoryError,
    },
}

impl GeoFixError {
    pub fn lookup(author: impl Into<String>, source: RepositoryError) -> Self {
        Self::LookupFailure {
            author: author.into(),
            source,
        }
    }
}

/// Anything that can produce coordinates for a message.
#[async_trait]
pub trait CoordinateResolver: Send + Sync {
    /// `Ok(None)` when nothing is known about the message's position.
    async fn resolve(&self, message: &Message) -> Result<Option<Coordinates>, GeoFixError>;

    /// Resolver name for logging
    fn resolver_name(&self) -> &str;
}

#[async_trait]
impl<R: CoordinateResolver + ?Sized> CoordinateResolver for Arc<R> {
    async fn resolve(&self, message: &Message) -> Result<Option<Coordinates>, GeoFixError> {
        (**self).resolve(message).await
    }

    fn resolver_name(&self) -> &str {
        (**self).resolver_name()
    }
}

#[async_trait]
impl<R: CoordinateResolver + ?Sized> CoordinateResolver for Box<R> {
    async fn resolve(&self, message: &Message) -> Result<Option<Coordinates>, GeoFixError> {
        (**self).resolve(message).await
    }

    fn resolver_name(&self) -> &str {
        (**self).resolver_name()
    }
}

/// A named per-message transform, as selected from the plugin registry.
#[async_trait]
pub trait MessageOperator: Send + Sync {
    fn name(&self) -> &str;

    async fn apply(&self, message: Message) -> Result<Message, GeoFixError>;
}

/// Attaches resolved coordinates to messages that have none.
///
/// Stateless across messages; the resolver is fixed for the operator's
/// lifetime.
pub struct GeoFixOperator<R> {
    name: String,
    resolver: R,
}

impl<R: CoordinateResolver> GeoFixOperator<R> {
    pub fn new(name: impl Into<String>, resolver: R) -> Self {
        Self {
            name: name.into(),
            resolver,
        }
    }

    pub const fn resolver(&self) -> &R {
        &self.resolver
    }

    /// Geo-fix one message.
    pub async fn apply(&self, mut message: Message) -> Result<Message, GeoFixError> {
        if message.has_coordinates() {
            trace!(author = ?message.from_user, "Message already has coordinates");
            return Ok(message);
        }

        if let Some(coordinates) = self.resolver.resolve(&message).await? {
            debug!(
                author = ?message.from_user,
                resolver = self.resolver.resolver_name(),
                %coordinates,
                "Attached coordinates"
            );
            message.set_coordinates(coordinates);
        }

        Ok(message)
    }
}

#[async_trait]
impl<R: CoordinateResolver> MessageOperator for GeoFixOperator<R> {
    fn name(&self) -> &str {
        &self.name
    }

    async fn apply(&self, message: Message) -> Result<Message, GeoFixError> {
        GeoFixOperator::<R>::apply(self, message).await
    }
}
