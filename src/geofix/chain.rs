//! Ordered composition of resolvers

use async_trait::async_trait;

use super::{CoordinateResolver, GeoFixError};
use crate::types::{Coordinates, Message};

/// Asks each resolver in turn and returns the first coordinates found.
///
/// A failure from any resolver stops the chain: later resolvers are not
/// consulted, so a failed lookup is never hidden behind a fallback.
#[derive(Default)]
pub struct ResolverChain {
    resolvers: Vec<Box<dyn CoordinateResolver>>,
}

impl ResolverChain {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then(mut self, resolver: impl CoordinateResolver + 'static) -> Self {
        self.resolvers.push(Box::new(resolver));
        self
    }

    pub fn len(&self) -> usize {
        self.resolvers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resolvers.is_empty()
    }
}

#[async_trait]
impl CoordinateResolver for ResolverChain {
    async fn resolve(&self, message: &Message) -> Result<Option<Coordinates>, GeoFixError> {
        for resolver in &self.resolvers {
            if let Some(coordinates) = resolver.resolve(message).await? {
                return Ok(Some(coordinates));
            }
        }
        Ok(None)
    }

    fn resolver_name(&self) -> &str {
        "chain"
    }
}
