//! geofix: message geo-fixing pipeline stage
//!
//! Enriches streamed messages with coordinates taken from the stored profile
//! of each message's author.
//!
//! ## Architecture
//!
//! - **GeoFix Operator**: 1-in/1-out transform over an injected coordinate resolver
//! - **Profile Resolver**: author's stored latitude/longitude, only when both are set
//! - **Plugin Registry**: strategies selected by stable name (`fromprofile`)
//! - **Profile Storage**: read-only repository traits with in-memory and sled backends
//! - **Pipeline**: ordered, bounded-concurrency processing loop between a source and a sink

pub mod config;
pub mod geofix;
pub mod pipeline;
pub mod plugin;
pub mod storage;
pub mod types;

// Re-export configuration
pub use config::{AppConfig, ConfigError, FromProfileOptions};

// Re-export commonly used types
pub use types::{Coordinates, Message, Profile};

// Re-export the operator and resolvers
pub use geofix::{
    CoordinateResolver, GeoFixError, GeoFixOperator, MessageOperator, ProfileCoordinateResolver,
    ResolverChain,
};

// Re-export plugin registry
pub use plugin::{FromProfilePlugin, OperatorFactory, PluginError, PluginRegistry, FROM_PROFILE_PLUGIN};

// Re-export storage
pub use storage::{
    InMemoryProfileRepository, InMemoryProfileStore, ProfileRepository, ProfileStore,
    RepositoryError, SledProfileStore, StoreSelector,
};

// Re-export pipeline
pub use pipeline::{PipelineError, PipelineStats, ProcessingLoop};
