//! Shared data structures for the geo-fixing stage
//!
//! - `Message`: one streamed unit of content, optionally carrying coordinates
//! - `Profile`: a known author with an optionally stored position
//! - `Coordinates`: a complete (latitude, longitude) pair

mod message;
mod profile;

pub use message::*;
pub use profile::*;
