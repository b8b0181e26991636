//! Geo-fixing Configuration Module
//!
//! Runtime configuration loaded from TOML files.
//!
//! ## Loading Order
//!
//! 1. `GEOFIX_CONFIG` environment variable (path to TOML file)
//! 2. `geofix.toml` in the current working directory
//! 3. Built-in defaults
//!
//! ## Layout
//!
//! ```toml
//! [store]
//! path = "./data/profiles.db"
//!
//! [pipeline]
//! plugin = "fromprofile"
//! concurrency = 16
//!
//! [plugins.fromprofile]
//! db = "crowd"
//! ```

mod app_config;
mod options;
pub mod defaults;

pub use app_config::*;
pub use options::*;
