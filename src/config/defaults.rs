//! System-wide default constants.
//!
//! Grouped by subsystem for easy discovery.

// ============================================================================
// Configuration
// ============================================================================

/// Environment variable pointing at a TOML config file.
pub const CONFIG_ENV_VAR: &str = "GEOFIX_CONFIG";

/// Config file looked up in the working directory when the env var is unset.
pub const LOCAL_CONFIG_FILE: &str = "geofix.toml";

// ============================================================================
// Profile Store
// ============================================================================

/// Default sled database path for author profiles.
pub const DEFAULT_STORE_PATH: &str = "./data/profiles.db";

/// Store selector prefix reserved for the storage engine's own trees.
pub const RESERVED_SELECTOR_PREFIX: &str = "__";

// ============================================================================
// Pipeline
// ============================================================================

/// Plugin used when none is configured.
pub const DEFAULT_PLUGIN: &str = crate::plugin::FROM_PROFILE_PLUGIN;

/// Messages geo-fixed concurrently by the processing loop.
pub const DEFAULT_CONCURRENCY: usize = 16;

/// Upper bound on configured concurrency.
pub const MAX_CONCURRENCY: usize = 1_024;

/// Log a progress line every N messages.
pub const PROGRESS_LOG_INTERVAL: u64 = 1_000;
