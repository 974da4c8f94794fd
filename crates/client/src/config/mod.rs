//! Configuration loading and management
//!
//! [`ClientConfiguration`] is immutable once built. It can be assembled in
//! code, or loaded from `SUBSCRIPTIONS_*` environment variables and
//! JSON/TOML files through [`loader`].

pub mod loader;
pub mod types;

// Re-export commonly used items
pub use loader::{load, load_from_env, load_from_file, probe_config_paths, ConfigError};
pub use types::{ApplicationCredentials, ClientConfiguration};
