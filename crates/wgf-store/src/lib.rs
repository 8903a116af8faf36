//! # wgf-store
//!
//! Persistence plumbing shared by the wg-federation crates:
//!
//! - [`ConfigurationLocationFinder`]: resolves every well-known file and directory
//! - [`ConfigurationLoader`] / [`ConfigurationSaver`]: read and write small structured
//!   documents (JSON or raw text records), picking an implementation per location
//! - [`ConfigurationLocker`]: OS-backed advisory locks scoped to a configuration path
//!
//! Every write goes through [`write_atomically_with`]: the content lands in a
//! `0600` temporary file next to the destination, is synced, then renamed over it.

pub mod error;
pub mod loader;
pub mod location;
pub mod locker;
pub mod saver;

pub use error::{Error, Result};
pub use loader::{
    CanLoadConfiguration, ConfigurationLoader, JsonFileConfigurationLoader,
    TextFileConfigurationLoader,
};
pub use location::ConfigurationLocationFinder;
pub use locker::{ConfigurationLock, ConfigurationLocker, LockMode};
pub use saver::{
    CanSaveConfiguration, ConfigurationSaver, JsonFileConfigurationSaver,
    TextFileConfigurationSaver, restrict_permissions, write_atomically, write_atomically_with,
};

/// A structured configuration document, as read from or written to a location.
pub type ConfigurationData = serde_json::Map<String, serde_json::Value>;

/// Key under which text records store their content.
pub const RAW_FIELD: &str = "raw";
