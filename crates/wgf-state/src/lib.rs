//! # wgf-state
//!
//! HQ state management for wg-federation.
//!
//! - [`HqState`]: the federation settings and every `WireGuard` configuration
//!   the HQ owns, grouped by [`wgf_wireguard::InterfaceKind`]
//! - [`StateDataManager`]: bootstraps, reloads and updates the state under the
//!   state file lock, dispatching [`HqEvent`]s around every change
//! - [`EventDispatcher`]: synchronous observer that threads a payload through
//!   the [`EventSubscriber`]s registered for an event
//! - [`WireguardInterfaceConfigurationReconciler`]: rewrites a configuration's
//!   `.ini` file whenever its digest moved
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use wgf_state::{
//!     EventDispatcher, HqEventDispatcher, StateDataManager,
//!     WireguardInterfaceConfigurationReconciler,
//! };
//! use wgf_store::{
//!     ConfigurationLoader, ConfigurationLocationFinder, ConfigurationLocker, ConfigurationSaver,
//! };
//! use wgf_wireguard::WireguardKeyGenerator;
//!
//! let events = Arc::new(HqEventDispatcher::default());
//! events
//!     .configuration
//!     .register(Arc::new(WireguardInterfaceConfigurationReconciler::new(
//!         ConfigurationLocker::default(),
//!         Arc::new(EventDispatcher::new()),
//!     )));
//!
//! let manager = StateDataManager::new(
//!     ConfigurationLocationFinder::default(),
//!     Arc::new(ConfigurationLoader::default()),
//!     Arc::new(ConfigurationSaver::default()),
//!     ConfigurationLocker::default(),
//!     WireguardKeyGenerator::new(),
//!     events,
//! );
//! let state = manager.create_hq_state()?;
//! println!("federation {}", state.federation().name());
//! # Ok::<(), wgf_state::Error>(())
//! ```

pub mod dispatcher;
pub mod error;
pub mod events;
pub mod manager;
pub mod reconciler;
pub mod state;

pub use dispatcher::{EventDispatcher, EventSubscriber};
pub use error::{Error, Result};
pub use events::{HqEvent, WireguardConfigurationEvent};
pub use manager::{
    DEFAULT_FORUM_NAME, DEFAULT_INTERFACE_NAME, DEFAULT_PHONE_LINE_NAME, HqEventDispatcher,
    StateDataManager,
};
pub use reconciler::{ReconciliationState, WireguardInterfaceConfigurationReconciler};
pub use state::{
    DEFAULT_FEDERATION_NAME, DEFAULT_FORUM_PORTS, DEFAULT_PHONE_LINE_PORTS, Federation, HqState,
};
