//! CLI command implementations.
//!
//! - [`salt`] - Root passphrase salt management
//! - [`hq`] - HQ state bootstrap, reconciliation and key retrieval

pub mod hq;
pub mod salt;

pub use hq::HqCommand;
pub use salt::SaltCommand;
