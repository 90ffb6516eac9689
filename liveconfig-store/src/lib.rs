//! # liveconfig-store
//!
//! The file handler: reads a save file into the `loaded_values` a
//! [`LiveManager`](liveconfig_core::LiveManager) applies at registration, and
//! writes [`serialize`](liveconfig_core::LiveManager::serialize) snapshots
//! back atomically.

pub mod error;
pub mod file_handler;

pub use error::StoreError;
pub use file_handler::{default_path, default_path_at, FileHandler, Format, SaveOutcome};
