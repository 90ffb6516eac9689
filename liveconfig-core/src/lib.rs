//! LiveConfig core library: tracked class/instance registry, type-coerced
//! attribute edits, and save/restore of tracked state.
//!
//! - [`types`]: newtypes, [`Value`], tracked objects and classes, save-file shape
//! - [`error`]: [`LiveError`], [`CoercionError`]
//! - [`typechecker`]: raw text → attribute kind coercion
//! - [`registry`]: [`LiveManager`] class and instance tables
//! - [`accessor`]: get/set of attributes by instance name
//! - [`snapshot`]: serialize live state, apply saved values

pub mod accessor;
pub mod error;
pub mod registry;
pub mod snapshot;
pub mod typechecker;
pub mod types;

pub use accessor::get_attr;
pub use error::{CoercionError, LiveError};
pub use registry::LiveManager;
pub use snapshot::apply_loaded_attrs;
pub use types::{
    Attributes, ClassName, InstanceName, LoadedValues, PersistedState, Snapshot, TrackedClass,
    TrackedObject, Value, ValueKind,
};
