//! Rebuild a [`LiveManager`] from saved state.
//!
//! Saved files record instance names and attribute values but not classes.
//! Every saved instance is registered as an empty object of the
//! [`PERSISTED_CLASS`] class; the normal registration path then fills in its
//! attributes from the loaded values, so edits coerce against the saved kinds.

use liveconfig_core::{LiveError, LiveManager, LoadedValues, TrackedClass};

/// Class that rehydrated instances are registered under.
pub const PERSISTED_CLASS: &str = "persisted";

pub fn hydrate(loaded: Option<&LoadedValues>) -> Result<LiveManager, LiveError> {
    let mut manager = LiveManager::new();
    manager.set_loaded_values(loaded.cloned());
    let class = manager.register_class(TrackedClass::new(PERSISTED_CLASS)).clone();

    let names: Vec<_> = loaded
        .and_then(|l| l.live_instances.as_ref())
        .map(|snapshot| snapshot.keys().cloned().collect())
        .unwrap_or_default();
    for name in names {
        manager.register_instance(name, class.instantiate())?;
    }
    Ok(manager)
}
