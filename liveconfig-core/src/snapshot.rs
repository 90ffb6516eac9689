//! Save/restore of tracked state.
//!
//! Persistable values are `null`, booleans, integers, finite floats, strings
//! and tuples/lists built from those. Anything else is written as its textual
//! form: opaque values keep their text, non-finite floats become `"inf"`,
//! `"NaN"` and so on.

use tracing::{debug, warn};

use crate::registry::LiveManager;
use crate::types::{Attributes, PersistedState, Snapshot, TrackedObject, Value};

impl LiveManager {
    /// Snapshot of every live instance's public attributes, in registration
    /// order, wrapped as `{"live_instances": {...}}`.
    pub fn serialize(&self) -> PersistedState {
        let snapshot: Snapshot = self
            .instances()
            .map(|(name, instance)| {
                let attrs: Attributes = instance
                    .tracked_attrs()
                    .map(|(attr, value)| (attr.clone(), to_persisted(value)))
                    .collect();
                (name.clone(), attrs)
            })
            .collect();
        debug!("serialized {} instance(s)", snapshot.len());
        PersistedState {
            live_instances: Some(snapshot),
        }
    }
}

/// Overwrite `instance`'s attributes with saved values, without coercion.
///
/// Saved values are trusted, with two adjustments undoing the persisted
/// form: a list landing on a tuple of the same arity becomes a tuple again,
/// and float text (`"inf"`, `"NaN"`) landing on a float becomes a float.
pub fn apply_loaded_attrs(mut instance: TrackedObject, attrs: &Attributes) -> TrackedObject {
    for (attr, value) in attrs {
        let value = match (instance.get(attr), value) {
            (Some(Value::Tuple(current)), Value::List(items)) => {
                if items.len() == current.len() {
                    Value::Tuple(items.clone())
                } else {
                    warn!(
                        "saved '{attr}' has {} elements but the tuple has {}; keeping it as a list",
                        items.len(),
                        current.len()
                    );
                    value.clone()
                }
            }
            (Some(Value::Float(_)), Value::Str(text)) => match text.trim().parse::<f64>() {
                Ok(x) => Value::Float(x),
                Err(_) => value.clone(),
            },
            _ => value.clone(),
        };
        instance.set(attr.as_str(), value);
    }
    instance
}

/// Map a live value onto its persisted form.
pub fn to_persisted(value: &Value) -> Value {
    match value {
        Value::Float(x) if !x.is_finite() => Value::Str(x.to_string()),
        Value::Opaque(text) => Value::Str(text.clone()),
        Value::Tuple(items) => Value::Tuple(items.iter().map(to_persisted).collect()),
        Value::List(items) => Value::List(items.iter().map(to_persisted).collect()),
        other => other.clone(),
    }
}
