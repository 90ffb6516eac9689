//! Attribute reads and type-preserving writes on named instances.

use tracing::warn;

use crate::registry::LiveManager;
use crate::typechecker;
use crate::types::{TrackedObject, Value, ValueKind};

/// Read an attribute of `instance`.
///
/// An attribute holding `null` is reported exactly like a missing one: `None`
/// plus a warning.
pub fn get_attr<'a>(instance: &'a TrackedObject, attr: &str) -> Option<&'a Value> {
    match instance.get(attr) {
        Some(value) if !value.is_null() => Some(value),
        _ => {
            warn!("attribute '{attr}' does not exist on '{}' instance", instance.class());
            None
        }
    }
}

impl LiveManager {
    /// [`get_attr`] on the instance registered as `instance_name`.
    pub fn get_attr_by_name(&self, instance_name: &str, attr: &str) -> Option<&Value> {
        get_attr(self.get_instance(instance_name)?, attr)
    }

    /// Coerce `raw` into the kind `attr` currently holds and store it.
    ///
    /// Returns `false` (after logging) when the instance or attribute is
    /// missing or the input does not coerce; the attribute is then left as it
    /// was. A successful write never changes the attribute's kind.
    pub fn set_attr_by_name(&mut self, instance_name: &str, attr: &str, raw: &str) -> bool {
        let Some(instance) = self.get_instance(instance_name) else {
            return false;
        };
        let Some(current) = get_attr(instance, attr) else {
            return false;
        };

        let coerced = match current.kind() {
            ValueKind::Tuple => typechecker::coerce_tuple(raw, instance, attr),
            ValueKind::List => typechecker::coerce_list(raw, instance, attr),
            _ => match typechecker::coerce(raw, current) {
                Ok(value) => Some(value),
                Err(e) => {
                    warn!("failed to update '{instance_name}.{attr}': {e}");
                    None
                }
            },
        };
        let Some(value) = coerced else {
            return false;
        };

        match self.instances.get_mut(instance_name) {
            Some(instance) => {
                instance.set(attr, value);
                true
            }
            None => false,
        }
    }
}
