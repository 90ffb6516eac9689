//! Class and instance tables.
//!
//! # Ownership
//!
//! The host program constructs one [`LiveManager`] and passes it (or a
//! reference) to whatever needs it: the file handler, a control shell, the
//! code that builds tracked objects. There is no process-global registry.
//! Access is unsynchronised; a host sharing the manager across threads must
//! wrap it itself.
//!
//! # Lifecycle
//!
//! ```text
//! set_loaded_values(..)      (optional, before instances are registered)
//! register_class(..)         (once per class; re-registering overwrites)
//! register_instance(..)      (saved values for that name applied here)
//! get_* / set_attr_by_name   (live inspection and tuning)
//! serialize()                (snapshot for the file handler to write)
//! ```

use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::LiveError;
use crate::snapshot::apply_loaded_attrs;
use crate::types::{ClassName, InstanceName, LoadedValues, TrackedClass, TrackedObject};

/// Registry of tracked classes and their live instances.
#[derive(Debug, Default)]
pub struct LiveManager {
    classes: IndexMap<ClassName, TrackedClass>,
    pub(crate) instances: IndexMap<InstanceName, TrackedObject>,
    /// Per-class instance lists, keyed by runtime class. Kept apart from
    /// `classes` so instances of a not-yet-registered class still accumulate.
    class_instances: HashMap<ClassName, Vec<InstanceName>>,
    loaded_values: Option<LoadedValues>,
}

impl LiveManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// A manager that applies `loaded` to instances as they register.
    pub fn with_loaded_values(loaded: LoadedValues) -> Self {
        Self {
            loaded_values: Some(loaded),
            ..Self::default()
        }
    }

    /// Hand over the file handler's state. Only instances registered after
    /// this call see it.
    pub fn set_loaded_values(&mut self, loaded: Option<LoadedValues>) {
        self.loaded_values = loaded;
    }

    pub fn loaded_values(&self) -> Option<&LoadedValues> {
        self.loaded_values.as_ref()
    }

    // -----------------------------------------------------------------------
    // Classes
    // -----------------------------------------------------------------------

    /// Enrol a class. Re-registering a name replaces the definition and keeps
    /// the instances already recorded for it.
    pub fn register_class(&mut self, class: TrackedClass) -> &TrackedClass {
        debug!("registering class '{}'", class.name);
        let name = class.name.clone();
        self.classes.insert(name.clone(), class);
        &self.classes[&name]
    }

    /// All registered classes in registration order.
    pub fn classes(&self) -> impl Iterator<Item = &TrackedClass> {
        self.classes.values()
    }

    pub fn get_class(&self, name: &str) -> Option<&TrackedClass> {
        self.classes.get(name)
    }

    /// Live instances of a class, oldest first.
    ///
    /// `None` if the class was never registered; an empty list if it was but
    /// has no instances yet.
    pub fn get_instances_of(&self, class_name: &str) -> Option<Vec<(&InstanceName, &TrackedObject)>> {
        self.get_class(class_name)?;
        let names = self
            .class_instances
            .get(class_name)
            .map(Vec::as_slice)
            .unwrap_or_default();
        Some(
            names
                .iter()
                .filter_map(|name| self.instances.get_key_value(name))
                .collect(),
        )
    }

    // -----------------------------------------------------------------------
    // Instances
    // -----------------------------------------------------------------------

    /// Enrol a live object under a unique name.
    ///
    /// Saved values for `name` (if any were loaded) overwrite the object's
    /// attributes before it becomes visible. Fails without touching the
    /// registry if the name is taken.
    pub fn register_instance(
        &mut self,
        name: impl Into<InstanceName>,
        instance: TrackedObject,
    ) -> Result<(), LiveError> {
        let name = name.into();
        if self.instances.contains_key(&name) {
            return Err(LiveError::DuplicateName { name });
        }

        let instance = match self
            .loaded_values
            .as_ref()
            .and_then(|loaded| loaded.instance_attrs(&name.0))
        {
            Some(saved) => {
                debug!("restoring {} saved attribute(s) into '{name}'", saved.len());
                apply_loaded_attrs(instance, saved)
            }
            None => instance,
        };

        self.class_instances
            .entry(instance.class().clone())
            .or_default()
            .push(name.clone());
        debug!("registered instance '{name}' of class '{}'", instance.class());
        self.instances.insert(name, instance);
        Ok(())
    }

    /// Look up an instance; a miss is logged.
    pub fn get_instance(&self, name: &str) -> Option<&TrackedObject> {
        let found = self.instances.get(name);
        if found.is_none() {
            warn!("instance '{name}' does not exist");
        }
        found
    }

    /// All instances in registration order.
    pub fn instances(&self) -> impl Iterator<Item = (&InstanceName, &TrackedObject)> {
        self.instances.iter()
    }

    pub fn instance_count(&self) -> usize {
        self.instances.len()
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Attributes, PersistedState, Snapshot, Value};

    fn player() -> TrackedClass {
        TrackedClass::new("Player").with_default("health", 100).with_default("name", "anon")
    }

    #[test]
    fn duplicate_instance_name_is_rejected() {
        let mut manager = LiveManager::new();
        let class = manager.register_class(player()).clone();
        manager.register_instance("p1", class.instantiate()).expect("first");

        let mut other = class.instantiate();
        other.set("health", 1);
        let err = manager.register_instance("p1", other).unwrap_err();
        assert!(matches!(err, LiveError::DuplicateName { ref name } if name.0 == "p1"));
        assert!(err.to_string().contains("already exists"));

        assert_eq!(manager.instance_count(), 1);
        assert_eq!(manager.get_instance("p1").and_then(|p| p.get_int("health")), Some(100));
        assert_eq!(manager.get_instances_of("Player").map(|v| v.len()), Some(1));
    }

    #[test]
    fn register_class_is_idempotent() {
        let mut manager = LiveManager::new();
        manager.register_class(player());
        manager.register_class(player());
        assert_eq!(manager.classes().count(), 1);
    }

    #[test]
    fn register_class_returns_stored_definition() {
        let mut manager = LiveManager::new();
        let stored = manager.register_class(player());
        assert_eq!(stored, &player());
    }

    #[test]
    fn reregistering_class_keeps_its_instances() {
        let mut manager = LiveManager::new();
        let class = manager.register_class(player()).clone();
        manager.register_instance("p1", class.instantiate()).expect("register");
        manager.register_class(player().with_default("mana", 5));
        assert_eq!(manager.get_instances_of("Player").map(|v| v.len()), Some(1));
        assert!(manager.get_class("Player").is_some_and(|c| c.defaults.contains_key("mana")));
    }

    #[test]
    fn unknown_class_vs_empty_class() {
        let mut manager = LiveManager::new();
        assert!(manager.get_instances_of("Player").is_none());
        manager.register_class(player());
        assert_eq!(manager.get_instances_of("Player"), Some(vec![]));
    }

    #[test]
    fn instances_of_unregistered_class_appear_once_class_registers() {
        let mut manager = LiveManager::new();
        manager
            .register_instance("ghost", TrackedObject::new("Enemy").with("hp", 3))
            .expect("register");
        assert!(manager.get_instances_of("Enemy").is_none());
        manager.register_class(TrackedClass::new("Enemy"));
        let instances = manager.get_instances_of("Enemy").expect("known class");
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].0, &InstanceName::from("ghost"));
    }

    #[test]
    fn loaded_values_override_constructor_defaults() {
        let mut saved = Attributes::new();
        saved.insert("health".to_string(), Value::Int(42));
        let mut snapshot = Snapshot::new();
        snapshot.insert(InstanceName::from("p1"), saved);
        let mut manager = LiveManager::with_loaded_values(PersistedState {
            live_instances: Some(snapshot),
        });

        let class = manager.register_class(player()).clone();
        manager.register_instance("p1", class.instantiate()).expect("p1");
        manager.register_instance("p2", class.instantiate()).expect("p2");

        assert_eq!(manager.get_instance("p1").and_then(|p| p.get_int("health")), Some(42));
        assert_eq!(manager.get_instance("p1").and_then(|p| p.get_str("name")), Some("anon"));
        assert_eq!(manager.get_instance("p2").and_then(|p| p.get_int("health")), Some(100));
    }

    #[test]
    fn missing_instance_is_none() {
        let manager = LiveManager::new();
        assert!(manager.get_instance("nobody").is_none());
    }

    #[test]
    fn instances_iterate_in_registration_order() {
        let mut manager = LiveManager::new();
        for name in ["c", "a", "b"] {
            manager
                .register_instance(name, TrackedObject::new("Thing"))
                .expect("register");
        }
        let names: Vec<_> = manager.instances().map(|(n, _)| n.0.as_str()).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
