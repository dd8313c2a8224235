//! Beatmap characteristics: built-ins plus runtime-registered custom ones.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

use crate::notifications::Broadcaster;

pub const MISSING_CHARACTERISTIC: &str = "MissingCharacteristic";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristic {
    pub serialized_name: String,
    pub name_localization_key: String,
    pub hint_localization_key: String,
    pub compound_id_part_name: String,
    pub requires_360_movement: bool,
    pub contains_rotation_events: bool,
    pub sorting_order: i32,
}

impl Characteristic {
    pub fn new(serialized_name: impl Into<String>, sorting_order: i32) -> Self {
        let serialized_name = serialized_name.into();
        Self {
            name_localization_key: serialized_name.clone(),
            hint_localization_key: String::new(),
            compound_id_part_name: serialized_name.clone(),
            serialized_name,
            requires_360_movement: false,
            contains_rotation_events: false,
            sorting_order,
        }
    }

    pub fn with_rotation(mut self, requires_360_movement: bool) -> Self {
        self.requires_360_movement = requires_360_movement;
        self.contains_rotation_events = true;
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint_localization_key = hint.into();
        self
    }

    /// Placeholder for levels that reference an unknown characteristic.
    pub fn missing() -> Self {
        Self::new(MISSING_CHARACTERISTIC, 1000).with_hint("Missing Characteristic")
    }

    pub fn is_missing(&self) -> bool {
        self.serialized_name == MISSING_CHARACTERISTIC
    }
}

/// Registration changes of custom characteristics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CharacteristicEvent {
    Registered(Characteristic),
    Unregistered(Characteristic),
}

fn builtins() -> Vec<Characteristic> {
    vec![
        Characteristic::new("Standard", 0),
        Characteristic::new("OneSaber", 1),
        Characteristic::new("NoArrows", 2),
        Characteristic::new("90Degree", 3).with_rotation(false),
        Characteristic::new("360Degree", 4).with_rotation(true),
        Characteristic::new("Lightshow", 5),
        Characteristic::new("Lawless", 6),
        Characteristic::new("Legacy", 7),
    ]
}

/// Lookup of characteristics by serialized name.
///
/// Built-in characteristics are always present. Custom ones can be added and
/// removed at runtime; those changes are broadcast.
#[derive(Debug)]
pub struct CharacteristicRegistry {
    builtin: DashMap<String, Characteristic>,
    custom: DashMap<String, Characteristic>,
    events: Broadcaster<CharacteristicEvent>,
}

impl Default for CharacteristicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CharacteristicRegistry {
    pub fn new() -> Self {
        let builtin = DashMap::new();
        for characteristic in builtins() {
            builtin.insert(characteristic.serialized_name.clone(), characteristic);
        }
        Self {
            builtin,
            custom: DashMap::new(),
            events: Broadcaster::default(),
        }
    }

    /// Register a custom characteristic.
    ///
    /// Returns false and logs a warning if the serialized name is already known.
    pub fn register_custom(&self, characteristic: Characteristic) -> bool {
        use dashmap::mapref::entry::Entry;
        if self.builtin.contains_key(&characteristic.serialized_name) {
            tracing::warn!(
                "Characteristic '{}' was registered more than once! not registering again",
                characteristic.serialized_name
            );
            return false;
        }
        match self.custom.entry(characteristic.serialized_name.clone()) {
            Entry::Occupied(_) => {
                tracing::warn!(
                    "Characteristic '{}' was registered more than once! not registering again",
                    characteristic.serialized_name
                );
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(characteristic.clone());
                self.events
                    .send(CharacteristicEvent::Registered(characteristic));
                true
            }
        }
    }

    /// Remove a custom characteristic. Returns false if it was not registered.
    pub fn unregister_custom(&self, serialized_name: &str) -> bool {
        match self.custom.remove(serialized_name) {
            Some((_, characteristic)) => {
                self.events
                    .send(CharacteristicEvent::Unregistered(characteristic));
                true
            }
            None => {
                tracing::warn!(
                    "Characteristic '{serialized_name}' was unregistered more than once! not unregistering again"
                );
                false
            }
        }
    }

    pub fn get(&self, serialized_name: &str) -> Option<Characteristic> {
        self.custom
            .get(serialized_name)
            .or_else(|| self.builtin.get(serialized_name))
            .map(|r| r.value().clone())
    }

    /// Custom characteristics ordered by sorting order, then name.
    pub fn registered_custom(&self) -> Vec<Characteristic> {
        let mut out: Vec<_> = self.custom.iter().map(|r| r.value().clone()).collect();
        out.sort_by(|a, b| {
            a.sorting_order
                .cmp(&b.sorting_order)
                .then_with(|| a.serialized_name.cmp(&b.serialized_name))
        });
        out
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<CharacteristicEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_resolve() {
        let registry = CharacteristicRegistry::new();
        assert_eq!(registry.get("Standard").unwrap().sorting_order, 0);
        assert!(registry.get("360Degree").unwrap().requires_360_movement);
        assert!(registry.get("Unknown").is_none());
    }

    #[test]
    fn test_register_and_unregister_custom() {
        let registry = CharacteristicRegistry::new();
        let mut rx = registry.subscribe();
        let custom = Characteristic::new("Lightsaber", 10);

        assert!(registry.register_custom(custom.clone()));
        assert!(!registry.register_custom(custom.clone()));
        assert_eq!(registry.get("Lightsaber"), Some(custom.clone()));
        assert_eq!(registry.registered_custom(), vec![custom.clone()]);
        assert_eq!(
            rx.try_recv().unwrap(),
            CharacteristicEvent::Registered(custom.clone())
        );
        // Duplicate registration sends nothing
        assert!(rx.try_recv().is_err());

        assert!(registry.unregister_custom("Lightsaber"));
        assert!(!registry.unregister_custom("Lightsaber"));
        assert_eq!(
            rx.try_recv().unwrap(),
            CharacteristicEvent::Unregistered(custom)
        );
        assert!(registry.get("Lightsaber").is_none());
    }

    #[test]
    fn test_builtin_name_cannot_be_registered() {
        let registry = CharacteristicRegistry::new();
        assert!(!registry.register_custom(Characteristic::new("Standard", 99)));
        assert_eq!(registry.get("Standard").unwrap().sorting_order, 0);
    }

    #[test]
    fn test_missing_placeholder() {
        let missing = Characteristic::missing();
        assert!(missing.is_missing());
        assert!(!Characteristic::new("Standard", 0).is_missing());
    }
}
