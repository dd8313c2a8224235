//! Collaborator lookups consumed by the metadata loader.
//!
//! The loader never owns environments, characteristics or color schemes; it
//! resolves names through [`LevelLookups`] and substitutes defaults when a
//! name is unknown. [`Registries`] is the in-process implementation.

pub mod capabilities;
pub mod characteristics;
pub mod colors;
pub mod environments;

pub use capabilities::{CapabilityEvent, CapabilityRegistry};
pub use characteristics::{Characteristic, CharacteristicEvent, CharacteristicRegistry};
pub use colors::{Color, ColorScheme};
pub use environments::{EnvironmentInfo, EnvironmentRegistry, EnvironmentType};

use crate::level::ColorSchemeSaveData;

/// Read-only lookups used while loading levels.
///
/// Called concurrently from every loader worker.
pub trait LevelLookups: Send + Sync {
    /// Environment by serialized name.
    fn environment(&self, serialized_name: &str) -> Option<EnvironmentInfo>;

    /// Fallback environment when a name does not resolve.
    fn default_environment(&self, all_directions: bool) -> EnvironmentInfo;

    /// Characteristic by serialized name.
    fn characteristic(&self, serialized_name: &str) -> Option<Characteristic>;

    /// Runtime color scheme for descriptor save data.
    fn color_scheme(&self, save_data: &ColorSchemeSaveData) -> Option<ColorScheme> {
        ColorScheme::from_save_data(save_data)
    }
}

/// Default lookups backed by in-memory registries.
#[derive(Debug, Default)]
pub struct Registries {
    pub environments: EnvironmentRegistry,
    pub characteristics: CharacteristicRegistry,
    pub capabilities: CapabilityRegistry,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LevelLookups for Registries {
    fn environment(&self, serialized_name: &str) -> Option<EnvironmentInfo> {
        self.environments.get(serialized_name)
    }

    fn default_environment(&self, all_directions: bool) -> EnvironmentInfo {
        self.environments.default_environment(all_directions)
    }

    fn characteristic(&self, serialized_name: &str) -> Option<Characteristic> {
        self.characteristics.get(serialized_name)
    }
}
