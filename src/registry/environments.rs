//! Environment lookup by serialized name.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};

pub const DEFAULT_ENVIRONMENT: &str = "DefaultEnvironment";
pub const DEFAULT_ALL_DIRECTIONS_ENVIRONMENT: &str = "GlassDesertEnvironment";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnvironmentType {
    Normal,
    Circle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentInfo {
    pub serialized_name: String,
    pub environment_name: String,
    pub environment_type: EnvironmentType,
}

impl EnvironmentInfo {
    pub fn new(
        serialized_name: impl Into<String>,
        environment_name: impl Into<String>,
        environment_type: EnvironmentType,
    ) -> Self {
        Self {
            serialized_name: serialized_name.into(),
            environment_name: environment_name.into(),
            environment_type,
        }
    }
}

const BUILTIN_ENVIRONMENTS: &[(&str, &str, EnvironmentType)] = &[
    (DEFAULT_ENVIRONMENT, "The First", EnvironmentType::Normal),
    ("TriangleEnvironment", "Triangle", EnvironmentType::Normal),
    ("NiceEnvironment", "Nice", EnvironmentType::Normal),
    ("BigMirrorEnvironment", "Big Mirror", EnvironmentType::Normal),
    ("KDAEnvironment", "KDA", EnvironmentType::Normal),
    ("MonstercatEnvironment", "Monstercat", EnvironmentType::Normal),
    ("CrabRaveEnvironment", "Crab Rave", EnvironmentType::Normal),
    ("DragonsEnvironment", "Dragons", EnvironmentType::Normal),
    ("OriginsEnvironment", "Origins", EnvironmentType::Normal),
    ("PanicEnvironment", "Panic", EnvironmentType::Normal),
    ("RocketEnvironment", "Rocket", EnvironmentType::Normal),
    ("GreenDayEnvironment", "Green Day", EnvironmentType::Normal),
    ("TimbalandEnvironment", "Timbaland", EnvironmentType::Normal),
    ("FitBeatEnvironment", "FitBeat", EnvironmentType::Normal),
    ("LinkinParkEnvironment", "Linkin Park", EnvironmentType::Normal),
    ("BTSEnvironment", "BTS", EnvironmentType::Normal),
    ("KaleidoscopeEnvironment", "Kaleidoscope", EnvironmentType::Normal),
    ("InterscopeEnvironment", "Interscope", EnvironmentType::Normal),
    ("SkrillexEnvironment", "Skrillex", EnvironmentType::Normal),
    ("BillieEnvironment", "Billie", EnvironmentType::Normal),
    ("HalloweenEnvironment", "Spooky", EnvironmentType::Normal),
    ("GagaEnvironment", "Gaga", EnvironmentType::Normal),
    (
        DEFAULT_ALL_DIRECTIONS_ENVIRONMENT,
        "Glass Desert",
        EnvironmentType::Circle,
    ),
];

/// Registry of environments known to the host.
///
/// Read concurrently by loader workers, written only during setup.
#[derive(Debug)]
pub struct EnvironmentRegistry {
    environments: DashMap<String, EnvironmentInfo>,
}

impl Default for EnvironmentRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl EnvironmentRegistry {
    /// Empty registry. Lookups still fall back to built-in defaults.
    pub fn empty() -> Self {
        Self {
            environments: DashMap::new(),
        }
    }

    pub fn with_builtins() -> Self {
        let registry = Self::empty();
        for (serialized, name, kind) in BUILTIN_ENVIRONMENTS {
            registry.register(EnvironmentInfo::new(*serialized, *name, *kind));
        }
        registry
    }

    /// Register an environment. Returns false and logs if the name is taken.
    pub fn register(&self, info: EnvironmentInfo) -> bool {
        use dashmap::mapref::entry::Entry;
        match self.environments.entry(info.serialized_name.clone()) {
            Entry::Occupied(_) => {
                tracing::warn!(
                    "Environment '{}' was registered more than once! not registering again",
                    info.serialized_name
                );
                false
            }
            Entry::Vacant(slot) => {
                slot.insert(info);
                true
            }
        }
    }

    pub fn get(&self, serialized_name: &str) -> Option<EnvironmentInfo> {
        self.environments
            .get(serialized_name)
            .map(|r| r.value().clone())
    }

    /// Default environment for normal or all-directions levels.
    pub fn default_environment(&self, all_directions: bool) -> EnvironmentInfo {
        let name = if all_directions {
            DEFAULT_ALL_DIRECTIONS_ENVIRONMENT
        } else {
            DEFAULT_ENVIRONMENT
        };
        self.get(name).unwrap_or_else(|| {
            let kind = if all_directions {
                EnvironmentType::Circle
            } else {
                EnvironmentType::Normal
            };
            EnvironmentInfo::new(name, name, kind)
        })
    }

    pub fn len(&self) -> usize {
        self.environments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.environments.is_empty()
    }
}
