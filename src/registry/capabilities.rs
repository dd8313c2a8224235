//! Named capabilities advertised by plugins consuming the loader.
//!
//! Names are compared after stripping spaces and lower-casing, so
//! "Mapping Extensions" and "mappingextensions" are the same capability.

use parking_lot::Mutex;

use crate::notifications::Broadcaster;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CapabilityEvent {
    /// Carries the name as passed by the caller.
    Registered(String),
    Unregistered(String),
}

fn sanitize(capability: &str) -> String {
    capability
        .chars()
        .filter(|c| *c != ' ')
        .flat_map(char::to_lowercase)
        .collect()
}

#[derive(Debug, Default)]
pub struct CapabilityRegistry {
    capabilities: Mutex<Vec<String>>,
    events: Broadcaster<CapabilityEvent>,
}

impl CapabilityRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false and logs a warning if already registered.
    pub fn register(&self, capability: &str) -> bool {
        let sanitized = sanitize(capability);
        let mut capabilities = self.capabilities.lock();
        if capabilities.contains(&sanitized) {
            tracing::warn!(
                "Capability '{capability}' was registered more than once! not registering again"
            );
            return false;
        }
        capabilities.push(sanitized);
        self.events
            .send(CapabilityEvent::Registered(capability.to_string()));
        true
    }

    /// Returns false and logs a warning if not registered.
    pub fn unregister(&self, capability: &str) -> bool {
        let sanitized = sanitize(capability);
        let mut capabilities = self.capabilities.lock();
        match capabilities.iter().position(|c| *c == sanitized) {
            Some(idx) => {
                capabilities.remove(idx);
                self.events
                    .send(CapabilityEvent::Unregistered(capability.to_string()));
                true
            }
            None => {
                tracing::warn!(
                    "Capability '{capability}' was unregistered more than once! not unregistering again"
                );
                false
            }
        }
    }

    pub fn is_registered(&self, capability: &str) -> bool {
        let sanitized = sanitize(capability);
        self.capabilities.lock().contains(&sanitized)
    }

    /// Sanitized names in registration order.
    pub fn registered(&self) -> Vec<String> {
        self.capabilities.lock().clone()
    }

    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<CapabilityEvent> {
        self.events.subscribe()
    }
}
