//! Device registry — maps a configuration type tag to a builder for a
//! concrete device kind.
//!
//! This is what lets the orchestrator turn a configuration entry into a
//! live device without a compiled-in switch statement: new kinds are added
//! by registering a builder at startup, never by touching the orchestrator.
//! Builders may capture shared hardware drivers (a GPIO chip, a 1-Wire bus)
//! by cloning them into the closure.

use std::collections::HashMap;

use crate::device::{Actor, Buzzer, Sensor};
use crate::equipment::Equipment;

/// A freshly-built, not-yet-initialized device of some kind.
pub enum DeviceInstance {
    Sensor(Box<dyn Sensor>),
    Actor(Box<dyn Actor>),
    Buzzer(Box<dyn Buzzer>),
    Equipment(Box<dyn Equipment>),
}

impl DeviceInstance {
    /// The kind label used in skip-and-log diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Sensor(_) => "sensor",
            Self::Actor(_) => "actor",
            Self::Buzzer(_) => "buzzer",
            Self::Equipment(_) => "equipment",
        }
    }
}

/// Zero-argument builder capability for a concrete device kind.
pub type DeviceBuilder = Box<dyn Fn() -> DeviceInstance + Send + Sync>;

/// Registry of all device kinds the configuration may name.
#[derive(Default)]
pub struct DeviceRegistry {
    builders: HashMap<String, DeviceBuilder>,
}

impl DeviceRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a builder under a type tag. Re-registering a tag replaces
    /// the previous builder.
    pub fn register(
        &mut self,
        tag: impl Into<String>,
        builder: impl Fn() -> DeviceInstance + Send + Sync + 'static,
    ) {
        self.builders.insert(tag.into(), Box::new(builder));
    }

    /// Resolve a type tag. `None` means the tag is unknown — callers skip
    /// the declaration with a logged warning, never abort the load.
    #[must_use]
    pub fn resolve(&self, tag: &str) -> Option<&DeviceBuilder> {
        self.builders.get(tag)
    }

    #[must_use]
    pub fn is_registered(&self, tag: &str) -> bool {
        self.builders.contains_key(tag)
    }

    /// All registered tags, sorted for stable diagnostics.
    #[must_use]
    pub fn tags(&self) -> Vec<&str> {
        let mut tags: Vec<&str> = self.builders.keys().map(String::as_str).collect();
        tags.sort_unstable();
        tags
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ActorCore, Device, DeviceCore};
    use brewhub_domain::error::DeviceError;
    use brewhub_domain::state::DeviceState;

    #[derive(Default)]
    struct NullRelay {
        core: DeviceCore,
        actor: ActorCore,
    }

    impl Device for NullRelay {
        fn core(&self) -> &DeviceCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut DeviceCore {
            &mut self.core
        }
    }

    impl Actor for NullRelay {
        fn on(&mut self) -> Result<(), DeviceError> {
            self.actor.set_state(DeviceState::On);
            Ok(())
        }

        fn off(&mut self) -> Result<(), DeviceError> {
            self.actor.set_state(DeviceState::Off);
            Ok(())
        }

        fn set_power(&mut self, power: u8) -> Result<(), DeviceError> {
            self.actor.set_power(power);
            Ok(())
        }

        fn state(&self) -> DeviceState {
            self.actor.state()
        }

        fn power_level(&self) -> u8 {
            self.actor.power()
        }
    }

    #[test]
    fn should_resolve_registered_tag() {
        let mut registry = DeviceRegistry::new();
        registry.register("NullRelay", || {
            DeviceInstance::Actor(Box::new(NullRelay::default()))
        });

        assert!(registry.is_registered("NullRelay"));
        let builder = registry.resolve("NullRelay").unwrap();
        let instance = builder();
        assert_eq!(instance.kind(), "actor");
    }

    #[test]
    fn should_return_none_for_unknown_tag() {
        let registry = DeviceRegistry::new();
        assert!(registry.resolve("NoSuchKind").is_none());
    }

    #[test]
    fn should_build_independent_instances() {
        let mut registry = DeviceRegistry::new();
        registry.register("NullRelay", || {
            DeviceInstance::Actor(Box::new(NullRelay::default()))
        });

        let builder = registry.resolve("NullRelay").unwrap();
        let (a, b) = (builder(), builder());
        let (DeviceInstance::Actor(mut a), DeviceInstance::Actor(b)) = (a, b) else {
            panic!("expected actors");
        };
        a.on().unwrap();
        assert_eq!(a.state(), DeviceState::On);
        assert_eq!(b.state(), DeviceState::Off);
    }

    #[test]
    fn should_list_tags_sorted() {
        let mut registry = DeviceRegistry::new();
        registry.register("Zeta", || {
            DeviceInstance::Actor(Box::new(NullRelay::default()))
        });
        registry.register("Alpha", || {
            DeviceInstance::Actor(Box::new(NullRelay::default()))
        });
        assert_eq!(registry.tags(), vec!["Alpha", "Zeta"]);
    }
}
