//! Device state — measurements and actuator state shared between the
//! orchestrator and equipment.

use serde::{Deserialize, Serialize};

/// Binary power state of an actuator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum DeviceState {
    On,
    #[default]
    Off,
}

impl DeviceState {
    #[must_use]
    pub fn is_on(self) -> bool {
        matches!(self, Self::On)
    }

    /// The state after an on/off toggle.
    #[must_use]
    pub fn toggled(self) -> Self {
        match self {
            Self::On => Self::Off,
            Self::Off => Self::On,
        }
    }
}

impl std::fmt::Display for DeviceState {
    /// Renders the web contract form: `ON` / `OFF`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::On => f.write_str("ON"),
            Self::Off => f.write_str("OFF"),
        }
    }
}

/// An immutable point-in-time measurement produced by a sensor's polling
/// loop and consumed exactly once by the orchestrator.
#[derive(Debug, Clone, PartialEq)]
pub struct SensorReading {
    pub name: String,
    pub value: f64,
}

impl SensorReading {
    #[must_use]
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Actuator state. The authoritative copy lives in the orchestrator's actor
/// map; equipment holds an eventually-consistent *shadow* copy, only as
/// fresh as the last periodic broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorState {
    pub name: String,
    pub state: DeviceState,
    /// Power level in percent, for variable-power actuators.
    pub power: u8,
}

impl ActorState {
    #[must_use]
    pub fn new(name: impl Into<String>, state: DeviceState, power: u8) -> Self {
        Self {
            name: name.into(),
            state,
            power,
        }
    }
}
