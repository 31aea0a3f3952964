//! Equipment state machine core — behavioral state, control mode, and the
//! hysteresis decision function.
//!
//! This module is pure math over shadow values; it never touches hardware
//! and never emits messages itself. Equipment logic calls [`HysteresisBand::decide`]
//! and turns the answer into an intent message.

use crate::state::DeviceState;

/// Behavioral state of an equipment controller.
///
/// Transitions to [`Active`](Self::Active) happen only via an explicit
/// command; the control loop is a no-op while [`Idle`](Self::Idle).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EquipmentState {
    #[default]
    Idle,
    Active,
}

impl EquipmentState {
    /// Parse a requested state, rejecting anything unrecognized so an
    /// invalid command leaves the current state unchanged.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "idle" => Some(Self::Idle),
            "active" => Some(Self::Active),
            _ => None,
        }
    }
}

impl std::fmt::Display for EquipmentState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => f.write_str("idle"),
            Self::Active => f.write_str("active"),
        }
    }
}

/// Control algorithm an equipment runs while active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControlMode {
    #[default]
    Hysteresis,
    /// Reserved extension point — explicitly unimplemented, never a silent
    /// no-op elsewhere in the system.
    Pid,
}

impl ControlMode {
    /// Parse the `Control` property value; unknown modes fall back to
    /// hysteresis.
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pid" => Self::Pid,
            _ => Self::Hysteresis,
        }
    }
}

/// On/off control band with separate power-on and power-off thresholds to
/// prevent rapid toggling.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HysteresisBand {
    /// Below this temperature the heater should be on.
    pub power_on: f64,
    /// Above this temperature the heater should be off.
    pub power_off: f64,
}

impl HysteresisBand {
    #[must_use]
    pub fn new(power_on: f64, power_off: f64) -> Self {
        Self {
            power_on,
            power_off,
        }
    }

    /// Decide the desired heater state.
    ///
    /// Fail-safe: with no basis reading the answer is always `None` — the
    /// controller never commands hardware blind. A heater already in the
    /// desired state also yields `None`, so no redundant commands are
    /// emitted.
    #[must_use]
    pub fn decide(
        &self,
        reading: Option<f64>,
        heater: Option<DeviceState>,
    ) -> Option<DeviceState> {
        let value = reading?;
        if value > self.power_off && heater != Some(DeviceState::Off) {
            return Some(DeviceState::Off);
        }
        if value < self.power_on && heater != Some(DeviceState::On) {
            return Some(DeviceState::On);
        }
        None
    }

    /// Move both thresholds by `delta`, keeping the band width — used when
    /// the setpoint changes.
    pub fn shift(&mut self, delta: f64) {
        self.power_on += delta;
        self.power_off += delta;
    }

    /// The midpoint of the band, reported as the effective setpoint.
    #[must_use]
    pub fn midpoint(&self) -> f64 {
        f64::midpoint(self.power_on, self.power_off)
    }
}
