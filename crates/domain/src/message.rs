//! Messages exchanged between the orchestrator, equipment, and the web
//! control surface.
//!
//! Equipment never holds references to real devices — it receives snapshot
//! messages and emits *intent* messages describing desired actuator state.
//! Only the orchestrator turns intents into hardware calls, which prevents
//! two equipment instances from racing to actuate the same relay.

use crate::control::EquipmentState;
use crate::state::{ActorState, SensorReading};

/// Messages delivered to an equipment's inbound queue.
#[derive(Debug, Clone, PartialEq)]
pub enum EquipmentMessage {
    /// Periodic snapshot of authoritative sensor and actor state. Either
    /// list may be empty when the corresponding side is unchanged.
    UpdateDevices {
        sensors: Vec<SensorReading>,
        actors: Vec<ActorState>,
    },
    /// Explicit behavioral-state transition request.
    ChangeState(EquipmentState),
    /// Move the control target; the equipment shifts its band accordingly.
    SetSetpoint(f64),
}

/// Intents emitted by equipment onto the orchestrator's outbound queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EquipmentIntent {
    /// Turn the named actor on.
    ActorOn { actor: String },
    /// Turn the named actor off.
    ActorOff { actor: String },
    /// Free-text notification for the named sensor; sensors that don't
    /// understand the text ignore it silently.
    Notify { sensor: String, text: String },
}

/// Commands arriving from the web control surface.
///
/// The string replies (`"ON"`, `"OFF"`, a `%.2f` float, `"bad"`, `"ack"`,
/// `"Unknown"`) are the de facto wire format consumed by the front end and
/// are preserved byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebCommand {
    SetRelay,
    RelayOn,
    RelayOff,
    GetSensorValue,
    GetActorValue,
    GetSetpoint,
    SetSetpoint,
    /// Sentinel for a command string the parser did not recognize; always
    /// answered with `"Unknown"`.
    Unknown,
}
