//! Equipment — behavioral controllers that read named sensors and command
//! named actors to hold a setpoint.
//!
//! Equipment never holds pointers to real devices. It owns *shadow* copies
//! of sensor and actor state, refreshed by orchestrator broadcasts, and
//! emits intent messages instead of calling hardware. Each equipment runs a
//! drain-then-step loop: drain queued inbound messages inside a bounded
//! window, then take one control decision.

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

use brewhub_domain::control::{ControlMode, EquipmentState, HysteresisBand};
use brewhub_domain::error::DeviceError;
use brewhub_domain::message::{EquipmentIntent, EquipmentMessage};
use brewhub_domain::property::Property;
use brewhub_domain::state::{ActorState, DeviceState};

use crate::device::{Device, DeviceCore};
use crate::logger::Logger;
use crate::registry::{DeviceInstance, DeviceRegistry};

/// How long one drain phase may block waiting for inbound messages. Bounds
/// the loop's blocking time and decouples broadcast frequency from control
/// frequency.
const DRAIN_WINDOW: Duration = Duration::from_secs(4);

const DEFAULT_POWER_ON: f64 = 147.0;
const DEFAULT_POWER_OFF: f64 = 150.0;

/// Shadow state, behavioral state, and queue ends shared by every
/// equipment kind.
#[derive(Default)]
pub struct EquipmentCore {
    dev: DeviceCore,
    state: EquipmentState,
    mode: ControlMode,
    sensors: std::collections::HashMap<String, Option<f64>>,
    actors: std::collections::HashMap<String, Option<ActorState>>,
    inbound: Option<mpsc::Receiver<EquipmentMessage>>,
    outbound: Option<mpsc::Sender<EquipmentIntent>>,
}

impl EquipmentCore {
    /// Bind identity, properties, and both queue ends.
    pub fn init(
        &mut self,
        name: &str,
        logger: Logger,
        properties: Vec<Property>,
        inbound: mpsc::Receiver<EquipmentMessage>,
        outbound: mpsc::Sender<EquipmentIntent>,
    ) {
        self.dev.init(name, logger, properties);
        self.inbound = Some(inbound);
        self.outbound = Some(outbound);
    }

    #[must_use]
    pub fn device_core(&self) -> &DeviceCore {
        &self.dev
    }

    pub fn device_core_mut(&mut self) -> &mut DeviceCore {
        &mut self.dev
    }

    #[must_use]
    pub fn state(&self) -> EquipmentState {
        self.state
    }

    #[must_use]
    pub fn mode(&self) -> ControlMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: ControlMode) {
        self.mode = mode;
    }

    /// Watch the named sensor; its shadow starts empty.
    pub fn add_sensor(&mut self, name: &str) {
        self.sensors.insert(name.to_string(), None);
    }

    /// Mirror the named actor; its shadow starts empty.
    pub fn add_actor(&mut self, name: &str) {
        self.actors.insert(name.to_string(), None);
    }

    /// Latest shadow value for a watched sensor, if any has arrived.
    #[must_use]
    pub fn sensor_shadow(&self, name: &str) -> Option<f64> {
        self.sensors.get(name).copied().flatten()
    }

    /// Latest shadow state for a mirrored actor.
    #[must_use]
    pub fn actor_shadow(&self, name: &str) -> Option<&ActorState> {
        self.actors.get(name).and_then(Option::as_ref)
    }

    /// Receive the next inbound message; `None` when the controller is gone.
    pub async fn recv(&mut self) -> Option<EquipmentMessage> {
        match self.inbound.as_mut() {
            Some(rx) => rx.recv().await,
            None => None,
        }
    }

    /// Apply an inbound message to the shadow maps and behavioral state.
    pub fn apply(&mut self, message: EquipmentMessage) {
        match message {
            EquipmentMessage::UpdateDevices { sensors, actors } => {
                for reading in sensors {
                    if let Some(slot) = self.sensors.get_mut(&reading.name) {
                        *slot = Some(reading.value);
                    }
                }
                for actor in actors {
                    if let Some(slot) = self.actors.get_mut(&actor.name) {
                        *slot = Some(actor);
                    }
                }
            }
            EquipmentMessage::ChangeState(state) => {
                if self.state != state {
                    self.dev
                        .log_message(format!("'{}' {} -> {state}", self.dev.name(), self.state));
                    self.state = state;
                }
            }
            EquipmentMessage::SetSetpoint(target) => {
                // Kind-specific; equipment that track a setpoint override
                // handle_message and never reach this arm.
                self.dev
                    .log_debug(format!("unhandled setpoint request {target:.2}"));
            }
        }
    }

    /// Emit an on/off intent for the named actor, mirroring the commanded
    /// state into the shadow so the next step doesn't repeat the command.
    pub async fn command_actor(&mut self, name: &str, desired: DeviceState) {
        let intent = match desired {
            DeviceState::On => EquipmentIntent::ActorOn {
                actor: name.to_string(),
            },
            DeviceState::Off => EquipmentIntent::ActorOff {
                actor: name.to_string(),
            },
        };
        let Some(tx) = &self.outbound else { return };
        if tx.send(intent).await.is_err() {
            self.dev.log_warning("intent queue closed, command dropped");
            return;
        }
        if let Some(slot) = self.actors.get_mut(name) {
            match slot {
                Some(shadow) => shadow.state = desired,
                None => *slot = Some(ActorState::new(name, desired, 0)),
            }
        }
    }

    /// Emit a free-text notification intent for the named sensor.
    pub async fn notify(&mut self, sensor: &str, text: &str) {
        let Some(tx) = &self.outbound else { return };
        let _ = tx
            .send(EquipmentIntent::Notify {
                sensor: sensor.to_string(),
                text: text.to_string(),
            })
            .await;
    }
}

/// A composite controller owning a named subset of sensors and actors.
#[async_trait]
pub trait Equipment: Device {
    fn equipment_core(&self) -> &EquipmentCore;

    fn equipment_core_mut(&mut self) -> &mut EquipmentCore;

    /// Bind identity, properties, and the inbound/outbound queues. Called
    /// instead of [`Device::init`] for equipment kinds.
    fn init_equipment(
        &mut self,
        name: &str,
        logger: Logger,
        properties: Vec<Property>,
        inbound: mpsc::Receiver<EquipmentMessage>,
        outbound: mpsc::Sender<EquipmentIntent>,
    ) -> Result<(), DeviceError>;

    fn add_sensor(&mut self, name: &str) {
        self.equipment_core_mut().add_sensor(name);
    }

    fn add_actor(&mut self, name: &str) {
        self.equipment_core_mut().add_actor(name);
    }

    /// Apply one inbound message.
    fn handle_message(&mut self, message: EquipmentMessage) {
        self.equipment_core_mut().apply(message);
    }

    /// Take one control decision against the current shadow state.
    async fn next_step(&mut self);

    /// Drain-then-step loop: drain inbound messages inside the
    /// [`DRAIN_WINDOW`], then step once. Runs until cancelled or the
    /// controller closes the queue.
    async fn run(&mut self, cancel: CancellationToken) {
        loop {
            let deadline = Instant::now() + DRAIN_WINDOW;
            loop {
                let received = {
                    let core = self.equipment_core_mut();
                    tokio::select! {
                        () = cancel.cancelled() => return,
                        received = tokio::time::timeout_at(deadline, core.recv()) => received,
                    }
                };
                match received {
                    Ok(Some(message)) => self.handle_message(message),
                    Ok(None) => return,
                    Err(_elapsed) => break,
                }
            }
            self.next_step().await;
        }
    }
}

/// Recirculating-infusion mash controller: holds one vessel inside a
/// hysteresis band by switching a named heater actor.
///
/// Registered under the `SimpleRIMS` type tag.
pub struct HysteresisRig {
    core: EquipmentCore,
    band: HysteresisBand,
    temp_sensor: String,
    heater: String,
    pump: String,
    circulator: String,
    pid_warned: bool,
}

impl Default for HysteresisRig {
    fn default() -> Self {
        Self {
            core: EquipmentCore::default(),
            band: HysteresisBand::new(DEFAULT_POWER_ON, DEFAULT_POWER_OFF),
            temp_sensor: String::new(),
            heater: String::new(),
            pump: String::new(),
            circulator: String::new(),
            pid_warned: false,
        }
    }
}

impl HysteresisRig {
    /// The effective setpoint (midpoint of the band).
    #[must_use]
    pub fn setpoint(&self) -> f64 {
        self.band.midpoint()
    }

    #[must_use]
    pub fn band(&self) -> HysteresisBand {
        self.band
    }
}

impl Device for HysteresisRig {
    fn core(&self) -> &DeviceCore {
        self.core.device_core()
    }

    fn core_mut(&mut self) -> &mut DeviceCore {
        self.core.device_core_mut()
    }
}

#[async_trait]
impl Equipment for HysteresisRig {
    fn equipment_core(&self) -> &EquipmentCore {
        &self.core
    }

    fn equipment_core_mut(&mut self) -> &mut EquipmentCore {
        &mut self.core
    }

    fn init_equipment(
        &mut self,
        name: &str,
        logger: Logger,
        properties: Vec<Property>,
        inbound: mpsc::Receiver<EquipmentMessage>,
        outbound: mpsc::Sender<EquipmentIntent>,
    ) -> Result<(), DeviceError> {
        self.core.init(name, logger, properties, inbound, outbound);

        let (temp_sensor, heater, pump, circulator, band, mode) = {
            let props = self.core.device_core_mut().props_mut();
            let temp_sensor =
                props.init_str("Temp Sensor", "", "Sensor watched by the controller");
            let heater = props.init_str("Heater", "", "Actor driving the heating element");
            let pump = props.init_str("Pump", "", "Actor driving the pump");
            let circulator = props.init_str("Circulator", "", "Actor driving the circulator");
            let power_on =
                props.init_f64("PowerOn", DEFAULT_POWER_ON, "Heater power-on threshold");
            let power_off =
                props.init_f64("PowerOff", DEFAULT_POWER_OFF, "Heater power-off threshold");
            let mode = ControlMode::parse(&props.init_str("Control", "hysteresis", "Control mode"));
            let mut band = HysteresisBand::new(power_on, power_off);
            // A configured Setpoint overrides the band midpoint, keeping
            // the band width.
            let setpoint = props.init_f64("Setpoint", band.midpoint(), "Control target");
            band.shift(setpoint - band.midpoint());
            (temp_sensor, heater, pump, circulator, band, mode)
        };

        self.core.set_mode(mode);
        self.core.add_sensor(&temp_sensor);
        for actor in [&heater, &pump, &circulator] {
            if !actor.is_empty() {
                self.core.add_actor(actor);
            }
        }

        self.temp_sensor = temp_sensor;
        self.heater = heater;
        self.pump = pump;
        self.circulator = circulator;
        self.band = band;
        Ok(())
    }

    fn handle_message(&mut self, message: EquipmentMessage) {
        if let EquipmentMessage::SetSetpoint(target) = message {
            let delta = target - self.band.midpoint();
            self.band.shift(delta);
            self.core
                .device_core()
                .log_message(format!("setpoint moved to {target:.2}"));
        } else {
            self.core.apply(message);
        }
    }

    async fn next_step(&mut self) {
        if self.core.state() != EquipmentState::Active {
            return;
        }
        match self.core.mode() {
            ControlMode::Hysteresis => {
                let reading = self.core.sensor_shadow(&self.temp_sensor);
                let heater_state = self.core.actor_shadow(&self.heater).map(|a| a.state);
                if let Some(desired) = self.band.decide(reading, heater_state) {
                    let heater = self.heater.clone();
                    self.core
                        .device_core()
                        .log_message(format!("heater '{heater}' -> {desired}"));
                    self.core.command_actor(&heater, desired).await;
                }
            }
            ControlMode::Pid => {
                // Reserved extension point; say so once instead of silently
                // doing nothing.
                if !self.pid_warned {
                    self.pid_warned = true;
                    self.core
                        .device_core()
                        .log_warning("PID control mode is not implemented");
                }
            }
        }
    }
}

/// Register the built-in equipment kinds.
pub fn register_equipment(registry: &mut DeviceRegistry) {
    registry.register("SimpleRIMS", || {
        DeviceInstance::Equipment(Box::new(HysteresisRig::default()))
    });
}
