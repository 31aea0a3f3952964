//! The control orchestrator.
//!
//! Owns every live device. Instantiates the collections from the rig
//! document, spawns the sensor and equipment tasks, and runs the single
//! event loop that mutates authoritative state: sensor readings, equipment
//! intents, web commands, and a periodic tick all funnel into one task, so
//! no lock ever guards a device.

use std::collections::HashMap;

use tokio::sync::{mpsc, oneshot};
use tokio::time::Duration;
use tokio_util::sync::CancellationToken;

use brewhub_domain::config::RigConfig;
use brewhub_domain::control::EquipmentState;
use brewhub_domain::message::{EquipmentIntent, EquipmentMessage, WebCommand};
use brewhub_domain::state::SensorReading;

use crate::device::{Actor, Buzzer, Sensor};
use crate::equipment::Equipment;
use crate::logger::Logger;
use crate::registry::{DeviceInstance, DeviceRegistry};
use crate::sensor::run_sensor;

/// Event-loop heartbeat; equipment gets a snapshot at least this often once
/// anything has changed.
const TICK: Duration = Duration::from_secs(3);

/// Per-equipment inbound queue depth.
const EQUIPMENT_QUEUE: usize = 4;
/// Per-sensor notification queue depth.
const NOTIFY_QUEUE: usize = 4;
const READING_QUEUE: usize = 32;
const INTENT_QUEUE: usize = 16;
const COMMAND_QUEUE: usize = 16;

/// One web command with its reply slot.
pub struct WebRequest {
    pub command: WebCommand,
    pub device: String,
    pub value: Vec<u8>,
    pub reply: oneshot::Sender<String>,
}

/// Device collections built from the rig document, ready to start.
pub struct Controller {
    log: Logger,
    sensors: Vec<Box<dyn Sensor>>,
    actors: HashMap<String, Box<dyn Actor>>,
    buzzers: Vec<Box<dyn Buzzer>>,
    equipment: Vec<Box<dyn Equipment>>,
    equip_txs: HashMap<String, mpsc::Sender<EquipmentMessage>>,
    setpoints: HashMap<String, f64>,
    intent_rx: mpsc::Receiver<EquipmentIntent>,
}

impl Controller {
    /// Instantiate every declared device through the registry.
    ///
    /// Unknown type tags, kind mismatches, and init failures skip the one
    /// declaration with a logged warning; the rest of the rig still loads.
    #[must_use]
    pub fn build(config: &RigConfig, registry: &DeviceRegistry, log: Logger) -> Self {
        let (intent_tx, intent_rx) = mpsc::channel(INTENT_QUEUE);

        let mut sensors: Vec<Box<dyn Sensor>> = Vec::new();
        let mut actors: HashMap<String, Box<dyn Actor>> = HashMap::new();
        let mut buzzers: Vec<Box<dyn Buzzer>> = Vec::new();
        let mut equipment: Vec<Box<dyn Equipment>> = Vec::new();
        let mut equip_txs = HashMap::new();
        let mut setpoints = HashMap::new();

        for decl in &config.sensors {
            let Some(instance) = Self::instantiate(registry, &log, &decl.name, &decl.type_tag)
            else {
                continue;
            };
            let DeviceInstance::Sensor(mut sensor) = instance else {
                log.warning(format!(
                    "'{}': type '{}' is not a sensor, skipped",
                    decl.name, decl.type_tag
                ));
                continue;
            };
            match sensor.init(&decl.name, log.clone(), decl.properties()) {
                Ok(()) => sensors.push(sensor),
                Err(err) => log.warning(format!("'{}' init failed, skipped: {err}", decl.name)),
            }
        }

        for decl in &config.actors {
            let Some(instance) = Self::instantiate(registry, &log, &decl.name, &decl.type_tag)
            else {
                continue;
            };
            let DeviceInstance::Actor(mut actor) = instance else {
                log.warning(format!(
                    "'{}': type '{}' is not an actor, skipped",
                    decl.name, decl.type_tag
                ));
                continue;
            };
            match actor.init(&decl.name, log.clone(), decl.properties()) {
                Ok(()) => {
                    actors.insert(decl.name.clone(), actor);
                }
                Err(err) => log.warning(format!("'{}' init failed, skipped: {err}", decl.name)),
            }
        }

        for decl in &config.buzzers {
            let Some(instance) = Self::instantiate(registry, &log, &decl.name, &decl.type_tag)
            else {
                continue;
            };
            let DeviceInstance::Buzzer(mut buzzer) = instance else {
                log.warning(format!(
                    "'{}': type '{}' is not a buzzer, skipped",
                    decl.name, decl.type_tag
                ));
                continue;
            };
            match buzzer.init(&decl.name, log.clone(), decl.properties()) {
                Ok(()) => buzzers.push(buzzer),
                Err(err) => log.warning(format!("'{}' init failed, skipped: {err}", decl.name)),
            }
        }

        for decl in &config.equipment {
            let Some(instance) = Self::instantiate(registry, &log, &decl.name, &decl.type_tag)
            else {
                continue;
            };
            let DeviceInstance::Equipment(mut equip) = instance else {
                log.warning(format!(
                    "'{}': type '{}' is not an equipment, skipped",
                    decl.name, decl.type_tag
                ));
                continue;
            };
            let (tx, rx) = mpsc::channel(EQUIPMENT_QUEUE);
            match equip.init_equipment(
                &decl.name,
                log.clone(),
                decl.properties(),
                rx,
                intent_tx.clone(),
            ) {
                Ok(()) => {
                    let props = equip.properties();
                    let power_on = props
                        .value("PowerOn")
                        .and_then(brewhub_domain::property::PropertyValue::as_f64)
                        .unwrap_or(147.0);
                    let power_off = props
                        .value("PowerOff")
                        .and_then(brewhub_domain::property::PropertyValue::as_f64)
                        .unwrap_or(150.0);
                    let setpoint = props
                        .value("Setpoint")
                        .and_then(brewhub_domain::property::PropertyValue::as_f64)
                        .unwrap_or_else(|| f64::midpoint(power_on, power_off));
                    setpoints.insert(decl.name.clone(), setpoint);
                    equip_txs.insert(decl.name.clone(), tx);
                    equipment.push(equip);
                }
                Err(err) => log.warning(format!("'{}' init failed, skipped: {err}", decl.name)),
            }
        }

        log.message(format!(
            "rig '{}' loaded: {} sensors, {} actors, {} buzzers, {} equipment",
            config.name,
            sensors.len(),
            actors.len(),
            buzzers.len(),
            equipment.len()
        ));

        Self {
            log,
            sensors,
            actors,
            buzzers,
            equipment,
            equip_txs,
            setpoints,
            intent_rx,
        }
    }

    fn instantiate(
        registry: &DeviceRegistry,
        log: &Logger,
        name: &str,
        tag: &str,
    ) -> Option<DeviceInstance> {
        let Some(builder) = registry.resolve(tag) else {
            log.warning(format!("'{name}': unknown device type '{tag}', skipped"));
            return None;
        };
        Some(builder())
    }

    /// Start every device and spawn the event loop.
    ///
    /// A device whose `on_start` fails is dropped with a logged error; the
    /// rest of the rig keeps running.
    #[must_use]
    pub fn start(mut self, cancel: CancellationToken) -> ControllerHandle {
        let (command_tx, command_rx) = mpsc::channel(COMMAND_QUEUE);
        let (reading_tx, reading_rx) = mpsc::channel(READING_QUEUE);

        let mut readings: HashMap<String, Option<f64>> = HashMap::new();
        let mut notify_txs: HashMap<String, mpsc::Sender<String>> = HashMap::new();
        for mut sensor in self.sensors {
            let name = sensor.name().to_string();
            if let Err(err) = sensor.on_start() {
                self.log.error(format!("'{name}' start failed, dropped: {err}"));
                continue;
            }
            readings.insert(name.clone(), None);
            let (notify_tx, notify_rx) = mpsc::channel(NOTIFY_QUEUE);
            notify_txs.insert(name, notify_tx);
            tokio::spawn(run_sensor(
                sensor,
                reading_tx.clone(),
                notify_rx,
                cancel.clone(),
                self.log.clone(),
            ));
        }

        self.actors.retain(|name, actor| match actor.on_start() {
            Ok(()) => true,
            Err(err) => {
                self.log.error(format!("'{name}' start failed, dropped: {err}"));
                false
            }
        });

        self.buzzers.retain_mut(|buzzer| match buzzer.on_start() {
            Ok(()) => true,
            Err(err) => {
                self.log
                    .error(format!("'{}' start failed, dropped: {err}", buzzer.name()));
                false
            }
        });

        for mut equip in self.equipment {
            let equip_cancel = cancel.clone();
            tokio::spawn(async move {
                equip.run(equip_cancel).await;
            });
        }

        let handle = ControllerHandle {
            commands: command_tx,
            equipment: self.equip_txs.clone(),
            cancel: cancel.clone(),
        };

        let event_loop = EventLoop {
            log: self.log,
            actors: self.actors,
            buzzers: self.buzzers,
            readings,
            setpoints: self.setpoints,
            equip_txs: self.equip_txs,
            notify_txs,
            reading_rx,
            intent_rx: self.intent_rx,
            command_rx,
        };
        tokio::spawn(event_loop.run(cancel));

        handle
    }
}

/// Clonable handle onto a running controller.
#[derive(Clone)]
pub struct ControllerHandle {
    commands: mpsc::Sender<WebRequest>,
    equipment: HashMap<String, mpsc::Sender<EquipmentMessage>>,
    cancel: CancellationToken,
}

impl ControllerHandle {
    /// Submit one web command and wait for its reply string. Any transport
    /// failure answers `"bad"`, like an unreadable device.
    pub async fn request(&self, command: WebCommand, device: &str, value: &[u8]) -> String {
        let (reply_tx, reply_rx) = oneshot::channel();
        let request = WebRequest {
            command,
            device: device.to_string(),
            value: value.to_vec(),
            reply: reply_tx,
        };
        if self.commands.send(request).await.is_err() {
            return "bad".to_string();
        }
        reply_rx.await.unwrap_or_else(|_| "bad".to_string())
    }

    /// Request a behavioral-state transition on the named equipment.
    /// Returns `false` when the equipment does not exist.
    pub async fn set_equipment_state(&self, name: &str, state: EquipmentState) -> bool {
        match self.equipment.get(name) {
            Some(tx) => tx.send(EquipmentMessage::ChangeState(state)).await.is_ok(),
            None => false,
        }
    }

    /// Begin an orderly shutdown of every task.
    pub fn shutdown(&self) {
        self.cancel.cancel();
    }
}

/// The single task allowed to mutate authoritative device state.
struct EventLoop {
    log: Logger,
    actors: HashMap<String, Box<dyn Actor>>,
    buzzers: Vec<Box<dyn Buzzer>>,
    readings: HashMap<String, Option<f64>>,
    setpoints: HashMap<String, f64>,
    equip_txs: HashMap<String, mpsc::Sender<EquipmentMessage>>,
    notify_txs: HashMap<String, mpsc::Sender<String>>,
    reading_rx: mpsc::Receiver<SensorReading>,
    intent_rx: mpsc::Receiver<EquipmentIntent>,
    command_rx: mpsc::Receiver<WebRequest>,
}

impl EventLoop {
    async fn run(mut self, cancel: CancellationToken) {
        for buzzer in &mut self.buzzers {
            if let Err(err) = buzzer.play_sound("Main").await {
                self.log
                    .warning(format!("'{}' startup sound failed: {err}", buzzer.name()));
            }
        }

        let mut tick = tokio::time::interval(TICK);
        loop {
            let mut changed_sensors: Vec<SensorReading> = Vec::new();
            let mut actors_dirty = false;
            tokio::select! {
                () = cancel.cancelled() => break,
                Some(reading) = self.reading_rx.recv() => {
                    self.readings.insert(reading.name.clone(), Some(reading.value));
                    changed_sensors.push(reading);
                }
                Some(intent) = self.intent_rx.recv() => {
                    actors_dirty = self.apply_intent(intent);
                }
                Some(request) = self.command_rx.recv() => {
                    actors_dirty = self.handle_command(request);
                }
                _ = tick.tick() => {}
            }
            if !changed_sensors.is_empty() || actors_dirty {
                self.broadcast(changed_sensors, actors_dirty);
            }
        }
        self.stop_devices();
    }

    /// Execute one equipment intent against the authoritative collections.
    fn apply_intent(&mut self, intent: EquipmentIntent) -> bool {
        match intent {
            EquipmentIntent::ActorOn { actor } => self.switch_actor(&actor, true),
            EquipmentIntent::ActorOff { actor } => self.switch_actor(&actor, false),
            EquipmentIntent::Notify { sensor, text } => {
                match self.notify_txs.get(&sensor) {
                    Some(tx) => {
                        // Notifications are advisory; a full queue drops them.
                        let _ = tx.try_send(text);
                    }
                    None => self
                        .log
                        .warning(format!("notify for unknown sensor '{sensor}' dropped")),
                }
                false
            }
        }
    }

    fn switch_actor(&mut self, name: &str, on: bool) -> bool {
        let Some(actor) = self.actors.get_mut(name) else {
            self.log
                .warning(format!("intent for unknown actor '{name}' dropped"));
            return false;
        };
        let result = if on { actor.on() } else { actor.off() };
        match result {
            Ok(()) => true,
            Err(err) => {
                self.log.error(format!("actor '{name}' switch failed: {err}"));
                false
            }
        }
    }

    /// Push the changed state to every equipment. Full queues drop the
    /// snapshot; the next one carries fresher state anyway.
    fn broadcast(&self, sensors: Vec<SensorReading>, actors_dirty: bool) {
        let actors = if actors_dirty {
            self.actors.values().map(|a| a.actor_state()).collect()
        } else {
            Vec::new()
        };
        for tx in self.equip_txs.values() {
            let _ = tx.try_send(EquipmentMessage::UpdateDevices {
                sensors: sensors.clone(),
                actors: actors.clone(),
            });
        }
    }

    /// Answer one web command. The reply strings (`"ON"`, `"OFF"`, a `%.2f`
    /// float, `"bad"`, `"ack"`, `"Unknown"`) are a fixed wire contract.
    fn handle_command(&mut self, request: WebRequest) -> bool {
        let mut actors_dirty = false;
        let reply = match request.command {
            WebCommand::SetRelay => match self.actors.get_mut(&request.device) {
                Some(actor) => {
                    let result = if request.value == b"ON" {
                        actor.on()
                    } else {
                        actor.off()
                    };
                    match result {
                        Ok(()) => {
                            actors_dirty = true;
                            actor.state().to_string()
                        }
                        Err(err) => {
                            self.log
                                .error(format!("actor '{}' switch failed: {err}", request.device));
                            "bad".to_string()
                        }
                    }
                }
                // Historical quirk kept for front-end compatibility: an
                // unknown relay acknowledges instead of failing.
                None => "ack".to_string(),
            },
            WebCommand::RelayOn | WebCommand::RelayOff => {
                if let Some(actor) = self.actors.get_mut(&request.device) {
                    let result = if request.command == WebCommand::RelayOn {
                        actor.on()
                    } else {
                        actor.off()
                    };
                    match result {
                        Ok(()) => actors_dirty = true,
                        Err(err) => self
                            .log
                            .error(format!("actor '{}' switch failed: {err}", request.device)),
                    }
                }
                "ack".to_string()
            }
            WebCommand::GetSensorValue => self
                .readings
                .get(&request.device)
                .copied()
                .flatten()
                .map_or_else(|| "bad".to_string(), |value| format!("{value:.2}")),
            WebCommand::GetActorValue => self
                .actors
                .get(&request.device)
                .map_or_else(|| "bad".to_string(), |actor| actor.state().to_string()),
            WebCommand::GetSetpoint => self
                .setpoints
                .get(&request.device)
                .map_or_else(|| "bad".to_string(), |value| format!("{value:.2}")),
            WebCommand::SetSetpoint => self.set_setpoint(&request.device, &request.value),
            WebCommand::Unknown => "Unknown".to_string(),
        };
        // The requester may have given up; that is not our problem.
        let _ = request.reply.send(reply);
        actors_dirty
    }

    fn set_setpoint(&mut self, device: &str, raw: &[u8]) -> String {
        let Ok(text) = std::str::from_utf8(raw) else {
            return "bad".to_string();
        };
        let Ok(target) = text.trim().parse::<f64>() else {
            return "bad".to_string();
        };
        let Some(tx) = self.equip_txs.get(device) else {
            return "bad".to_string();
        };
        self.setpoints.insert(device.to_string(), target);
        let _ = tx.try_send(EquipmentMessage::SetSetpoint(target));
        "ack".to_string()
    }

    /// Leave the rig in a safe state: every actor off, hardware released.
    fn stop_devices(&mut self) {
        for (name, actor) in &mut self.actors {
            if let Err(err) = actor.off() {
                self.log.error(format!("actor '{name}' final off failed: {err}"));
            }
            if let Err(err) = actor.on_stop() {
                self.log.warning(format!("actor '{name}' stop failed: {err}"));
            }
        }
        for buzzer in &mut self.buzzers {
            if let Err(err) = buzzer.on_stop() {
                self.log
                    .warning(format!("'{}' stop failed: {err}", buzzer.name()));
            }
        }
        self.log.message("controller stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::device::{ActorCore, Device, DeviceCore};
    use async_trait::async_trait;
    use brewhub_domain::config::{DeviceConfig, PropertyConfig};
    use brewhub_domain::error::DeviceError;
    use brewhub_domain::property::PropertyKind;

    struct FixedSensor {
        core: DeviceCore,
        value: f64,
    }

    impl Device for FixedSensor {
        fn core(&self) -> &DeviceCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut DeviceCore {
            &mut self.core
        }
    }

    #[async_trait]
    impl Sensor for FixedSensor {
        fn units(&self) -> &str {
            "°F"
        }

        async fn on_read(&mut self) -> Result<f64, DeviceError> {
            Ok(self.value)
        }

        fn poll_interval(&self) -> Duration {
            Duration::from_millis(5)
        }

        fn handle_notification(&mut self, text: &str) {
            if let Some(raw) = text.strip_prefix("set:") {
                if let Ok(value) = raw.parse() {
                    self.value = value;
                }
            }
        }
    }

    #[derive(Default)]
    struct TestRelay {
        core: DeviceCore,
        actor: ActorCore,
    }

    impl Device for TestRelay {
        fn core(&self) -> &DeviceCore {
            &self.core
        }

        fn core_mut(&mut self) -> &mut DeviceCore {
            &mut self.core
        }
    }

    impl Actor for TestRelay {
        fn on(&mut self) -> Result<(), DeviceError> {
            self.actor.set_state(brewhub_domain::state::DeviceState::On);
            Ok(())
        }

        fn off(&mut self) -> Result<(), DeviceError> {
            self.actor.set_state(brewhub_domain::state::DeviceState::Off);
            Ok(())
        }

        fn set_power(&mut self, power: u8) -> Result<(), DeviceError> {
            self.actor.set_power(power);
            Ok(())
        }

        fn state(&self) -> brewhub_domain::state::DeviceState {
            self.actor.state()
        }

        fn power_level(&self) -> u8 {
            self.actor.power()
        }
    }

    fn test_registry() -> DeviceRegistry {
        let mut registry = DeviceRegistry::new();
        registry.register("FixedSensor", || {
            DeviceInstance::Sensor(Box::new(FixedSensor {
                core: DeviceCore::default(),
                value: 148.0,
            }))
        });
        registry.register("TestRelay", || {
            DeviceInstance::Actor(Box::new(TestRelay::default()))
        });
        crate::equipment::register_equipment(&mut registry);
        registry
    }

    fn test_config() -> RigConfig {
        RigConfig {
            name: "Test Rig".to_string(),
            version: "1".to_string(),
            sensors: vec![DeviceConfig {
                name: "Temp Sensor 1".to_string(),
                type_tag: "FixedSensor".to_string(),
                properties: Vec::new(),
            }],
            actors: vec![
                DeviceConfig {
                    name: "SSR 1".to_string(),
                    type_tag: "TestRelay".to_string(),
                    properties: Vec::new(),
                },
                DeviceConfig {
                    name: "Pump 1".to_string(),
                    type_tag: "TestRelay".to_string(),
                    properties: Vec::new(),
                },
            ],
            buzzers: Vec::new(),
            equipment: vec![DeviceConfig {
                name: "Mash Tun".to_string(),
                type_tag: "SimpleRIMS".to_string(),
                properties: vec![
                    PropertyConfig::new("Temp Sensor", PropertyKind::String, "Temp Sensor 1", ""),
                    PropertyConfig::new("Heater", PropertyKind::String, "SSR 1", ""),
                    PropertyConfig::new("PowerOn", PropertyKind::Float, "147", ""),
                    PropertyConfig::new("PowerOff", PropertyKind::Float, "150", ""),
                ],
            }],
        }
    }

    async fn poll_until(
        handle: &ControllerHandle,
        command: WebCommand,
        device: &str,
        expected: &str,
    ) -> String {
        let mut last = String::new();
        for _ in 0..200 {
            last = handle.request(command, device, b"").await;
            if last == expected {
                return last;
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
        }
        last
    }

    #[tokio::test]
    async fn should_skip_unknown_device_types() {
        let mut config = test_config();
        config.actors.push(DeviceConfig {
            name: "Mystery".to_string(),
            type_tag: "NoSuchKind".to_string(),
            properties: Vec::new(),
        });

        let handle = Controller::build(&config, &test_registry(), Logger::disconnected())
            .start(CancellationToken::new());

        // The bogus actor was skipped; a known one still answers.
        assert_eq!(
            handle.request(WebCommand::GetActorValue, "Mystery", b"").await,
            "bad"
        );
        assert_eq!(
            handle.request(WebCommand::GetActorValue, "SSR 1", b"").await,
            "OFF"
        );
        handle.shutdown();
    }

    #[tokio::test]
    async fn should_skip_kind_mismatch_declarations() {
        let mut config = test_config();
        // A sensor kind declared in the actors section.
        config.actors.push(DeviceConfig {
            name: "Confused".to_string(),
            type_tag: "FixedSensor".to_string(),
            properties: Vec::new(),
        });

        let handle = Controller::build(&config, &test_registry(), Logger::disconnected())
            .start(CancellationToken::new());
        assert_eq!(
            handle.request(WebCommand::GetActorValue, "Confused", b"").await,
            "bad"
        );
        handle.shutdown();
    }

    #[tokio::test]
    async fn should_answer_sensor_queries_from_authoritative_state() {
        let handle = Controller::build(&test_config(), &test_registry(), Logger::disconnected())
            .start(CancellationToken::new());

        // Before the first reading lands the value is unavailable, never a
        // stale or invented number.
        let value = poll_until(&handle, WebCommand::GetSensorValue, "Temp Sensor 1", "148.00").await;
        assert_eq!(value, "148.00");
        assert_eq!(
            handle.request(WebCommand::GetSensorValue, "Nope", b"").await,
            "bad"
        );
        handle.shutdown();
    }

    #[tokio::test]
    async fn should_follow_the_relay_command_contract() {
        let handle = Controller::build(&test_config(), &test_registry(), Logger::disconnected())
            .start(CancellationToken::new());

        assert_eq!(
            handle.request(WebCommand::SetRelay, "Pump 1", b"ON").await,
            "ON"
        );
        assert_eq!(
            handle.request(WebCommand::GetActorValue, "Pump 1", b"").await,
            "ON"
        );
        assert_eq!(
            handle.request(WebCommand::SetRelay, "Pump 1", b"OFF").await,
            "OFF"
        );
        // Unknown relay acknowledges.
        assert_eq!(
            handle.request(WebCommand::SetRelay, "Nope", b"ON").await,
            "ack"
        );
        // The legacy on/off commands always acknowledge.
        assert_eq!(
            handle.request(WebCommand::RelayOn, "Pump 1", b"").await,
            "ack"
        );
        assert_eq!(
            handle.request(WebCommand::GetActorValue, "Pump 1", b"").await,
            "ON"
        );
        assert_eq!(
            handle.request(WebCommand::RelayOff, "Pump 1", b"").await,
            "ack"
        );
        handle.shutdown();
    }

    #[tokio::test]
    async fn should_track_setpoints_per_equipment() {
        let handle = Controller::build(&test_config(), &test_registry(), Logger::disconnected())
            .start(CancellationToken::new());

        assert_eq!(
            handle.request(WebCommand::GetSetpoint, "Mash Tun", b"").await,
            "148.50"
        );
        assert_eq!(
            handle
                .request(WebCommand::SetSetpoint, "Mash Tun", b"152.0")
                .await,
            "ack"
        );
        assert_eq!(
            handle.request(WebCommand::GetSetpoint, "Mash Tun", b"").await,
            "152.00"
        );
        assert_eq!(
            handle.request(WebCommand::SetSetpoint, "Mash Tun", b"hot").await,
            "bad"
        );
        assert_eq!(
            handle.request(WebCommand::SetSetpoint, "Nope", b"150").await,
            "bad"
        );
        handle.shutdown();
    }

    #[tokio::test]
    async fn should_answer_unknown_commands_with_sentinel() {
        let handle = Controller::build(&test_config(), &test_registry(), Logger::disconnected())
            .start(CancellationToken::new());
        assert_eq!(
            handle.request(WebCommand::Unknown, "whatever", b"").await,
            "Unknown"
        );
        handle.shutdown();
    }

    #[tokio::test(start_paused = true)]
    async fn should_drive_heater_through_active_equipment() {
        let handle = Controller::build(&test_config(), &test_registry(), Logger::disconnected())
            .start(CancellationToken::new());

        // Sensor reads a constant 148.0, inside the 147..150 band: no
        // command expected while idle or in-band.
        assert!(
            handle
                .set_equipment_state("Mash Tun", EquipmentState::Active)
                .await
        );
        // Move the setpoint up so 148.0 falls below the new power-on
        // threshold and the heater must switch on.
        assert_eq!(
            handle
                .request(WebCommand::SetSetpoint, "Mash Tun", b"155.0")
                .await,
            "ack"
        );
        let state = poll_until(&handle, WebCommand::GetActorValue, "SSR 1", "ON").await;
        assert_eq!(state, "ON");
        handle.shutdown();
    }

    #[tokio::test]
    async fn should_reject_state_change_for_unknown_equipment() {
        let handle = Controller::build(&test_config(), &test_registry(), Logger::disconnected())
            .start(CancellationToken::new());
        assert!(
            !handle
                .set_equipment_state("Nope", EquipmentState::Active)
                .await
        );
        handle.shutdown();
    }
}
