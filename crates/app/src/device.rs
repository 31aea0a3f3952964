//! Device base and capability contracts.
//!
//! Concrete device kinds hold a reusable [`DeviceCore`] (composition, not
//! inheritance) and implement one of the small capability traits on top.
//! Lifecycle: built by the registry → [`Device::init`] binds name, logger,
//! and properties → [`Device::on_start`] acquires hardware → runs →
//! [`Device::on_stop`] releases hardware.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use brewhub_domain::error::DeviceError;
use brewhub_domain::property::{Property, PropertySet};
use brewhub_domain::state::{ActorState, DeviceState};

use crate::logger::Logger;

/// Identity, properties, and logging façade shared by every device kind.
#[derive(Clone)]
pub struct DeviceCore {
    name: String,
    dummy: bool,
    props: PropertySet,
    log: Logger,
}

impl Default for DeviceCore {
    fn default() -> Self {
        Self {
            name: "Unknown".to_string(),
            dummy: false,
            props: PropertySet::new(),
            log: Logger::disconnected(),
        }
    }
}

impl DeviceCore {
    /// Bind identity, logger, and configuration-supplied properties.
    ///
    /// Properties are only mutated here, before the device begins concurrent
    /// operation; afterwards the set is effectively immutable.
    pub fn init(&mut self, name: &str, logger: Logger, properties: Vec<Property>) {
        self.name = name.to_string();
        self.log = logger;
        self.props.add_all(properties);
        self.dummy = self
            .props
            .value("Dummy")
            .and_then(brewhub_domain::property::PropertyValue::as_bool)
            .unwrap_or(false);
        self.log_debug(format!("init device '{name}'"));
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn is_dummy(&self) -> bool {
        self.dummy
    }

    #[must_use]
    pub fn props(&self) -> &PropertySet {
        &self.props
    }

    pub fn props_mut(&mut self) -> &mut PropertySet {
        &mut self.props
    }

    #[must_use]
    pub fn logger(&self) -> &Logger {
        &self.log
    }

    pub fn log_message(&self, text: impl AsRef<str>) {
        self.log.message(text);
    }

    pub fn log_warning(&self, text: impl AsRef<str>) {
        self.log.warning(text);
    }

    pub fn log_error(&self, text: impl AsRef<str>) {
        self.log.error(text);
    }

    pub fn log_debug(&self, text: impl AsRef<str>) {
        self.log.debug(text);
    }
}

/// Common contract every device kind fulfils.
pub trait Device: Send {
    /// Access the embedded [`DeviceCore`].
    fn core(&self) -> &DeviceCore;

    fn core_mut(&mut self) -> &mut DeviceCore;

    /// Bind name, logger, and properties. Called exactly once, before
    /// [`on_start`](Self::on_start).
    fn init(
        &mut self,
        name: &str,
        logger: Logger,
        properties: Vec<Property>,
    ) -> Result<(), DeviceError> {
        self.core_mut().init(name, logger, properties);
        Ok(())
    }

    fn name(&self) -> &str {
        self.core().name()
    }

    fn is_dummy(&self) -> bool {
        self.core().is_dummy()
    }

    fn properties(&self) -> &PropertySet {
        self.core().props()
    }

    /// Acquire hardware resources. A failure aborts only this device's
    /// startup, never the process.
    fn on_start(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    /// Release hardware resources.
    fn on_stop(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}

/// On/off and power-level bookkeeping shared by every actor kind.
///
/// Concrete kinds differ only in how `on`/`off` touch the hardware; the
/// state tracking lives here.
#[derive(Debug, Clone, Copy, Default)]
pub struct ActorCore {
    state: DeviceState,
    power: u8,
}

impl ActorCore {
    pub fn set_state(&mut self, state: DeviceState) {
        self.state = state;
    }

    #[must_use]
    pub fn state(&self) -> DeviceState {
        self.state
    }

    pub fn set_power(&mut self, power: u8) {
        self.power = power.min(100);
    }

    #[must_use]
    pub fn power(&self) -> u8 {
        self.power
    }
}

/// A binary/variable-power actuator (relay, solid-state relay).
pub trait Actor: Device {
    fn on(&mut self) -> Result<(), DeviceError>;

    fn off(&mut self) -> Result<(), DeviceError>;

    /// Set the power level in percent (clamped to 100).
    fn set_power(&mut self, power: u8) -> Result<(), DeviceError>;

    /// The state after the most recent `on`/`off` command.
    fn state(&self) -> DeviceState;

    fn power_level(&self) -> u8;

    /// Snapshot for authoritative bookkeeping and broadcasts.
    fn actor_state(&self) -> ActorState {
        ActorState::new(self.name(), self.state(), self.power_level())
    }
}

/// A device that measures a value and publishes it from a polling loop.
#[async_trait]
pub trait Sensor: Device {
    /// Unit label for display (`°C`, `°F`, …).
    fn units(&self) -> &str;

    /// Read one value from the hardware. An error permanently terminates
    /// this sensor's polling loop.
    async fn on_read(&mut self) -> Result<f64, DeviceError>;

    /// Delay between polls.
    fn poll_interval(&self) -> Duration {
        Duration::from_secs(5)
    }

    /// Free-text notification hook; texts the sensor doesn't understand are
    /// ignored silently.
    fn handle_notification(&mut self, _text: &str) {}
}

/// One piece of a buzzer pattern: drive at `level` for `on_ms`, rest for
/// `off_ms`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SoundBit {
    pub level: u8,
    pub on_ms: u64,
    pub off_ms: u64,
}

/// Named sound patterns shared by buzzer kinds.
#[derive(Debug, Clone)]
pub struct BuzzerCore {
    sounds: HashMap<String, Vec<SoundBit>>,
}

impl Default for BuzzerCore {
    fn default() -> Self {
        let mut sounds = HashMap::new();
        sounds.insert(
            "Main".to_string(),
            vec![
                SoundBit { level: 100, on_ms: 200, off_ms: 20 },
                SoundBit { level: 100, on_ms: 200, off_ms: 20 },
                SoundBit { level: 100, on_ms: 200, off_ms: 20 },
            ],
        );
        Self { sounds }
    }
}

impl BuzzerCore {
    #[must_use]
    pub fn sound(&self, name: &str) -> Option<&[SoundBit]> {
        self.sounds.get(name).map(Vec::as_slice)
    }

    pub fn add_sound(&mut self, name: impl Into<String>, pattern: Vec<SoundBit>) {
        self.sounds.insert(name.into(), pattern);
    }
}

/// A device that emits sound patterns.
#[async_trait]
pub trait Buzzer: Device {
    fn buzzer_core(&self) -> &BuzzerCore;

    fn buzzer_on(&mut self) -> Result<(), DeviceError>;

    fn buzzer_off(&mut self) -> Result<(), DeviceError>;

    /// Play a pattern, sleeping between bits.
    async fn play_pattern(&mut self, pattern: &[SoundBit]) -> Result<(), DeviceError> {
        for bit in pattern {
            self.buzzer_on()?;
            tokio::time::sleep(Duration::from_millis(bit.on_ms)).await;
            self.buzzer_off()?;
            tokio::time::sleep(Duration::from_millis(bit.off_ms)).await;
        }
        self.buzzer_off()
    }

    /// Play a named sound; unknown names are ignored.
    async fn play_sound(&mut self, name: &str) -> Result<(), DeviceError> {
        let Some(pattern) = self.buzzer_core().sound(name).map(<[SoundBit]>::to_vec) else {
            return Ok(());
        };
        self.play_pattern(&pattern).await
    }
}
