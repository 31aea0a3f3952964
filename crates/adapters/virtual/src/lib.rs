//! # brewhub-adapter-virtual
//!
//! Fully simulated device kinds. A rig declared entirely from these runs on
//! any development machine with no hardware attached, which is how the
//! generated first-run configuration and the integration tests work.

use async_trait::async_trait;

use brewhub_app::device::{
    Actor, ActorCore, Buzzer, BuzzerCore, Device, DeviceCore, Sensor,
};
use brewhub_app::registry::{DeviceInstance, DeviceRegistry};
use brewhub_domain::error::DeviceError;
use brewhub_domain::state::DeviceState;

/// Register every simulated kind under its configuration type tag.
pub fn register(registry: &mut DeviceRegistry) {
    registry.register("DummyTempSensor", || {
        DeviceInstance::Sensor(Box::new(DummyTempSensor::default()))
    });
    registry.register("DummyRelay", || {
        DeviceInstance::Actor(Box::new(DummyRelay::default()))
    });
    registry.register("DummyBuzzer", || {
        DeviceInstance::Buzzer(Box::new(DummyBuzzer::default()))
    });
}

/// Simulated temperature probe: a deterministic triangle wave, so control
/// behavior is reproducible across runs.
///
/// Understands the `set:<float>` notification text, which pins the current
/// value — equipment and tests use it to steer a scenario.
pub struct DummyTempSensor {
    core: DeviceCore,
    units: String,
    value: f64,
    rising: bool,
}

const WAVE_LOW: f64 = 140.0;
const WAVE_HIGH: f64 = 160.0;
const WAVE_STEP: f64 = 0.5;

impl Default for DummyTempSensor {
    fn default() -> Self {
        Self {
            core: DeviceCore::default(),
            units: "\u{b0}F".to_string(),
            value: WAVE_LOW,
            rising: true,
        }
    }
}

impl Device for DummyTempSensor {
    fn core(&self) -> &DeviceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DeviceCore {
        &mut self.core
    }

    fn init(
        &mut self,
        name: &str,
        logger: brewhub_app::logger::Logger,
        properties: Vec<brewhub_domain::property::Property>,
    ) -> Result<(), DeviceError> {
        self.core.init(name, logger, properties);
        self.units = self
            .core
            .props_mut()
            .init_str("Units", "\u{b0}F", "Units for temperature sensor");
        Ok(())
    }
}

#[async_trait]
impl Sensor for DummyTempSensor {
    fn units(&self) -> &str {
        &self.units
    }

    async fn on_read(&mut self) -> Result<f64, DeviceError> {
        let value = self.value;
        if self.rising {
            self.value += WAVE_STEP;
            if self.value >= WAVE_HIGH {
                self.rising = false;
            }
        } else {
            self.value -= WAVE_STEP;
            if self.value <= WAVE_LOW {
                self.rising = true;
            }
        }
        Ok(value)
    }

    fn handle_notification(&mut self, text: &str) {
        if let Some(raw) = text.strip_prefix("set:") {
            if let Ok(value) = raw.trim().parse::<f64>() {
                self.value = value;
                self.core
                    .log_debug(format!("'{}' pinned to {value:.2}", self.core.name()));
            }
        }
    }
}

/// Simulated relay: tracks commanded state, touches nothing.
#[derive(Default)]
pub struct DummyRelay {
    core: DeviceCore,
    actor: ActorCore,
}

impl Device for DummyRelay {
    fn core(&self) -> &DeviceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DeviceCore {
        &mut self.core
    }
}

impl Actor for DummyRelay {
    fn on(&mut self) -> Result<(), DeviceError> {
        self.actor.set_state(DeviceState::On);
        self.core.log_debug(format!("'{}' on", self.core.name()));
        Ok(())
    }

    fn off(&mut self) -> Result<(), DeviceError> {
        self.actor.set_state(DeviceState::Off);
        self.core.log_debug(format!("'{}' off", self.core.name()));
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

/// Simulated buzzer: the pattern timing runs for real, the sound doesn't.
#[derive(Default)]
pub struct DummyBuzzer {
    core: DeviceCore,
    sounds: BuzzerCore,
}

impl Device for DummyBuzzer {
    fn core(&self) -> &DeviceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DeviceCore {
        &mut self.core
    }
}

#[async_trait]
impl Buzzer for DummyBuzzer {
    fn buzzer_core(&self) -> &BuzzerCore {
        &self.sounds
    }

    fn buzzer_on(&mut self) -> Result<(), DeviceError> {
        self.core.log_debug(format!("'{}' beep", self.core.name()));
        Ok(())
    }

    fn buzzer_off(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }
}
