//! # brewhub-adapter-gpio
//!
//! Device kinds for a Raspberry Pi brew rig: relay boards and solid-state
//! relays on GPIO lines, an active buzzer, and DS18B20 temperature probes
//! on the 1-Wire bus.
//!
//! Hardware access goes through the [`brewhub_app::ports`] traits. The
//! sysfs-backed implementations live in [`sysfs`]; tests substitute
//! in-memory fakes.

use std::sync::Arc;

use brewhub_app::ports::{GpioDriver, OneWireBus};
use brewhub_app::registry::{DeviceInstance, DeviceRegistry};

pub mod devices;
pub mod sysfs;

pub use devices::{ActiveBuzzer, SimpleRelay, SimpleSsr, TempSensor};
pub use sysfs::{SysfsGpio, W1Bus};

/// Register every hardware kind under its configuration type tag, capturing
/// the shared drivers in the builder closures.
pub fn register(
    registry: &mut DeviceRegistry,
    gpio: Arc<dyn GpioDriver>,
    bus: Arc<dyn OneWireBus>,
) {
    let driver = Arc::clone(&gpio);
    registry.register("SimpleRelay", move || {
        DeviceInstance::Actor(Box::new(SimpleRelay::new(Arc::clone(&driver))))
    });
    let driver = Arc::clone(&gpio);
    registry.register("SimpleSSR", move || {
        DeviceInstance::Actor(Box::new(SimpleSsr::new(Arc::clone(&driver))))
    });
    let driver = Arc::clone(&gpio);
    registry.register("ActiveBuzzer", move || {
        DeviceInstance::Buzzer(Box::new(ActiveBuzzer::new(Arc::clone(&driver))))
    });
    registry.register("TempSensor", move || {
        DeviceInstance::Sensor(Box::new(TempSensor::new(Arc::clone(&bus))))
    });
}
