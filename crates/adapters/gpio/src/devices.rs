//! Hardware device kinds.

use std::sync::Arc;

use async_trait::async_trait;

use brewhub_app::device::{
    Actor, ActorCore, Buzzer, BuzzerCore, Device, DeviceCore, Sensor,
};
use brewhub_app::logger::Logger;
use brewhub_app::ports::{GpioDriver, GpioPin, OneWireBus};
use brewhub_domain::error::DeviceError;
use brewhub_domain::property::Property;
use brewhub_domain::state::DeviceState;

/// One output line with its polarity. Relay boards are usually active-low
/// (driving the line low energizes the coil); solid-state relays are
/// active-high.
struct GpioSwitch {
    driver: Arc<dyn GpioDriver>,
    line: String,
    active_low: bool,
    pin: Option<Box<dyn GpioPin>>,
}

impl GpioSwitch {
    fn new(driver: Arc<dyn GpioDriver>, active_low: bool) -> Self {
        Self {
            driver,
            line: String::new(),
            active_low,
            pin: None,
        }
    }

    fn bind_line(&mut self, line: String) {
        self.line = line;
    }

    /// Request the line and drive it to the de-energized level.
    fn acquire(&mut self, device: &str) -> Result<(), DeviceError> {
        if self.line.is_empty() {
            return Err(DeviceError::hardware(device, "no GPIO line configured"));
        }
        let mut pin = self.driver.pin(&self.line)?;
        if self.active_low {
            pin.set_high()?;
        } else {
            pin.set_low()?;
        }
        self.pin = Some(pin);
        Ok(())
    }

    fn drive(&mut self, device: &str, energized: bool) -> Result<(), DeviceError> {
        let Some(pin) = self.pin.as_mut() else {
            return Err(DeviceError::hardware(device, "line not acquired"));
        };
        if energized == self.active_low {
            pin.set_low()
        } else {
            pin.set_high()
        }
    }

    fn release(&mut self, device: &str) -> Result<(), DeviceError> {
        if self.pin.is_some() {
            self.drive(device, false)?;
            self.pin = None;
        }
        Ok(())
    }
}

macro_rules! gpio_actor {
    ($kind:ident, $active_low:expr, $doc:literal) => {
        #[doc = $doc]
        pub struct $kind {
            core: DeviceCore,
            actor: ActorCore,
            switch: GpioSwitch,
        }

        impl $kind {
            #[must_use]
            pub fn new(driver: Arc<dyn GpioDriver>) -> Self {
                Self {
                    core: DeviceCore::default(),
                    actor: ActorCore::default(),
                    switch: GpioSwitch::new(driver, $active_low),
                }
            }
        }

        impl Device for $kind {
            fn core(&self) -> &DeviceCore {
                &self.core
            }

            fn core_mut(&mut self) -> &mut DeviceCore {
                &mut self.core
            }

            fn init(
                &mut self,
                name: &str,
                logger: Logger,
                properties: Vec<Property>,
            ) -> Result<(), DeviceError> {
                self.core.init(name, logger, properties);
                let line = self.core.props_mut().init_str("GPIO", "", "GPIO line name");
                self.switch.bind_line(line);
                Ok(())
            }

            fn on_start(&mut self) -> Result<(), DeviceError> {
                self.switch.acquire(self.core.name())?;
                self.actor.set_state(DeviceState::Off);
                Ok(())
            }

            fn on_stop(&mut self) -> Result<(), DeviceError> {
                self.switch.release(self.core.name())
            }
        }

        impl Actor for $kind {
            fn on(&mut self) -> Result<(), DeviceError> {
                self.switch.drive(self.core.name(), true)?;
                self.actor.set_state(DeviceState::On);
                Ok(())
            }

            fn off(&mut self) -> Result<(), DeviceError> {
                self.switch.drive(self.core.name(), false)?;
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
    };
}

gpio_actor!(
    SimpleRelay,
    true,
    "Mechanical relay board channel, active-low."
);
gpio_actor!(SimpleSsr, false, "Solid-state relay, active-high.");

/// Active buzzer on a GPIO line, active-high.
pub struct ActiveBuzzer {
    core: DeviceCore,
    sounds: BuzzerCore,
    switch: GpioSwitch,
}

impl ActiveBuzzer {
    #[must_use]
    pub fn new(driver: Arc<dyn GpioDriver>) -> Self {
        Self {
            core: DeviceCore::default(),
            sounds: BuzzerCore::default(),
            switch: GpioSwitch::new(driver, false),
        }
    }
}

impl Device for ActiveBuzzer {
    fn core(&self) -> &DeviceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DeviceCore {
        &mut self.core
    }

    fn init(
        &mut self,
        name: &str,
        logger: Logger,
        properties: Vec<Property>,
    ) -> Result<(), DeviceError> {
        self.core.init(name, logger, properties);
        let line = self.core.props_mut().init_str("GPIO", "", "GPIO line name");
        self.switch.bind_line(line);
        Ok(())
    }

    fn on_start(&mut self) -> Result<(), DeviceError> {
        self.switch.acquire(self.core.name())
    }

    fn on_stop(&mut self) -> Result<(), DeviceError> {
        self.switch.release(self.core.name())
    }
}

#[async_trait]
impl Buzzer for ActiveBuzzer {
    fn buzzer_core(&self) -> &BuzzerCore {
        &self.sounds
    }

    fn buzzer_on(&mut self) -> Result<(), DeviceError> {
        self.switch.drive(self.core.name(), true)
    }

    fn buzzer_off(&mut self) -> Result<(), DeviceError> {
        self.switch.drive(self.core.name(), false)
    }
}

/// DS18B20 temperature probe on the 1-Wire bus.
///
/// The `Address` property names the probe. When left empty, the first probe
/// found on the bus is claimed at startup, which covers the common
/// single-probe rig.
pub struct TempSensor {
    core: DeviceCore,
    bus: Arc<dyn OneWireBus>,
    address: String,
    units: String,
}

impl TempSensor {
    #[must_use]
    pub fn new(bus: Arc<dyn OneWireBus>) -> Self {
        Self {
            core: DeviceCore::default(),
            bus,
            address: String::new(),
            units: "\u{b0}C".to_string(),
        }
    }

    #[must_use]
    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Device for TempSensor {
    fn core(&self) -> &DeviceCore {
        &self.core
    }

    fn core_mut(&mut self) -> &mut DeviceCore {
        &mut self.core
    }

    fn init(
        &mut self,
        name: &str,
        logger: Logger,
        properties: Vec<Property>,
    ) -> Result<(), DeviceError> {
        self.core.init(name, logger, properties);
        let props = self.core.props_mut();
        self.address = props.init_str("Address", "", "1-Wire probe address");
        self.units = props.init_str("Units", "\u{b0}C", "Units for temperature sensor");
        Ok(())
    }

    fn on_start(&mut self) -> Result<(), DeviceError> {
        if self.address.is_empty() {
            let probes = self.bus.search()?;
            let Some(first) = probes.into_iter().next() else {
                return Err(DeviceError::hardware(
                    self.core.name(),
                    "no probe found on the 1-Wire bus",
                ));
            };
            self.core
                .log_message(format!("'{}' claimed probe {first}", self.core.name()));
            self.address = first;
        }
        Ok(())
    }
}

#[async_trait]
impl Sensor for TempSensor {
    fn units(&self) -> &str {
        &self.units
    }

    async fn on_read(&mut self) -> Result<f64, DeviceError> {
        let celsius = self.bus.read_temperature(&self.address)?;
        if self.units == "\u{b0}F" {
            Ok(celsius * 9.0 / 5.0 + 32.0)
        } else {
            Ok(celsius)
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use brewhub_domain::property::{PropertyKind, PropertyValue};
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records the last driven level per line.
    #[derive(Default)]
    pub(crate) struct FakeGpio {
        pub(crate) levels: Arc<Mutex<HashMap<String, bool>>>,
    }

    struct FakePin {
        line: String,
        levels: Arc<Mutex<HashMap<String, bool>>>,
    }

    impl GpioPin for FakePin {
        fn set_high(&mut self) -> Result<(), DeviceError> {
            self.levels.lock().unwrap().insert(self.line.clone(), true);
            Ok(())
        }

        fn set_low(&mut self) -> Result<(), DeviceError> {
            self.levels.lock().unwrap().insert(self.line.clone(), false);
            Ok(())
        }
    }

    impl GpioDriver for FakeGpio {
        fn pin(&self, name: &str) -> Result<Box<dyn GpioPin>, DeviceError> {
            if name.is_empty() {
                return Err(DeviceError::hardware(name, "no such line"));
            }
            Ok(Box::new(FakePin {
                line: name.to_string(),
                levels: Arc::clone(&self.levels),
            }))
        }
    }

    impl FakeGpio {
        fn level(&self, line: &str) -> Option<bool> {
            self.levels.lock().unwrap().get(line).copied()
        }
    }

    #[derive(Default)]
    pub(crate) struct FakeBus {
        pub(crate) probes: Vec<String>,
        pub(crate) celsius: f64,
    }

    impl OneWireBus for FakeBus {
        fn search(&self) -> Result<Vec<String>, DeviceError> {
            Ok(self.probes.clone())
        }

        fn read_temperature(&self, address: &str) -> Result<f64, DeviceError> {
            if self.probes.iter().any(|p| p == address) {
                Ok(self.celsius)
            } else {
                Err(DeviceError::hardware(address, "probe not present"))
            }
        }
    }

    fn gpio_property(line: &str) -> Vec<Property> {
        vec![Property::new(
            "GPIO",
            PropertyKind::String,
            PropertyValue::String(line.to_string()),
            "",
        )]
    }

    #[tokio::test]
    async fn should_drive_relay_active_low() {
        let gpio = Arc::new(FakeGpio::default());
        let mut relay = SimpleRelay::new(Arc::clone(&gpio) as Arc<dyn GpioDriver>);
        relay
            .init("Relay 1", Logger::disconnected(), gpio_property("GPIO21"))
            .unwrap();
        relay.on_start().unwrap();

        // De-energized at startup means the line is held high.
        assert_eq!(gpio.level("GPIO21"), Some(true));
        relay.on().unwrap();
        assert_eq!(gpio.level("GPIO21"), Some(false));
        assert_eq!(relay.state(), DeviceState::On);
        relay.off().unwrap();
        assert_eq!(gpio.level("GPIO21"), Some(true));
    }

    #[tokio::test]
    async fn should_drive_ssr_active_high() {
        let gpio = Arc::new(FakeGpio::default());
        let mut ssr = SimpleSsr::new(Arc::clone(&gpio) as Arc<dyn GpioDriver>);
        ssr.init("SSR 1", Logger::disconnected(), gpio_property("GPIO26"))
            .unwrap();
        ssr.on_start().unwrap();

        assert_eq!(gpio.level("GPIO26"), Some(false));
        ssr.on().unwrap();
        assert_eq!(gpio.level("GPIO26"), Some(true));
        ssr.off().unwrap();
        assert_eq!(gpio.level("GPIO26"), Some(false));
    }

    #[tokio::test]
    async fn should_fail_commands_before_start() {
        let gpio = Arc::new(FakeGpio::default());
        let mut relay = SimpleRelay::new(gpio as Arc<dyn GpioDriver>);
        relay
            .init("Relay 1", Logger::disconnected(), gpio_property("GPIO21"))
            .unwrap();
        assert!(relay.on().is_err());
    }

    #[tokio::test]
    async fn should_fail_start_without_a_configured_line() {
        let gpio = Arc::new(FakeGpio::default());
        let mut relay = SimpleRelay::new(gpio as Arc<dyn GpioDriver>);
        relay.init("Relay 1", Logger::disconnected(), vec![]).unwrap();
        assert!(relay.on_start().is_err());
    }

    #[tokio::test]
    async fn should_release_line_de_energized_on_stop() {
        let gpio = Arc::new(FakeGpio::default());
        let mut ssr = SimpleSsr::new(Arc::clone(&gpio) as Arc<dyn GpioDriver>);
        ssr.init("SSR 1", Logger::disconnected(), gpio_property("GPIO26"))
            .unwrap();
        ssr.on_start().unwrap();
        ssr.on().unwrap();
        ssr.on_stop().unwrap();
        assert_eq!(gpio.level("GPIO26"), Some(false));
    }

    #[tokio::test]
    async fn should_beep_through_the_line() {
        let gpio = Arc::new(FakeGpio::default());
        let mut buzzer = ActiveBuzzer::new(Arc::clone(&gpio) as Arc<dyn GpioDriver>);
        buzzer
            .init("Buzzer", Logger::disconnected(), gpio_property("GPIO4"))
            .unwrap();
        buzzer.on_start().unwrap();
        buzzer.buzzer_on().unwrap();
        assert_eq!(gpio.level("GPIO4"), Some(true));
        buzzer.buzzer_off().unwrap();
        assert_eq!(gpio.level("GPIO4"), Some(false));
    }

    #[tokio::test]
    async fn should_read_probe_by_configured_address() {
        let bus = Arc::new(FakeBus {
            probes: vec!["28-00000a0b0c0d".to_string()],
            celsius: 65.0,
        });
        let mut sensor = TempSensor::new(bus as Arc<dyn OneWireBus>);
        sensor
            .init(
                "Mash Temp",
                Logger::disconnected(),
                vec![Property::new(
                    "Address",
                    PropertyKind::String,
                    PropertyValue::String("28-00000a0b0c0d".into()),
                    "",
                )],
            )
            .unwrap();
        sensor.on_start().unwrap();
        assert!((sensor.on_read().await.unwrap() - 65.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn should_claim_first_probe_when_address_is_empty() {
        let bus = Arc::new(FakeBus {
            probes: vec!["28-aaaa".to_string(), "28-bbbb".to_string()],
            celsius: 20.0,
        });
        let mut sensor = TempSensor::new(bus as Arc<dyn OneWireBus>);
        sensor.init("Mash Temp", Logger::disconnected(), vec![]).unwrap();
        sensor.on_start().unwrap();
        assert_eq!(sensor.address(), "28-aaaa");
    }

    #[tokio::test]
    async fn should_fail_start_on_an_empty_bus() {
        let bus = Arc::new(FakeBus::default());
        let mut sensor = TempSensor::new(bus as Arc<dyn OneWireBus>);
        sensor.init("Mash Temp", Logger::disconnected(), vec![]).unwrap();
        assert!(sensor.on_start().is_err());
    }

    #[tokio::test]
    async fn should_convert_to_fahrenheit_when_configured() {
        let bus = Arc::new(FakeBus {
            probes: vec!["28-aaaa".to_string()],
            celsius: 65.0,
        });
        let mut sensor = TempSensor::new(bus as Arc<dyn OneWireBus>);
        sensor
            .init(
                "Mash Temp",
                Logger::disconnected(),
                vec![Property::new(
                    "Units",
                    PropertyKind::String,
                    PropertyValue::String("\u{b0}F".into()),
                    "",
                )],
            )
            .unwrap();
        sensor.on_start().unwrap();
        assert!((sensor.on_read().await.unwrap() - 149.0).abs() < f64::EPSILON);
    }
}
