//! Sysfs-backed implementations of the hardware ports.
//!
//! The kernel exposes GPIO lines under `/sys/class/gpio` and 1-Wire probes
//! under `/sys/bus/w1/devices`; both are plain-file interfaces, so no
//! platform crate is needed. The root paths are injectable for tests.

use std::fs;
use std::path::{Path, PathBuf};

use brewhub_app::ports::{GpioDriver, GpioPin, OneWireBus};
use brewhub_domain::error::DeviceError;

const GPIO_ROOT: &str = "/sys/class/gpio";
const W1_ROOT: &str = "/sys/bus/w1/devices";

/// DS18B20 family prefix in probe directory names.
const W1_THERM_PREFIX: &str = "28-";

/// Accepts `GPIO21` or a bare line number.
fn parse_line(name: &str) -> Result<u32, DeviceError> {
    let digits = name.strip_prefix("GPIO").unwrap_or(name);
    digits
        .parse()
        .map_err(|_| DeviceError::hardware(name, "not a GPIO line name"))
}

fn io_error(device: &str, err: &std::io::Error) -> DeviceError {
    DeviceError::hardware(device, err.to_string())
}

/// GPIO access through the sysfs export interface.
pub struct SysfsGpio {
    root: PathBuf,
}

impl Default for SysfsGpio {
    fn default() -> Self {
        Self {
            root: PathBuf::from(GPIO_ROOT),
        }
    }
}

impl SysfsGpio {
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl GpioDriver for SysfsGpio {
    fn pin(&self, name: &str) -> Result<Box<dyn GpioPin>, DeviceError> {
        let number = parse_line(name)?;
        let dir = self.root.join(format!("gpio{number}"));
        if !dir.exists() {
            fs::write(self.root.join("export"), number.to_string())
                .map_err(|err| io_error(name, &err))?;
        }
        fs::write(dir.join("direction"), "out").map_err(|err| io_error(name, &err))?;
        Ok(Box::new(SysfsPin {
            line: name.to_string(),
            value: dir.join("value"),
        }))
    }
}

struct SysfsPin {
    line: String,
    value: PathBuf,
}

impl GpioPin for SysfsPin {
    fn set_high(&mut self) -> Result<(), DeviceError> {
        fs::write(&self.value, "1").map_err(|err| io_error(&self.line, &err))
    }

    fn set_low(&mut self) -> Result<(), DeviceError> {
        fs::write(&self.value, "0").map_err(|err| io_error(&self.line, &err))
    }
}

/// 1-Wire bus access through the kernel's w1 therm driver.
pub struct W1Bus {
    root: PathBuf,
}

impl Default for W1Bus {
    fn default() -> Self {
        Self {
            root: PathBuf::from(W1_ROOT),
        }
    }
}

impl W1Bus {
    #[must_use]
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Parse a `w1_slave` payload:
///
/// ```text
/// 72 01 4b 46 7f ff 0e 10 57 : crc=57 YES
/// 72 01 4b 46 7f ff 0e 10 57 t=23125
/// ```
///
/// The first line carries the CRC verdict, the second the temperature in
/// milli-degrees Celsius.
fn parse_w1_payload(address: &str, payload: &str) -> Result<f64, DeviceError> {
    let mut lines = payload.lines();
    let crc_line = lines
        .next()
        .ok_or_else(|| DeviceError::hardware(address, "empty w1_slave payload"))?;
    if !crc_line.trim_end().ends_with("YES") {
        return Err(DeviceError::hardware(address, "CRC check failed"));
    }
    let temp_line = lines
        .next()
        .ok_or_else(|| DeviceError::hardware(address, "missing temperature line"))?;
    let raw = temp_line
        .rsplit_once("t=")
        .ok_or_else(|| DeviceError::hardware(address, "missing t= field"))?
        .1;
    let milli: f64 = raw
        .trim()
        .parse()
        .map_err(|_| DeviceError::hardware(address, "unparsable temperature"))?;
    Ok(milli / 1000.0)
}

impl OneWireBus for W1Bus {
    fn search(&self) -> Result<Vec<String>, DeviceError> {
        let entries = fs::read_dir(&self.root).map_err(|err| io_error("w1", &err))?;
        let mut probes = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| io_error("w1", &err))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(W1_THERM_PREFIX) {
                probes.push(name);
            }
        }
        probes.sort_unstable();
        Ok(probes)
    }

    fn read_temperature(&self, address: &str) -> Result<f64, DeviceError> {
        let path = self.root.join(address).join("w1_slave");
        let payload = fs::read_to_string(path).map_err(|err| io_error(address, &err))?;
        parse_w1_payload(address, &payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "brewhub-sysfs-{tag}-{}",
            std::process::id()
        ));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn should_parse_line_names_and_bare_numbers() {
        assert_eq!(parse_line("GPIO21").unwrap(), 21);
        assert_eq!(parse_line("4").unwrap(), 4);
        assert!(parse_line("relay").is_err());
    }

    #[test]
    fn should_drive_exported_line_through_value_file() {
        let root = scratch_dir("gpio");
        let dir = root.join("gpio21");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("value"), "0").unwrap();

        let driver = SysfsGpio::with_root(&root);
        let mut pin = driver.pin("GPIO21").unwrap();
        assert_eq!(fs::read_to_string(dir.join("direction")).unwrap(), "out");

        pin.set_high().unwrap();
        assert_eq!(fs::read_to_string(dir.join("value")).unwrap(), "1");
        pin.set_low().unwrap();
        assert_eq!(fs::read_to_string(dir.join("value")).unwrap(), "0");
    }

    #[test]
    fn should_export_missing_line_first() {
        let root = scratch_dir("gpio-export");
        let driver = SysfsGpio::with_root(&root);
        // The fake sysfs has no kernel behind it, so the export write
        // succeeds but no gpio4 directory appears and the direction write
        // fails — what matters is that export was attempted.
        assert!(driver.pin("GPIO4").is_err());
        assert_eq!(fs::read_to_string(root.join("export")).unwrap(), "4");
    }

    #[test]
    fn should_list_only_thermal_probes() {
        let root = scratch_dir("w1");
        for name in ["28-00000a0b0c0d", "28-00000a0b0c0e", "w1_bus_master1"] {
            fs::create_dir_all(root.join(name)).unwrap();
        }
        let bus = W1Bus::with_root(&root);
        assert_eq!(
            bus.search().unwrap(),
            vec!["28-00000a0b0c0d".to_string(), "28-00000a0b0c0e".to_string()]
        );
    }

    #[test]
    fn should_read_temperature_from_w1_slave_payload() {
        let root = scratch_dir("w1-read");
        let dir = root.join("28-00000a0b0c0d");
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("w1_slave"),
            "72 01 4b 46 7f ff 0e 10 57 : crc=57 YES\n72 01 4b 46 7f ff 0e 10 57 t=23125\n",
        )
        .unwrap();

        let bus = W1Bus::with_root(&root);
        let value = bus.read_temperature("28-00000a0b0c0d").unwrap();
        assert!((value - 23.125).abs() < f64::EPSILON);
    }

    #[test]
    fn should_reject_failed_crc() {
        assert!(parse_w1_payload(
            "28-a",
            "72 01 4b 46 7f ff 0e 10 57 : crc=57 NO\n72 01 t=23125\n"
        )
        .is_err());
    }

    #[test]
    fn should_handle_negative_temperatures() {
        let value = parse_w1_payload(
            "28-a",
            "crc=aa YES\nff ff t=-1250\n",
        )
        .unwrap();
        assert!((value + 1.25).abs() < f64::EPSILON);
    }

    #[test]
    fn should_fail_read_for_absent_probe() {
        let root = scratch_dir("w1-absent");
        let bus = W1Bus::with_root(&root);
        assert!(bus.read_temperature("28-gone").is_err());
    }
}
