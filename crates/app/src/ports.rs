//! Hardware ports — the traits adapter crates implement.
//!
//! Device kinds in the adapter crates talk to hardware exclusively through
//! these traits, so tests substitute in-memory fakes and the framework never
//! links against platform-specific code.

use brewhub_domain::error::DeviceError;

/// A single digital output line, already requested and configured.
pub trait GpioPin: Send {
    fn set_high(&mut self) -> Result<(), DeviceError>;

    fn set_low(&mut self) -> Result<(), DeviceError>;
}

/// Access to a board's GPIO lines by name (`GPIO21`, …).
pub trait GpioDriver: Send + Sync {
    /// Request the named line as an output.
    fn pin(&self, name: &str) -> Result<Box<dyn GpioPin>, DeviceError>;
}

/// A 1-Wire bus with temperature probes on it.
pub trait OneWireBus: Send + Sync {
    /// Addresses of all probes currently present.
    fn search(&self) -> Result<Vec<String>, DeviceError>;

    /// Read one probe, in degrees Celsius.
    fn read_temperature(&self, address: &str) -> Result<f64, DeviceError>;
}
