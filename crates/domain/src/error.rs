//! Common error types used across the workspace.
//!
//! Configuration problems are deliberately *not* errors: an unknown device
//! type or a missing property degrades to a skipped device or a default
//! value, logged by the caller. Errors here cover hardware acquisition and
//! runtime faults that abort a single device, never the whole process.

/// Errors raised by device lifecycle and hardware operations.
#[derive(Debug, thiserror::Error)]
pub enum DeviceError {
    /// A hardware resource could not be acquired or driven.
    #[error("hardware fault on '{device}': {reason}")]
    Hardware { device: String, reason: String },

    /// A device declared a property requirement the configuration cannot meet.
    #[error("device '{device}' is missing required property '{property}'")]
    MissingProperty { device: String, property: String },

    /// A queue the device depends on has closed (controller shutting down).
    #[error("device queue closed during shutdown")]
    Shutdown,
}

impl DeviceError {
    /// Convenience constructor for hardware faults.
    pub fn hardware(device: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Hardware {
            device: device.into(),
            reason: reason.to_string(),
        }
    }
}
