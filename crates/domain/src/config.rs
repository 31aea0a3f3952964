//! The rig configuration document — ordered device declarations.
//!
//! This document is the sole source of truth for which concrete device
//! kinds are instantiated. The core's contract: given this document and a
//! populated device registry, produce the device collections. Malformed or
//! partially-missing entries degrade gracefully (skip + log) — they never
//! abort the whole load.

use serde::{Deserialize, Serialize};

use crate::property::{Property, PropertyKind, PropertyValue};

/// The whole configuration document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RigConfig {
    pub name: String,
    pub version: String,
    pub sensors: Vec<DeviceConfig>,
    pub actors: Vec<DeviceConfig>,
    pub buzzers: Vec<DeviceConfig>,
    pub equipment: Vec<DeviceConfig>,
}

/// One device declaration: a name, the registry type tag that picks the
/// concrete kind, and its property list.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceConfig {
    pub name: String,
    #[serde(rename = "type")]
    pub type_tag: String,
    #[serde(default)]
    pub properties: Vec<PropertyConfig>,
}

/// Persisted form of a property — the value is always a string and is
/// coerced to its declared kind at load time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PropertyConfig {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: PropertyKind,
    #[serde(default)]
    pub hidden: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choice: Option<String>,
    #[serde(default)]
    pub comment: String,
    #[serde(default)]
    pub value: String,
}

impl PropertyConfig {
    /// Shorthand for a visible property with no choice hint.
    #[must_use]
    pub fn new(name: &str, kind: PropertyKind, value: &str, comment: &str) -> Self {
        Self {
            name: name.to_string(),
            kind,
            hidden: false,
            choice: None,
            comment: comment.to_string(),
            value: value.to_string(),
        }
    }

    /// Coerce the persisted string form into a typed [`Property`].
    #[must_use]
    pub fn to_property(&self) -> Property {
        Property {
            name: self.name.clone(),
            kind: self.kind,
            hidden: self.hidden,
            choice: self.choice.clone(),
            comment: self.comment.clone(),
            value: PropertyValue::coerce(self.kind, &self.value),
        }
    }
}

impl DeviceConfig {
    /// Typed properties for this declaration.
    #[must_use]
    pub fn properties(&self) -> Vec<Property> {
        self.properties.iter().map(PropertyConfig::to_property).collect()
    }
}

impl RigConfig {
    /// The generated first-run configuration: a fully simulated rig with
    /// three temperature sensors, three relays, a buzzer, and one
    /// hysteresis-controlled mash tun. Written back to disk when no
    /// configuration file exists yet.
    #[must_use]
    pub fn default_dummy() -> Self {
        let sensors = (1..=3)
            .map(|i| DeviceConfig {
                name: format!("Temp Sensor {i}"),
                type_tag: "DummyTempSensor".to_string(),
                properties: vec![PropertyConfig::new(
                    "Units",
                    PropertyKind::String,
                    "\u{b0}F",
                    "Units for temperature sensor",
                )],
            })
            .collect();

        let actors = (1..=3)
            .map(|i| DeviceConfig {
                name: format!("Dummy Relay {i}"),
                type_tag: "DummyRelay".to_string(),
                properties: Vec::new(),
            })
            .collect();

        let buzzers = vec![DeviceConfig {
            name: "Main Buzzer".to_string(),
            type_tag: "DummyBuzzer".to_string(),
            properties: Vec::new(),
        }];

        let equipment = vec![DeviceConfig {
            name: "Mash Tun".to_string(),
            type_tag: "SimpleRIMS".to_string(),
            properties: vec![
                PropertyConfig::new(
                    "Temp Sensor",
                    PropertyKind::String,
                    "Temp Sensor 1",
                    "Sensor watched by the controller",
                ),
                PropertyConfig::new(
                    "Heater",
                    PropertyKind::String,
                    "Dummy Relay 3",
                    "Actor driving the heating element",
                ),
                PropertyConfig::new(
                    "Pump",
                    PropertyKind::String,
                    "Dummy Relay 1",
                    "Actor driving the pump",
                ),
                PropertyConfig::new(
                    "Circulator",
                    PropertyKind::String,
                    "Dummy Relay 2",
                    "Actor driving the circulator",
                ),
                PropertyConfig::new(
                    "PowerOn",
                    PropertyKind::Float,
                    "147",
                    "Heater power-on threshold",
                ),
                PropertyConfig::new(
                    "PowerOff",
                    PropertyKind::Float,
                    "150",
                    "Heater power-off threshold",
                ),
                PropertyConfig::new(
                    "Control",
                    PropertyKind::String,
                    "hysteresis",
                    "Control mode",
                ),
            ],
        }];

        Self {
            name: "Brew Rig".to_string(),
            version: "1".to_string(),
            sensors,
            actors,
            buzzers,
            equipment,
        }
    }
}
