//! The property store — typed, named configuration values attached to every
//! device.
//!
//! Values are dynamically typed over a fixed set of kinds and coerced from
//! their persisted string form at load time. Absence is signalled with
//! [`Option`], never an error: configuration-driven systems must tolerate
//! partial declarations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Declared type of a property, as written in the configuration document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyKind {
    #[default]
    String,
    UInt,
    Int,
    Float,
    Bool,
}

impl PropertyKind {
    /// The declared default for this kind — what an uninitialized read
    /// returns, never a partial or garbage value.
    #[must_use]
    pub fn default_value(self) -> PropertyValue {
        match self {
            Self::String => PropertyValue::String(String::new()),
            Self::UInt => PropertyValue::UInt(0),
            Self::Int => PropertyValue::Int(0),
            Self::Float => PropertyValue::Float(0.0),
            Self::Bool => PropertyValue::Bool(false),
        }
    }
}

/// A single typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Bool(bool),
    UInt(u64),
    Int(i64),
    Float(f64),
    String(String),
}

impl PropertyValue {
    /// Coerce a persisted string form into a typed value.
    ///
    /// Booleans accept `1`, `true`, and `True`; numeric kinds fall back to the
    /// kind's default when the string does not parse — loading a document
    /// never fails on a malformed value.
    #[must_use]
    pub fn coerce(kind: PropertyKind, raw: &str) -> Self {
        match kind {
            PropertyKind::String => Self::String(raw.to_string()),
            PropertyKind::UInt => Self::UInt(raw.trim().parse().unwrap_or_default()),
            PropertyKind::Int => Self::Int(raw.trim().parse().unwrap_or_default()),
            PropertyKind::Float => Self::Float(raw.trim().parse().unwrap_or_default()),
            PropertyKind::Bool => Self::Bool(matches!(raw.trim(), "1" | "true" | "True")),
        }
    }

    /// The kind this value belongs to.
    #[must_use]
    pub fn kind(&self) -> PropertyKind {
        match self {
            Self::String(_) => PropertyKind::String,
            Self::UInt(_) => PropertyKind::UInt,
            Self::Int(_) => PropertyKind::Int,
            Self::Float(_) => PropertyKind::Float,
            Self::Bool(_) => PropertyKind::Bool,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(v) => Some(*v),
            Self::UInt(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Numeric view — integers widen to float.
    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(*v),
            #[allow(clippy::cast_precision_loss)]
            Self::UInt(v) => Some(*v as f64),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl std::fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(v) => f.write_str(v),
            Self::UInt(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Bool(v) => write!(f, "{v}"),
        }
    }
}

/// A named, typed configuration value with its document metadata.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub kind: PropertyKind,
    /// Hidden properties are not offered for editing by outer surfaces.
    pub hidden: bool,
    /// Optional comma-separated choice-list hint for editors.
    pub choice: Option<String>,
    pub comment: String,
    pub value: PropertyValue,
}

impl Property {
    /// Create a visible property with no choice hint.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        kind: PropertyKind,
        value: PropertyValue,
        comment: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            kind,
            hidden: false,
            choice: None,
            comment: comment.into(),
            value,
        }
    }

    /// The marker property flagging a simulated device.
    #[must_use]
    pub fn dummy() -> Self {
        Self::new(
            "Dummy",
            PropertyKind::Bool,
            PropertyValue::Bool(true),
            "Is dummy device",
        )
    }
}

/// A device's property set — a name-keyed map with upsert and
/// init-with-default semantics.
///
/// Invariant: a property name is unique within the set; re-adding the same
/// name overwrites the prior entry.
#[derive(Debug, Clone, Default)]
pub struct PropertySet {
    entries: HashMap<String, Property>,
}

impl PropertySet {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert a property, returning the stored value.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        kind: PropertyKind,
        value: PropertyValue,
        comment: impl Into<String>,
    ) -> PropertyValue {
        let name = name.into();
        let prop = Property::new(name.clone(), kind, value.clone(), comment);
        self.entries.insert(name, prop);
        value
    }

    /// Upsert a fully-formed property (preserves hidden/choice metadata).
    pub fn add_property(&mut self, prop: Property) {
        self.entries.insert(prop.name.clone(), prop);
    }

    /// Upsert a batch of properties, e.g. from a configuration entry.
    pub fn add_all(&mut self, props: Vec<Property>) {
        for prop in props {
            self.add_property(prop);
        }
    }

    /// Declare "I need property `name` with this default": returns the
    /// existing value when configuration already supplied one, otherwise
    /// installs and returns `default`.
    ///
    /// Idempotent — a second `init` with a different default returns the
    /// value installed by the first.
    pub fn init(
        &mut self,
        name: &str,
        kind: PropertyKind,
        default: PropertyValue,
        comment: &str,
    ) -> PropertyValue {
        if let Some(existing) = self.entries.get(name) {
            return existing.value.clone();
        }
        self.add(name, kind, default.clone(), comment);
        default
    }

    /// Typed `init` shorthand for string properties.
    pub fn init_str(&mut self, name: &str, default: &str, comment: &str) -> String {
        let value = self.init(
            name,
            PropertyKind::String,
            PropertyValue::String(default.to_string()),
            comment,
        );
        value
            .as_str()
            .map_or_else(|| value.to_string(), ToString::to_string)
    }

    /// Typed `init` shorthand for unsigned integer properties.
    pub fn init_u64(&mut self, name: &str, default: u64, comment: &str) -> u64 {
        self.init(name, PropertyKind::UInt, PropertyValue::UInt(default), comment)
            .as_u64()
            .unwrap_or(default)
    }

    /// Typed `init` shorthand for float properties.
    pub fn init_f64(&mut self, name: &str, default: f64, comment: &str) -> f64 {
        self.init(
            name,
            PropertyKind::Float,
            PropertyValue::Float(default),
            comment,
        )
        .as_f64()
        .unwrap_or(default)
    }

    /// Typed `init` shorthand for boolean properties.
    pub fn init_bool(&mut self, name: &str, default: bool, comment: &str) -> bool {
        self.init(name, PropertyKind::Bool, PropertyValue::Bool(default), comment)
            .as_bool()
            .unwrap_or(default)
    }

    /// Pure lookup — `None` signals absence, no error is raised.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Property> {
        self.entries.get(name)
    }

    /// Pure value lookup.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&PropertyValue> {
        self.entries.get(name).map(|p| &p.value)
    }

    /// Pure declared-kind lookup.
    #[must_use]
    pub fn kind_of(&self, name: &str) -> Option<PropertyKind> {
        self.entries.get(name).map(|p| p.kind)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate over the stored properties (unspecified order).
    pub fn iter(&self) -> impl Iterator<Item = &Property> {
        self.entries.values()
    }
}
