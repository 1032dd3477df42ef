//! Request level modifiers and the reserved keys hoisted out of property maps.

use jiff::Timestamp;
use serde_json::{Map, Value};

use crate::{payload::PropertyMap, value::is_truthy};

/// Optional request modifiers.
///
/// Flags are only written to the request when they are `true`, so an explicit
/// `false` never clears a flag that was set inline in a property map.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Modifiers {
    /// Written as `$ignore_alias`.
    pub ignore_alias: bool,
    /// Written as `$ignore_time`.
    pub ignore_time: bool,
    /// IP address the update is attributed to, written as `$ip`.
    pub ip: Option<String>,
    /// Milliseconds since the Unix epoch, written as `$time`.
    pub time: Option<i64>,
}

impl Modifiers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignore_alias(mut self) -> Self {
        self.ignore_alias = true;
        self
    }

    pub fn ignore_time(mut self) -> Self {
        self.ignore_time = true;
        self
    }

    pub fn ip(mut self, ip: impl Into<String>) -> Self {
        self.ip = Some(ip.into());
        self
    }

    pub fn time(mut self, millis: i64) -> Self {
        self.time = Some(millis);
        self
    }

    pub fn timestamp(self, timestamp: Timestamp) -> Self {
        self.time(timestamp.as_millisecond())
    }
}

/// How a reserved key leaves the property map.
#[derive(Clone, Copy)]
enum Hoist {
    Always,
    WhenTruthy,
}

/// Reserved property keys, the request key they become, and when they move.
const RESERVED_KEYS: &[(&str, &str, Hoist)] = &[
    ("ip", "$ip", Hoist::Always),
    ("$ignore_time", "$ignore_time", Hoist::WhenTruthy),
];

/// Modifier values pulled out of a property map, keyed by their request key.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct Staged(Map<String, Value>);

/// Remove reserved control keys from `properties` and stage them as modifiers.
pub(crate) fn extract(properties: &mut PropertyMap) -> Staged {
    let mut staged = Map::new();

    for &(property, request_key, hoist) in RESERVED_KEYS {
        let take = match (hoist, properties.get(property)) {
            (_, None) => false,
            (Hoist::Always, Some(_)) => true,
            (Hoist::WhenTruthy, Some(value)) => is_truthy(value),
        };

        if take && let Some(value) = properties.remove(property) {
            staged.insert(request_key.to_string(), value);
        }
    }

    Staged(staged)
}

/// Apply explicit modifiers on top of the staged ones.
pub(crate) fn merge(staged: Staged, explicit: &Modifiers) -> Map<String, Value> {
    let Staged(mut merged) = staged;

    if explicit.ignore_alias {
        merged.insert("$ignore_alias".to_string(), Value::Bool(true));
    }

    if explicit.ignore_time {
        merged.insert("$ignore_time".to_string(), Value::Bool(true));
    }

    if let Some(ip) = &explicit.ip {
        merged.insert("$ip".to_string(), Value::String(ip.clone()));
    }

    if let Some(time) = explicit.time {
        merged.insert("$time".to_string(), Value::from(time));
    }

    merged
}
