use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::POWER_OFF_KIND;

/// A hub reachable on the local network.
///
/// The address is the hub's identity; the name is only for display.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Hub {
    pub name: String,
    pub address: String,
}

impl Hub {
    pub fn new(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: address.into(),
        }
    }

    /// Returns true when both name and address are set.
    pub fn is_configured(&self) -> bool {
        !self.name.is_empty() && !self.address.is_empty()
    }
}

impl fmt::Display for Hub {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Identifier of an activity configured on the hub.
///
/// The hub reports ids both as JSON numbers and as strings depending on the
/// message, so numeric ids are normalised to their decimal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "RawActivityId", into = "String")]
pub struct ActivityId(String);

impl ActivityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ActivityId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ActivityId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<i64> for ActivityId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl From<i32> for ActivityId {
    fn from(id: i32) -> Self {
        Self(id.to_string())
    }
}

impl From<ActivityId> for String {
    fn from(id: ActivityId) -> Self {
        id.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawActivityId {
    Text(String),
    Number(i64),
}

impl From<RawActivityId> for ActivityId {
    fn from(raw: RawActivityId) -> Self {
        match raw {
            RawActivityId::Text(s) => Self(s),
            RawActivityId::Number(n) => Self(n.to_string()),
        }
    }
}

/// Kind of an activity as reported by the hub's `type` field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ActivityKind {
    /// The reserved "all off" activity. Never exposed as an endpoint.
    PowerOff,
    /// Any user-configured activity (e.g. `VirtualTelevisionN`).
    Other(String),
}

impl From<String> for ActivityKind {
    fn from(kind: String) -> Self {
        if kind == POWER_OFF_KIND {
            ActivityKind::PowerOff
        } else {
            ActivityKind::Other(kind)
        }
    }
}

impl From<ActivityKind> for String {
    fn from(kind: ActivityKind) -> Self {
        match kind {
            ActivityKind::PowerOff => POWER_OFF_KIND.to_string(),
            ActivityKind::Other(s) => s,
        }
    }
}

/// An activity configured on the hub.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Activity {
    pub id: ActivityId,
    #[serde(default)]
    pub label: String,
    #[serde(rename = "type")]
    pub kind: ActivityKind,
}

impl Activity {
    pub fn new(id: impl Into<ActivityId>, label: impl Into<String>, kind: ActivityKind) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
            kind,
        }
    }

    /// Returns true if this activity can be exposed as a control endpoint.
    pub fn is_controllable(&self) -> bool {
        self.kind != ActivityKind::PowerOff
    }
}

/// Status of a control endpoint as seen by the host controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EndpointStatus {
    Selected,
    Standby,
}

impl EndpointStatus {
    /// Status of `activity` given the hub's current activity.
    pub fn for_current(activity: &ActivityId, current: &ActivityId) -> Self {
        if activity == current {
            EndpointStatus::Selected
        } else {
            EndpointStatus::Standby
        }
    }
}

impl fmt::Display for EndpointStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EndpointStatus::Selected => write!(f, "selected"),
            EndpointStatus::Standby => write!(f, "standby"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hub_configured_requires_name_and_address() {
        assert!(Hub::new("Living Room", "192.168.1.20").is_configured());
        assert!(!Hub::new("", "192.168.1.20").is_configured());
        assert!(!Hub::new("Living Room", "").is_configured());
    }

    #[test]
    fn activity_id_accepts_numbers_and_strings() {
        let from_num: ActivityId = serde_json::from_str("-1").unwrap();
        let from_str: ActivityId = serde_json::from_str("\"-1\"").unwrap();
        assert_eq!(from_num, from_str);
        assert_eq!(from_num, ActivityId::from(-1));
    }

    #[test]
    fn activity_parses_hub_record() {
        let json = r#"{"id":"23788","label":"Watch TV","type":"VirtualTelevisionN","isAVActivity":true}"#;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.id.as_str(), "23788");
        assert_eq!(activity.label, "Watch TV");
        assert!(activity.is_controllable());
    }

    #[test]
    fn power_off_is_not_controllable() {
        let json = r#"{"id":-1,"label":"PowerOff","type":"PowerOff"}"#;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.kind, ActivityKind::PowerOff);
        assert!(!activity.is_controllable());
    }

    #[test]
    fn status_for_current() {
        let one = ActivityId::from(1);
        let two = ActivityId::from(2);
        assert_eq!(EndpointStatus::for_current(&one, &one), EndpointStatus::Selected);
        assert_eq!(EndpointStatus::for_current(&two, &one), EndpointStatus::Standby);
    }

    #[test]
    fn endpoint_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&EndpointStatus::Selected).unwrap(),
            "\"selected\""
        );
        assert_eq!(EndpointStatus::Standby.to_string(), "standby");
    }
}
