//! State digests pushed by the hub while a session is live.

use serde::{Deserialize, Serialize};

use crate::types::{ActivityId, EndpointStatus};

/// Phase of the hub's current activity, from the digest's `activityStatus`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "i64", into = "i64")]
pub enum ActivityPhase {
    HubOff,
    Starting,
    Started,
    TurningOff,
    Unknown(i64),
}

impl ActivityPhase {
    /// Returns true while an activity is starting or running.
    pub fn is_active(self) -> bool {
        matches!(self, ActivityPhase::Starting | ActivityPhase::Started)
    }
}

impl From<i64> for ActivityPhase {
    fn from(code: i64) -> Self {
        match code {
            0 => ActivityPhase::HubOff,
            1 => ActivityPhase::Starting,
            2 => ActivityPhase::Started,
            3 => ActivityPhase::TurningOff,
            other => ActivityPhase::Unknown(other),
        }
    }
}

impl From<ActivityPhase> for i64 {
    fn from(phase: ActivityPhase) -> Self {
        match phase {
            ActivityPhase::HubOff => 0,
            ActivityPhase::Starting => 1,
            ActivityPhase::Started => 2,
            ActivityPhase::TurningOff => 3,
            ActivityPhase::Unknown(code) => code,
        }
    }
}

/// Which activity the hub is on and in what phase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateDigest {
    pub activity_id: ActivityId,
    pub activity_status: ActivityPhase,
}

impl StateDigest {
    pub fn new(activity_id: impl Into<ActivityId>, activity_status: ActivityPhase) -> Self {
        Self {
            activity_id: activity_id.into(),
            activity_status,
        }
    }

    /// Status an endpoint for `activity` should show after this digest.
    ///
    /// Only a starting or started activity selects its endpoint; a hub that
    /// is off or turning off leaves every endpoint in standby.
    pub fn status_for(&self, activity: &ActivityId) -> EndpointStatus {
        if self.activity_status.is_active() {
            EndpointStatus::for_current(activity, &self.activity_id)
        } else {
            EndpointStatus::Standby
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_codes() {
        assert_eq!(ActivityPhase::from(0), ActivityPhase::HubOff);
        assert_eq!(ActivityPhase::from(2), ActivityPhase::Started);
        assert_eq!(ActivityPhase::from(7), ActivityPhase::Unknown(7));
        assert!(ActivityPhase::Starting.is_active());
        assert!(!ActivityPhase::TurningOff.is_active());
    }

    #[test]
    fn started_digest_selects_only_its_activity() {
        let digest = StateDigest::new(1, ActivityPhase::Started);
        assert_eq!(digest.status_for(&ActivityId::from(1)), EndpointStatus::Selected);
        assert_eq!(digest.status_for(&ActivityId::from(2)), EndpointStatus::Standby);
    }

    #[test]
    fn starting_digest_selects_its_activity() {
        let digest = StateDigest::new("7", ActivityPhase::Starting);
        assert_eq!(digest.status_for(&ActivityId::from(7)), EndpointStatus::Selected);
    }

    #[test]
    fn hub_off_and_turning_off_force_standby() {
        for phase in [
            ActivityPhase::HubOff,
            ActivityPhase::TurningOff,
            ActivityPhase::Unknown(9),
        ] {
            let digest = StateDigest::new(1, phase);
            assert_eq!(digest.status_for(&ActivityId::from(1)), EndpointStatus::Standby);
        }
    }

    #[test]
    fn parses_hub_digest_payload() {
        let json = r#"{"activityId":"23788","activityStatus":2,"runningActivityList":"23788"}"#;
        let digest: StateDigest = serde_json::from_str(json).unwrap();
        assert_eq!(digest.activity_id, ActivityId::from(23788));
        assert_eq!(digest.activity_status, ActivityPhase::Started);
    }
}
