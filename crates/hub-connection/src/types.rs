//! Public types for the hub connection manager.

use std::time::Duration;

use harmony_bridge_protocol::constants::KEEPALIVE_PERIOD;
use harmony_bridge_protocol::{ActivityId, Hub};

use crate::session::SessionError;

/// Connection state of the configured hub.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    /// No hub selected.
    Unconfigured,
    /// Establishing a session and enumerating activities.
    Connecting { attempt: u32 },
    /// Session live, endpoints in sync.
    Connected,
    /// Hub went offline, the session is being replaced.
    Reconnecting,
}

/// Events emitted by the connection manager.
#[derive(Debug, Clone)]
pub enum ConnectionEvent {
    /// Connection state changed for the configured hub.
    StateChanged {
        hub: Option<Hub>,
        state: ConnectionState,
    },
    /// A connect attempt or a live session failed; a retry follows.
    LinkFailed {
        hub: Hub,
        attempt: u32,
        error: String,
    },
    /// Activities were enumerated after a connect.
    EndpointsSynced {
        hub: Hub,
        created: usize,
        refreshed: usize,
    },
    /// A status message was shown to the host.
    StatusReported { message: String, is_error: bool },
}

/// Why a hub link stopped. Every variant is transient and leads to a
/// reconnect against the same hub.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("connect to {address} failed: {source}")]
    Connect {
        address: String,
        #[source]
        source: SessionError,
    },

    #[error("activity enumeration failed: {0}")]
    Enumeration(#[source] SessionError),

    #[error("hub went offline")]
    Offline,
}

/// Failure of an activate or standby command. Reported to the caller,
/// never retried.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("no live hub session")]
    NotConnected,

    #[error("unknown activity {0}")]
    UnknownActivity(ActivityId),

    #[error("hub rejected command: {0}")]
    Failed(#[from] SessionError),
}

/// Delay policy between reconnect attempts.
///
/// The default retries immediately and forever. [`ReconnectConfig::backoff`]
/// opts into capped exponential backoff.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconnectConfig {
    /// Delay before the first retry. Zero disables backoff entirely.
    pub initial_delay: Duration,
    /// Maximum delay between attempts (backoff cap).
    pub max_delay: Duration,
    /// Multiplier for each subsequent attempt.
    pub backoff_factor: f64,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self::immediate()
    }
}

impl ReconnectConfig {
    /// Retry as soon as an attempt fails.
    pub fn immediate() -> Self {
        Self {
            initial_delay: Duration::ZERO,
            max_delay: Duration::ZERO,
            backoff_factor: 1.0,
        }
    }

    /// Exponential backoff from 250ms up to 15s.
    pub fn backoff() -> Self {
        Self {
            initial_delay: Duration::from_millis(250),
            max_delay: Duration::from_secs(15),
            backoff_factor: 2.0,
        }
    }

    /// Calculates the delay for a given attempt number (1-based),
    /// with ±25% jitter to avoid thundering herd.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if self.initial_delay.is_zero() {
            return Duration::ZERO;
        }
        let exp = attempt.saturating_sub(1).min(63) as i32;
        let secs = self.initial_delay.as_secs_f64() * self.backoff_factor.powi(exp);
        let capped = secs.min(self.max_delay.as_secs_f64());
        let jitter = capped * 0.25;
        let offset = (std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .subsec_nanos() as f64
            / u32::MAX as f64)
            * 2.0
            - 1.0; // [-1.0, 1.0)
        let with_jitter = (capped + jitter * offset).max(0.05);
        Duration::from_secs_f64(with_jitter)
    }
}

/// Tunables for [`ConnectionManager`](crate::ConnectionManager).
#[derive(Debug, Clone)]
pub struct ManagerConfig {
    /// Interval of the diagnostic keepalive poll.
    pub keepalive_period: Duration,
    pub reconnect: ReconnectConfig,
}

impl Default for ManagerConfig {
    fn default() -> Self {
        Self {
            keepalive_period: KEEPALIVE_PERIOD,
            reconnect: ReconnectConfig::default(),
        }
    }
}
