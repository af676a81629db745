//! Shared data model for the Harmony Hub bridge.
//!
//! Hubs, activities and the state digests a hub pushes while a session is
//! live, plus the status values exposed to the host controller.

pub mod constants;
pub mod digest;
pub mod types;

pub use digest::{ActivityPhase, StateDigest};
pub use types::{Activity, ActivityId, ActivityKind, EndpointStatus, Hub};
