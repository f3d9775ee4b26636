//! Observation types - Ingestion output
//!
//! Wire-level and translated observation structures.

use serde::{Deserialize, Serialize};

use crate::AgentId;

/// Inter-agent range measurement, identifiers already translated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RangeObservation {
    /// Measuring agent
    pub from: AgentId,

    /// Measured agent
    pub to: AgentId,

    /// Measured distance (meters)
    pub distance: f64,

    /// Measurement timestamp (seconds, f64)
    pub timestamp: f64,
}

/// Range measurement as carried on the wire, with external identifiers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawRangeObservation {
    /// External id of the measuring agent
    pub from_id: u32,

    /// External id of the measured agent
    pub to_id: u32,

    /// Measured distance (meters)
    pub distance: f64,

    /// Measurement timestamp (seconds, f64)
    pub timestamp: f64,
}

/// Auxiliary pose estimate for one neighbor (position/orientation feed).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoseObservation {
    /// Position estimate (meters)
    pub position: Vector3,

    /// Orientation estimate
    pub orientation: Quaternion,

    /// Row-major 6x6 pose covariance
    pub covariance: Vec<f64>,

    /// Estimate timestamp (seconds, f64)
    pub timestamp: f64,
}

/// Control command applied by one agent, identifier already translated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ControlObservation {
    /// Commanding agent
    pub agent: AgentId,

    /// Commanded forward velocity (m/s)
    pub velocity: f64,

    /// Commanded steering angle (rad)
    pub steering: f64,

    /// Command timestamp (seconds, f64)
    pub timestamp: f64,
}

/// Control command as carried on the wire, with an external identifier.
///
/// Arrives on one shared feed for all agents; only entries whose translated
/// id is a neighbor of the ego agent are retained.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RawControlObservation {
    /// External id of the commanding agent
    pub car_id: u32,

    /// Commanded forward velocity (m/s)
    pub velocity: f64,

    /// Commanded steering angle (rad)
    pub steering: f64,

    /// Command timestamp (seconds, f64)
    pub timestamp: f64,
}

/// Unified inbound event type for the aggregation loop.
///
/// Every ingestion feed produces these; the aggregation loop is the single
/// consumer and the exclusive owner of the epoch buffer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ObservationEvent {
    /// Range measurement from the shared ranging feed
    Range(RawRangeObservation),

    /// Pose update from the per-neighbor pose feed.
    ///
    /// The feed-to-neighbor-index binding is established at startup, so the
    /// index arrives with the event rather than being looked up.
    Pose {
        neighbor_index: usize,
        pose: PoseObservation,
    },

    /// Control command from the shared control feed
    Control(RawControlObservation),
}

/// 3D vector
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Unit quaternion (x, y, z, w)
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            z: 0.0,
            w: 1.0,
        }
    }
}

impl PoseObservation {
    /// Identity pose at the given timestamp, zero covariance.
    pub fn identity(timestamp: f64) -> Self {
        Self {
            position: Vector3::default(),
            orientation: Quaternion::default(),
            covariance: vec![0.0; 36],
            timestamp,
        }
    }
}

/// Drop policy for bounded ingestion channels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DropPolicy {
    /// Drop the incoming event when the channel is full
    #[default]
    DropNewest,
    /// Evict the oldest queued event to make room
    DropOldest,
}
