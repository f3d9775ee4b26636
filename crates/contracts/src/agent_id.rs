//! AgentId - internal agent identifier
//!
//! Small non-negative integer, globally unique and stable for the fleet.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Internal agent identifier.
///
/// Distinct from the external identifiers carried on the wire; those are
/// translated into `AgentId` through the identity table before they touch
/// the graph or the epoch buffer.
///
/// # Examples
/// ```
/// use contracts::AgentId;
///
/// let ego = AgentId::new(0);
/// assert_eq!(ego.get(), 0);
/// assert_eq!(ego.to_string(), "agent0");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(u32);

impl AgentId {
    /// Create a new AgentId.
    #[inline]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw integer value.
    #[inline]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl From<u32> for AgentId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<AgentId> for u32 {
    #[inline]
    fn from(id: AgentId) -> Self {
        id.0
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "agent{}", self.0)
    }
}

impl fmt::Debug for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AgentId({})", self.0)
    }
}
