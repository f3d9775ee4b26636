//! External-to-internal identifier translation.

use std::collections::HashMap;

use contracts::{AgentId, ContractError};

/// Fixed external-to-internal identifier table, supplied at startup.
#[derive(Debug, Clone, Default)]
pub struct IdentityMap {
    table: HashMap<u32, AgentId>,
}

impl IdentityMap {
    /// Create from a translation table.
    pub fn new(table: HashMap<u32, AgentId>) -> Self {
        Self { table }
    }

    /// Translate an external wire identifier into an internal agent id.
    ///
    /// # Errors
    /// `UnknownIdentifier` if the external id has no table entry. Callers
    /// must treat this as "drop the observation", never as fatal.
    pub fn translate(&self, external: u32) -> Result<AgentId, ContractError> {
        self.table
            .get(&external)
            .copied()
            .ok_or(ContractError::UnknownIdentifier { external })
    }

    /// Check whether any external id maps to the given internal agent.
    pub fn maps_to(&self, internal: AgentId) -> bool {
        self.table.values().any(|&id| id == internal)
    }

    /// Number of table entries.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}
