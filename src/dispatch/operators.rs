// src/dispatch/operators.rs

use std::collections::HashMap;

use crate::config::OperatorEntry;
use crate::types::{OperatorId, Role};

/// Known operators and their roles, loaded once at startup.
#[derive(Debug, Clone, Default)]
pub struct OperatorRegistry {
    roles: HashMap<OperatorId, Role>,
    owner: Option<OperatorId>,
}

impl OperatorRegistry {
    pub fn new(entries: &[OperatorEntry]) -> Self {
        let roles = entries.iter().map(|op| (op.id, op.role)).collect();
        let owner = entries
            .iter()
            .find(|op| op.role == Role::Owner)
            .map(|op| op.id);
        Self { roles, owner }
    }

    /// Role of `id`; anyone not registered is a [`Role::Stranger`].
    pub fn role_of(&self, id: OperatorId) -> Role {
        self.roles.get(&id).copied().unwrap_or(Role::Stranger)
    }

    /// First configured owner.
    pub fn owner_id(&self) -> Option<OperatorId> {
        self.owner
    }
}
