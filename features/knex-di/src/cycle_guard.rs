use std::{any::TypeId, collections::HashSet};

use crate::{errors::KnexError, types::TypeInfo};

/// Implementations currently under construction in one query
///
/// Only the active call chain is tracked: every [CycleGuard::enter] is paired
/// with a [CycleGuard::leave] once the construction attempt is over.
#[derive(Debug, Default)]
pub struct CycleGuard {
    active: HashSet<TypeId>,
    chain: Vec<TypeInfo>,
}

impl CycleGuard {
    /// Marks `implementation` as in progress
    ///
    /// Fails if it already is, i.e. it (transitively) depends on itself.
    pub fn enter(&mut self, implementation: TypeInfo) -> Result<(), KnexError> {
        if !self.active.insert(implementation.type_id) {
            let mut chain: Vec<String> =
                self.chain.iter().map(|i| i.type_name.to_string()).collect();
            chain.push(implementation.type_name.to_string()); // Close the loop
            return Err(KnexError::circular(implementation.type_name, chain));
        }
        self.chain.push(implementation);
        Ok(())
    }

    pub fn leave(&mut self, implementation: TypeInfo) {
        self.active.remove(&implementation.type_id);
        if let Some(pos) = self.chain.iter().rposition(|i| *i == implementation) {
            self.chain.remove(pos);
        }
    }

    pub fn contains(&self, implementation: TypeInfo) -> bool {
        self.active.contains(&implementation.type_id)
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
