// src/dispatch/dialog.rs

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::types::OperatorId;

/// Open confirmation dialogs, at most one per operator.
///
/// Each open dialog carries a generation number so a timer armed for an old
/// dialog cannot close a newer one opened by the same operator.
#[derive(Debug, Default)]
pub struct DialogSessions {
    open: Mutex<HashMap<OperatorId, u64>>,
    next_generation: AtomicU64,
}

impl DialogSessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<OperatorId, u64>> {
        self.open.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Open (or reopen) the dialog of `id`, returning its generation.
    pub fn open(&self, id: OperatorId) -> u64 {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        self.lock().insert(id, generation);
        generation
    }

    /// Close the dialog of `id`. Returns whether one was open.
    pub fn close(&self, id: OperatorId) -> bool {
        self.lock().remove(&id).is_some()
    }

    /// Close the dialog of `id` only if it is still the given generation.
    pub fn close_if(&self, id: OperatorId, generation: u64) -> bool {
        let mut open = self.lock();
        if open.get(&id) == Some(&generation) {
            open.remove(&id);
            true
        } else {
            false
        }
    }

    pub fn is_open(&self, id: OperatorId) -> bool {
        self.lock().contains_key(&id)
    }
}
