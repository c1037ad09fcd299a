// src/event/stage.rs

use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::StageSignal;

/// Lifecycle of a single stage within one run.
///
/// Transitions only move forward (`NotStarted -> Started -> Finished`, or
/// straight to `Finished`) until the event is cleared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum StagePhase {
    #[default]
    NotStarted,
    Started,
    Finished,
}

impl fmt::Display for StagePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StagePhase::NotStarted => "not started",
            StagePhase::Started => "running",
            StagePhase::Finished => "finished",
        };
        f.write_str(s)
    }
}

#[derive(Debug)]
struct StageInner<T> {
    phase: StagePhase,
    result: Option<T>,
}

/// Start/finish latch for one stage, carrying an optional result.
///
/// All field access goes through one mutex. Phase changes are additionally
/// published on a `watch` channel so waiters block without holding the lock.
/// Readers always receive a clone of the stored result, never a reference
/// into the event.
#[derive(Debug)]
pub struct StageEvent<T = bool> {
    inner: Mutex<StageInner<T>>,
    phase_tx: watch::Sender<StagePhase>,
}

impl<T: Clone> StageEvent<T> {
    pub fn new() -> Self {
        let (phase_tx, _) = watch::channel(StagePhase::NotStarted);
        Self {
            inner: Mutex::new(StageInner {
                phase: StagePhase::NotStarted,
                result: None,
            }),
            phase_tx,
        }
    }

    fn lock(&self) -> MutexGuard<'_, StageInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Latch `started`. Has no effect once the stage started or finished.
    pub fn emit_started(&self) {
        let mut inner = self.lock();
        if inner.phase == StagePhase::NotStarted {
            inner.phase = StagePhase::Started;
            self.phase_tx.send_replace(StagePhase::Started);
        }
    }

    /// Store `result` and latch `finished`.
    ///
    /// Calling this twice in one run overwrites the stored result.
    pub fn emit_finished(&self, result: T) {
        let mut inner = self.lock();
        inner.result = Some(result);
        inner.phase = StagePhase::Finished;
        self.phase_tx.send_replace(StagePhase::Finished);
    }

    /// Reset phase and result to the construction state.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.result = None;
        inner.phase = StagePhase::NotStarted;
        self.phase_tx.send_replace(StagePhase::NotStarted);
    }

    pub fn phase(&self) -> StagePhase {
        self.lock().phase
    }

    pub fn is_started(&self) -> bool {
        self.phase() != StagePhase::NotStarted
    }

    pub fn is_finished(&self) -> bool {
        self.phase() == StagePhase::Finished
    }

    /// Independent copy of the stored result (`None` until finished).
    pub fn result(&self) -> Option<T> {
        self.lock().result.clone()
    }

    /// Wait until the stage has started (or already finished).
    pub async fn wait_started(&self) {
        let mut rx = self.phase_tx.subscribe();
        let _ = rx.wait_for(|phase| *phase != StagePhase::NotStarted).await;
    }

    /// Wait until the stage has finished and return its result.
    pub async fn wait_finished(&self) -> Option<T> {
        let mut rx = self.phase_tx.subscribe();
        let _ = rx.wait_for(|phase| *phase == StagePhase::Finished).await;
        self.result()
    }
}

impl<T: Clone> Default for StageEvent<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl StageSignal for StageEvent<bool> {
    fn clear(&self) {
        StageEvent::clear(self);
    }

    fn phase(&self) -> StagePhase {
        StageEvent::phase(self)
    }

    fn succeeded(&self) -> Option<bool> {
        self.result()
    }
}
