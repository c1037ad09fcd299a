// src/event/progress.rs

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;

use super::StageSignal;
use super::stage::{StageEvent, StagePhase};

/// A [`StageEvent`] that can also report intermediate progress.
///
/// Progress is a fraction in `[0.0, 1.0]`; out-of-range writes are clamped.
/// `progress_value` is only meaningful once `progress_signaled` is true.
#[derive(Debug)]
pub struct ProgressStageEvent<T = bool> {
    stage: StageEvent<T>,
    progress: Mutex<Option<f64>>,
    progress_tx: watch::Sender<Option<f64>>,
}

/// Clamp a raw progress reading into `[0.0, 1.0]`. NaN maps to 0.0.
pub fn clamp_progress(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

impl<T: Clone> ProgressStageEvent<T> {
    pub fn new() -> Self {
        let (progress_tx, _) = watch::channel(None);
        Self {
            stage: StageEvent::new(),
            progress: Mutex::new(None),
            progress_tx,
        }
    }

    fn lock_progress(&self) -> MutexGuard<'_, Option<f64>> {
        self.progress.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Underlying start/finish event.
    pub fn stage(&self) -> &StageEvent<T> {
        &self.stage
    }

    pub fn emit_started(&self) {
        self.stage.emit_started();
    }

    pub fn emit_finished(&self, result: T) {
        self.stage.emit_finished(result);
    }

    /// Record a progress reading. Every call is a fresh signal; earlier
    /// values are not kept.
    pub fn emit_progress(&self, value: f64) {
        let value = clamp_progress(value);
        let mut progress = self.lock_progress();
        *progress = Some(value);
        self.progress_tx.send_replace(Some(value));
    }

    /// Reset stage and progress to the construction state.
    pub fn clear(&self) {
        let mut progress = self.lock_progress();
        *progress = None;
        self.progress_tx.send_replace(None);
        drop(progress);
        self.stage.clear();
    }

    pub fn phase(&self) -> StagePhase {
        self.stage.phase()
    }

    pub fn is_started(&self) -> bool {
        self.stage.is_started()
    }

    pub fn is_finished(&self) -> bool {
        self.stage.is_finished()
    }

    pub fn result(&self) -> Option<T> {
        self.stage.result()
    }

    pub fn progress_signaled(&self) -> bool {
        self.lock_progress().is_some()
    }

    /// Last progress reading, `0.0` before any signal.
    pub fn progress_value(&self) -> f64 {
        self.lock_progress().unwrap_or(0.0)
    }

    /// Wait until at least one progress signal arrived and return the latest
    /// value.
    pub async fn wait_progress(&self) -> f64 {
        let mut rx = self.progress_tx.subscribe();
        let _ = rx.wait_for(Option::is_some).await;
        self.progress_value()
    }

    pub async fn wait_started(&self) {
        self.stage.wait_started().await;
    }

    pub async fn wait_finished(&self) -> Option<T> {
        self.stage.wait_finished().await
    }
}

impl<T: Clone> Default for ProgressStageEvent<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl StageSignal for ProgressStageEvent<bool> {
    fn clear(&self) {
        ProgressStageEvent::clear(self);
    }

    fn phase(&self) -> StagePhase {
        ProgressStageEvent::phase(self)
    }

    fn succeeded(&self) -> Option<bool> {
        self.result()
    }

    fn progress(&self) -> Option<f64> {
        *self.lock_progress()
    }
}
