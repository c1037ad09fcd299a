// src/event/mod.rs

//! Stage signaling primitives.
//!
//! The orchestrator is the only writer of these events; any number of
//! observers (status queries, front-ends, tests) read them concurrently.
//!
//! - [`stage`]: [`StageEvent`], a start/finish latch with a result value.
//! - [`progress`]: [`ProgressStageEvent`], a stage event that also carries a
//!   fractional progress signal.
//! - [`job_state`]: [`BackupJobState`], the fixed set of five events for one
//!   backup job plus the per-run paths.

pub mod job_state;
pub mod progress;
pub mod stage;

pub use job_state::{BackupJobState, StageName};
pub use progress::{ProgressStageEvent, clamp_progress};
pub use stage::{StageEvent, StagePhase};

/// Type-erased view over the events of a job, used for bulk reset and status
/// reporting.
pub trait StageSignal: Send + Sync {
    /// Return the event to its construction state.
    fn clear(&self);

    fn phase(&self) -> StagePhase;

    /// Stored boolean outcome, if the stage has finished.
    fn succeeded(&self) -> Option<bool>;

    /// Last progress fraction, for events that carry one.
    fn progress(&self) -> Option<f64> {
        None
    }
}
