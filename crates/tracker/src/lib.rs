//! Generation lifecycle tracking.
//!
//! [`poller::poll_task`] is the per-job reconciliation loop: it polls
//! the remote task engine until the job reaches a terminal state, then
//! writes the outcome into the ledger exactly once. [`Tracker`] owns
//! the shared client and ledger, spawns one poller per submitted job,
//! and hands the caller a cancellable [`TrackedJob`] handle.

pub mod poller;
mod tracker;

use narrate_client::ClientError;
use narrate_core::CoreError;
use narrate_ledger::LedgerError;

pub use poller::{poll_task, PollError, PollOutcome, POLL_INTERVAL};
pub use tracker::{TrackedJob, Tracker};

/// Errors surfaced synchronously at submission time.
///
/// A job that fails here never enters tracking and leaves no ledger
/// record behind.
#[derive(Debug, thiserror::Error)]
pub enum TrackError {
    /// The request payload failed validation locally.
    #[error("Invalid request: {0}")]
    Invalid(#[from] CoreError),

    /// The remote rejected the submission or was unreachable.
    #[error("Submission failed: {0}")]
    Submit(#[from] ClientError),

    /// The pending record could not be persisted.
    #[error("Ledger write failed: {0}")]
    Ledger(#[from] LedgerError),
}
