pub mod edit;
pub mod workflow;

use thiserror::Error;

use crate::domain::hours::IntervalError;
use crate::domain::{Appointment, RequestStatus};
use crate::storage::store::StoreError;

pub use workflow::BookingWorkflow;

/// Outcomes of the booking operations. `SlotConflict` and
/// `SlotNoLongerAvailable` are recoverable: they carry the conflicting
/// appointment so the caller can propose an alternative or pick another
/// slot. Notification failures are deliberately absent; delivery is
/// best-effort and never fails a committed transition.
#[derive(Debug, Error)]
pub enum BookingError {
    #[error("invalid interval: {0}")]
    InvalidInterval(#[from] IntervalError),
    #[error("a live request for this slot already exists")]
    DuplicateRequest,
    #[error("the requested time overlaps the appointment at {}", .conflicting.interval)]
    SlotConflict { conflicting: Box<Appointment> },
    #[error("the suggested time has been taken by the appointment at {}", .conflicting.interval)]
    SlotNoLongerAvailable { conflicting: Box<Appointment> },
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("cannot {action} a request in the {status:?} state")]
    InvalidTransition {
        action: &'static str,
        status: RequestStatus,
    },
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}

/// Maps the store's `NotFound` to a caller-facing `NotFound` naming the
/// missing record; everything else stays a storage error.
fn missing(what: &'static str) -> impl FnOnce(StoreError) -> BookingError {
    move |err| match err {
        StoreError::NotFound => BookingError::NotFound(what),
        other => BookingError::Store(other),
    }
}
