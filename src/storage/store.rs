use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use thiserror::Error;
use uuid::Uuid;

use crate::domain::{
    Appointment, AppointmentId, BookingRequest, ClientRef, OfferingRef, RequestId, RequestStatus,
    SuggestedTime, TimeInterval,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("slot {} is already booked", .0.interval)]
    SlotTaken(Box<Appointment>),
    #[error("a live request for this client and slot already exists")]
    DuplicateRequest,
    #[error("record not found")]
    NotFound,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub date: NaiveDate,
    pub interval: TimeInterval,
    pub client: ClientRef,
    pub offering: OfferingRef,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewRequest {
    pub client_id: Uuid,
    pub offering: OfferingRef,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RequestFilter {
    pub client: Option<Uuid>,
    pub status: Option<RequestStatus>,
    /// Requests a client dismissed from their list view are excluded unless
    /// this is set.
    pub include_hidden: bool,
}

/// Persistence seam for appointments and booking requests.
///
/// The store owns the calendar invariants: `insert_appointment` and
/// `replace_appointment` perform the overlap check and the write as one
/// atomic unit, and `insert_request` enforces at most one live request per
/// (client, date, start). Callers may pre-check for friendlier errors but
/// must never rely on a check-then-act gap.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    async fn list_appointments(&self, date: NaiveDate) -> Result<Vec<Appointment>, StoreError>;

    async fn get_appointment(&self, id: AppointmentId) -> Result<Appointment, StoreError>;

    /// Fails with `SlotTaken` when the interval overlaps a confirmed
    /// appointment on the same date; the check and the insert are atomic.
    async fn insert_appointment(&self, new: NewAppointment) -> Result<Appointment, StoreError>;

    /// Replace-in-place edit. Validates the new interval against every other
    /// appointment before deleting the old row; on `SlotTaken` the original
    /// is left untouched. The appointment keeps its id.
    async fn replace_appointment(
        &self,
        id: AppointmentId,
        new: NewAppointment,
    ) -> Result<Appointment, StoreError>;

    async fn cancel_appointment(&self, id: AppointmentId) -> Result<(), StoreError>;

    async fn delete_appointment(&self, id: AppointmentId) -> Result<(), StoreError>;

    async fn get_request(&self, id: RequestId) -> Result<BookingRequest, StoreError>;

    async fn list_requests(&self, filter: RequestFilter)
        -> Result<Vec<BookingRequest>, StoreError>;

    /// Fails with `DuplicateRequest` when a live request for the same
    /// (client, date, start) already exists.
    async fn insert_request(&self, new: NewRequest) -> Result<BookingRequest, StoreError>;

    async fn update_request(
        &self,
        id: RequestId,
        status: RequestStatus,
        suggested: Option<SuggestedTime>,
    ) -> Result<(), StoreError>;

    /// Marks a request as dismissed from the client's list view.
    async fn hide_request(&self, id: RequestId) -> Result<(), StoreError>;

    async fn delete_request(&self, id: RequestId) -> Result<(), StoreError>;
}
