use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::appointment::OfferingRef;
use crate::domain::hours::TimeInterval;

pub type RequestId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Changed,
}

/// An operator counter-offer attached to a `Changed` request.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SuggestedTime {
    pub date: NaiveDate,
    pub interval: TimeInterval,
}

/// A client's proposal for a booking. Ephemeral negotiation state: every
/// terminal transition deletes the request, and the appointment created on
/// approval or acceptance is the durable record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookingRequest {
    pub id: RequestId,
    pub client_id: Uuid,
    pub offering: OfferingRef,
    pub date: NaiveDate,
    /// The end of the requested slot is derived from the offering's duration.
    pub start: NaiveTime,
    pub message: Option<String>,
    pub status: RequestStatus,
    pub suggested: Option<SuggestedTime>,
    pub hidden_by_client: bool,
}

impl BookingRequest {
    pub fn is_live(&self) -> bool {
        matches!(self.status, RequestStatus::Pending | RequestStatus::Changed)
    }
}
