use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("delivery failed: {0}")]
    Delivery(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    Operator,
    Client(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NotificationKind {
    BookingRequested,
    BookingApproved,
    BookingRejected,
    TimeSuggested,
    SuggestionAccepted,
    SuggestionRejected,
    RequestCancelled,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::BookingRequested => "booking_requested",
            NotificationKind::BookingApproved => "booking_approved",
            NotificationKind::BookingRejected => "booking_rejected",
            NotificationKind::TimeSuggested => "time_suggested",
            NotificationKind::SuggestionAccepted => "suggestion_accepted",
            NotificationKind::SuggestionRejected => "suggestion_rejected",
            NotificationKind::RequestCancelled => "request_cancelled",
        }
    }
}

/// Display data for the counterpart party. `end` is absent when the offering
/// duration could not be resolved; `message` carries the client message or
/// the operator's reason, depending on the kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub client_name: Option<String>,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: Option<NaiveTime>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub recipient: Recipient,
    pub kind: NotificationKind,
    pub payload: NotificationPayload,
}

/// Fire-and-forget delivery of state-change events to the counterpart party.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn notify(&self, notification: Notification) -> Result<(), NotifyError>;
}

/// Delivery is best-effort: a failed or timed-out notification is logged and
/// swallowed so it never rolls back the state transition that triggered it.
pub(crate) async fn deliver_best_effort(
    sink: &dyn NotificationSink,
    notification: Notification,
    timeout: Duration,
) {
    let kind = notification.kind;
    match tokio::time::timeout(timeout, sink.notify(notification)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => {
            tracing::warn!("failed to deliver {} notification: {}", kind.as_str(), err);
        }
        Err(_) => {
            tracing::warn!(
                "{} notification not delivered within {:?}",
                kind.as_str(),
                timeout
            );
        }
    }
}
