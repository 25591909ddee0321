use std::sync::Arc;
use std::time::Duration;

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

use crate::booking::{BookingError, missing};
use crate::catalog::ServiceCatalog;
use crate::directory::ClientDirectory;
use crate::domain::hours::IntervalError;
use crate::domain::{
    Appointment, BookingRequest, ClientRef, OfferingRef, RequestId, RequestStatus, SuggestedTime,
    TimeInterval, WorkingHours,
};
use crate::notify::{
    self, Notification, NotificationKind, NotificationPayload, NotificationSink, Recipient,
};
use crate::scheduling::availability::{self, GridSlot};
use crate::scheduling::{clock, conflict};
use crate::storage::config::{BookingConfig, ConfigError};
use crate::storage::store::{AppointmentStore, NewAppointment, NewRequest, StoreError};

/// Drives a booking request from submission to resolution and answers the
/// availability queries the screens are built from.
///
/// Every mutating operation re-validates against the live calendar before
/// writing, and the store repeats the check atomically with the write, so a
/// request approved from a stale screen can never double-book a slot.
pub struct BookingWorkflow {
    pub(super) store: Arc<dyn AppointmentStore>,
    catalog: Arc<dyn ServiceCatalog>,
    directory: Arc<dyn ClientDirectory>,
    notifier: Arc<dyn NotificationSink>,
    week: [WorkingHours; 7],
    step_minutes: u32,
    min_gap_minutes: u32,
    min_appointment_minutes: u32,
    notify_timeout: Duration,
}

impl BookingWorkflow {
    pub fn new(
        store: Arc<dyn AppointmentStore>,
        catalog: Arc<dyn ServiceCatalog>,
        directory: Arc<dyn ClientDirectory>,
        notifier: Arc<dyn NotificationSink>,
        config: &BookingConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            store,
            catalog,
            directory,
            notifier,
            week: config.resolve_week()?,
            step_minutes: config.scheduling.slot_step_minutes,
            min_gap_minutes: config.scheduling.min_gap_minutes,
            min_appointment_minutes: config.scheduling.min_appointment_minutes,
            notify_timeout: config.delivery_timeout(),
        })
    }

    /// Submits a client request for a slot. The requested end time is derived
    /// from the offering's duration; a live request for the same
    /// (client, date, start) is refused before anything is written.
    pub async fn submit(&self, new: NewRequest) -> Result<BookingRequest, BookingError> {
        self.request_interval(new.offering, new.start).await?;

        let request = self.store.insert_request(new).await.map_err(|err| match err {
            StoreError::DuplicateRequest => BookingError::DuplicateRequest,
            other => BookingError::Store(other),
        })?;

        tracing::info!(
            "request {} submitted for {} at {}",
            request.id,
            request.date,
            clock::format_time(request.start)
        );
        let end = self.end_hint(request.offering, request.start).await;
        self.send(
            Recipient::Operator,
            NotificationKind::BookingRequested,
            ClientRef::Registered(request.client_id),
            request.date,
            request.start,
            end,
            request.message.clone(),
        )
        .await;
        Ok(request)
    }

    /// Approves a pending request, turning it into a confirmed appointment.
    ///
    /// The conflict check runs against the appointments live in the store at
    /// approval time, never against a snapshot from submission: if the slot
    /// has been taken in the meantime the approval is refused and the
    /// operator must reject or propose an alternative instead.
    pub async fn approve(&self, request_id: RequestId) -> Result<Appointment, BookingError> {
        let request = self.get_request(request_id).await?;
        if request.status != RequestStatus::Pending {
            return Err(BookingError::InvalidTransition {
                action: "approve",
                status: request.status,
            });
        }

        let interval = self.request_interval(request.offering, request.start).await?;
        let existing = self.store.list_appointments(request.date).await?;
        if let Some(conflicting) = conflict::first_conflict(&interval, &existing, None) {
            return Err(BookingError::SlotConflict {
                conflicting: Box::new(conflicting.clone()),
            });
        }

        let appointment = self
            .store
            .insert_appointment(NewAppointment {
                date: request.date,
                interval,
                client: ClientRef::Registered(request.client_id),
                offering: request.offering,
                notes: request.message.clone(),
            })
            .await
            .map_err(|err| match err {
                StoreError::SlotTaken(existing) => BookingError::SlotConflict {
                    conflicting: existing,
                },
                other => BookingError::Store(other),
            })?;
        self.store
            .delete_request(request_id)
            .await
            .map_err(missing("request"))?;

        tracing::info!(
            "request {} approved as appointment {}",
            request_id,
            appointment.id
        );
        self.send(
            Recipient::Client(request.client_id),
            NotificationKind::BookingApproved,
            ClientRef::Registered(request.client_id),
            appointment.date,
            appointment.interval.start,
            Some(appointment.interval.end),
            None,
        )
        .await;
        Ok(appointment)
    }

    /// Rejects a request. Rejected requests are discarded, not archived, once
    /// the client has been notified; a second call reports `NotFound`.
    pub async fn reject(
        &self,
        request_id: RequestId,
        reason: Option<String>,
    ) -> Result<(), BookingError> {
        let request = self.get_request(request_id).await?;
        self.store
            .delete_request(request_id)
            .await
            .map_err(missing("request"))?;

        tracing::info!("request {} rejected", request_id);
        let end = self.end_hint(request.offering, request.start).await;
        self.send(
            Recipient::Client(request.client_id),
            NotificationKind::BookingRejected,
            ClientRef::Registered(request.client_id),
            request.date,
            request.start,
            end,
            reason,
        )
        .await;
        Ok(())
    }

    /// Attaches an operator counter-offer. The calendar is untouched until
    /// the client accepts; re-proposing over an earlier suggestion is
    /// allowed.
    pub async fn propose_alternative(
        &self,
        request_id: RequestId,
        suggested: SuggestedTime,
    ) -> Result<BookingRequest, BookingError> {
        let mut request = self.get_request(request_id).await?;
        self.validate_interval(&suggested.interval)?;

        self.store
            .update_request(request_id, RequestStatus::Changed, Some(suggested))
            .await
            .map_err(missing("request"))?;
        request.status = RequestStatus::Changed;
        request.suggested = Some(suggested);

        tracing::info!(
            "request {} changed, suggested {} {}",
            request_id,
            suggested.date,
            suggested.interval
        );
        self.send(
            Recipient::Client(request.client_id),
            NotificationKind::TimeSuggested,
            ClientRef::Registered(request.client_id),
            suggested.date,
            suggested.interval.start,
            Some(suggested.interval.end),
            request.message.clone(),
        )
        .await;
        Ok(request)
    }

    /// Client accepts the suggested time. The suggestion is re-validated
    /// against the live calendar; if something else took the slot in the
    /// interim the call fails with `SlotNoLongerAvailable` and the request
    /// stays `Changed` for the operator to re-propose.
    pub async fn accept_alternative(
        &self,
        request_id: RequestId,
    ) -> Result<Appointment, BookingError> {
        let request = self.get_request(request_id).await?;
        let suggested = match (request.status, request.suggested) {
            (RequestStatus::Changed, Some(suggested)) => suggested,
            _ => {
                return Err(BookingError::InvalidTransition {
                    action: "accept an alternative for",
                    status: request.status,
                });
            }
        };

        let existing = self.store.list_appointments(suggested.date).await?;
        if let Some(conflicting) = conflict::first_conflict(&suggested.interval, &existing, None) {
            return Err(BookingError::SlotNoLongerAvailable {
                conflicting: Box::new(conflicting.clone()),
            });
        }

        let appointment = self
            .store
            .insert_appointment(NewAppointment {
                date: suggested.date,
                interval: suggested.interval,
                client: ClientRef::Registered(request.client_id),
                offering: request.offering,
                notes: request.message.clone(),
            })
            .await
            .map_err(|err| match err {
                StoreError::SlotTaken(existing) => BookingError::SlotNoLongerAvailable {
                    conflicting: existing,
                },
                other => BookingError::Store(other),
            })?;
        self.store
            .delete_request(request_id)
            .await
            .map_err(missing("request"))?;

        tracing::info!(
            "suggestion for request {} accepted as appointment {}",
            request_id,
            appointment.id
        );
        self.send(
            Recipient::Operator,
            NotificationKind::SuggestionAccepted,
            ClientRef::Registered(request.client_id),
            appointment.date,
            appointment.interval.start,
            Some(appointment.interval.end),
            None,
        )
        .await;
        Ok(appointment)
    }

    /// Client declines the suggested time; the request is discarded.
    pub async fn reject_alternative(
        &self,
        request_id: RequestId,
        reason: Option<String>,
    ) -> Result<(), BookingError> {
        let request = self.get_request(request_id).await?;
        let Some(suggested) = request
            .suggested
            .filter(|_| request.status == RequestStatus::Changed)
        else {
            return Err(BookingError::InvalidTransition {
                action: "reject an alternative for",
                status: request.status,
            });
        };

        self.store
            .delete_request(request_id)
            .await
            .map_err(missing("request"))?;

        tracing::info!("suggestion for request {} rejected", request_id);
        self.send(
            Recipient::Operator,
            NotificationKind::SuggestionRejected,
            ClientRef::Registered(request.client_id),
            suggested.date,
            suggested.interval.start,
            Some(suggested.interval.end),
            reason,
        )
        .await;
        Ok(())
    }

    /// Client withdraws a request that has not been acted on yet.
    pub async fn cancel(
        &self,
        request_id: RequestId,
        reason: Option<String>,
    ) -> Result<(), BookingError> {
        let request = self.get_request(request_id).await?;
        if request.status != RequestStatus::Pending {
            return Err(BookingError::InvalidTransition {
                action: "cancel",
                status: request.status,
            });
        }

        self.store
            .delete_request(request_id)
            .await
            .map_err(missing("request"))?;

        tracing::info!("request {} cancelled by the client", request_id);
        let end = self.end_hint(request.offering, request.start).await;
        self.send(
            Recipient::Operator,
            NotificationKind::RequestCancelled,
            ClientRef::Registered(request.client_id),
            request.date,
            request.start,
            end,
            reason,
        )
        .await;
        Ok(())
    }

    /// Free ranges of a day, for the slot-picking screens. `now` suppresses
    /// past times when the queried date is today.
    pub async fn free_ranges_on(
        &self,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Vec<TimeInterval>, BookingError> {
        let occupied = self.occupied_intervals(date).await?;
        Ok(availability::free_ranges(
            self.hours_on(date),
            &occupied,
            time_of(date, now),
            self.step_minutes,
            self.min_gap_minutes,
        ))
    }

    /// The fixed-step grid of a day, for the calendar view.
    pub async fn day_grid(
        &self,
        date: NaiveDate,
        now: NaiveDateTime,
    ) -> Result<Vec<GridSlot>, BookingError> {
        let appointments = self.store.list_appointments(date).await?;
        Ok(availability::fixed_grid_slots(
            self.hours_on(date),
            &appointments,
            time_of(date, now),
            self.step_minutes,
        ))
    }

    /// Bookable start times for one offering on a day.
    pub async fn start_options(
        &self,
        date: NaiveDate,
        offering: OfferingRef,
        now: NaiveDateTime,
    ) -> Result<Vec<NaiveTime>, BookingError> {
        let duration = self.offering_duration(offering).await?;
        let ranges = self.free_ranges_on(date, now).await?;
        Ok(ranges
            .iter()
            .flat_map(|range| {
                availability::service_start_options(range, duration, self.step_minutes)
            })
            .collect())
    }

    fn hours_on(&self, date: NaiveDate) -> &WorkingHours {
        &self.week[date.weekday().num_days_from_monday() as usize]
    }

    async fn occupied_intervals(&self, date: NaiveDate) -> Result<Vec<TimeInterval>, BookingError> {
        Ok(self
            .store
            .list_appointments(date)
            .await?
            .iter()
            .filter(|appointment| appointment.is_active())
            .map(|appointment| appointment.interval)
            .collect())
    }

    async fn offering_duration(&self, offering: OfferingRef) -> Result<u32, BookingError> {
        self.catalog
            .duration_minutes(offering)
            .await
            .map_err(|_| BookingError::NotFound("service or promotion"))
    }

    /// Derives and validates the interval a request asks for.
    async fn request_interval(
        &self,
        offering: OfferingRef,
        start: NaiveTime,
    ) -> Result<TimeInterval, BookingError> {
        let duration = self.offering_duration(offering).await?;
        let end = clock::add_minutes(start, duration as i32)
            .map_err(|_| BookingError::InvalidInterval(IntervalError::ExtendsPastMidnight))?;
        let interval = TimeInterval::new(start, end)?;
        self.validate_interval(&interval)?;
        Ok(interval)
    }

    pub(crate) fn validate_interval(&self, interval: &TimeInterval) -> Result<(), BookingError> {
        if interval.end <= interval.start {
            return Err(BookingError::InvalidInterval(
                IntervalError::EndNotAfterStart {
                    start: interval.start,
                    end: interval.end,
                },
            ));
        }
        let minutes = interval.duration_minutes();
        if minutes < self.min_appointment_minutes as i64 {
            return Err(BookingError::InvalidInterval(IntervalError::TooShort {
                minutes,
                minimum: self.min_appointment_minutes,
            }));
        }
        Ok(())
    }

    async fn get_request(&self, request_id: RequestId) -> Result<BookingRequest, BookingError> {
        self.store
            .get_request(request_id)
            .await
            .map_err(missing("request"))
    }

    async fn end_hint(&self, offering: OfferingRef, start: NaiveTime) -> Option<NaiveTime> {
        let duration = self.catalog.duration_minutes(offering).await.ok()?;
        clock::add_minutes(start, duration as i32).ok()
    }

    #[allow(clippy::too_many_arguments)]
    async fn send(
        &self,
        recipient: Recipient,
        kind: NotificationKind,
        client: ClientRef,
        date: NaiveDate,
        start: NaiveTime,
        end: Option<NaiveTime>,
        message: Option<String>,
    ) {
        let client_name = self
            .directory
            .resolve_client(client)
            .await
            .ok()
            .map(|profile| profile.display_name);
        let notification = Notification {
            recipient,
            kind,
            payload: NotificationPayload {
                client_name,
                date,
                start,
                end,
                message,
            },
        };
        notify::deliver_best_effort(self.notifier.as_ref(), notification, self.notify_timeout)
            .await;
    }
}

fn time_of(date: NaiveDate, now: NaiveDateTime) -> Option<NaiveTime> {
    (now.date() == date).then(|| now.time())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{CatalogError, MockServiceCatalog};
    use crate::directory::{ClientProfile, MockClientDirectory};
    use crate::notify::NotifyError;
    use crate::storage::config::DayHours;
    use crate::storage::sqlite::SqliteStore;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use uuid::Uuid;

    #[derive(Default)]
    struct RecordingSink {
        sent: Mutex<Vec<Notification>>,
    }

    impl RecordingSink {
        fn sent(&self) -> Vec<Notification> {
            self.sent.lock().unwrap().clone()
        }

        fn kinds(&self) -> Vec<NotificationKind> {
            self.sent().iter().map(|n| n.kind).collect()
        }
    }

    #[async_trait]
    impl NotificationSink for RecordingSink {
        async fn notify(&self, notification: Notification) -> Result<(), NotifyError> {
            self.sent.lock().unwrap().push(notification);
            Ok(())
        }
    }

    struct FailingSink;

    #[async_trait]
    impl NotificationSink for FailingSink {
        async fn notify(&self, _notification: Notification) -> Result<(), NotifyError> {
            Err(NotifyError::Delivery("gateway unreachable".to_string()))
        }
    }

    struct Harness {
        workflow: BookingWorkflow,
        store: Arc<SqliteStore>,
        sink: Arc<RecordingSink>,
    }

    fn open_day() -> DayHours {
        DayHours {
            closed: false,
            start: Some("09:00".to_string()),
            end: Some("18:00".to_string()),
        }
    }

    fn all_open_config() -> BookingConfig {
        let mut config = BookingConfig::default();
        config.hours.monday = open_day();
        config.hours.sunday = open_day();
        config
    }

    fn default_catalog() -> MockServiceCatalog {
        let mut catalog = MockServiceCatalog::new();
        catalog.expect_duration_minutes().returning(|_| Ok(45));
        catalog.expect_price().returning(|_| Ok(3500));
        catalog
    }

    fn default_directory() -> MockClientDirectory {
        let mut directory = MockClientDirectory::new();
        directory.expect_resolve_client().returning(|_| {
            Ok(ClientProfile {
                display_name: "Dana Levi".to_string(),
                phone: None,
            })
        });
        directory
    }

    fn harness() -> Harness {
        harness_with_catalog(default_catalog())
    }

    fn harness_with_catalog(catalog: MockServiceCatalog) -> Harness {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let sink = Arc::new(RecordingSink::default());
        let workflow = BookingWorkflow::new(
            store.clone(),
            Arc::new(catalog),
            Arc::new(default_directory()),
            sink.clone(),
            &all_open_config(),
        )
        .unwrap();
        Harness {
            workflow,
            store,
            sink,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 12).unwrap()
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn interval(start: (u32, u32), end: (u32, u32)) -> TimeInterval {
        TimeInterval::new(time(start.0, start.1), time(end.0, end.1)).unwrap()
    }

    /// A wall clock well before `date()`, for queries where today-suppression
    /// must not kick in.
    fn earlier_day() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 5, 1)
            .unwrap()
            .and_hms_opt(8, 0, 0)
            .unwrap()
    }

    fn request_for(client: Uuid, start: (u32, u32)) -> NewRequest {
        NewRequest {
            client_id: client,
            offering: OfferingRef::Service(Uuid::new_v4()),
            date: date(),
            start: time(start.0, start.1),
            message: None,
        }
    }

    fn direct_booking(start: (u32, u32), end: (u32, u32)) -> NewAppointment {
        NewAppointment {
            date: date(),
            interval: interval(start, end),
            client: ClientRef::Unregistered(Uuid::new_v4()),
            offering: OfferingRef::Service(Uuid::new_v4()),
            notes: None,
        }
    }

    #[tokio::test]
    async fn submit_creates_a_pending_request_and_notifies_the_operator() {
        let h = harness();

        let request = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();

        assert_eq!(request.status, RequestStatus::Pending);
        let sent = h.sink.sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].recipient, Recipient::Operator);
        assert_eq!(sent[0].kind, NotificationKind::BookingRequested);
        assert_eq!(sent[0].payload.client_name.as_deref(), Some("Dana Levi"));
        assert_eq!(sent[0].payload.end, Some(time(10, 45)));
    }

    #[tokio::test]
    async fn duplicate_submission_for_the_same_slot_is_refused() {
        let h = harness();
        let client = Uuid::new_v4();
        h.workflow.submit(request_for(client, (10, 0))).await.unwrap();

        let result = h.workflow.submit(request_for(client, (10, 0))).await;

        assert!(matches!(result, Err(BookingError::DuplicateRequest)));
    }

    #[tokio::test]
    async fn submitting_an_unknown_offering_is_not_found() {
        let mut catalog = MockServiceCatalog::new();
        catalog
            .expect_duration_minutes()
            .returning(|_| Err(CatalogError::UnknownOffering));
        let h = harness_with_catalog(catalog);

        let result = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await;

        assert!(matches!(result, Err(BookingError::NotFound(_))));
        assert!(h.sink.sent().is_empty());
    }

    #[tokio::test]
    async fn an_offering_below_the_minimum_duration_is_an_invalid_interval() {
        let mut catalog = MockServiceCatalog::new();
        catalog.expect_duration_minutes().returning(|_| Ok(10));
        let h = harness_with_catalog(catalog);

        let result = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await;

        assert!(matches!(result, Err(BookingError::InvalidInterval(_))));
    }

    #[tokio::test]
    async fn a_request_running_past_midnight_is_an_invalid_interval() {
        let h = harness();

        let result = h.workflow.submit(request_for(Uuid::new_v4(), (23, 30))).await;

        assert!(matches!(result, Err(BookingError::InvalidInterval(_))));
    }

    #[tokio::test]
    async fn approve_books_the_slot_and_deletes_the_request() {
        let h = harness();
        let client = Uuid::new_v4();
        let request = h.workflow.submit(request_for(client, (10, 0))).await.unwrap();

        let appointment = h.workflow.approve(request.id).await.unwrap();

        assert_eq!(appointment.date, date());
        assert_eq!(appointment.interval, interval((10, 0), (10, 45)));
        assert_eq!(appointment.client, ClientRef::Registered(client));
        assert!(matches!(
            h.store.get_request(request.id).await,
            Err(StoreError::NotFound)
        ));
        let kinds = h.sink.kinds();
        assert_eq!(
            kinds,
            vec![
                NotificationKind::BookingRequested,
                NotificationKind::BookingApproved,
            ]
        );
        assert_eq!(h.sink.sent()[1].recipient, Recipient::Client(client));
    }

    #[tokio::test]
    async fn approving_both_requests_for_one_slot_books_exactly_one() {
        let h = harness();
        let first = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();
        let second = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();

        h.workflow.approve(first.id).await.unwrap();
        let result = h.workflow.approve(second.id).await;

        assert!(matches!(result, Err(BookingError::SlotConflict { .. })));
        assert_eq!(h.store.list_appointments(date()).await.unwrap().len(), 1);
        // the refused request is still pending for the operator to act on
        let remaining = h.store.get_request(second.id).await.unwrap();
        assert_eq!(remaining.status, RequestStatus::Pending);
    }

    #[tokio::test]
    async fn approving_a_missing_request_is_not_found() {
        let h = harness();
        let result = h.workflow.approve(Uuid::new_v4()).await;
        assert!(matches!(result, Err(BookingError::NotFound("request"))));
    }

    #[tokio::test]
    async fn approve_requires_a_pending_request() {
        let h = harness();
        let request = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();
        h.workflow
            .propose_alternative(
                request.id,
                SuggestedTime {
                    date: date(),
                    interval: interval((16, 0), (16, 45)),
                },
            )
            .await
            .unwrap();

        let result = h.workflow.approve(request.id).await;

        assert!(matches!(
            result,
            Err(BookingError::InvalidTransition {
                status: RequestStatus::Changed,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn reject_notifies_the_client_with_the_reason() {
        let h = harness();
        let request = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();

        h.workflow
            .reject(request.id, Some("fully booked that week".to_string()))
            .await
            .unwrap();

        let sent = h.sink.sent();
        assert_eq!(sent[1].kind, NotificationKind::BookingRejected);
        assert_eq!(
            sent[1].payload.message.as_deref(),
            Some("fully booked that week")
        );
    }

    #[tokio::test]
    async fn rejecting_twice_is_not_found_and_sends_no_second_notification() {
        let h = harness();
        let request = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();

        h.workflow.reject(request.id, None).await.unwrap();
        let second = h.workflow.reject(request.id, None).await;

        assert!(matches!(second, Err(BookingError::NotFound(_))));
        let rejected_count = h
            .sink
            .kinds()
            .iter()
            .filter(|kind| **kind == NotificationKind::BookingRejected)
            .count();
        assert_eq!(rejected_count, 1);
    }

    #[tokio::test]
    async fn propose_alternative_attaches_the_suggestion() {
        let h = harness();
        let request = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();
        let suggested = SuggestedTime {
            date: date(),
            interval: interval((16, 0), (16, 45)),
        };

        let changed = h.workflow.propose_alternative(request.id, suggested).await.unwrap();

        assert_eq!(changed.status, RequestStatus::Changed);
        assert_eq!(changed.suggested, Some(suggested));
        assert_eq!(h.sink.kinds()[1], NotificationKind::TimeSuggested);
        let stored = h.store.get_request(request.id).await.unwrap();
        assert_eq!(stored.status, RequestStatus::Changed);
    }

    #[tokio::test]
    async fn counter_offer_round_trip_books_the_suggested_slot() {
        let h = harness();
        let request = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();
        let suggested = SuggestedTime {
            date: date(),
            interval: interval((16, 0), (16, 45)),
        };
        h.workflow.propose_alternative(request.id, suggested).await.unwrap();

        let appointment = h.workflow.accept_alternative(request.id).await.unwrap();

        assert_eq!(appointment.interval, suggested.interval);
        assert_eq!(appointment.date, suggested.date);
        let booked = h.store.list_appointments(date()).await.unwrap();
        assert_eq!(booked.len(), 1);
        assert!(matches!(
            h.store.get_request(request.id).await,
            Err(StoreError::NotFound)
        ));
        let last = h.sink.sent().last().unwrap().clone();
        assert_eq!(last.kind, NotificationKind::SuggestionAccepted);
        assert_eq!(last.recipient, Recipient::Operator);
    }

    #[tokio::test]
    async fn accepting_a_taken_suggestion_fails_and_the_request_stays_changed() {
        let h = harness();
        let request = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();
        h.workflow
            .propose_alternative(
                request.id,
                SuggestedTime {
                    date: date(),
                    interval: interval((16, 0), (16, 45)),
                },
            )
            .await
            .unwrap();
        h.workflow
            .book_directly(direct_booking((16, 0), (17, 0)))
            .await
            .unwrap();

        let result = h.workflow.accept_alternative(request.id).await;

        assert!(matches!(
            result,
            Err(BookingError::SlotNoLongerAvailable { .. })
        ));
        let remaining = h.store.get_request(request.id).await.unwrap();
        assert_eq!(remaining.status, RequestStatus::Changed);
    }

    #[tokio::test]
    async fn accepting_without_a_counter_offer_is_an_invalid_transition() {
        let h = harness();
        let request = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();

        let result = h.workflow.accept_alternative(request.id).await;

        assert!(matches!(
            result,
            Err(BookingError::InvalidTransition {
                status: RequestStatus::Pending,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn rejecting_an_alternative_discards_the_request() {
        let h = harness();
        let request = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();
        h.workflow
            .propose_alternative(
                request.id,
                SuggestedTime {
                    date: date(),
                    interval: interval((16, 0), (16, 45)),
                },
            )
            .await
            .unwrap();

        h.workflow.reject_alternative(request.id, None).await.unwrap();

        assert!(matches!(
            h.store.get_request(request.id).await,
            Err(StoreError::NotFound)
        ));
        let last = h.sink.sent().last().unwrap().clone();
        assert_eq!(last.kind, NotificationKind::SuggestionRejected);
        assert_eq!(last.recipient, Recipient::Operator);
    }

    #[tokio::test]
    async fn cancel_withdraws_a_pending_request() {
        let h = harness();
        let request = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();

        h.workflow
            .cancel(request.id, Some("found another salon".to_string()))
            .await
            .unwrap();

        assert!(matches!(
            h.store.get_request(request.id).await,
            Err(StoreError::NotFound)
        ));
        assert_eq!(
            h.sink.sent().last().unwrap().kind,
            NotificationKind::RequestCancelled
        );
    }

    #[tokio::test]
    async fn cancel_is_refused_once_an_alternative_was_proposed() {
        let h = harness();
        let request = h.workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();
        h.workflow
            .propose_alternative(
                request.id,
                SuggestedTime {
                    date: date(),
                    interval: interval((16, 0), (16, 45)),
                },
            )
            .await
            .unwrap();

        let result = h.workflow.cancel(request.id, None).await;

        assert!(matches!(
            result,
            Err(BookingError::InvalidTransition { .. })
        ));
    }

    #[tokio::test]
    async fn a_failed_notification_does_not_abort_the_booking() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let workflow = BookingWorkflow::new(
            store.clone(),
            Arc::new(default_catalog()),
            Arc::new(default_directory()),
            Arc::new(FailingSink),
            &all_open_config(),
        )
        .unwrap();
        let request = workflow.submit(request_for(Uuid::new_v4(), (10, 0))).await.unwrap();

        let appointment = workflow.approve(request.id).await.unwrap();

        assert_eq!(
            store.get_appointment(appointment.id).await.unwrap().id,
            appointment.id
        );
    }

    #[tokio::test]
    async fn free_ranges_skirt_the_booked_slots() {
        let h = harness();
        h.workflow.book_directly(direct_booking((10, 0), (10, 30))).await.unwrap();
        h.workflow.book_directly(direct_booking((14, 0), (15, 0))).await.unwrap();

        let ranges = h.workflow.free_ranges_on(date(), earlier_day()).await.unwrap();

        assert_eq!(
            ranges,
            vec![
                interval((9, 0), (10, 0)),
                interval((10, 30), (14, 0)),
                interval((15, 0), (18, 0)),
            ]
        );
    }

    #[tokio::test]
    async fn todays_start_options_begin_after_the_current_minute() {
        let h = harness();
        let now = date().and_hms_opt(11, 15, 0).unwrap();

        let options = h
            .workflow
            .start_options(date(), OfferingRef::Service(Uuid::new_v4()), now)
            .await
            .unwrap();

        assert!(!options.is_empty());
        for option in &options {
            assert!(*option >= time(11, 30), "offered {}", option);
        }
    }

    #[tokio::test]
    async fn closed_days_offer_nothing() {
        let store = Arc::new(SqliteStore::open_in_memory().unwrap());
        let workflow = BookingWorkflow::new(
            store,
            Arc::new(default_catalog()),
            Arc::new(default_directory()),
            Arc::new(RecordingSink::default()),
            &BookingConfig::default(),
        )
        .unwrap();
        let sunday = NaiveDate::from_ymd_opt(2026, 5, 10).unwrap();

        let ranges = workflow.free_ranges_on(sunday, earlier_day()).await.unwrap();

        assert!(ranges.is_empty());
    }

    #[tokio::test]
    async fn the_day_grid_shows_each_appointment_once() {
        let h = harness();
        let booked = h
            .workflow
            .book_directly(direct_booking((10, 0), (11, 0)))
            .await
            .unwrap();

        let grid = h.workflow.day_grid(date(), earlier_day()).await.unwrap();

        let starts: Vec<&GridSlot> = grid.iter().filter(|slot| slot.starts_appointment).collect();
        assert_eq!(starts.len(), 1);
        assert_eq!(starts[0].appointment, Some(booked.id));
    }
}
