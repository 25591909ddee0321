use crate::domain::{Appointment, AppointmentId, TimeInterval};

/// Returns the earliest-starting confirmed appointment overlapping the
/// candidate interval, or `None`. Cancelled appointments never conflict.
/// `exclude` skips one appointment by id so an edit does not collide with
/// itself.
pub fn first_conflict<'a>(
    candidate: &TimeInterval,
    existing: &'a [Appointment],
    exclude: Option<AppointmentId>,
) -> Option<&'a Appointment> {
    existing
        .iter()
        .filter(|appointment| Some(appointment.id) != exclude)
        .filter(|appointment| appointment.is_active())
        .filter(|appointment| appointment.interval.overlaps(candidate))
        .min_by_key(|appointment| appointment.interval.start)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{AppointmentStatus, ClientRef, OfferingRef};
    use chrono::{NaiveDate, NaiveTime};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    fn interval(start: (u32, u32), end: (u32, u32)) -> TimeInterval {
        TimeInterval::new(time(start.0, start.1), time(end.0, end.1)).unwrap()
    }

    fn appointment(
        start: (u32, u32),
        end: (u32, u32),
        status: AppointmentStatus,
    ) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2026, 5, 12).unwrap(),
            interval: interval(start, end),
            client: ClientRef::Registered(Uuid::new_v4()),
            offering: OfferingRef::Service(Uuid::new_v4()),
            status,
            notes: None,
        }
    }

    #[test]
    fn no_conflict_on_empty_calendar() {
        let candidate = interval((10, 0), (11, 0));
        assert!(first_conflict(&candidate, &[], None).is_none());
    }

    #[test]
    fn no_conflict_with_adjacent_appointment() {
        let existing = vec![appointment((9, 0), (10, 0), AppointmentStatus::Confirmed)];
        let candidate = interval((10, 0), (11, 0));
        assert!(first_conflict(&candidate, &existing, None).is_none());
    }

    #[test]
    fn overlapping_appointment_is_reported() {
        let existing = vec![appointment((10, 30), (11, 30), AppointmentStatus::Confirmed)];
        let candidate = interval((10, 0), (11, 0));
        let conflict = first_conflict(&candidate, &existing, None).unwrap();
        assert_eq!(conflict.interval, existing[0].interval);
    }

    #[test]
    fn earliest_starting_conflict_wins() {
        let existing = vec![
            appointment((11, 0), (12, 0), AppointmentStatus::Confirmed),
            appointment((10, 0), (10, 45), AppointmentStatus::Confirmed),
        ];
        let candidate = interval((10, 30), (11, 30));

        let conflict = first_conflict(&candidate, &existing, None).unwrap();

        assert_eq!(conflict.interval.start, time(10, 0));
    }

    #[test]
    fn cancelled_appointments_never_conflict() {
        let existing = vec![appointment((10, 0), (11, 0), AppointmentStatus::Cancelled)];
        let candidate = interval((10, 0), (11, 0));
        assert!(first_conflict(&candidate, &existing, None).is_none());
    }

    #[test]
    fn excluded_appointment_does_not_conflict_with_itself() {
        let existing = vec![appointment((10, 0), (11, 0), AppointmentStatus::Confirmed)];
        let candidate = interval((10, 30), (11, 30));

        assert!(first_conflict(&candidate, &existing, Some(existing[0].id)).is_none());
        assert!(first_conflict(&candidate, &existing, Some(Uuid::new_v4())).is_some());
    }

    fn minute_interval() -> impl Strategy<Value = TimeInterval> {
        (0u32..1380, 15u32..120).prop_map(|(start, length)| {
            let end = (start + length).min(1439);
            TimeInterval::new(
                NaiveTime::from_hms_opt(start / 60, start % 60, 0).unwrap(),
                NaiveTime::from_hms_opt(end / 60, end % 60, 0).unwrap(),
            )
            .unwrap()
        })
    }

    proptest! {
        #[test]
        fn overlap_is_symmetric(a in minute_interval(), b in minute_interval()) {
            prop_assert_eq!(a.overlaps(&b), b.overlaps(&a));
        }

        #[test]
        fn interval_never_overlaps_what_follows_it(a in minute_interval()) {
            if let Ok(later) = TimeInterval::new(a.end, NaiveTime::from_hms_opt(23, 59, 0).unwrap()) {
                prop_assert!(!a.overlaps(&later));
            }
        }

        #[test]
        fn interval_always_overlaps_itself(a in minute_interval()) {
            prop_assert!(a.overlaps(&a));
        }
    }
}
