use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::hours::TimeInterval;

pub type AppointmentId = Uuid;

/// Either a registered account or a walk-in record created by the operator.
/// Exactly one of the two, enforced by the type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClientRef {
    Registered(Uuid),
    Unregistered(Uuid),
}

/// A catalog service or a promotion, never both.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferingRef {
    Service(Uuid),
    Promotion(Uuid),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Confirmed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: AppointmentId,
    pub date: NaiveDate,
    pub interval: TimeInterval,
    pub client: ClientRef,
    pub offering: OfferingRef,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

impl Appointment {
    /// Cancelled appointments no longer occupy their slot.
    pub fn is_active(&self) -> bool {
        self.status == AppointmentStatus::Confirmed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn sample_appointment(status: AppointmentStatus) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            date: NaiveDate::from_ymd_opt(2026, 5, 12).unwrap(),
            interval: TimeInterval::new(
                NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
                NaiveTime::from_hms_opt(10, 45, 0).unwrap(),
            )
            .unwrap(),
            client: ClientRef::Registered(Uuid::new_v4()),
            offering: OfferingRef::Service(Uuid::new_v4()),
            status,
            notes: None,
        }
    }

    #[test]
    fn confirmed_appointment_is_active() {
        assert!(sample_appointment(AppointmentStatus::Confirmed).is_active());
    }

    #[test]
    fn cancelled_appointment_is_not_active() {
        assert!(!sample_appointment(AppointmentStatus::Cancelled).is_active());
    }

    #[test]
    fn appointment_survives_serde_round_trip() {
        let appointment = sample_appointment(AppointmentStatus::Confirmed);
        let json = serde_json::to_string(&appointment).unwrap();
        let restored: Appointment = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, appointment);
    }
}
