use crate::booking::{BookingError, BookingWorkflow, missing};
use crate::domain::{Appointment, AppointmentId};
use crate::storage::store::{NewAppointment, StoreError};

/// Operator-side calendar maintenance: direct bookings and the
/// replace-in-place edit.
impl BookingWorkflow {
    /// Books an appointment without the request round trip, for walk-ins and
    /// phone bookings. The store refuses overlapping inserts atomically.
    pub async fn book_directly(&self, new: NewAppointment) -> Result<Appointment, BookingError> {
        self.validate_interval(&new.interval)?;
        let appointment = self.store.insert_appointment(new).await.map_err(|err| match err {
            StoreError::SlotTaken(existing) => BookingError::SlotConflict {
                conflicting: existing,
            },
            other => BookingError::Store(other),
        })?;
        tracing::info!(
            "appointment {} booked directly for {} {}",
            appointment.id,
            appointment.date,
            appointment.interval
        );
        Ok(appointment)
    }

    /// Edits an appointment by replacing it wholesale: the new record is
    /// validated against every other appointment before the old one is
    /// deleted, and both steps run in one store transaction. A conflicting
    /// edit fails without touching the original. The id survives the edit.
    pub async fn edit_appointment(
        &self,
        id: AppointmentId,
        new: NewAppointment,
    ) -> Result<Appointment, BookingError> {
        self.validate_interval(&new.interval)?;
        let appointment = self
            .store
            .replace_appointment(id, new)
            .await
            .map_err(|err| match err {
                StoreError::SlotTaken(existing) => BookingError::SlotConflict {
                    conflicting: existing,
                },
                StoreError::NotFound => BookingError::NotFound("appointment"),
                other => BookingError::Store(other),
            })?;
        tracing::info!(
            "appointment {} edited to {} {}",
            appointment.id,
            appointment.date,
            appointment.interval
        );
        Ok(appointment)
    }

    /// Cancels an appointment, freeing its slot. The row is kept with
    /// `Cancelled` status rather than deleted.
    pub async fn cancel_appointment(&self, id: AppointmentId) -> Result<(), BookingError> {
        self.store
            .cancel_appointment(id)
            .await
            .map_err(missing("appointment"))?;
        tracing::info!("appointment {} cancelled", id);
        Ok(())
    }
}
