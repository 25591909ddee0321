pub mod appointment;
pub mod hours;
pub mod request;

pub use appointment::{Appointment, AppointmentId, AppointmentStatus, ClientRef, OfferingRef};
pub use hours::{IntervalError, TimeInterval, WorkingHours};
pub use request::{BookingRequest, RequestId, RequestStatus, SuggestedTime};
