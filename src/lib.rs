pub mod booking;
pub mod catalog;
pub mod directory;
pub mod domain;
pub mod logging;
pub mod notify;
pub mod scheduling;
pub mod storage;

pub use booking::{BookingError, BookingWorkflow};
pub use catalog::{CatalogError, ServiceCatalog};
pub use directory::{ClientDirectory, ClientProfile, DirectoryError};
pub use domain::{
    Appointment, AppointmentStatus, BookingRequest, ClientRef, OfferingRef, RequestStatus,
    SuggestedTime, TimeInterval, WorkingHours,
};
pub use notify::{Notification, NotificationKind, NotificationSink, Recipient};
pub use scheduling::GridSlot;
pub use storage::{AppointmentStore, BookingConfig, SqliteStore};
