pub mod config;
pub mod sqlite;
pub mod store;

pub use config::{BookingConfig, ConfigError};
pub use sqlite::SqliteStore;
pub use store::{AppointmentStore, NewAppointment, NewRequest, RequestFilter, StoreError};
