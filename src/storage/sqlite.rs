use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, params};
use uuid::Uuid;

use crate::domain::{
    Appointment, AppointmentId, AppointmentStatus, BookingRequest, RequestId, RequestStatus,
    SuggestedTime,
};
use crate::scheduling::clock;
use crate::storage::store::{
    AppointmentStore, NewAppointment, NewRequest, RequestFilter, StoreError,
};

/// Reference `AppointmentStore` backed by SQLite. Rows carry the full record
/// as JSON plus the columns the calendar queries filter on; every mutating
/// operation runs its invariant check and its write under one connection
/// lock, so racing writers serialize at the storage boundary.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new(conn: Connection) -> Result<Self, StoreError> {
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.initialize()?;
        Ok(store)
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Self::new(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::new(Connection::open_in_memory()?)
    }

    fn initialize(&self) -> Result<(), StoreError> {
        let conn = self.lock();
        conn.execute(
            "CREATE TABLE IF NOT EXISTS appointments (
                id TEXT PRIMARY KEY,
                date TEXT NOT NULL,
                start_min INTEGER NOT NULL,
                end_min INTEGER NOT NULL,
                status TEXT NOT NULL,
                data TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS requests (
                id TEXT PRIMARY KEY,
                client_id TEXT NOT NULL,
                date TEXT NOT NULL,
                start_min INTEGER NOT NULL,
                status TEXT NOT NULL,
                hidden INTEGER NOT NULL DEFAULT 0,
                data TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().expect("store connection lock poisoned")
    }
}

fn date_key(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

fn appointment_status_key(status: AppointmentStatus) -> &'static str {
    match status {
        AppointmentStatus::Confirmed => "confirmed",
        AppointmentStatus::Cancelled => "cancelled",
    }
}

fn request_status_key(status: RequestStatus) -> &'static str {
    match status {
        RequestStatus::Pending => "pending",
        RequestStatus::Approved => "approved",
        RequestStatus::Rejected => "rejected",
        RequestStatus::Changed => "changed",
    }
}

/// Earliest confirmed appointment overlapping [start_min, end_min) on the
/// date; the SQL predicate is the same half-open rule as
/// `TimeInterval::overlaps`.
fn conflicting_appointment(
    conn: &Connection,
    date: NaiveDate,
    start_min: u32,
    end_min: u32,
    exclude: Option<AppointmentId>,
) -> Result<Option<Appointment>, StoreError> {
    let mut stmt = conn.prepare(
        "SELECT data FROM appointments
         WHERE date = ?1 AND status = 'confirmed'
           AND start_min < ?2 AND end_min > ?3
           AND (?4 IS NULL OR id <> ?4)
         ORDER BY start_min LIMIT 1",
    )?;
    let data = stmt
        .query_row(
            params![
                date_key(date),
                end_min,
                start_min,
                exclude.map(|id| id.to_string())
            ],
            |row| row.get::<_, String>(0),
        )
        .optional()?;
    data.map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(Into::into)
}

fn load_appointment(
    conn: &Connection,
    id: AppointmentId,
) -> Result<Option<Appointment>, StoreError> {
    let mut stmt = conn.prepare("SELECT data FROM appointments WHERE id = ?1")?;
    let data = stmt
        .query_row([id.to_string()], |row| row.get::<_, String>(0))
        .optional()?;
    data.map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(Into::into)
}

fn store_appointment(conn: &Connection, appointment: &Appointment) -> Result<(), StoreError> {
    let data = serde_json::to_string(appointment)?;
    conn.execute(
        "INSERT INTO appointments (id, date, start_min, end_min, status, data)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            appointment.id.to_string(),
            date_key(appointment.date),
            clock::to_minutes(appointment.interval.start),
            clock::to_minutes(appointment.interval.end),
            appointment_status_key(appointment.status),
            data,
        ],
    )?;
    Ok(())
}

fn load_request(conn: &Connection, id: RequestId) -> Result<Option<BookingRequest>, StoreError> {
    let mut stmt = conn.prepare("SELECT data FROM requests WHERE id = ?1")?;
    let data = stmt
        .query_row([id.to_string()], |row| row.get::<_, String>(0))
        .optional()?;
    data.map(|json| serde_json::from_str(&json))
        .transpose()
        .map_err(Into::into)
}

fn update_request_row(conn: &Connection, request: &BookingRequest) -> Result<(), StoreError> {
    let data = serde_json::to_string(request)?;
    let updated = conn.execute(
        "UPDATE requests SET status = ?2, hidden = ?3, data = ?4 WHERE id = ?1",
        params![
            request.id.to_string(),
            request_status_key(request.status),
            request.hidden_by_client,
            data,
        ],
    )?;
    if updated == 0 {
        return Err(StoreError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl AppointmentStore for SqliteStore {
    async fn list_appointments(&self, date: NaiveDate) -> Result<Vec<Appointment>, StoreError> {
        let conn = self.lock();
        let mut stmt =
            conn.prepare("SELECT data FROM appointments WHERE date = ?1 ORDER BY start_min")?;
        let rows = stmt.query_map([date_key(date)], |row| row.get::<_, String>(0))?;

        let mut appointments = Vec::new();
        for row in rows {
            appointments.push(serde_json::from_str(&row?)?);
        }
        Ok(appointments)
    }

    async fn get_appointment(&self, id: AppointmentId) -> Result<Appointment, StoreError> {
        let conn = self.lock();
        load_appointment(&conn, id)?.ok_or(StoreError::NotFound)
    }

    async fn insert_appointment(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        // The lock spans the conflict check and the insert.
        let conn = self.lock();
        let start_min = clock::to_minutes(new.interval.start);
        let end_min = clock::to_minutes(new.interval.end);

        if let Some(existing) = conflicting_appointment(&conn, new.date, start_min, end_min, None)?
        {
            return Err(StoreError::SlotTaken(Box::new(existing)));
        }

        let appointment = Appointment {
            id: Uuid::new_v4(),
            date: new.date,
            interval: new.interval,
            client: new.client,
            offering: new.offering,
            status: AppointmentStatus::Confirmed,
            notes: new.notes,
        };
        store_appointment(&conn, &appointment)?;
        Ok(appointment)
    }

    async fn replace_appointment(
        &self,
        id: AppointmentId,
        new: NewAppointment,
    ) -> Result<Appointment, StoreError> {
        let mut conn = self.lock();
        let tx = conn.transaction()?;

        if load_appointment(&tx, id)?.is_none() {
            return Err(StoreError::NotFound);
        }

        // Validate before deleting anything: a conflicting edit must leave
        // the original row untouched.
        let start_min = clock::to_minutes(new.interval.start);
        let end_min = clock::to_minutes(new.interval.end);
        if let Some(existing) =
            conflicting_appointment(&tx, new.date, start_min, end_min, Some(id))?
        {
            return Err(StoreError::SlotTaken(Box::new(existing)));
        }

        tx.execute("DELETE FROM appointments WHERE id = ?1", [id.to_string()])?;
        let replacement = Appointment {
            id,
            date: new.date,
            interval: new.interval,
            client: new.client,
            offering: new.offering,
            status: AppointmentStatus::Confirmed,
            notes: new.notes,
        };
        store_appointment(&tx, &replacement)?;
        tx.commit()?;
        Ok(replacement)
    }

    async fn cancel_appointment(&self, id: AppointmentId) -> Result<(), StoreError> {
        let conn = self.lock();
        let mut appointment = load_appointment(&conn, id)?.ok_or(StoreError::NotFound)?;
        appointment.status = AppointmentStatus::Cancelled;

        let data = serde_json::to_string(&appointment)?;
        conn.execute(
            "UPDATE appointments SET status = ?2, data = ?3 WHERE id = ?1",
            params![id.to_string(), appointment_status_key(appointment.status), data],
        )?;
        Ok(())
    }

    async fn delete_appointment(&self, id: AppointmentId) -> Result<(), StoreError> {
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM appointments WHERE id = ?1", [id.to_string()])?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn get_request(&self, id: RequestId) -> Result<BookingRequest, StoreError> {
        let conn = self.lock();
        load_request(&conn, id)?.ok_or(StoreError::NotFound)
    }

    async fn list_requests(
        &self,
        filter: RequestFilter,
    ) -> Result<Vec<BookingRequest>, StoreError> {
        let conn = self.lock();
        let mut stmt = conn.prepare("SELECT data FROM requests ORDER BY date, start_min")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut requests: Vec<BookingRequest> = Vec::new();
        for row in rows {
            requests.push(serde_json::from_str(&row?)?);
        }
        Ok(requests
            .into_iter()
            .filter(|request| filter.client.is_none_or(|client| request.client_id == client))
            .filter(|request| filter.status.is_none_or(|status| request.status == status))
            .filter(|request| filter.include_hidden || !request.hidden_by_client)
            .collect())
    }

    async fn insert_request(&self, new: NewRequest) -> Result<BookingRequest, StoreError> {
        let conn = self.lock();
        let start_min = clock::to_minutes(new.start);

        let duplicate = conn
            .query_row(
                "SELECT 1 FROM requests
                 WHERE client_id = ?1 AND date = ?2 AND start_min = ?3
                   AND status IN ('pending', 'changed')
                 LIMIT 1",
                params![new.client_id.to_string(), date_key(new.date), start_min],
                |_| Ok(()),
            )
            .optional()?;
        if duplicate.is_some() {
            return Err(StoreError::DuplicateRequest);
        }

        let request = BookingRequest {
            id: Uuid::new_v4(),
            client_id: new.client_id,
            offering: new.offering,
            date: new.date,
            start: new.start,
            message: new.message,
            status: RequestStatus::Pending,
            suggested: None,
            hidden_by_client: false,
        };
        let data = serde_json::to_string(&request)?;
        conn.execute(
            "INSERT INTO requests (id, client_id, date, start_min, status, hidden, data)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                request.id.to_string(),
                request.client_id.to_string(),
                date_key(request.date),
                start_min,
                request_status_key(request.status),
                request.hidden_by_client,
                data,
            ],
        )?;
        Ok(request)
    }

    async fn update_request(
        &self,
        id: RequestId,
        status: RequestStatus,
        suggested: Option<SuggestedTime>,
    ) -> Result<(), StoreError> {
        let conn = self.lock();
        let mut request = load_request(&conn, id)?.ok_or(StoreError::NotFound)?;
        request.status = status;
        request.suggested = suggested;
        update_request_row(&conn, &request)
    }

    async fn hide_request(&self, id: RequestId) -> Result<(), StoreError> {
        let conn = self.lock();
        let mut request = load_request(&conn, id)?.ok_or(StoreError::NotFound)?;
        request.hidden_by_client = true;
        update_request_row(&conn, &request)
    }

    async fn delete_request(&self, id: RequestId) -> Result<(), StoreError> {
        let conn = self.lock();
        let deleted = conn.execute("DELETE FROM requests WHERE id = ?1", [id.to_string()])?;
        if deleted == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
