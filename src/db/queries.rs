use chrono::NaiveDateTime;
use rusqlite::{params, Connection, OptionalExtension};

use crate::errors::StoreError;
use crate::models::{Booking, BookingStatus, Customer, NewBooking, NotificationRecord};

/// Upper bound on rows returned by a listing, whatever the caller asks for.
pub const MAX_LISTING_ROWS: i64 = 1000;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const BOOKING_COLUMNS: &str = "id, reference, service, date, time, status, customer_name, \
     customer_email, customer_phone, customer_address, notes, created_at";

// ── Bookings ──

pub fn insert_booking(conn: &Connection, booking: &NewBooking) -> Result<Booking, StoreError> {
    let created_at = booking.created_at.format(TIMESTAMP_FORMAT).to_string();

    conn.execute(
        "INSERT INTO bookings (reference, service, date, time, status, customer_name,
                               customer_email, customer_phone, customer_address, notes, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            booking.reference,
            booking.service,
            booking.date,
            booking.time,
            BookingStatus::Confirmed.as_str(),
            booking.customer.name,
            booking.customer.email,
            booking.customer.phone,
            booking.customer.address,
            booking.notes,
            created_at,
        ],
    )
    .map_err(|e| {
        if is_reference_conflict(&e) {
            StoreError::DuplicateReference
        } else {
            StoreError::Database(e)
        }
    })?;

    Ok(Booking {
        id: conn.last_insert_rowid(),
        reference: booking.reference.clone(),
        service: booking.service.clone(),
        date: booking.date.clone(),
        time: booking.time.clone(),
        status: BookingStatus::Confirmed,
        customer: booking.customer.clone(),
        notes: booking.notes.clone(),
        created_at: booking.created_at,
    })
}

/// Moves a booking to `status` only while it still holds `expected`.
/// Returns `false` when no row matched (missing id or status already moved on).
pub fn update_booking_status(
    conn: &Connection,
    id: i64,
    status: BookingStatus,
    expected: BookingStatus,
) -> Result<bool, StoreError> {
    let count = conn.execute(
        "UPDATE bookings SET status = ?1 WHERE id = ?2 AND status = ?3",
        params![status.as_str(), id, expected.as_str()],
    )?;
    Ok(count > 0)
}

/// Rewrites the slot of a booking that is still `Confirmed`.
pub fn update_booking_schedule(
    conn: &Connection,
    id: i64,
    date: &str,
    time: &str,
) -> Result<bool, StoreError> {
    let count = conn.execute(
        "UPDATE bookings SET date = ?1, time = ?2 WHERE id = ?3 AND status = ?4",
        params![date, time, id, BookingStatus::Confirmed.as_str()],
    )?;
    Ok(count > 0)
}

/// Most recently created first, capped at [`MAX_LISTING_ROWS`].
pub fn list_bookings(conn: &Connection, limit: i64) -> Result<Vec<Booking>, StoreError> {
    let limit = limit.clamp(0, MAX_LISTING_ROWS);
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings ORDER BY created_at DESC, id DESC LIMIT ?1"
    ))?;

    let rows = stmt.query_map(params![limit], parse_booking_row)?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row?);
    }
    Ok(bookings)
}

pub fn get_booking_by_id(conn: &Connection, id: i64) -> Result<Option<Booking>, StoreError> {
    let booking = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
            params![id],
            parse_booking_row,
        )
        .optional()?;
    Ok(booking)
}

pub fn get_booking_by_reference(
    conn: &Connection,
    reference: &str,
) -> Result<Option<Booking>, StoreError> {
    let booking = conn
        .query_row(
            &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE reference = ?1"),
            params![reference],
            parse_booking_row,
        )
        .optional()?;
    Ok(booking)
}

fn parse_booking_row(row: &rusqlite::Row) -> rusqlite::Result<Booking> {
    let status_str: String = row.get(5)?;
    let created_at_str: String = row.get(11)?;

    let status = BookingStatus::parse(&status_str).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            5,
            rusqlite::types::Type::Text,
            format!("unknown booking status: {status_str}").into(),
        )
    })?;
    let created_at = NaiveDateTime::parse_from_str(&created_at_str, TIMESTAMP_FORMAT)
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(11, rusqlite::types::Type::Text, Box::new(e))
        })?;

    Ok(Booking {
        id: row.get(0)?,
        reference: row.get(1)?,
        service: row.get(2)?,
        date: row.get(3)?,
        time: row.get(4)?,
        status,
        customer: Customer {
            name: row.get(6)?,
            email: row.get(7)?,
            phone: row.get(8)?,
            address: row.get(9)?,
        },
        notes: row.get(10)?,
        created_at,
    })
}

fn is_reference_conflict(err: &rusqlite::Error) -> bool {
    match err {
        rusqlite::Error::SqliteFailure(e, Some(msg)) => {
            e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
                && msg.contains("bookings.reference")
        }
        _ => false,
    }
}

// ── Notification log ──

pub fn record_notification(
    conn: &Connection,
    kind: &str,
    reference: &str,
    ok: bool,
    detail: Option<&str>,
) -> Result<i64, StoreError> {
    conn.execute(
        "INSERT INTO notification_log (kind, reference, ok, detail) VALUES (?1, ?2, ?3, ?4)",
        params![kind, reference, ok, detail],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_notifications(
    conn: &Connection,
    reference: Option<&str>,
    limit: i64,
) -> Result<Vec<NotificationRecord>, StoreError> {
    let limit = limit.clamp(0, MAX_LISTING_ROWS);
    let mut stmt = conn.prepare(
        "SELECT id, kind, reference, ok, detail, created_at FROM notification_log
         WHERE ?1 IS NULL OR reference = ?1
         ORDER BY id DESC LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![reference, limit], |row| {
        Ok(NotificationRecord {
            id: row.get(0)?,
            kind: row.get(1)?,
            reference: row.get(2)?,
            ok: row.get(3)?,
            detail: row.get(4)?,
            created_at: row.get(5)?,
        })
    })?;

    let mut records = vec![];
    for row in rows {
        records.push(row?);
    }
    Ok(records)
}
