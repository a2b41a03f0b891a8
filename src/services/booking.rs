use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime, Utc};
use rusqlite::Connection;
use tokio::task::JoinHandle;

use crate::db::queries;
use crate::errors::{AppError, NotifyError, StoreError, ValidationError};
use crate::models::catalog::find_service;
use crate::models::{
    Booking, BookingStatus, CreateBookingRequest, Customer, NewBooking, NotificationEvent,
    NotificationKind,
};
use crate::services::reference;
use crate::state::AppState;

/// Fresh references tried before a create gives up on unique-constraint hits.
const MAX_REFERENCE_ATTEMPTS: usize = 3;

/// A committed transition. The booking already reflects the store.
#[derive(Debug)]
pub struct Transition {
    pub booking: Booking,
    pub notification: NotificationTicket,
}

/// Handle on the background dispatch started by a transition. Dropping it
/// leaves the dispatch running.
#[derive(Debug)]
pub struct NotificationTicket(JoinHandle<Result<(), NotifyError>>);

impl NotificationTicket {
    pub async fn outcome(self) -> Result<(), NotifyError> {
        match self.0.await {
            Ok(result) => result,
            Err(e) => Err(NotifyError::Interrupted(e.to_string())),
        }
    }
}

pub fn create_booking(
    state: &Arc<AppState>,
    req: CreateBookingRequest,
) -> Result<Transition, AppError> {
    let draft = validate_create(req)?;

    let booking = {
        let db = state.db.lock().unwrap();
        insert_with_fresh_reference(&db, draft, reference::generate)?
    };

    tracing::info!(
        id = booking.id,
        reference = %booking.reference,
        service = %booking.service,
        "booking created"
    );
    state.view.apply(booking.clone());

    let notification = spawn_dispatch(state, NotificationKind::Created, &booking);
    Ok(Transition {
        booking,
        notification,
    })
}

pub fn cancel_booking(state: &Arc<AppState>, id: i64) -> Result<Transition, AppError> {
    let current = lookup_by_id(state, id)?;
    ensure_confirmed(&current, "cancel")?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_booking_status(
            &db,
            id,
            BookingStatus::Cancelled,
            BookingStatus::Confirmed,
        )?
    };
    if !updated {
        return Err(reconcile(state, id, "cancelled"));
    }

    let booking = Booking {
        status: BookingStatus::Cancelled,
        ..current
    };
    tracing::info!(id, reference = %booking.reference, "booking cancelled");
    state.view.apply(booking.clone());

    let notification = spawn_dispatch(state, NotificationKind::Cancelled, &booking);
    Ok(Transition {
        booking,
        notification,
    })
}

pub fn reschedule_booking(
    state: &Arc<AppState>,
    reference: &str,
    date: &str,
    time: &str,
) -> Result<Transition, AppError> {
    let (date, time) = validate_slot(date, time)?;
    let current = lookup_by_reference(state, reference.trim())?;
    ensure_confirmed(&current, "reschedule")?;

    let updated = {
        let db = state.db.lock().unwrap();
        queries::update_booking_schedule(&db, current.id, &date, &time)?
    };
    if !updated {
        return Err(reconcile(state, current.id, "rescheduled"));
    }

    let booking = Booking {
        date,
        time,
        ..current
    };
    tracing::info!(
        id = booking.id,
        reference = %booking.reference,
        date = %booking.date,
        time = %booking.time,
        "booking rescheduled"
    );
    state.view.apply(booking.clone());

    let notification = spawn_dispatch(state, NotificationKind::Rescheduled, &booking);
    Ok(Transition {
        booking,
        notification,
    })
}

/// Logs a dispatch result and appends it to the delivery log.
pub fn record_dispatch(
    state: &AppState,
    event: &NotificationEvent,
    result: &Result<(), NotifyError>,
) {
    let detail = match result {
        Ok(()) => None,
        Err(e) => {
            tracing::warn!(
                reference = %event.reference,
                kind = event.kind.as_str(),
                error = %e,
                "notification dispatch failed"
            );
            Some(e.to_string())
        }
    };

    let db = state.db.lock().unwrap();
    if let Err(e) = queries::record_notification(
        &db,
        event.kind.as_str(),
        &event.reference,
        result.is_ok(),
        detail.as_deref(),
    ) {
        tracing::error!(error = %e, "failed to record notification outcome");
    }
}

fn spawn_dispatch(
    state: &Arc<AppState>,
    kind: NotificationKind,
    booking: &Booking,
) -> NotificationTicket {
    let state = Arc::clone(state);
    let event = NotificationEvent::for_booking(kind, booking);

    NotificationTicket(tokio::spawn(async move {
        let result = state.notifier.dispatch(&event).await;
        record_dispatch(&state, &event, &result);
        result
    }))
}

fn insert_with_fresh_reference(
    conn: &Connection,
    mut draft: NewBooking,
    mut next_reference: impl FnMut() -> String,
) -> Result<Booking, StoreError> {
    let mut attempt = 1;
    loop {
        match queries::insert_booking(conn, &draft) {
            Err(StoreError::DuplicateReference) if attempt < MAX_REFERENCE_ATTEMPTS => {
                tracing::warn!(
                    reference = %draft.reference,
                    attempt,
                    "booking reference collision"
                );
                draft.reference = next_reference();
                attempt += 1;
            }
            other => return other,
        }
    }
}

fn lookup_by_id(state: &AppState, id: i64) -> Result<Booking, AppError> {
    if let Some(booking) = state.view.get(id) {
        return Ok(booking);
    }

    let found = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, id)?
    };
    let booking = found.ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    state.view.apply(booking.clone());
    Ok(booking)
}

fn lookup_by_reference(state: &AppState, reference: &str) -> Result<Booking, AppError> {
    if let Some(booking) = state.view.find_by_reference(reference) {
        return Ok(booking);
    }

    let found = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_reference(&db, reference)?
    };
    let booking = found.ok_or_else(|| AppError::NotFound(format!("booking {reference}")))?;
    state.view.apply(booking.clone());
    Ok(booking)
}

/// A guarded write matched no row: the view was behind the store. Pull the
/// row again so the view converges, and report why the write was refused.
fn reconcile(state: &AppState, id: i64, action: &str) -> AppError {
    let fresh = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, id)
    };

    match fresh {
        Ok(Some(booking)) => {
            let status = booking.status;
            state.view.apply(booking);
            AppError::Conflict(format!(
                "booking {id} is {status} and cannot be {action}"
            ))
        }
        Ok(None) => {
            state.view.remove(id);
            AppError::NotFound(format!("booking {id}"))
        }
        Err(e) => e.into(),
    }
}

fn ensure_confirmed(booking: &Booking, action: &'static str) -> Result<(), ValidationError> {
    if booking.status == BookingStatus::Confirmed {
        Ok(())
    } else {
        Err(ValidationError::InvalidTransition {
            action,
            status: booking.status,
        })
    }
}

fn validate_create(req: CreateBookingRequest) -> Result<NewBooking, ValidationError> {
    let service = required(&req.service, "service")?;
    if find_service(&service).is_none() {
        return Err(ValidationError::UnknownService(service));
    }

    let customer = Customer {
        name: required(&req.customer.name, "name")?,
        email: required(&req.customer.email, "email")?,
        phone: required(&req.customer.phone, "phone")?,
        address: required(&req.customer.address, "address")?,
    };
    let (date, time) = validate_slot(&req.date, &req.time)?;
    let notes = req
        .notes
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty());

    Ok(NewBooking {
        reference: reference::generate(),
        service,
        date,
        time,
        customer,
        notes,
        created_at: Utc::now().naive_utc(),
    })
}

/// Dates are `YYYY-MM-DD`, times 12-hour `H:MM AM`. Past dates are accepted.
fn validate_slot(date: &str, time: &str) -> Result<(String, String), ValidationError> {
    let date = required(date, "date")?;
    let time = required(time, "time")?;

    NaiveDate::parse_from_str(&date, "%Y-%m-%d")
        .map_err(|_| ValidationError::InvalidDate(date.clone()))?;
    NaiveTime::parse_from_str(&time, "%I:%M %p")
        .map_err(|_| ValidationError::InvalidTime(time.clone()))?;

    Ok((date, time))
}

fn required(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ValidationError::MissingField(field))
    } else {
        Ok(value.to_string())
    }
}
