use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;

use crate::errors::AppError;
use crate::models::{Booking, CreateBookingRequest, RescheduleRequest, SERVICES, TIME_SLOTS};
use crate::services::booking;
use crate::services::export::{filter_for_viewer, ViewerFilter};
use crate::state::AppState;

// GET /api/services
pub async fn list_services() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "services": SERVICES,
        "time_slots": TIME_SLOTS,
    }))
}

// POST /api/bookings
pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    // The dispatch keeps running after the ticket is dropped
    let transition = booking::create_booking(&state, body)?;
    Ok((StatusCode::CREATED, Json(transition.booking)))
}

// POST /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Booking>, AppError> {
    let transition = booking::cancel_booking(&state, id)?;
    Ok(Json(transition.booking))
}

// POST /api/bookings/reschedule
pub async fn reschedule_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RescheduleRequest>,
) -> Result<Json<Booking>, AppError> {
    let transition = booking::reschedule_booking(&state, &body.reference, &body.date, &body.time)?;
    Ok(Json(transition.booking))
}

// GET /api/dashboard?ref=&email=&phone=
#[derive(Deserialize)]
pub struct DashboardQuery {
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

pub async fn dashboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DashboardQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let filter = ViewerFilter {
        reference: query.reference,
        email: query.email,
        phone: query.phone,
    };
    // Same rows the admin listing sees, straight from the store
    let bookings = state.refresh_view()?;
    Ok(Json(filter_for_viewer(&bookings, &filter)))
}
