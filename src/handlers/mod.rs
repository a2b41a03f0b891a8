pub mod admin;
pub mod bookings;
pub mod health;
pub mod notify;

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/api/services", get(bookings::list_services))
        .route("/api/bookings", post(bookings::create_booking))
        .route("/api/bookings/reschedule", post(bookings::reschedule_booking))
        .route("/api/bookings/:id/cancel", post(bookings::cancel_booking))
        .route("/api/dashboard", get(bookings::dashboard))
        .route("/api/admin/bookings", get(admin::get_bookings))
        .route("/api/admin/notifications", get(admin::get_notifications))
        .route("/api/notify", post(notify::send_notification))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
