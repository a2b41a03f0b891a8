use std::sync::Arc;

use axum::extract::{Query, State};
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::NotificationRecord;
use crate::services::export::{to_csv, CSV_FILENAME};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token.is_empty() || token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub csv: Option<String>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BookingsQuery>,
) -> Result<Response, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    // Listing reads through the store and resyncs the view on the way
    let bookings = state.refresh_view()?;

    if query.csv.as_deref() == Some("1") {
        let disposition = format!("attachment; filename=\"{CSV_FILENAME}\"");
        return Ok((
            [
                (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
                (header::CONTENT_DISPOSITION, disposition),
                (header::CACHE_CONTROL, "no-store".to_string()),
            ],
            to_csv(&bookings),
        )
            .into_response());
    }

    Ok(Json(bookings).into_response())
}

// GET /api/admin/notifications
#[derive(Deserialize)]
pub struct NotificationsQuery {
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_notifications(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<NotificationsQuery>,
) -> Result<Json<Vec<NotificationRecord>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let records = {
        let db = state.db.lock().unwrap();
        queries::list_notifications(
            &db,
            query.reference.as_deref(),
            query.limit.unwrap_or(100),
        )?
    };
    Ok(Json(records))
}
