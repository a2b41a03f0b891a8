use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;

use crate::errors::NotifyError;
use crate::models::{Customer, NotificationEvent, NotificationKind};
use crate::services::booking::record_dispatch;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifyRequest {
    #[serde(rename = "type", default)]
    pub kind: NotificationKind,
    pub to_email: Option<String>,
    pub to_name: Option<String>,
    #[serde(default)]
    pub reference: String,
    #[serde(default)]
    pub service: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub notes: String,
}

impl From<NotifyRequest> for NotificationEvent {
    fn from(req: NotifyRequest) -> Self {
        Self {
            kind: req.kind,
            reference: req.reference,
            service: req.service,
            date: req.date,
            time: req.time,
            customer: Customer {
                name: req.name,
                email: req.email,
                phone: req.phone,
                address: req.address,
            },
            notes: req.notes,
            to_email: req.to_email,
            to_name: req.to_name,
        }
    }
}

// POST /api/notify
pub async fn send_notification(
    State(state): State<Arc<AppState>>,
    Json(body): Json<NotifyRequest>,
) -> Response {
    let event = NotificationEvent::from(body);
    let result = state.notifier.dispatch(&event).await;
    record_dispatch(&state, &event, &result);

    match result {
        Ok(()) => Json(json!({ "ok": true })).into_response(),
        Err(NotifyError::MissingCredentials) => (
            StatusCode::BAD_REQUEST,
            Json(json!({ "ok": false, "error": NotifyError::MissingCredentials.to_string() })),
        )
            .into_response(),
        Err(NotifyError::Rejected { customer, team }) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "ok": false, "error": [customer, team] })),
        )
            .into_response(),
        Err(e @ NotifyError::Interrupted(_)) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "ok": false, "error": e.to_string() })),
        )
            .into_response(),
    }
}
