use std::sync::Arc;

use axum::extract::State;
use axum::Json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    let db_ok = {
        let db = state.db.lock().unwrap();
        db.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)).is_ok()
    };

    let status = if db_ok { "ok" } else { "degraded" };
    Json(serde_json::json!({
        "status": status,
        "bookings_in_view": state.view.len(),
    }))
}
