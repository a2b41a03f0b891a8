use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::Datelike;
use tower::ServiceExt;

use flitzap::config::AppConfig;
use flitzap::db;
use flitzap::db::queries::{self, MAX_LISTING_ROWS};
use flitzap::handlers;
use flitzap::models::{Customer, NewBooking};
use flitzap::services::notify::{
    Delivery, EmailTransport, Notifier, NotifierSettings, OutboundEmail,
};
use flitzap::services::reference;
use flitzap::state::AppState;

// ── Mock Transport ──

type Outbox = Arc<Mutex<Vec<OutboundEmail>>>;

struct MockTransport {
    configured: bool,
    fail_for: Option<String>,
    sent: Outbox,
}

#[async_trait]
impl EmailTransport for MockTransport {
    fn is_configured(&self) -> bool {
        self.configured
    }

    async fn send(&self, email: &OutboundEmail) -> anyhow::Result<Delivery> {
        self.sent.lock().unwrap().push(email.clone());
        if self.fail_for.as_deref() == Some(email.to[0].email.as_str()) {
            return Ok(Delivery {
                status: 500,
                body: "{\"message\":\"mailbox unavailable\"}".to_string(),
            });
        }
        Ok(Delivery {
            status: 201,
            body: "{\"messageId\":\"<ok@smtp>\"}".to_string(),
        })
    }
}

// ── Helpers ──

fn test_config() -> AppConfig {
    AppConfig {
        port: 3000,
        database_url: ":memory:".to_string(),
        admin_token: "test-token".to_string(),
        brevo_api_key: "test-key".to_string(),
        email_from: "bookings@flitzap.com".to_string(),
        email_from_name: "FlitZap".to_string(),
        team_alert_email: "alerts@flitzap.com".to_string(),
        email_logo_url: "https://cdn.example.com/logo.png".to_string(),
        site_url: "https://app.flitzap.com".to_string(),
    }
}

fn state_with(configured: bool, fail_for: Option<&str>) -> (Arc<AppState>, Outbox) {
    let config = test_config();
    let sent = Arc::new(Mutex::new(vec![]));
    let transport = MockTransport {
        configured,
        fail_for: fail_for.map(str::to_string),
        sent: Arc::clone(&sent),
    };
    let notifier = Notifier::new(Box::new(transport), NotifierSettings::from_config(&config));
    let conn = db::init_db(":memory:").unwrap();
    (Arc::new(AppState::new(conn, config, notifier)), sent)
}

fn test_state() -> (Arc<AppState>, Outbox) {
    state_with(true, None)
}

fn test_app(state: Arc<AppState>) -> Router {
    handlers::router(state)
}

fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn admin_get(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header("Authorization", "Bearer test-token")
        .body(Body::empty())
        .unwrap()
}

fn sarah_booking() -> serde_json::Value {
    serde_json::json!({
        "service": "Cleaning Services",
        "date": "2025-10-10",
        "time": "10:00 AM",
        "customer": {
            "name": "Sarah Johnson",
            "email": "sarah@email.com",
            "phone": "(470) 604-1366",
            "address": "123 Oak St, Marietta, GA 30060"
        },
        "notes": "note, with comma\nand newline"
    })
}

async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

async fn body_text(res: axum::response::Response) -> String {
    let body = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(body.to_vec()).unwrap()
}

/// Handlers return before the dispatch finishes; poll until it has.
async fn wait_for_sent(sent: &Outbox, count: usize) {
    for _ in 0..200 {
        if sent.lock().unwrap().len() >= count {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {count} emails, got {}", sent.lock().unwrap().len());
}

async fn wait_for_log(
    state: &Arc<AppState>,
    count: usize,
) -> Vec<flitzap::models::NotificationRecord> {
    for _ in 0..200 {
        let records = {
            let db = state.db.lock().unwrap();
            queries::list_notifications(&db, None, 100).unwrap()
        };
        if records.len() >= count {
            return records;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("expected {count} notification log rows");
}

async fn create(state: &Arc<AppState>) -> serde_json::Value {
    let res = test_app(state.clone())
        .oneshot(json_request("POST", "/api/bookings", sarah_booking()))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    body_json(res).await
}

// ── Health & Catalog ──

#[tokio::test]
async fn test_health() {
    let (state, _) = test_state();
    let res = test_app(state)
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["status"], "ok");
}

#[tokio::test]
async fn test_services_catalog() {
    let (state, _) = test_state();
    let res = test_app(state)
        .oneshot(Request::builder().uri("/api/services").body(Body::empty()).unwrap())
        .await
        .unwrap();

    let json = body_json(res).await;
    assert_eq!(json["services"].as_array().unwrap().len(), 3);
    assert_eq!(json["services"][0]["title"], "Cleaning Services");
    assert_eq!(json["time_slots"][0], "8:00 AM");
}

// ── Create ──

#[tokio::test]
async fn test_create_booking_example_scenario() {
    let (state, sent) = test_state();
    let json = create(&state).await;

    assert_eq!(json["status"], "Confirmed");
    let reference = json["reference"].as_str().unwrap();
    assert!(reference::is_well_formed(reference));
    let year = chrono::Utc::now().year();
    assert!(reference.starts_with(&format!("FZ-{year}-")));
    assert_eq!(json["customer"]["email"], "sarah@email.com");

    wait_for_sent(&sent, 2).await;
    let sent = sent.lock().unwrap();
    let recipients: Vec<&str> = sent.iter().map(|e| e.to[0].email.as_str()).collect();
    assert!(recipients.contains(&"sarah@email.com"));
    assert!(recipients.contains(&"alerts@flitzap.com"));
    assert!(sent.iter().any(|e| e.subject == format!("🟦 New Booking — {reference}")));
}

#[tokio::test]
async fn test_create_missing_phone_rejected() {
    let (state, sent) = test_state();
    let mut body = sarah_booking();
    body["customer"]["phone"] = serde_json::json!("");

    let res = test_app(state.clone())
        .oneshot(json_request("POST", "/api/bookings", body))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(res).await;
    assert_eq!(json["error"], "missing required field: phone");
    assert!(state.view.is_empty());
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_staff_failure_still_creates_booking() {
    let (state, sent) = state_with(true, Some("alerts@flitzap.com"));
    let json = create(&state).await;
    assert_eq!(json["status"], "Confirmed");

    let records = wait_for_log(&state, 1).await;
    assert_eq!(records[0].reference, json["reference"].as_str().unwrap());
    assert!(!records[0].ok);
    assert!(records[0]
        .detail
        .as_deref()
        .unwrap()
        .contains("mailbox unavailable"));
    assert_eq!(sent.lock().unwrap().len(), 2);

    // Visible to the admin as well
    let res = test_app(state)
        .oneshot(admin_get("/api/admin/notifications"))
        .await
        .unwrap();
    let log = body_json(res).await;
    assert_eq!(log[0]["ok"], false);
    assert_eq!(log[0]["kind"], "booking.created");
}

// ── Cancel & Reschedule ──

#[tokio::test]
async fn test_cancel_twice() {
    let (state, sent) = test_state();
    let created = create(&state).await;
    let id = created["id"].as_i64().unwrap();
    let uri = format!("/api/bookings/{id}/cancel");

    let res = test_app(state.clone())
        .oneshot(json_request("POST", &uri, serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["status"], "Cancelled");

    wait_for_sent(&sent, 4).await;
    assert!(sent
        .lock()
        .unwrap()
        .iter()
        .any(|e| e.subject.starts_with("Your FlitZap Booking Cancelled")));

    let res = test_app(state.clone())
        .oneshot(json_request("POST", &uri, serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = test_app(state)
        .oneshot(admin_get("/api/admin/bookings"))
        .await
        .unwrap();
    let list = body_json(res).await;
    assert_eq!(list[0]["status"], "Cancelled");
}

#[tokio::test]
async fn test_cancel_unknown_booking() {
    let (state, _) = test_state();
    let res = test_app(state)
        .oneshot(json_request("POST", "/api/bookings/404/cancel", serde_json::json!({})))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_reschedule_by_reference() {
    let (state, _) = test_state();
    let created = create(&state).await;
    let reference = created["reference"].as_str().unwrap();

    let res = test_app(state.clone())
        .oneshot(json_request(
            "POST",
            "/api/bookings/reschedule",
            serde_json::json!({ "reference": reference, "date": "2025-10-14", "time": "3:00 PM" }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let json = body_json(res).await;
    assert_eq!(json["date"], "2025-10-14");
    assert_eq!(json["time"], "3:00 PM");
    assert_eq!(json["id"], created["id"]);
    assert_eq!(json["created_at"], created["created_at"]);
}

#[tokio::test]
async fn test_reschedule_cancelled_rejected() {
    let (state, _) = test_state();
    let created = create(&state).await;
    let id = created["id"].as_i64().unwrap();

    test_app(state.clone())
        .oneshot(json_request(
            "POST",
            &format!("/api/bookings/{id}/cancel"),
            serde_json::json!({}),
        ))
        .await
        .unwrap();

    let res = test_app(state)
        .oneshot(json_request(
            "POST",
            "/api/bookings/reschedule",
            serde_json::json!({
                "reference": created["reference"],
                "date": "2025-10-14",
                "time": "3:00 PM"
            }),
        ))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(res).await;
    assert_eq!(json["error"], "cannot reschedule a booking that is Cancelled");
}

// ── Dashboard ──

#[tokio::test]
async fn test_dashboard_contact_filter_and_deep_link() {
    let (state, _) = test_state();
    let first = create(&state).await;

    let mut other = sarah_booking();
    other["customer"]["email"] = serde_json::json!("mike@email.com");
    other["customer"]["phone"] = serde_json::json!("(404) 555-0100");
    test_app(state.clone())
        .oneshot(json_request("POST", "/api/bookings", other))
        .await
        .unwrap();

    let res = test_app(state.clone())
        .oneshot(
            Request::builder()
                .uri("/api/dashboard?email=sarah%40email.com&phone=%28000%29")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["reference"], first["reference"]);

    // A deep link bypasses the contact filter entirely
    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri(format!(
                    "/api/dashboard?ref={}&email=mike%40email.com",
                    first["reference"].as_str().unwrap()
                ))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let json = body_json(res).await;
    assert_eq!(json.as_array().unwrap().len(), 1);
    assert_eq!(json[0]["customer"]["email"], "sarah@email.com");
}

async fn dashboard_refs(state: &Arc<AppState>, query: &str) -> Vec<String> {
    let res = test_app(state.clone())
        .oneshot(
            Request::builder()
                .uri(format!("/api/dashboard?{query}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    body_json(res)
        .await
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["reference"].as_str().unwrap().to_string())
        .collect()
}

#[tokio::test]
async fn test_dashboard_matches_listing_window() {
    let (state, _) = test_state();
    let oldest = create(&state).await;
    let oldest_ref = oldest["reference"].as_str().unwrap().to_string();

    // Fill the listing window with newer rows written behind the view's back
    {
        let db = state.db.lock().unwrap();
        let base = chrono::Utc::now().naive_utc() + chrono::Duration::hours(1);
        for i in 0..MAX_LISTING_ROWS {
            let draft = NewBooking {
                reference: format!("FZ-2099-{i:06}"),
                service: "General Labor".to_string(),
                date: "2025-11-01".to_string(),
                time: "9:00 AM".to_string(),
                customer: Customer {
                    name: "Walk In".to_string(),
                    email: format!("walkin{i}@email.com"),
                    phone: format!("555-{i:04}"),
                    address: "1 Main St".to_string(),
                },
                notes: None,
                created_at: base + chrono::Duration::seconds(i),
            };
            queries::insert_booking(&db, &draft).unwrap();
        }
    }

    let newest = format!("FZ-2099-{:06}", MAX_LISTING_ROWS - 1);
    assert_eq!(dashboard_refs(&state, &format!("ref={newest}")).await, vec![newest]);

    let before = dashboard_refs(&state, &format!("ref={oldest_ref}")).await;

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/admin/bookings"))
        .await
        .unwrap();
    let listing = body_json(res).await;
    let listing = listing.as_array().unwrap();
    assert_eq!(listing.len(), MAX_LISTING_ROWS as usize);
    assert!(listing.iter().all(|b| b["reference"] != oldest["reference"]));

    let after = dashboard_refs(&state, &format!("ref={oldest_ref}")).await;
    assert!(before.is_empty());
    assert_eq!(before, after);
}

// ── Admin Listing & Export ──

#[tokio::test]
async fn test_admin_requires_auth() {
    let (state, _) = test_state();
    let res = test_app(state)
        .oneshot(
            Request::builder()
                .uri("/api/admin/bookings")
                .header("Authorization", "Bearer wrong-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_csv_export() {
    let (state, _) = test_state();
    create(&state).await;

    let res = test_app(state)
        .oneshot(admin_get("/api/admin/bookings?csv=1"))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()[header::CONTENT_TYPE],
        "text/csv; charset=utf-8"
    );
    assert_eq!(
        res.headers()[header::CONTENT_DISPOSITION],
        "attachment; filename=\"flitzap-bookings.csv\""
    );

    let text = body_text(res).await;
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[0].starts_with("reference,service,date,time,status"));
    assert!(lines[1].contains("note; with comma and newline"));
    assert!(lines[1].contains("123 Oak St; Marietta; GA 30060"));
    assert_eq!(lines[1].split(',').count(), 11);
}

#[tokio::test]
async fn test_admin_listing_resyncs_view() {
    let (state, _) = test_state();
    let created = create(&state).await;
    state.view.replace_all(vec![]);

    let res = test_app(state.clone())
        .oneshot(admin_get("/api/admin/bookings"))
        .await
        .unwrap();
    let list = body_json(res).await;
    assert_eq!(list.as_array().unwrap().len(), 1);
    assert_eq!(list[0]["reference"], created["reference"]);
    assert_eq!(state.view.len(), 1);
}

// ── Direct Notification Endpoint ──

fn notify_body(kind: &str) -> serde_json::Value {
    serde_json::json!({
        "type": kind,
        "toEmail": "sarah@email.com",
        "toName": "Sarah",
        "reference": "FZ-2025-ABC123",
        "service": "Cleaning Services",
        "date": "2025-10-10",
        "time": "10:00 AM",
        "name": "Sarah Johnson",
        "email": "sarah@email.com",
        "phone": "(470) 604-1366",
        "address": "123 Oak St, Marietta, GA 30060",
        "notes": ""
    })
}

#[tokio::test]
async fn test_notify_ok() {
    let (state, sent) = test_state();
    let res = test_app(state)
        .oneshot(json_request("POST", "/api/notify", notify_body("booking.cancelled")))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_json(res).await["ok"], true);

    let sent = sent.lock().unwrap();
    let customer = sent
        .iter()
        .find(|e| e.to[0].email == "sarah@email.com")
        .unwrap();
    assert_eq!(customer.to[0].name, "Sarah");
    assert!(customer.html_content.contains("Hi Sarah, your booking has been cancelled."));
}

#[tokio::test]
async fn test_notify_missing_credentials() {
    let (state, sent) = state_with(false, None);
    let res = test_app(state)
        .oneshot(json_request("POST", "/api/notify", notify_body("booking.created")))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let json = body_json(res).await;
    assert_eq!(json["ok"], false);
    assert_eq!(json["error"], "Missing BREVO_API_KEY");
    assert!(sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_notify_team_rejected_returns_both_bodies() {
    let (state, _) = state_with(true, Some("alerts@flitzap.com"));
    let res = test_app(state)
        .oneshot(json_request("POST", "/api/notify", notify_body("booking.rescheduled")))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let json = body_json(res).await;
    assert_eq!(json["ok"], false);
    let bodies = json["error"].as_array().unwrap();
    assert_eq!(bodies.len(), 2);
    assert!(bodies[0].as_str().unwrap().contains("messageId"));
    assert!(bodies[1].as_str().unwrap().contains("mailbox unavailable"));
}

#[tokio::test]
async fn test_notify_unrecognized_type_uses_generic_header() {
    let (state, sent) = test_state();
    let res = test_app(state)
        .oneshot(json_request("POST", "/api/notify", notify_body("booking.paid")))
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let sent = sent.lock().unwrap();
    assert!(sent
        .iter()
        .all(|e| e.html_content.contains("Booking Confirmation")));
}
