use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::db::queries;
use crate::errors::StoreError;
use crate::models::Booking;
use crate::services::notify::Notifier;
use crate::services::projection::BookingView;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub notifier: Notifier,
    pub view: BookingView,
}

impl AppState {
    pub fn new(conn: Connection, config: AppConfig, notifier: Notifier) -> Self {
        Self {
            db: Arc::new(Mutex::new(conn)),
            config,
            notifier,
            view: BookingView::new(),
        }
    }

    /// Reloads the view from the store and returns the rows it now holds.
    pub fn refresh_view(&self) -> Result<Vec<Booking>, StoreError> {
        let bookings = {
            let db = self.db.lock().unwrap();
            queries::list_bookings(&db, queries::MAX_LISTING_ROWS)?
        };
        self.view.replace_all(bookings.clone());
        Ok(bookings)
    }
}
