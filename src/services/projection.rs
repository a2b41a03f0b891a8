use std::collections::HashMap;
use std::sync::Mutex;

use crate::models::Booking;

/// In-memory copy of the bookings that transition preconditions are checked
/// against.
///
/// Only ever written from rows the store has confirmed: a full rebuild from a
/// listing, or a single booking returned by a successful transition.
#[derive(Default)]
pub struct BookingView {
    bookings: Mutex<HashMap<i64, Booking>>,
}

impl BookingView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn replace_all(&self, bookings: Vec<Booking>) {
        let mut map = self.bookings.lock().unwrap();
        map.clear();
        map.extend(bookings.into_iter().map(|b| (b.id, b)));
    }

    pub fn apply(&self, booking: Booking) {
        self.bookings.lock().unwrap().insert(booking.id, booking);
    }

    pub fn remove(&self, id: i64) {
        self.bookings.lock().unwrap().remove(&id);
    }

    pub fn get(&self, id: i64) -> Option<Booking> {
        self.bookings.lock().unwrap().get(&id).cloned()
    }

    pub fn find_by_reference(&self, reference: &str) -> Option<Booking> {
        self.bookings
            .lock()
            .unwrap()
            .values()
            .find(|b| b.reference == reference)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.bookings.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
