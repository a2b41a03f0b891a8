pub mod booking;
pub mod catalog;
pub mod notification;

pub use booking::{
    Booking, BookingStatus, CreateBookingRequest, Customer, NewBooking, RescheduleRequest,
};
pub use catalog::{Service, SERVICES, TIME_SLOTS};
pub use notification::{NotificationEvent, NotificationKind, NotificationRecord};
