pub mod booking;
pub mod export;
pub mod notify;
pub mod projection;
pub mod reference;
