use serde::{Deserialize, Serialize};

use super::{Booking, Customer};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum NotificationKind {
    #[default]
    #[serde(rename = "booking.created")]
    Created,
    #[serde(rename = "booking.rescheduled")]
    Rescheduled,
    #[serde(rename = "booking.cancelled")]
    Cancelled,
    /// Any other event type string; rendered with generic copy.
    #[serde(other)]
    Unrecognized,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Created => "booking.created",
            NotificationKind::Rescheduled => "booking.rescheduled",
            NotificationKind::Cancelled => "booking.cancelled",
            NotificationKind::Unrecognized => "unrecognized",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NotificationEvent {
    pub kind: NotificationKind,
    pub reference: String,
    pub service: String,
    pub date: String,
    pub time: String,
    pub customer: Customer,
    pub notes: String,
    /// Overrides the customer as recipient of the customer-facing message.
    pub to_email: Option<String>,
    pub to_name: Option<String>,
}

impl NotificationEvent {
    pub fn for_booking(kind: NotificationKind, booking: &Booking) -> Self {
        Self {
            kind,
            reference: booking.reference.clone(),
            service: booking.service.clone(),
            date: booking.date.clone(),
            time: booking.time.clone(),
            customer: booking.customer.clone(),
            notes: booking.notes.clone().unwrap_or_default(),
            to_email: None,
            to_name: None,
        }
    }

    pub fn recipient_email(&self) -> &str {
        non_blank(self.to_email.as_deref()).unwrap_or(&self.customer.email)
    }

    pub fn recipient_name(&self) -> &str {
        non_blank(self.to_name.as_deref()).unwrap_or(&self.customer.name)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// One row of the notification delivery log.
#[derive(Debug, Clone, Serialize)]
pub struct NotificationRecord {
    pub id: i64,
    pub kind: String,
    pub reference: String,
    pub ok: bool,
    pub detail: Option<String>,
    pub created_at: String,
}
