use crate::models::Booking;

pub const CSV_HEADER: &[&str] = &[
    "reference",
    "service",
    "date",
    "time",
    "status",
    "customer_name",
    "customer_email",
    "customer_phone",
    "customer_address",
    "notes",
    "created_at",
];

pub const CSV_FILENAME: &str = "flitzap-bookings.csv";

/// Who is looking at the customer dashboard.
#[derive(Debug, Clone, Default)]
pub struct ViewerFilter {
    /// Deep-link reference; when present the contact fields are ignored.
    pub reference: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Keeps the input order. A reference matches exactly; otherwise a booking
/// matches when its email or its phone equals the viewer's.
pub fn filter_for_viewer(bookings: &[Booking], filter: &ViewerFilter) -> Vec<Booking> {
    if let Some(reference) = present(filter.reference.as_deref()) {
        return bookings
            .iter()
            .filter(|b| b.reference == reference)
            .cloned()
            .collect();
    }

    let email = present(filter.email.as_deref());
    let phone = present(filter.phone.as_deref());
    if email.is_none() && phone.is_none() {
        return vec![];
    }

    bookings
        .iter()
        .filter(|b| {
            email.is_some_and(|e| b.customer.email == e)
                || phone.is_some_and(|p| b.customer.phone == p)
        })
        .cloned()
        .collect()
}

fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// One line per booking plus a header line. Fields are never quoted: commas
/// become semicolons and line breaks become spaces.
pub fn to_csv(bookings: &[Booking]) -> String {
    let mut lines = Vec::with_capacity(bookings.len() + 1);
    lines.push(CSV_HEADER.join(","));

    for b in bookings {
        let created_at = b.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
        let fields = [
            b.reference.as_str(),
            b.service.as_str(),
            b.date.as_str(),
            b.time.as_str(),
            b.status.as_str(),
            b.customer.name.as_str(),
            b.customer.email.as_str(),
            b.customer.phone.as_str(),
            b.customer.address.as_str(),
            b.notes.as_deref().unwrap_or(""),
            created_at.as_str(),
        ];
        let row: Vec<String> = fields.iter().map(|f| sanitize_field(f)).collect();
        lines.push(row.join(","));
    }

    lines.join("\n")
}

pub fn sanitize_field(value: &str) -> String {
    value
        .replace("\r\n", " ")
        .replace(['\n', '\r'], " ")
        .replace(',', ";")
}
