use crate::models::{NotificationEvent, NotificationKind};

const FONT: &str = "-apple-system,BlinkMacSystemFont,Segoe UI,Roboto,Arial";
const FOOTER_CONTACT: &str = "(470) 604-1366 &bull; info@flitzap.com";
const FOOTER_SITE: &str = "https://www.flitzap.com";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Customer,
    Team,
}

/// Inputs the layout needs besides the event itself.
pub struct Branding<'a> {
    pub brand: &'a str,
    pub logo_url: &'a str,
    pub booking_url: &'a str,
}

pub fn subject(kind: NotificationKind, audience: Audience, brand: &str, reference: &str) -> String {
    match (kind, audience) {
        (NotificationKind::Rescheduled, Audience::Customer) => {
            format!("Your {brand} Booking Rescheduled 🟦 — {reference}")
        }
        (NotificationKind::Rescheduled, Audience::Team) => {
            format!("🟦 Booking Rescheduled — {reference}")
        }
        (NotificationKind::Cancelled, Audience::Customer) => {
            format!("Your {brand} Booking Cancelled 🟥 — {reference}")
        }
        (NotificationKind::Cancelled, Audience::Team) => {
            format!("🟥 Booking Cancelled — {reference}")
        }
        (NotificationKind::Created | NotificationKind::Unrecognized, Audience::Customer) => {
            format!("Your {brand} Booking 🟦 — {reference}")
        }
        (NotificationKind::Created | NotificationKind::Unrecognized, Audience::Team) => {
            format!("🟦 New Booking — {reference}")
        }
    }
}

pub fn header_text(kind: NotificationKind) -> &'static str {
    match kind {
        NotificationKind::Created => "Booking Confirmed",
        NotificationKind::Rescheduled => "Booking Rescheduled",
        NotificationKind::Cancelled => "Booking Cancelled",
        NotificationKind::Unrecognized => "Booking Confirmation",
    }
}

pub fn greeting(kind: NotificationKind, audience: Audience, name: &str) -> String {
    match (audience, kind) {
        (Audience::Customer, NotificationKind::Cancelled) => {
            format!("Hi {name}, your booking has been cancelled.")
        }
        (Audience::Customer, _) => format!("Thanks, {name}! Here are your details:"),
        (Audience::Team, NotificationKind::Rescheduled) => "Booking was rescheduled.".to_string(),
        (Audience::Team, NotificationKind::Cancelled) => "Booking was cancelled.".to_string(),
        (Audience::Team, _) => "New booking received.".to_string(),
    }
}

/// Full HTML document for one leg of a dispatch. Only the customer copy
/// carries the "View booking" link.
pub fn render_html(event: &NotificationEvent, audience: Audience, branding: &Branding) -> String {
    let greeting = escape_html(&greeting(event.kind, audience, event.recipient_name()));
    let header = header_text(event.kind);
    let details = details_table(event);

    let cta = if audience == Audience::Customer {
        format!(
            r#"<div style="text-align:center; margin:22px 0 6px;">
  <a href="{url}" style="display:inline-block;background:#3788da;color:#ffffff;text-decoration:none;font:600 14px/1 {FONT};padding:12px 18px;border-radius:8px;">View booking</a>
</div>"#,
            url = escape_html(branding.booking_url),
        )
    } else {
        String::new()
    };

    let next_steps = if event.kind == NotificationKind::Cancelled {
        String::new()
    } else {
        format!(
            r#"<div style="margin-top:18px; padding:12px; background:#F7FBFF; border:1px solid #E5DCC5; border-radius:8px;">
  <div style="font:600 14px/1.4 {FONT}; color:#1a1a2e; margin-bottom:4px;">Next steps</div>
  <div style="font:400 13px/1.6 {FONT}; color:#4a4a4a;">
    &bull; A coordinator will call to confirm your quote.<br/>
    &bull; You'll receive a secure payment link <em>after</em> the job is complete.
  </div>
</div>"#
        )
    };

    let brand = escape_html(branding.brand);
    let logo = escape_html(branding.logo_url);

    format!(
        r#"<!DOCTYPE html><html><head></head>
<body style="margin:0;padding:0;background:#f6f9fc;">
<table role="presentation" cellspacing="0" cellpadding="0" border="0" width="100%" style="background:#f6f9fc;padding:24px 0;">
<tr><td align="center">
<table role="presentation" cellspacing="0" cellpadding="0" border="0" width="560" style="max-width:560px;background:#ffffff;border:1px solid #e6f0f3;border-radius:10px;overflow:hidden;">
<tr><td style="padding:20px 24px; text-align:center; border-bottom:1px solid #eee;">
  <img src="{logo}" alt="{brand}" width="160" style="display:block;margin:0 auto;max-width:160px;height:auto;border:0;"/>
</td></tr>
<tr><td style="padding:24px;">
  <h1 style="margin:0 0 12px 0; font:700 20px/1.3 {FONT}; color:#1a1a2e;">{header}</h1>
  <p style="margin:0 0 16px 0; font:400 14px/1.6 {FONT}; color:#4a4a4a;">{greeting}</p>
  {details}
  {cta}
  {next_steps}
</td></tr>
<tr><td style="padding:16px 24px; border-top:1px solid #eee; color:#8a8a8a; font:400 12px/1.6 {FONT};">
  {brand} &bull; {FOOTER_CONTACT}<br/>
  <a href="{FOOTER_SITE}" style="color:#3788da;text-decoration:none;">www.flitzap.com</a>
</td></tr>
</table>
</td></tr>
</table>
</body></html>"#
    )
}

fn details_table(event: &NotificationEvent) -> String {
    let rows = [
        ("Reference", event.reference.as_str()),
        ("Service", event.service.as_str()),
        ("Date", event.date.as_str()),
        ("Time", event.time.as_str()),
        ("Name", event.customer.name.as_str()),
        ("Email", event.customer.email.as_str()),
        ("Phone", event.customer.phone.as_str()),
        ("Address", event.customer.address.as_str()),
        ("Notes", event.notes.as_str()),
    ];

    let mut html = format!(
        r#"<table role="presentation" width="100%" cellspacing="0" cellpadding="0" border="0" style="font:400 14px/1.6 {FONT}; color:#1a1a2e;">"#
    );
    for (label, value) in rows {
        let value = escape_html(value);
        let value = if label == "Reference" {
            format!("<strong>{value}</strong>")
        } else {
            value
        };
        html.push_str(&format!(
            r#"<tr><td style="padding:8px 0; width:140px; color:#4a4a4a; vertical-align:top;">{label}:</td><td style="padding:8px 0;">{value}</td></tr>"#
        ));
    }
    html.push_str("</table>");
    html
}

pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
