pub mod brevo;
pub mod template;

use async_trait::async_trait;
use serde::Serialize;

use crate::config::AppConfig;
use crate::errors::NotifyError;
use crate::models::NotificationEvent;
use template::{Audience, Branding};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Mailbox {
    pub email: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OutboundEmail {
    pub sender: Mailbox,
    pub to: Vec<Mailbox>,
    pub subject: String,
    pub html_content: String,
}

/// What the transport answered for a single message.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub status: u16,
    pub body: String,
}

impl Delivery {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    /// Whether credentials are present. Checked before anything is sent.
    fn is_configured(&self) -> bool;

    /// Errors only on transport failure; an HTTP rejection is a `Delivery`
    /// with a non-2xx status.
    async fn send(&self, email: &OutboundEmail) -> anyhow::Result<Delivery>;
}

#[derive(Debug, Clone)]
pub struct NotifierSettings {
    pub from_email: String,
    pub from_name: String,
    pub team_alert_email: String,
    pub logo_url: String,
    pub site_url: String,
}

impl NotifierSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            from_email: config.email_from.clone(),
            from_name: config.email_from_name.clone(),
            team_alert_email: config.team_alert_email.clone(),
            logo_url: config.email_logo_url.clone(),
            site_url: config.site_url.clone(),
        }
    }

    /// Deep link that opens the dashboard filtered to one booking.
    pub fn booking_url(&self, reference: &str) -> String {
        match reqwest::Url::parse(&format!("{}/", self.site_url)) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("ref", reference);
                url.to_string()
            }
            Err(_) => format!("{}/?ref={}", self.site_url, urlencoding::encode(reference)),
        }
    }
}

/// Renders and sends the customer + team message pair for one event.
pub struct Notifier {
    transport: Box<dyn EmailTransport>,
    settings: NotifierSettings,
}

impl Notifier {
    pub fn new(transport: Box<dyn EmailTransport>, settings: NotifierSettings) -> Self {
        Self {
            transport,
            settings,
        }
    }

    pub fn render(&self, event: &NotificationEvent) -> (OutboundEmail, OutboundEmail) {
        let booking_url = self.settings.booking_url(&event.reference);
        let branding = Branding {
            brand: &self.settings.from_name,
            logo_url: &self.settings.logo_url,
            booking_url: &booking_url,
        };
        let sender = Mailbox {
            email: self.settings.from_email.clone(),
            name: self.settings.from_name.clone(),
        };

        let customer = OutboundEmail {
            sender: sender.clone(),
            to: vec![Mailbox {
                email: event.recipient_email().to_string(),
                name: event.recipient_name().to_string(),
            }],
            subject: template::subject(
                event.kind,
                Audience::Customer,
                &self.settings.from_name,
                &event.reference,
            ),
            html_content: template::render_html(event, Audience::Customer, &branding),
        };

        let team = OutboundEmail {
            sender,
            to: vec![Mailbox {
                email: self.settings.team_alert_email.clone(),
                name: format!("{} Alerts", self.settings.from_name),
            }],
            subject: template::subject(
                event.kind,
                Audience::Team,
                &self.settings.from_name,
                &event.reference,
            ),
            html_content: template::render_html(event, Audience::Team, &branding),
        };

        (customer, team)
    }

    /// Both legs go out concurrently; success requires both to be accepted.
    pub async fn dispatch(&self, event: &NotificationEvent) -> Result<(), NotifyError> {
        if !self.transport.is_configured() {
            return Err(NotifyError::MissingCredentials);
        }

        let (customer, team) = self.render(event);
        let (customer_res, team_res) =
            tokio::join!(self.transport.send(&customer), self.transport.send(&team));

        let (customer_ok, customer_body) = leg_outcome(customer_res);
        let (team_ok, team_body) = leg_outcome(team_res);

        if customer_ok && team_ok {
            tracing::info!(
                reference = %event.reference,
                kind = event.kind.as_str(),
                "notification sent"
            );
            Ok(())
        } else {
            Err(NotifyError::Rejected {
                customer: customer_body,
                team: team_body,
            })
        }
    }
}

fn leg_outcome(result: anyhow::Result<Delivery>) -> (bool, String) {
    match result {
        Ok(delivery) => (delivery.is_success(), delivery.body),
        Err(e) => (false, format!("{e:#}")),
    }
}
