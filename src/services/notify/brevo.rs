use anyhow::Context;
use async_trait::async_trait;

use super::{Delivery, EmailTransport, OutboundEmail};

const BREVO_SMTP_URL: &str = "https://api.brevo.com/v3/smtp/email";

pub struct BrevoTransport {
    api_key: String,
    endpoint: String,
    client: reqwest::Client,
}

impl BrevoTransport {
    pub fn new(api_key: String) -> Self {
        Self::with_endpoint(api_key, BREVO_SMTP_URL.to_string())
    }

    pub fn with_endpoint(api_key: String, endpoint: String) -> Self {
        Self {
            api_key,
            endpoint,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl EmailTransport for BrevoTransport {
    fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
    }

    async fn send(&self, email: &OutboundEmail) -> anyhow::Result<Delivery> {
        let resp = self
            .client
            .post(&self.endpoint)
            .header("api-key", &self.api_key)
            .json(email)
            .send()
            .await
            .context("failed to call Brevo API")?;

        let status = resp.status().as_u16();
        let body = resp.text().await.unwrap_or_default();

        if !(200..300).contains(&status) {
            tracing::warn!(status, body = %body, "Brevo rejected email");
        }

        Ok(Delivery { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::notify::Mailbox;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn email() -> OutboundEmail {
        OutboundEmail {
            sender: Mailbox {
                email: "bookings@flitzap.com".to_string(),
                name: "FlitZap".to_string(),
            },
            to: vec![Mailbox {
                email: "sarah@email.com".to_string(),
                name: "Sarah Johnson".to_string(),
            }],
            subject: "Your FlitZap Booking 🟦 — FZ-2025-ABC123".to_string(),
            html_content: "<p>hi</p>".to_string(),
        }
    }

    #[tokio::test]
    async fn test_posts_json_with_api_key() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v3/smtp/email"))
            .and(header("api-key", "test-key"))
            .and(body_partial_json(serde_json::json!({
                "subject": "Your FlitZap Booking 🟦 — FZ-2025-ABC123",
                "htmlContent": "<p>hi</p>",
            })))
            .respond_with(ResponseTemplate::new(201).set_body_string(r#"{"messageId":"abc"}"#))
            .expect(1)
            .mount(&server)
            .await;

        let transport = BrevoTransport::with_endpoint(
            "test-key".to_string(),
            format!("{}/v3/smtp/email", server.uri()),
        );
        let delivery = transport.send(&email()).await.unwrap();

        assert!(delivery.is_success());
        assert_eq!(delivery.body, r#"{"messageId":"abc"}"#);
    }

    #[tokio::test]
    async fn test_rejection_is_a_delivery_not_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("unauthorized key"))
            .mount(&server)
            .await;

        let transport = BrevoTransport::with_endpoint(
            "bad".to_string(),
            format!("{}/v3/smtp/email", server.uri()),
        );
        let delivery = transport.send(&email()).await.unwrap();

        assert_eq!(delivery.status, 401);
        assert!(!delivery.is_success());
        assert_eq!(delivery.body, "unauthorized key");
    }

    #[test]
    fn test_empty_key_is_not_configured() {
        assert!(!BrevoTransport::new(String::new()).is_configured());
        assert!(BrevoTransport::new("k".to_string()).is_configured());
    }
}
