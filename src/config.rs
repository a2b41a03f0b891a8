use std::env;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub port: u16,
    pub database_url: String,
    pub admin_token: String,
    pub brevo_api_key: String,
    pub email_from: String,
    pub email_from_name: String,
    pub team_alert_email: String,
    pub email_logo_url: String,
    pub site_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self {
            port: env::var("PORT")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(3000),
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "flitzap.db".to_string()),
            admin_token: env::var("ADMIN_TOKEN").unwrap_or_else(|_| "changeme".to_string()),
            brevo_api_key: env::var("BREVO_API_KEY").unwrap_or_default(),
            email_from: env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "bookings@flitzap.com".to_string()),
            email_from_name: env::var("EMAIL_FROM_NAME").unwrap_or_else(|_| "FlitZap".to_string()),
            team_alert_email: env::var("TEAM_ALERT_EMAIL")
                .unwrap_or_else(|_| "alerts@flitzap.com".to_string()),
            email_logo_url: env::var("EMAIL_LOGO_URL").unwrap_or_else(|_| {
                "https://www.flitzap.com/assets/flitzap-logo.png".to_string()
            }),
            site_url: normalize_site_url(
                &env::var("SITE_URL").unwrap_or_else(|_| "https://app.flitzap.com".to_string()),
            ),
        }
    }
}

fn normalize_site_url(url: &str) -> String {
    url.trim_end_matches('/').to_string()
}
