// libs/notification-cell/src/models.rs
use std::env;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Payload handed to the dispatcher when a booking commits.
///
/// The Adhaar number is deliberately absent: it is sensitive and has no
/// business being in outbound mail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingNotification {
    pub appointment_id: i64,
    pub appointment_date: String,
    pub appointment_time: String,
    pub patient_name: String,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub concern: Option<String>,
}

/// A single outbound email, ready for the transport.
#[derive(Debug, Clone, Serialize)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
}

/// Mail transport configuration.
///
/// Read fresh from the environment at every dispatch (see
/// [`crate::services::dispatcher::MailConfigProvider`]) so credentials can
/// be rotated without a process restart.
#[derive(Debug, Clone)]
pub struct MailConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_address: String,
    pub admin_email: String,
}

impl MailConfig {
    pub fn from_env() -> Self {
        Self {
            api_url: env::var("MAIL_API_URL")
                .unwrap_or_else(|_| "https://api.resend.com".to_string()),
            api_key: env::var("MAIL_API_KEY").unwrap_or_else(|_| {
                warn!("MAIL_API_KEY not set, outbound mail disabled");
                String::new()
            }),
            from_address: env::var("MAIL_FROM")
                .unwrap_or_else(|_| "clinic@example.com".to_string()),
            admin_email: env::var("ADMIN_EMAIL").unwrap_or_else(|_| {
                warn!("ADMIN_EMAIL not set, admin notifications disabled");
                String::new()
            }),
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty() && !self.admin_email.is_empty()
    }
}
