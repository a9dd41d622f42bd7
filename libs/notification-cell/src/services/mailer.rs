use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Client,
};
use serde_json::json;
use tracing::{debug, error};

use crate::error::NotificationError;
use crate::models::{MailConfig, MailMessage};

/// Thin JSON client for the mail delivery API.
///
/// The configuration is passed per call rather than captured at
/// construction, so the caller can hand in freshly re-read credentials.
pub struct MailClient {
    client: Client,
}

impl MailClient {
    pub fn new() -> Self {
        Self {
            client: Client::new(),
        }
    }

    fn get_headers(&self, config: &MailConfig) -> HeaderMap {
        let mut headers = HeaderMap::new();

        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", config.api_key)) {
            headers.insert(AUTHORIZATION, value);
        }

        headers
    }

    pub async fn send(
        &self,
        config: &MailConfig,
        message: &MailMessage,
    ) -> Result<(), NotificationError> {
        let url = format!("{}/emails", config.api_url);
        debug!("Sending mail to {} via {}", message.to, url);

        let body = json!({
            "from": config.from_address,
            "to": message.to,
            "subject": message.subject,
            "text": message.text,
        });

        let response = self
            .client
            .post(&url)
            .headers(self.get_headers(config))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();

            match status.as_u16() {
                401 | 403 => error!("Mail API authentication failed ({}): {}", status, error_text),
                _ => error!("Mail API error ({}): {}", status, error_text),
            }

            return Err(NotificationError::Api {
                status: status.as_u16(),
                message: error_text,
            });
        }

        Ok(())
    }
}

impl Default for MailClient {
    fn default() -> Self {
        Self::new()
    }
}
