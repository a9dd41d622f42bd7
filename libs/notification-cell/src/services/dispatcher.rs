use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tracing::{debug, info, warn};

use crate::error::NotificationError;
use crate::models::{BookingNotification, MailConfig, MailMessage};
use crate::services::mailer::MailClient;

const QUEUE_CAPACITY: usize = 64;
const SEND_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of mail configuration, queried at dispatch time.
pub trait MailConfigProvider: Send + Sync {
    fn mail_config(&self) -> MailConfig;
}

/// Re-reads the process environment on every call, so credential changes
/// take effect without a restart.
pub struct EnvMailConfig;

impl MailConfigProvider for EnvMailConfig {
    fn mail_config(&self) -> MailConfig {
        MailConfig::from_env()
    }
}

/// The seam the booking flow talks to: hand over a committed booking,
/// never hear back. Implementations must not fail the caller.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, booking: BookingNotification);
}

/// Sends the admin notification and, when an address is present, the
/// patient confirmation for a committed booking.
pub struct NotificationService {
    mailer: MailClient,
    config_provider: Arc<dyn MailConfigProvider>,
}

impl NotificationService {
    pub fn new(config_provider: Arc<dyn MailConfigProvider>) -> Self {
        Self {
            mailer: MailClient::new(),
            config_provider,
        }
    }

    pub async fn notify_admin(
        &self,
        booking: &BookingNotification,
    ) -> Result<(), NotificationError> {
        let config = self.config_provider.mail_config();
        if !config.is_configured() {
            warn!("Skipping admin notification, mail transport not configured");
            return Err(NotificationError::NotConfigured);
        }

        let message = MailMessage {
            to: config.admin_email.clone(),
            subject: format!(
                "New appointment: {} at {}",
                booking.appointment_date, booking.appointment_time
            ),
            text: admin_body(booking),
        };

        self.mailer.send(&config, &message).await
    }

    pub async fn notify_patient(
        &self,
        booking: &BookingNotification,
    ) -> Result<(), NotificationError> {
        let Some(patient_email) = booking.patient_email.as_deref() else {
            return Ok(());
        };

        let config = self.config_provider.mail_config();
        if !config.is_configured() {
            warn!("Skipping patient confirmation, mail transport not configured");
            return Err(NotificationError::NotConfigured);
        }

        let message = MailMessage {
            to: patient_email.to_string(),
            subject: "Your appointment is confirmed".to_string(),
            text: patient_body(booking),
        };

        self.mailer.send(&config, &message).await
    }

    /// Best-effort fan-out for one booking. Every failure is logged and
    /// absorbed here; nothing reaches the booking caller and nothing
    /// reverses the persisted record.
    pub async fn notify_booking(&self, booking: &BookingNotification) {
        if let Err(e) = self.notify_admin(booking).await {
            warn!(
                "Admin notification for appointment {} failed: {}",
                booking.appointment_id, e
            );
        }

        if booking.patient_email.is_some() {
            if let Err(e) = self.notify_patient(booking).await {
                warn!(
                    "Patient confirmation for appointment {} failed: {}",
                    booking.appointment_id, e
                );
            }
        }
    }
}

fn admin_body(booking: &BookingNotification) -> String {
    let mut lines = vec![
        "A new appointment has been booked.".to_string(),
        String::new(),
        format!("Date: {}", booking.appointment_date),
        format!("Time: {}", booking.appointment_time),
        format!("Patient: {}", booking.patient_name),
    ];

    if let Some(phone) = &booking.patient_phone {
        lines.push(format!("Phone: {}", phone));
    }
    if let Some(email) = &booking.patient_email {
        lines.push(format!("Email: {}", email));
    }
    if let Some(concern) = &booking.concern {
        lines.push(format!("Concern: {}", concern));
    }

    lines.join("\n")
}

fn patient_body(booking: &BookingNotification) -> String {
    format!(
        "Dear {},\n\nYour appointment on {} at {} is confirmed.\n\nIf you need to make changes, please contact the clinic.",
        booking.patient_name, booking.appointment_date, booking.appointment_time
    )
}

/// Queue-backed dispatcher decoupling notification sends from the request
/// path. A single worker drains the channel, so sends go out in booking
/// order; each send is bounded by a timeout so a stuck transport cannot
/// hold up shutdown.
pub struct NotificationQueue {
    tx: mpsc::Sender<BookingNotification>,
}

impl NotificationQueue {
    pub fn start(service: NotificationService) -> Self {
        let (tx, mut rx) = mpsc::channel::<BookingNotification>(QUEUE_CAPACITY);

        tokio::spawn(async move {
            info!("Notification worker started");

            while let Some(booking) = rx.recv().await {
                let appointment_id = booking.appointment_id;
                debug!("Dispatching notifications for appointment {}", appointment_id);

                if timeout(SEND_TIMEOUT, service.notify_booking(&booking))
                    .await
                    .is_err()
                {
                    warn!(
                        "Notification send for appointment {} timed out after {:?}",
                        appointment_id, SEND_TIMEOUT
                    );
                }
            }

            debug!("Notification worker stopped");
        });

        Self { tx }
    }
}

#[async_trait]
impl NotificationDispatcher for NotificationQueue {
    async fn dispatch(&self, booking: BookingNotification) {
        if let Err(e) = self.tx.try_send(booking) {
            warn!("Dropping booking notification: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn admin_body_includes_optional_contact_fields() {
        let booking = BookingNotification {
            appointment_id: 1,
            appointment_date: "2024-06-01".to_string(),
            appointment_time: "10:00".to_string(),
            patient_name: "Asha".to_string(),
            patient_email: Some("asha@example.com".to_string()),
            patient_phone: Some("9876543210".to_string()),
            concern: Some("Follow-up".to_string()),
        };

        let body = admin_body(&booking);
        assert!(body.contains("Date: 2024-06-01"));
        assert!(body.contains("Time: 10:00"));
        assert!(body.contains("Patient: Asha"));
        assert!(body.contains("Phone: 9876543210"));
        assert!(body.contains("Concern: Follow-up"));
    }

    #[test]
    fn admin_body_omits_absent_fields() {
        let booking = BookingNotification {
            appointment_id: 1,
            appointment_date: "2024-06-01".to_string(),
            appointment_time: "10:00".to_string(),
            patient_name: "Asha".to_string(),
            patient_email: None,
            patient_phone: None,
            concern: None,
        };

        let body = admin_body(&booking);
        assert!(!body.contains("Phone:"));
        assert!(!body.contains("Email:"));
        assert!(!body.contains("Concern:"));
    }
}
