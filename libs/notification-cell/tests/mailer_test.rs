use std::sync::Arc;

use assert_matches::assert_matches;
use serde_json::Value;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use notification_cell::models::{BookingNotification, MailConfig};
use notification_cell::services::dispatcher::{
    MailConfigProvider, NotificationDispatcher, NotificationQueue, NotificationService,
};
use notification_cell::services::mailer::MailClient;
use notification_cell::MailMessage;
use notification_cell::NotificationError;

/// Provider returning a fixed configuration pointed at a mock server.
struct StaticMailConfig(MailConfig);

impl MailConfigProvider for StaticMailConfig {
    fn mail_config(&self) -> MailConfig {
        self.0.clone()
    }
}

fn test_config(api_url: &str) -> MailConfig {
    MailConfig {
        api_url: api_url.to_string(),
        api_key: "re_test_key".to_string(),
        from_address: "clinic@example.com".to_string(),
        admin_email: "admin@example.com".to_string(),
    }
}

fn test_booking(patient_email: Option<&str>) -> BookingNotification {
    BookingNotification {
        appointment_id: 1717236000000,
        appointment_date: "2024-06-01".to_string(),
        appointment_time: "10:00".to_string(),
        patient_name: "Asha".to_string(),
        patient_email: patient_email.map(str::to_string),
        patient_phone: Some("9876543210".to_string()),
        concern: None,
    }
}

#[tokio::test]
async fn mail_client_posts_message_with_bearer_key() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .and(header("authorization", "Bearer re_test_key"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let client = MailClient::new();
    let config = test_config(&mock_server.uri());
    let message = MailMessage {
        to: "admin@example.com".to_string(),
        subject: "New appointment: 2024-06-01 at 10:00".to_string(),
        text: "A new appointment has been booked.".to_string(),
    };

    client.send(&config, &message).await.unwrap();

    let requests = mock_server.received_requests().await.unwrap();
    let body: Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["from"], "clinic@example.com");
    assert_eq!(body["to"], "admin@example.com");
    assert_eq!(body["subject"], "New appointment: 2024-06-01 at 10:00");
}

#[tokio::test]
async fn mail_client_surfaces_authentication_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(401).set_body_string("invalid api key"))
        .mount(&mock_server)
        .await;

    let client = MailClient::new();
    let config = test_config(&mock_server.uri());
    let message = MailMessage {
        to: "admin@example.com".to_string(),
        subject: "subject".to_string(),
        text: "text".to_string(),
    };

    let result = client.send(&config, &message).await;
    assert_matches!(result, Err(NotificationError::Api { status: 401, .. }));
}

#[tokio::test]
async fn unconfigured_transport_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut config = test_config(&mock_server.uri());
    config.api_key = String::new();

    let service = NotificationService::new(Arc::new(StaticMailConfig(config)));
    let result = service.notify_admin(&test_booking(None)).await;

    assert_matches!(result, Err(NotificationError::NotConfigured));
}

#[tokio::test]
async fn notify_booking_sends_admin_and_patient_mail() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .expect(2)
        .mount(&mock_server)
        .await;

    let service = NotificationService::new(Arc::new(StaticMailConfig(test_config(
        &mock_server.uri(),
    ))));

    service
        .notify_booking(&test_booking(Some("asha@example.com")))
        .await;

    let requests = mock_server.received_requests().await.unwrap();
    let recipients: Vec<String> = requests
        .iter()
        .map(|r| {
            let body: Value = serde_json::from_slice(&r.body).unwrap();
            body["to"].as_str().unwrap().to_string()
        })
        .collect();

    assert_eq!(recipients, vec!["admin@example.com", "asha@example.com"]);
}

#[tokio::test]
async fn notify_booking_skips_patient_mail_without_address() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&mock_server)
        .await;

    let service = NotificationService::new(Arc::new(StaticMailConfig(test_config(
        &mock_server.uri(),
    ))));

    service.notify_booking(&test_booking(None)).await;
}

#[tokio::test]
async fn notify_booking_absorbs_transport_failures() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .mount(&mock_server)
        .await;

    let service = NotificationService::new(Arc::new(StaticMailConfig(test_config(
        &mock_server.uri(),
    ))));

    // Must not panic or propagate; the failure is logged and swallowed.
    service
        .notify_booking(&test_booking(Some("asha@example.com")))
        .await;
}

#[tokio::test]
async fn queued_dispatch_reaches_the_transport() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/emails"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&mock_server)
        .await;

    let service = NotificationService::new(Arc::new(StaticMailConfig(test_config(
        &mock_server.uri(),
    ))));
    let queue = NotificationQueue::start(service);

    queue.dispatch(test_booking(None)).await;

    // The worker drains the channel asynchronously; poll until the send
    // lands rather than sleeping a fixed amount.
    for _ in 0..50 {
        let requests = mock_server.received_requests().await.unwrap();
        if !requests.is_empty() {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
    }
    panic!("queued notification never reached the mail API");
}
