use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::{self, TraceLayer};
use tracing::{info, warn, Level};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod router;

use appointment_cell::services::booking::AppointmentBookingService;
use notification_cell::{EnvMailConfig, MailConfig, NotificationQueue, NotificationService};
use shared_config::AppConfig;
use shared_storage::SnapshotStore;

#[tokio::main]
async fn main() {
    // Loading Env Vars
    dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,tower_http=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Arogya Clinic API server");

    // Load configuration
    let config = AppConfig::from_env();

    if !MailConfig::from_env().is_configured() {
        warn!("Mail transport not fully configured - booking notifications will be skipped");
    }

    // Select the storage backing: a read-only filesystem gets the
    // in-memory store, everything else the file-backed snapshot.
    let store = if config.read_only_fs {
        info!("Read-only filesystem flag set, using volatile appointment storage");
        SnapshotStore::volatile()
    } else {
        info!("Using durable appointment storage at {}", config.appointments_file);
        SnapshotStore::durable(&config.appointments_file)
    };

    // Notification dispatch runs on its own worker, decoupled from the
    // request path; mail configuration is re-read on every send.
    let notifications = NotificationService::new(Arc::new(EnvMailConfig));
    let dispatcher = Arc::new(NotificationQueue::start(notifications));

    // Single owned booking service, injected into the handlers
    let booking = Arc::new(AppointmentBookingService::new(store, dispatcher));

    // Set up CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // Build the application router
    let app = router::create_router(booking)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(trace::DefaultMakeSpan::new().level(Level::INFO))
                .on_response(trace::DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(cors);

    // Run the server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
