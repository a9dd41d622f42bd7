use std::sync::Arc;

use axum::Router;
use tower_http::services::ServeDir;

use appointment_cell::router::appointment_routes;
use appointment_cell::services::booking::AppointmentBookingService;

pub fn create_router(booking: Arc<AppointmentBookingService>) -> Router {
    Router::new()
        .nest("/api/appointments", appointment_routes(booking))
        // Anything outside /api is the static booking page
        .fallback_service(ServeDir::new("public"))
}
