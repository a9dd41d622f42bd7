// libs/appointment-cell/src/router.rs
use std::sync::Arc;

use axum::{
    routing::get,
    Router,
};

use crate::handlers;
use crate::services::booking::AppointmentBookingService;

pub fn appointment_routes(service: Arc<AppointmentBookingService>) -> Router {
    Router::new()
        .route(
            "/",
            get(handlers::list_appointments).post(handlers::book_appointment),
        )
        .with_state(service)
}
