// libs/appointment-cell/src/handlers.rs
use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};

use shared_models::error::AppError;

use crate::models::{Appointment, AppointmentError, BookAppointmentRequest};
use crate::services::booking::AppointmentBookingService;

#[axum::debug_handler]
pub async fn list_appointments(
    State(service): State<Arc<AppointmentBookingService>>,
) -> Result<Json<Vec<Appointment>>, AppError> {
    let appointments = service
        .list_appointments()
        .await
        .map_err(|_| AppError::Internal("Failed to read appointments".to_string()))?;

    Ok(Json(appointments))
}

#[axum::debug_handler]
pub async fn book_appointment(
    State(service): State<Arc<AppointmentBookingService>>,
    Json(request): Json<BookAppointmentRequest>,
) -> Result<(StatusCode, Json<Appointment>), AppError> {
    let appointment = service
        .book_appointment(request)
        .await
        .map_err(|e| match e {
            AppointmentError::MissingFields => {
                AppError::BadRequest("Missing required fields".to_string())
            }
            AppointmentError::SlotTaken => {
                AppError::Conflict("This time slot is already booked.".to_string())
            }
            AppointmentError::Storage(_) => {
                AppError::Internal("Failed to save appointment".to_string())
            }
        })?;

    Ok((StatusCode::CREATED, Json(appointment)))
}
