// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==============================================================================
// CORE APPOINTMENT MODELS
// ==============================================================================

/// One booked slot. Immutable once created; the collection it lives in is
/// append-only and no update or cancel operation exists.
///
/// Wire field names are fixed by the frontend contract and mix snake and
/// camel case, hence the per-field renames.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub appointment_date: String,
    pub appointment_time: String,
    #[serde(rename = "patientName")]
    pub patient_name: String,
    #[serde(rename = "patientEmail", default, skip_serializing_if = "Option::is_none")]
    pub patient_email: Option<String>,
    #[serde(rename = "patientPhone", default, skip_serializing_if = "Option::is_none")]
    pub patient_phone: Option<String>,
    // Opaque identity string, treated as sensitive. Never normalized,
    // never placed in outbound mail.
    #[serde(rename = "patientAdhaar", default, skip_serializing_if = "Option::is_none")]
    pub patient_adhaar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concern: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

/// Raw booking request body.
///
/// Every field is optional at the serde level so that an absent or empty
/// required field reaches [`BookAppointmentRequest::validate`] and comes
/// back as `MissingFields`, instead of dying in a deserialization
/// rejection with the wrong status code.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    #[serde(default)]
    pub appointment_date: Option<String>,
    #[serde(default)]
    pub appointment_time: Option<String>,
    #[serde(rename = "patientName", default)]
    pub patient_name: Option<String>,
    #[serde(rename = "patientEmail", default)]
    pub patient_email: Option<String>,
    #[serde(rename = "patientPhone", default)]
    pub patient_phone: Option<String>,
    #[serde(rename = "patientAdhaar", default)]
    pub patient_adhaar: Option<String>,
    #[serde(default)]
    pub concern: Option<String>,
}

/// A booking request that has passed required-field validation.
#[derive(Debug, Clone)]
pub struct ValidBooking {
    pub appointment_date: String,
    pub appointment_time: String,
    pub patient_name: String,
    pub patient_email: Option<String>,
    pub patient_phone: Option<String>,
    pub patient_adhaar: Option<String>,
    pub concern: Option<String>,
}

impl BookAppointmentRequest {
    /// Checks that date, time and patient name are present and non-empty.
    /// Empty strings count as missing; no trimming or normalization is
    /// applied to any field.
    pub fn validate(self) -> Result<ValidBooking, AppointmentError> {
        let required = |field: Option<String>| match field {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(AppointmentError::MissingFields),
        };

        Ok(ValidBooking {
            appointment_date: required(self.appointment_date)?,
            appointment_time: required(self.appointment_time)?,
            patient_name: required(self.patient_name)?,
            patient_email: self.patient_email,
            patient_phone: self.patient_phone,
            patient_adhaar: self.patient_adhaar,
            concern: self.concern,
        })
    }
}

// ==============================================================================
// ERROR TYPES
// ==============================================================================

#[derive(Debug, Clone, thiserror::Error)]
pub enum AppointmentError {
    #[error("Missing required fields")]
    MissingFields,

    #[error("This time slot is already booked.")]
    SlotTaken,

    #[error("Storage error: {0}")]
    Storage(String),
}
