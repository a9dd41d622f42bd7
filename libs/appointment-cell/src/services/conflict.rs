use crate::models::Appointment;

/// Returns true iff some existing appointment occupies exactly this
/// (date, time) slot.
///
/// Slots are atomic units keyed by literal string equality on both
/// fields: "2024-01-01" and "2024-1-1" are different dates here, and no
/// overlap or adjacency logic applies.
pub fn slot_taken(appointments: &[Appointment], date: &str, time: &str) -> bool {
    appointments
        .iter()
        .any(|a| a.appointment_date == date && a.appointment_time == time)
}
