// libs/appointment-cell/src/services/booking.rs
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use notification_cell::{BookingNotification, NotificationDispatcher};
use shared_storage::{SnapshotStore, StorageMode};

use crate::models::{Appointment, AppointmentError, BookAppointmentRequest, ValidBooking};
use crate::services::conflict;

/// Owns the canonical appointment collection and the one-booking-per-slot
/// guarantee. Constructed once at process start and injected into the
/// request handlers as router state.
pub struct AppointmentBookingService {
    store: SnapshotStore<Appointment>,
    dispatcher: Arc<dyn NotificationDispatcher>,
    // Serializes the load-check-append-persist sequence. Two interleaved
    // booking requests for one slot must not both observe "free".
    booking_lock: Mutex<()>,
    last_id: AtomicI64,
}

impl AppointmentBookingService {
    pub fn new(
        store: SnapshotStore<Appointment>,
        dispatcher: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            dispatcher,
            booking_lock: Mutex::new(()),
            last_id: AtomicI64::new(0),
        }
    }

    /// The stored collection verbatim, in booking order.
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, AppointmentError> {
        self.store
            .load_all()
            .map_err(|e| AppointmentError::Storage(e.to_string()))
    }

    /// Validates, checks the slot, persists and returns the new record.
    ///
    /// A storage read failure here is recovered as an empty collection
    /// rather than failing the booking; a durable write failure degrades
    /// the store to in-memory operation without failing it either. The
    /// caller gets a definitive record or a definitive input-level error.
    pub async fn book_appointment(
        &self,
        request: BookAppointmentRequest,
    ) -> Result<Appointment, AppointmentError> {
        let booking = request.validate()?;

        let _guard = self.booking_lock.lock().await;

        let mut appointments = match self.store.load_all() {
            Ok(appointments) => appointments,
            Err(e) => {
                warn!("Could not read existing appointments, treating as empty: {}", e);
                Vec::new()
            }
        };

        if conflict::slot_taken(
            &appointments,
            &booking.appointment_date,
            &booking.appointment_time,
        ) {
            return Err(AppointmentError::SlotTaken);
        }

        let appointment = self.build_appointment(&appointments, booking);
        appointments.push(appointment.clone());

        self.store
            .save_all(&appointments)
            .map_err(|e| AppointmentError::Storage(e.to_string()))?;

        info!(
            "Booked appointment {} for {} on {} at {}",
            appointment.id,
            appointment.patient_name,
            appointment.appointment_date,
            appointment.appointment_time
        );

        // Fire-and-forget: enqueued while the lock is still held so send
        // order follows booking order, but the outcome never feeds back
        // into the booking result.
        self.dispatcher.dispatch(notification_for(&appointment)).await;

        Ok(appointment)
    }

    /// Current storage mode, for logging and for tests asserting on the
    /// durable-to-degraded fallback.
    pub fn storage_mode(&self) -> StorageMode {
        self.store.mode()
    }

    fn build_appointment(
        &self,
        appointments: &[Appointment],
        booking: ValidBooking,
    ) -> Appointment {
        let created_at = Utc::now();
        let id = self.next_id(appointments, created_at.timestamp_millis());

        Appointment {
            id,
            appointment_date: booking.appointment_date,
            appointment_time: booking.appointment_time,
            patient_name: booking.patient_name,
            patient_email: booking.patient_email,
            patient_phone: booking.patient_phone,
            patient_adhaar: booking.patient_adhaar,
            concern: booking.concern,
            created_at,
        }
    }

    // Millisecond timestamps are unique and ordered except when bookings
    // land within the same millisecond (or the clock steps back), so the
    // id is bumped past both the stored maximum and the last id issued by
    // this process. Only called under the booking lock.
    fn next_id(&self, appointments: &[Appointment], now_millis: i64) -> i64 {
        let stored_max = appointments.iter().map(|a| a.id).max().unwrap_or(0);
        let last_issued = self.last_id.load(Ordering::Relaxed);

        let id = now_millis.max(stored_max + 1).max(last_issued + 1);
        self.last_id.store(id, Ordering::Relaxed);
        id
    }
}

fn notification_for(appointment: &Appointment) -> BookingNotification {
    BookingNotification {
        appointment_id: appointment.id,
        appointment_date: appointment.appointment_date.clone(),
        appointment_time: appointment.appointment_time.clone(),
        patient_name: appointment.patient_name.clone(),
        patient_email: appointment.patient_email.clone(),
        patient_phone: appointment.patient_phone.clone(),
        concern: appointment.concern.clone(),
    }
}
