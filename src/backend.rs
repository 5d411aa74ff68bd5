use crate::error::ServiceError;
use crate::types::{Account, Booking, Timeslot};
use uuid::Uuid;

/// Storage seam over the three ledgers. Implemented by the in-memory
/// [`LocalLedger`](crate::local_ledger::LocalLedger) and the PostgreSQL
/// [`DatabaseInterface`](crate::database_interface::DatabaseInterface).
pub trait BookingBackend: Clone + Send + Sync + 'static {
    fn add_account(&self, account: Account) -> Result<Account, ServiceError>;
    fn account(&self, id: Uuid) -> Result<Option<Account>, ServiceError>;
    fn account_by_email(&self, email: &str) -> Result<Option<Account>, ServiceError>;

    fn add_timeslot(&self, timeslot: Timeslot) -> Result<Timeslot, ServiceError>;
    fn timeslot(&self, id: Uuid) -> Result<Option<Timeslot>, ServiceError>;
    fn available_timeslots(&self) -> Result<Vec<Timeslot>, ServiceError>;

    /// Flips the timeslot to unavailable and records the booking in one atomic
    /// step. The flip only succeeds while the slot is still available, so two
    /// concurrent claims can never both go through.
    fn claim_timeslot(&self, student_id: Uuid, slot_id: Uuid) -> Result<Booking, ServiceError>;
    fn booking(&self, id: Uuid) -> Result<Option<Booking>, ServiceError>;
    fn bookings_for_student(&self, student_id: Uuid) -> Result<Vec<Booking>, ServiceError>;
    /// Deletes the booking and flips its timeslot back to available, atomically.
    fn release_booking(&self, booking_id: Uuid) -> Result<(), ServiceError>;
}
