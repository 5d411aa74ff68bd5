use crate::backend::BookingBackend;
use crate::error::ServiceError;
use crate::types::{Account, Booking, Timeslot};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Debug, Default)]
struct Ledgers {
    accounts: HashMap<Uuid, Account>,
    timeslots: HashMap<Uuid, Timeslot>,
    bookings: HashMap<Uuid, Booking>,
}

/// In-memory backend used when no database is configured. All three ledgers
/// live behind a single lock, so claim and release are atomic.
#[derive(Debug, Clone, Default)]
pub struct LocalLedger {
    ledgers: Arc<Mutex<Ledgers>>,
}

impl BookingBackend for LocalLedger {
    fn add_account(&self, account: Account) -> Result<Account, ServiceError> {
        let mut ledgers = self.ledgers.lock().unwrap();
        if ledgers
            .accounts
            .values()
            .any(|existing| existing.email == account.email)
        {
            return Err(ServiceError::DuplicateEmail);
        }
        ledgers.accounts.insert(account.id, account.clone());
        Ok(account)
    }

    fn account(&self, id: Uuid) -> Result<Option<Account>, ServiceError> {
        Ok(self.ledgers.lock().unwrap().accounts.get(&id).cloned())
    }

    fn account_by_email(&self, email: &str) -> Result<Option<Account>, ServiceError> {
        Ok(self
            .ledgers
            .lock()
            .unwrap()
            .accounts
            .values()
            .find(|account| account.email == email)
            .cloned())
    }

    fn add_timeslot(&self, timeslot: Timeslot) -> Result<Timeslot, ServiceError> {
        let mut ledgers = self.ledgers.lock().unwrap();
        ledgers.timeslots.insert(timeslot.id, timeslot.clone());
        Ok(timeslot)
    }

    fn timeslot(&self, id: Uuid) -> Result<Option<Timeslot>, ServiceError> {
        Ok(self.ledgers.lock().unwrap().timeslots.get(&id).cloned())
    }

    fn available_timeslots(&self) -> Result<Vec<Timeslot>, ServiceError> {
        Ok(self
            .ledgers
            .lock()
            .unwrap()
            .timeslots
            .values()
            .filter(|timeslot| timeslot.is_available)
            .cloned()
            .collect())
    }

    fn claim_timeslot(&self, student_id: Uuid, slot_id: Uuid) -> Result<Booking, ServiceError> {
        let mut ledgers = self.ledgers.lock().unwrap();
        let timeslot = ledgers
            .timeslots
            .get_mut(&slot_id)
            .ok_or(ServiceError::NotFound("Timeslot"))?;
        if !timeslot.is_available {
            return Err(ServiceError::SlotUnavailable);
        }
        timeslot.is_available = false;
        let booking = Booking {
            id: Uuid::new_v4(),
            student_id,
            slot_id,
            created_at: Utc::now(),
        };
        ledgers.bookings.insert(booking.id, booking.clone());
        Ok(booking)
    }

    fn booking(&self, id: Uuid) -> Result<Option<Booking>, ServiceError> {
        Ok(self.ledgers.lock().unwrap().bookings.get(&id).cloned())
    }

    fn bookings_for_student(&self, student_id: Uuid) -> Result<Vec<Booking>, ServiceError> {
        Ok(self
            .ledgers
            .lock()
            .unwrap()
            .bookings
            .values()
            .filter(|booking| booking.student_id == student_id)
            .cloned()
            .collect())
    }

    fn release_booking(&self, booking_id: Uuid) -> Result<(), ServiceError> {
        let mut ledgers = self.ledgers.lock().unwrap();
        let booking = ledgers
            .bookings
            .remove(&booking_id)
            .ok_or(ServiceError::NotFound("Booking"))?;
        if let Some(timeslot) = ledgers.timeslots.get_mut(&booking.slot_id) {
            timeslot.is_available = true;
        }
        Ok(())
    }
}
