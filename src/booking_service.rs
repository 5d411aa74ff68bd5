use crate::backend::BookingBackend;
use crate::calendar::{CalendarMirror, SessionEvent};
use crate::error::ServiceError;
use crate::types::{Account, Booking, Timeslot};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tracing::{error, warn};
use uuid::Uuid;

/// An available timeslot annotated with the owning volunteer's display name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnotatedTimeslot {
    pub id: Uuid,
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub volunteer_name: String,
    pub subject: String,
}

/// A student's booking joined with its timeslot and volunteer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookingOverview {
    pub id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub volunteer_name: String,
    pub subject: String,
}

/// Orchestrates the account, availability and booking ledgers and mirrors
/// confirmed bookings into the external calendar. Every operation takes the
/// acting account id explicitly; there is no ambient current-user state.
#[derive(Clone)]
pub struct BookingService<B: BookingBackend> {
    backend: B,
    calendar: Arc<dyn CalendarMirror>,
}

fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

fn event_summary(volunteer_name: &str) -> String {
    format!("Tutoring session with {volunteer_name}")
}

impl<B: BookingBackend> BookingService<B> {
    pub fn new(backend: B, calendar: Arc<dyn CalendarMirror>) -> Self {
        Self { backend, calendar }
    }

    pub fn register(
        &self,
        email: String,
        name: String,
        password: &str,
        is_volunteer: bool,
    ) -> Result<Account, ServiceError> {
        let account = Account {
            id: Uuid::new_v4(),
            email,
            name,
            password_hash: hash_password(password),
            is_volunteer,
        };
        self.backend.add_account(account)
    }

    pub fn authenticate(&self, email: &str, password: &str) -> Result<Account, ServiceError> {
        let account = self
            .backend
            .account_by_email(email)?
            .ok_or(ServiceError::InvalidCredentials)?;
        if account.password_hash != hash_password(password) {
            return Err(ServiceError::InvalidCredentials);
        }
        Ok(account)
    }

    pub fn publish_timeslot(
        &self,
        volunteer_id: Uuid,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        subject: &str,
    ) -> Result<Timeslot, ServiceError> {
        let account = self
            .backend
            .account(volunteer_id)?
            .ok_or(ServiceError::NotFound("Account"))?;
        if !account.is_volunteer {
            return Err(ServiceError::NotVolunteer);
        }

        let subject = subject.trim();
        if subject.is_empty() {
            return Err(ServiceError::Validation("Subject is required".into()));
        }
        if end_time <= start_time {
            return Err(ServiceError::Validation(
                "Timeslot must end after it starts".into(),
            ));
        }

        self.backend.add_timeslot(Timeslot {
            id: Uuid::new_v4(),
            volunteer_id,
            start_time,
            end_time,
            subject: subject.to_string(),
            is_available: true,
        })
    }

    /// All timeslots whose availability flag is true, joined with the owning
    /// volunteer's name. No ordering guarantee.
    pub fn available_timeslots(&self) -> Result<Vec<AnnotatedTimeslot>, ServiceError> {
        let mut annotated = Vec::new();
        for timeslot in self.backend.available_timeslots()? {
            let Some(volunteer) = self.backend.account(timeslot.volunteer_id)? else {
                warn!(timeslot_id = %timeslot.id, "timeslot without an owning account, skipping");
                continue;
            };
            annotated.push(AnnotatedTimeslot {
                id: timeslot.id,
                title: format!("{} with {}", timeslot.subject, volunteer.name),
                start: timeslot.start_time,
                end: timeslot.end_time,
                volunteer_name: volunteer.name,
                subject: timeslot.subject,
            });
        }
        Ok(annotated)
    }

    pub async fn book(&self, student_id: Uuid, slot_id: Uuid) -> Result<Booking, ServiceError> {
        let timeslot = self
            .backend
            .timeslot(slot_id)?
            .ok_or(ServiceError::NotFound("Timeslot"))?;
        if !timeslot.is_available {
            return Err(ServiceError::SlotUnavailable);
        }
        if timeslot.volunteer_id == student_id {
            return Err(ServiceError::SelfBooking);
        }

        let booking = self.backend.claim_timeslot(student_id, slot_id)?;

        // Ledger committed; the mirror is best effort from here on.
        match (
            self.backend.account(student_id),
            self.backend.account(timeslot.volunteer_id),
        ) {
            (Ok(Some(student)), Ok(Some(volunteer))) => {
                let event = SessionEvent {
                    summary: event_summary(&volunteer.name),
                    description: format!(
                        "One-on-one {} session with {}",
                        timeslot.subject, volunteer.name
                    ),
                    start_time: timeslot.start_time,
                    end_time: timeslot.end_time,
                    attendee_emails: vec![student.email, volunteer.email],
                };
                if let Err(err) = self.calendar.create_event(event).await {
                    error!(?err, booking_id = %booking.id, "failed to mirror booking to the calendar");
                }
            }
            _ => {
                warn!(booking_id = %booking.id, "participant lookup failed, calendar event not created")
            }
        }

        Ok(booking)
    }

    pub async fn cancel(&self, student_id: Uuid, booking_id: Uuid) -> Result<(), ServiceError> {
        let booking = self
            .backend
            .booking(booking_id)?
            .ok_or(ServiceError::NotFound("Booking"))?;
        if booking.student_id != student_id {
            return Err(ServiceError::Unauthorized);
        }

        let timeslot = self.backend.timeslot(booking.slot_id)?;
        self.backend.release_booking(booking_id)?;

        let Some(timeslot) = timeslot else {
            return Ok(());
        };
        match self.backend.account(timeslot.volunteer_id) {
            Ok(Some(volunteer)) => {
                let summary = event_summary(&volunteer.name);
                if let Err(err) = self
                    .calendar
                    .remove_matching_events(&summary, timeslot.start_time, timeslot.end_time)
                    .await
                {
                    error!(?err, booking_id = %booking_id, "failed to remove the mirrored calendar event");
                }
            }
            _ => {
                warn!(booking_id = %booking_id, "volunteer lookup failed, calendar event left in place")
            }
        }
        Ok(())
    }

    pub fn bookings_for_student(
        &self,
        student_id: Uuid,
    ) -> Result<Vec<BookingOverview>, ServiceError> {
        let mut overviews = Vec::new();
        for booking in self.backend.bookings_for_student(student_id)? {
            let Some(timeslot) = self.backend.timeslot(booking.slot_id)? else {
                warn!(booking_id = %booking.id, "booking without a timeslot, skipping");
                continue;
            };
            let volunteer_name = self
                .backend
                .account(timeslot.volunteer_id)?
                .map(|account| account.name)
                .unwrap_or_default();
            overviews.push(BookingOverview {
                id: booking.id,
                start_time: timeslot.start_time,
                end_time: timeslot.end_time,
                volunteer_name,
                subject: timeslot.subject,
            });
        }
        Ok(overviews)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::calendar::{CalendarError, DisabledCalendar, MockCalendarMirror};
    use crate::local_ledger::LocalLedger;
    use chrono::TimeZone;

    fn service() -> BookingService<LocalLedger> {
        BookingService::new(LocalLedger::default(), Arc::new(DisabledCalendar))
    }

    fn service_with_calendar(calendar: MockCalendarMirror) -> BookingService<LocalLedger> {
        BookingService::new(LocalLedger::default(), Arc::new(calendar))
    }

    fn register_volunteer(service: &BookingService<LocalLedger>) -> Account {
        service
            .register("vera@example.com".into(), "Vera".into(), "secret", true)
            .unwrap()
    }

    fn register_student(service: &BookingService<LocalLedger>) -> Account {
        service
            .register("anna@example.com".into(), "Anna".into(), "secret", false)
            .unwrap()
    }

    fn slot_window() -> (DateTime<Utc>, DateTime<Utc>) {
        let start = Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 14, 11, 0, 0).unwrap();
        (start, end)
    }

    fn publish(service: &BookingService<LocalLedger>, volunteer: &Account) -> Timeslot {
        let (start, end) = slot_window();
        service
            .publish_timeslot(volunteer.id, start, end, "Algebra")
            .unwrap()
    }

    #[test]
    fn test_register_rejects_duplicate_email() {
        let service = service();
        register_volunteer(&service);

        let err = service
            .register("vera@example.com".into(), "Other".into(), "secret", false)
            .unwrap_err();
        assert!(matches!(err, ServiceError::DuplicateEmail));
    }

    #[test]
    fn test_authenticate_checks_the_password_hash() {
        let service = service();
        let account = register_student(&service);

        let err = service
            .authenticate("anna@example.com", "wrong")
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));

        let err = service
            .authenticate("nobody@example.com", "secret")
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidCredentials));

        let authenticated = service.authenticate("anna@example.com", "secret").unwrap();
        assert_eq!(authenticated, account);
        // The stored hash is a digest, never the password itself.
        assert_ne!(authenticated.password_hash, "secret");
    }

    #[test]
    fn test_publish_requires_volunteer_role() {
        let service = service();
        let student = register_student(&service);
        let (start, end) = slot_window();

        let err = service
            .publish_timeslot(student.id, start, end, "Algebra")
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotVolunteer));

        let err = service
            .publish_timeslot(Uuid::new_v4(), start, end, "Algebra")
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[test_case::test_case("" ; "empty subject")]
    #[test_case::test_case("   " ; "blank subject")]
    fn test_publish_rejects_missing_subject(subject: &str) {
        let service = service();
        let volunteer = register_volunteer(&service);
        let (start, end) = slot_window();

        let err = service
            .publish_timeslot(volunteer.id, start, end, subject)
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_publish_rejects_inverted_window() {
        let service = service();
        let volunteer = register_volunteer(&service);
        let (start, end) = slot_window();

        let err = service
            .publish_timeslot(volunteer.id, end, start, "Algebra")
            .unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[test]
    fn test_available_timeslots_are_annotated_with_the_volunteer() {
        let service = service();
        let volunteer = register_volunteer(&service);
        let timeslot = publish(&service, &volunteer);

        let available = service.available_timeslots().unwrap();
        assert_eq!(available.len(), 1);
        assert_eq!(available[0].id, timeslot.id);
        assert_eq!(available[0].title, "Algebra with Vera");
        assert_eq!(available[0].volunteer_name, "Vera");
        assert_eq!(available[0].subject, "Algebra");
    }

    #[tokio::test]
    async fn test_booking_claims_the_timeslot_exactly_once() {
        let service = service();
        let volunteer = register_volunteer(&service);
        let student = register_student(&service);
        let timeslot = publish(&service, &volunteer);

        service.book(student.id, timeslot.id).await.unwrap();
        assert_eq!(service.available_timeslots().unwrap().len(), 0);
        assert_eq!(service.bookings_for_student(student.id).unwrap().len(), 1);

        let err = service.book(student.id, timeslot.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::SlotUnavailable));

        let err = service.book(student.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_booking_your_own_timeslot_is_forbidden() {
        let service = service();
        let volunteer = register_volunteer(&service);
        let timeslot = publish(&service, &volunteer);

        let err = service.book(volunteer.id, timeslot.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::SelfBooking));
        assert_eq!(service.available_timeslots().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_booking_mirrors_an_event_with_both_attendees() {
        let mut calendar = MockCalendarMirror::new();
        let (start, end) = slot_window();
        calendar
            .expect_create_event()
            .withf(move |event| {
                event.summary == "Tutoring session with Vera"
                    && event.start_time == start
                    && event.end_time == end
                    && event.attendee_emails
                        == vec!["anna@example.com".to_string(), "vera@example.com".to_string()]
            })
            .times(1)
            .returning(|_| Ok(()));

        let service = service_with_calendar(calendar);
        let volunteer = register_volunteer(&service);
        let student = register_student(&service);
        let timeslot = publish(&service, &volunteer);

        service.book(student.id, timeslot.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_calendar_failure_does_not_block_the_booking() {
        let mut calendar = MockCalendarMirror::new();
        calendar
            .expect_create_event()
            .times(1)
            .returning(|_| Err(CalendarError::Credentials("calendar offline".into())));

        let service = service_with_calendar(calendar);
        let volunteer = register_volunteer(&service);
        let student = register_student(&service);
        let timeslot = publish(&service, &volunteer);

        service.book(student.id, timeslot.id).await.unwrap();
        assert_eq!(service.bookings_for_student(student.id).unwrap().len(), 1);
        assert_eq!(service.available_timeslots().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_cancel_restores_the_timeslot_and_removes_the_mirror_event() {
        let mut calendar = MockCalendarMirror::new();
        let (start, end) = slot_window();
        calendar.expect_create_event().times(1).returning(|_| Ok(()));
        calendar
            .expect_remove_matching_events()
            .withf(move |summary, event_start, event_end| {
                summary == "Tutoring session with Vera"
                    && *event_start == start
                    && *event_end == end
            })
            .times(1)
            .returning(|_, _, _| Ok(1));

        let service = service_with_calendar(calendar);
        let volunteer = register_volunteer(&service);
        let student = register_student(&service);
        let timeslot = publish(&service, &volunteer);

        let booking = service.book(student.id, timeslot.id).await.unwrap();
        service.cancel(student.id, booking.id).await.unwrap();

        assert_eq!(service.bookings_for_student(student.id).unwrap().len(), 0);
        assert_eq!(service.available_timeslots().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_cancel_rejects_other_students_and_unknown_bookings() {
        let service = service();
        let volunteer = register_volunteer(&service);
        let student = register_student(&service);
        let other = service
            .register("paul@example.com".into(), "Paul".into(), "secret", false)
            .unwrap();
        let timeslot = publish(&service, &volunteer);

        let booking = service.book(student.id, timeslot.id).await.unwrap();

        let err = service.cancel(other.id, booking.id).await.unwrap_err();
        assert!(matches!(err, ServiceError::Unauthorized));
        assert_eq!(service.bookings_for_student(student.id).unwrap().len(), 1);

        let err = service.cancel(student.id, Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_bookings_for_student_join_slot_and_volunteer() {
        let service = service();
        let volunteer = register_volunteer(&service);
        let student = register_student(&service);
        let timeslot = publish(&service, &volunteer);
        let (start, end) = slot_window();

        service.book(student.id, timeslot.id).await.unwrap();

        let bookings = service.bookings_for_student(student.id).unwrap();
        assert_eq!(bookings.len(), 1);
        assert_eq!(bookings[0].start_time, start);
        assert_eq!(bookings[0].end_time, end);
        assert_eq!(bookings[0].volunteer_name, "Vera");
        assert_eq!(bookings[0].subject, "Algebra");

        assert_eq!(service.bookings_for_student(volunteer.id).unwrap().len(), 0);
    }
}
