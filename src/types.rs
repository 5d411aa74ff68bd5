use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A registered user. The volunteer flag decides whether the account may
/// publish timeslots; everyone may book.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = crate::schema::accounts)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_volunteer: bool,
}

/// A volunteer-published window of availability. `is_available` is true until
/// exactly one booking claims the slot and reverts when that booking is
/// cancelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = crate::schema::timeslots)]
pub struct Timeslot {
    pub id: Uuid,
    pub volunteer_id: Uuid,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub subject: String,
    pub is_available: bool,
}

/// A student's claim on a timeslot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Queryable, Insertable)]
#[diesel(table_name = crate::schema::bookings)]
pub struct Booking {
    pub id: Uuid,
    pub student_id: Uuid,
    pub slot_id: Uuid,
    pub created_at: DateTime<Utc>,
}
