use async_trait::async_trait;
use chrono::{DateTime, Utc};
use google_calendar3::api::{Event, EventAttendee, EventDateTime};
use google_calendar3::hyper_rustls::{self, HttpsConnectorBuilder};
use google_calendar3::hyper_util::client::legacy::connect::HttpConnector;
use google_calendar3::hyper_util::client::legacy::Client;
use google_calendar3::yup_oauth2::{read_service_account_key, ServiceAccountAuthenticator};
use google_calendar3::CalendarHub;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

type Connector = hyper_rustls::HttpsConnector<HttpConnector>;

pub type HubType = CalendarHub<Connector>;

#[derive(Error, Debug)]
pub enum CalendarError {
    #[error("Google API Error: {0}")]
    Api(#[from] google_calendar3::Error),
    #[error("Calendar credentials error: {0}")]
    Credentials(String),
}

/// A tutoring session as mirrored into the external calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionEvent {
    pub summary: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub attendee_emails: Vec<String>,
}

/// Best-effort mirror of bookings into an external calendar. The booking
/// ledger stays the source of truth; callers log and swallow every error.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CalendarMirror: Send + Sync {
    async fn create_event(&self, event: SessionEvent) -> Result<(), CalendarError>;

    /// Deletes events matching the summary text within the time window and
    /// returns how many were removed.
    async fn remove_matching_events(
        &self,
        summary: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<usize, CalendarError>;
}

pub struct GoogleCalendar {
    hub: HubType,
    calendar_id: String,
}

impl GoogleCalendar {
    /// Authenticates against the calendar API with a service account key file.
    pub async fn connect(key_path: &Path, calendar_id: String) -> Result<Self, CalendarError> {
        let sa_key = read_service_account_key(key_path)
            .await
            .map_err(|err| CalendarError::Credentials(err.to_string()))?;

        let auth = ServiceAccountAuthenticator::builder(sa_key)
            .build()
            .await
            .map_err(|err| CalendarError::Credentials(err.to_string()))?;

        let https = HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|err| CalendarError::Credentials(err.to_string()))?
            .https_or_http()
            .enable_http1()
            .build();
        let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(https);

        Ok(Self {
            hub: CalendarHub::new(client, auth),
            calendar_id,
        })
    }
}

#[async_trait]
impl CalendarMirror for GoogleCalendar {
    async fn create_event(&self, event: SessionEvent) -> Result<(), CalendarError> {
        let attendees = event
            .attendee_emails
            .iter()
            .map(|email| EventAttendee {
                email: Some(email.clone()),
                ..Default::default()
            })
            .collect();

        let new_event = Event {
            summary: Some(event.summary),
            description: Some(event.description),
            start: Some(EventDateTime {
                date_time: Some(event.start_time),
                time_zone: Some("UTC".to_string()),
                ..Default::default()
            }),
            end: Some(EventDateTime {
                date_time: Some(event.end_time),
                time_zone: Some("UTC".to_string()),
                ..Default::default()
            }),
            attendees: Some(attendees),
            ..Default::default()
        };

        self.hub
            .events()
            .insert(new_event, &self.calendar_id)
            .doit()
            .await?;
        Ok(())
    }

    async fn remove_matching_events(
        &self,
        summary: &str,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
    ) -> Result<usize, CalendarError> {
        let (_response, events) = self
            .hub
            .events()
            .list(&self.calendar_id)
            .q(summary)
            .time_min(start_time)
            .time_max(end_time)
            .single_events(true)
            .doit()
            .await?;

        let mut removed = 0;
        for event in events.items.unwrap_or_default() {
            let Some(event_id) = event.id else { continue };
            self.hub
                .events()
                .delete(&self.calendar_id, &event_id)
                .doit()
                .await?;
            removed += 1;
        }
        Ok(removed)
    }
}

/// No-op mirror wired in when no credential file is configured.
#[derive(Debug, Clone, Default)]
pub struct DisabledCalendar;

#[async_trait]
impl CalendarMirror for DisabledCalendar {
    async fn create_event(&self, event: SessionEvent) -> Result<(), CalendarError> {
        debug!(summary = %event.summary, "calendar mirroring disabled, event not created");
        Ok(())
    }

    async fn remove_matching_events(
        &self,
        summary: &str,
        _start_time: DateTime<Utc>,
        _end_time: DateTime<Utc>,
    ) -> Result<usize, CalendarError> {
        debug!(%summary, "calendar mirroring disabled, nothing to remove");
        Ok(0)
    }
}
