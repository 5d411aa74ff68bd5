use crate::calendar::{CalendarError, CalendarMirror, SessionEvent};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

pub struct RecordingCalendarInner {
    pub success: AtomicBool,
    pub calls_to_create_event: AtomicU64,
    pub calls_to_remove_matching_events: AtomicU64,
    pub events: Mutex<Vec<SessionEvent>>,
}

/// Calendar double for tests: counts calls, keeps the mirrored events, and can
/// be flipped into a failing mode via `success`.
#[derive(Clone)]
pub struct RecordingCalendar(pub Arc<RecordingCalendarInner>);

impl RecordingCalendar {
    pub fn new() -> Self {
        Self(Arc::new(RecordingCalendarInner {
            success: AtomicBool::new(true),
            calls_to_create_event: AtomicU64::default(),
            calls_to_remove_matching_events: AtomicU64::default(),
            events: Mutex::default(),
        }))
    }

    fn result(&self) -> Result<(), CalendarError> {
        match self.0.success.load(Ordering::SeqCst) {
            true => Ok(()),
            false => Err(CalendarError::Credentials("Supposed to fail".into())),
        }
    }
}

#[async_trait]
impl CalendarMirror for RecordingCalendar {
    async fn create_event(&self, event: SessionEvent) -> Result<(), CalendarError> {
        self.0.calls_to_create_event.fetch_add(1, Ordering::SeqCst);
        self.result()?;
        self.0.events.lock().unwrap().push(event);
        Ok(())
    }

    async fn remove_matching_events(
        &self,
        summary: &str,
        _start_time: DateTime<Utc>,
        _end_time: DateTime<Utc>,
    ) -> Result<usize, CalendarError> {
        self.0
            .calls_to_remove_matching_events
            .fetch_add(1, Ordering::SeqCst);
        self.result()?;
        let mut events = self.0.events.lock().unwrap();
        let before = events.len();
        events.retain(|event| event.summary != summary);
        Ok(before - events.len())
    }
}
