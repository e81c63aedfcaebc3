//! Presentation Event Logger
//!
//! Structured events (navigation, annotation batches, subscribers coming and
//! going, reloads, rejected commands) emitted under the `presentation_events`
//! target so they can be filtered or routed to the NDJSON file on their own.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

pub const EVENT_TARGET: &str = "presentation_events";

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PresentationEvent {
    Navigated {
        slide: usize,
        step: usize,
        via: String,
    },
    AnnotationBatch {
        slide: usize,
        applied: usize,
        skipped: usize,
    },
    SubscriberJoined {
        subscriber: String,
        role: String,
    },
    SubscriberLeft {
        subscriber: String,
        reason: String,
    },
    DeckReloaded {
        slides: usize,
        diagnostics: usize,
    },
    Unauthorized {
        command: String,
        detail: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub timestamp: DateTime<Utc>,
    pub event: PresentationEvent,
}

impl EventLogEntry {
    pub fn new(mut event: PresentationEvent) -> Self {
        if let PresentationEvent::Unauthorized { detail, .. } = &mut event {
            *detail = redact_sensitive_data(detail);
        }
        Self {
            timestamp: Utc::now(),
            event,
        }
    }
}

pub struct EventLogger;

impl EventLogger {
    /// Log a presentation event, redacting free-form text first.
    pub fn log_event(event: PresentationEvent) {
        let entry = EventLogEntry::new(event);
        let json = serde_json::to_string(&entry).unwrap_or_default();
        info!(target: EVENT_TARGET, event = %json, "Presentation event");
    }
}
