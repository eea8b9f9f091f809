// src/events.rs

//! Structured observability events emitted by the pipeline.
//!
//! The external metrics/log collector is a collaborator, not part of
//! this crate; the default sink forwards events to the `log` facade.

use std::time::Duration;

use crate::models::RecordKind;

/// One pipeline event.
#[derive(Debug, Clone, PartialEq)]
pub enum HarvestEvent {
    /// A transport attempt is about to be issued.
    Attempt { page: u32, attempt: u32 },
    /// A retry was scheduled after a transient or rate-limited outcome.
    Retry {
        page: u32,
        attempt: u32,
        delay: Duration,
        cause: String,
    },
    /// A page completed the full pipeline.
    Success { page: u32, records: usize },
    /// A record was dropped for missing a required field.
    DroppedRecord { kind: RecordKind, field: String },
    /// A page failed after its retry budget and was skipped.
    PageFailed { page: u32, error: String },
    /// A fatal upstream response terminated the run.
    Fatal { status: u16 },
}

/// Sink for pipeline events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &HarvestEvent);
}

/// Default sink: forwards events to the `log` facade.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl EventSink for LogSink {
    fn emit(&self, event: &HarvestEvent) {
        match event {
            HarvestEvent::Attempt { page, attempt } => {
                log::debug!("page {page}: attempt {attempt}");
            }
            HarvestEvent::Retry {
                page,
                attempt,
                delay,
                cause,
            } => {
                log::warn!(
                    "page {page}: attempt {attempt} failed ({cause}), retrying in {delay:?}"
                );
            }
            HarvestEvent::Success { page, records } => {
                log::info!("page {page}: {records} record(s)");
            }
            HarvestEvent::DroppedRecord { kind, field } => {
                log::warn!("dropped {kind} record: missing required field '{field}'");
            }
            HarvestEvent::PageFailed { page, error } => {
                log::warn!("page {page} skipped: {error}");
            }
            HarvestEvent::Fatal { status } => {
                log::error!("fatal upstream response: HTTP {status}");
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Mutex;

    use super::{EventSink, HarvestEvent};

    /// Records every emitted event for assertions.
    #[derive(Debug, Default)]
    pub struct RecordingSink {
        pub events: Mutex<Vec<HarvestEvent>>,
    }

    impl EventSink for RecordingSink {
        fn emit(&self, event: &HarvestEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }
}
