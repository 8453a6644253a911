//! Queue event sinks.

use std::sync::{Mutex, PoisonError};

use courier_domain::{QueueEvent, QueueEventOutcome};

use crate::infrastructure::ports::QueueEventSink;

/// Writes every queue event to `tracing`. Successes log at info, rejections
/// and dropped letters at warn, faults at error.
#[derive(Debug, Default)]
pub struct TracingEventSink;

impl TracingEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl QueueEventSink for TracingEventSink {
    fn emit(&self, event: QueueEvent) {
        match &event.outcome {
            QueueEventOutcome::Succeeded {
                tokens_spent,
                affected_letter,
            } => {
                tracing::info!(
                    operation = ?event.operation,
                    positions = ?event.positions,
                    tokens_spent = ?tokens_spent,
                    letter_id = ?affected_letter,
                    day = event.day,
                    hour = event.hour,
                    "Queue operation succeeded"
                );
            }
            QueueEventOutcome::Rejected {
                unmet_preconditions,
            } => {
                let reason = unmet_preconditions.first();
                tracing::warn!(
                    operation = ?event.operation,
                    positions = ?event.positions,
                    reason_code = reason.map(|r| r.code()).unwrap_or("unknown"),
                    reason = reason.map(|r| r.to_string()).unwrap_or_default(),
                    unmet = unmet_preconditions.len(),
                    day = event.day,
                    hour = event.hour,
                    "Queue operation rejected"
                );
            }
            QueueEventOutcome::Faulted { error } => {
                tracing::error!(
                    operation = ?event.operation,
                    positions = ?event.positions,
                    %error,
                    day = event.day,
                    hour = event.hour,
                    "Queue operation faulted"
                );
            }
            QueueEventOutcome::LetterRemoved {
                letter_id,
                reason,
                currency,
                penalty,
            } => {
                tracing::warn!(
                    %letter_id,
                    position = ?event.positions.first(),
                    %reason,
                    %currency,
                    penalty,
                    day = event.day,
                    hour = event.hour,
                    "Letter removed undelivered"
                );
            }
        }
    }
}

/// Keeps events in memory so callers can inspect them afterwards.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<QueueEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<QueueEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns everything recorded so far.
    pub fn drain(&self) -> Vec<QueueEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

impl QueueEventSink for RecordingEventSink {
    fn emit(&self, event: QueueEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courier_domain::{
        ClockSnapshot, Currency, DomainError, Letter, QueueOperation, RemovalReason,
    };
    use std::collections::BTreeMap;

    #[test]
    fn recording_sink_keeps_events_in_order() {
        let sink = RecordingEventSink::new();
        let clock = ClockSnapshot::at(1, 9);
        sink.emit(QueueEvent::succeeded(
            &QueueOperation::Deliver,
            &clock,
            BTreeMap::new(),
            None,
        ));
        sink.emit(QueueEvent::rejected(
            &QueueOperation::Deliver,
            &clock,
            vec![courier_domain::QueueViolation::PositionNotOccupied { position: 1 }],
        ));

        let events = sink.drain();
        assert_eq!(events.len(), 2);
        assert!(events[0].is_success());
        assert!(!events[1].is_success());
        assert!(sink.is_empty());
    }

    #[test]
    fn tracing_sink_accepts_every_outcome() {
        let sink = TracingEventSink::new();
        let clock = ClockSnapshot::at(2, 6);
        let letter = Letter::new("Marcus", "Harbor Master", Currency::Commerce, 0, 8);

        sink.emit(QueueEvent::faulted(
            &QueueOperation::Deliver,
            &clock,
            DomainError::constraint("stale plan"),
        ));
        sink.emit(QueueEvent::letter_removed(
            &clock,
            1,
            &letter,
            RemovalReason::Expired,
            2,
        ));
    }
}
