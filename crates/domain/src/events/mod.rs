//! Domain Events
//!
//! [`QueueEvent`] is the single observability record for the queue. The
//! engine's executor emits exactly one per attempted operation, success,
//! rejection, or internal fault, and the session emits one for every letter
//! the queue forfeits on its own (expiry, displacement). Tests and log sinks
//! assert on structured data instead of log text.
//!
//! ## Aggregate Mutation Events
//!
//! The `queue_events` submodule holds the return type of
//! [`LetterQueue::apply`](crate::LetterQueue::apply).

pub mod queue_events;

pub use queue_events::{QueueChange, RemovalReason};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    ClockSnapshot, Currency, Letter, LetterId, QueueOperation, QueueOperationKind, QueueViolation,
};

/// Record of one attempted queue operation or one forfeited letter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueEvent {
    /// `None` for removals the queue performs on its own.
    pub operation: Option<QueueOperationKind>,
    pub positions: Vec<usize>,
    pub outcome: QueueEventOutcome,
    pub day: u32,
    pub hour: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum QueueEventOutcome {
    #[serde(rename_all = "camelCase")]
    Succeeded {
        tokens_spent: BTreeMap<Currency, u32>,
        affected_letter: Option<LetterId>,
    },
    #[serde(rename_all = "camelCase")]
    Rejected {
        unmet_preconditions: Vec<QueueViolation>,
    },
    /// Validation passed but the queue refused the plan; debits were refunded.
    Faulted { error: String },
    /// A letter left the queue undelivered and its sender's currency was charged.
    #[serde(rename_all = "camelCase")]
    LetterRemoved {
        letter_id: LetterId,
        reason: RemovalReason,
        currency: Currency,
        penalty: u32,
    },
}

impl QueueEvent {
    pub fn succeeded(
        operation: &QueueOperation,
        clock: &ClockSnapshot,
        tokens_spent: BTreeMap<Currency, u32>,
        affected_letter: Option<LetterId>,
    ) -> Self {
        Self {
            operation: Some(operation.kind()),
            positions: operation.positions(),
            outcome: QueueEventOutcome::Succeeded {
                tokens_spent,
                affected_letter,
            },
            day: clock.day,
            hour: clock.hour,
        }
    }

    pub fn rejected(
        operation: &QueueOperation,
        clock: &ClockSnapshot,
        unmet_preconditions: Vec<QueueViolation>,
    ) -> Self {
        Self {
            operation: Some(operation.kind()),
            positions: operation.positions(),
            outcome: QueueEventOutcome::Rejected {
                unmet_preconditions,
            },
            day: clock.day,
            hour: clock.hour,
        }
    }

    pub fn faulted(
        operation: &QueueOperation,
        clock: &ClockSnapshot,
        error: impl std::fmt::Display,
    ) -> Self {
        Self {
            operation: Some(operation.kind()),
            positions: operation.positions(),
            outcome: QueueEventOutcome::Faulted {
                error: error.to_string(),
            },
            day: clock.day,
            hour: clock.hour,
        }
    }

    /// `position` is the slot the letter held before it was removed.
    pub fn letter_removed(
        clock: &ClockSnapshot,
        position: usize,
        letter: &Letter,
        reason: RemovalReason,
        penalty: u32,
    ) -> Self {
        Self {
            operation: None,
            positions: vec![position],
            outcome: QueueEventOutcome::LetterRemoved {
                letter_id: letter.id(),
                reason,
                currency: letter.currency_type(),
                penalty,
            },
            day: clock.day,
            hour: clock.hour,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, QueueEventOutcome::Succeeded { .. })
    }

    /// First unmet precondition of a rejected attempt.
    pub fn primary_reason(&self) -> Option<&QueueViolation> {
        match &self.outcome {
            QueueEventOutcome::Rejected {
                unmet_preconditions,
            } => unmet_preconditions.first(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_event_exposes_primary_reason() {
        let event = QueueEvent::rejected(
            &QueueOperation::MorningSwap { first: 1, second: 3 },
            &ClockSnapshot::at(2, 14),
            vec![QueueViolation::WrongTimeBlock {
                required: crate::TimeBlock::Dawn,
                actual: crate::TimeBlock::Afternoon,
            }],
        );
        assert!(!event.is_success());
        assert_eq!(event.positions, vec![1, 3]);
        assert_eq!(event.day, 2);
        assert_eq!(event.primary_reason().map(|v| v.code()), Some("wrong_time_block"));
    }

    #[test]
    fn outcome_serializes_with_status_tag() {
        let event = QueueEvent::succeeded(
            &QueueOperation::Deliver,
            &ClockSnapshot::at(1, 9),
            BTreeMap::new(),
            None,
        );
        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["operation"], "deliver");
        assert_eq!(json["outcome"]["status"], "succeeded");
    }

    #[test]
    fn removal_event_has_no_operation_and_names_the_charge() {
        let letter = Letter::new("Marcus", "Harbor Master", Currency::Commerce, 0, 8);
        let event = QueueEvent::letter_removed(
            &ClockSnapshot::at(3, 6),
            2,
            &letter,
            RemovalReason::Expired,
            2,
        );

        assert!(event.operation.is_none());
        assert!(!event.is_success());
        assert!(event.primary_reason().is_none());
        assert_eq!(event.positions, vec![2]);

        let json = serde_json::to_value(&event).expect("serialize");
        assert_eq!(json["operation"], serde_json::Value::Null);
        assert_eq!(json["outcome"]["status"], "letterRemoved");
        assert_eq!(json["outcome"]["reason"], "expired");
        assert_eq!(json["outcome"]["currency"], "commerce");
        assert_eq!(json["outcome"]["penalty"], 2);
    }

    #[test]
    fn faulted_event_keeps_the_error_text() {
        let event = QueueEvent::faulted(
            &QueueOperation::SkipDeliver { position: 3 },
            &ClockSnapshot::at(1, 10),
            crate::DomainError::constraint("stale plan"),
        );
        assert_eq!(event.operation, Some(QueueOperationKind::SkipDeliver));
        assert!(!event.is_success());
        assert!(matches!(
            &event.outcome,
            QueueEventOutcome::Faulted { error } if error.contains("stale plan")
        ));
    }
}
