//! Courier domain layer.
//!
//! Pure, synchronous types and rules for the letter queue: the queue aggregate,
//! the operation catalog, cost validation, and deadline projection. Nothing in
//! this crate performs I/O or reads ambient state; clocks and ledgers are
//! handed in as snapshots by the engine.

pub mod aggregates;
pub mod entities;
pub mod error;
pub mod events;
pub mod ids;
pub mod queue_rules;
pub mod value_objects;

pub use aggregates::LetterQueue;
pub use entities::{Letter, LetterSize, PhysicalProperty};
pub use error::DomainError;
pub use events::{QueueChange, QueueEvent, QueueEventOutcome, RemovalReason};
pub use ids::{LetterId, SessionId};

// Re-export queue rule types
pub use queue_rules::{
    authorize, can_perform, project_deadline_impact, validate_operation, AffectedLetter,
    DeadlineImpact, QueueOperation, QueueOperationCost, QueueOperationKind, QueueOperationResult,
    QueueRules, QueueViolation, Rejection, ValidatedOperation, ValidationContext,
};

// Re-export value objects
pub use value_objects::{ClockSnapshot, Currency, TimeBlock, TokenBalances, HOURS_PER_DAY};
