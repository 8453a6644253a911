//! Queue operation catalog, cost rules, validation, and deadline projection.
//!
//! Everything here is a pure function of its inputs. The engine's executor is
//! the only caller that turns a validated operation into a mutation.

mod cost;
mod operation;
mod projector;
mod rules;
mod validator;
mod violation;

pub use cost::{QueueOperationCost, QueueOperationResult};
pub use operation::{QueueOperation, QueueOperationKind};
pub use projector::{project_deadline_impact, AffectedLetter, DeadlineImpact};
pub use rules::QueueRules;
pub use validator::{
    authorize, can_perform, validate_operation, Rejection, ValidatedOperation, ValidationContext,
};
pub use violation::QueueViolation;

pub(crate) use validator::PlannedChange;
