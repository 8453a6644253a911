//! Queue use cases.
//!
//! Handles letter queue operations for a player session:
//! - Previewing operation costs and eligibility
//! - Executing operations (validate, debit, mutate, emit)
//! - Projecting how spending time would expire letters
//! - Letter intake and the daily deadline sweep

mod executor;
mod session;

pub use executor::{QueueExecutionError, QueueOperationExecutor};
pub use session::{DroppedLetter, QueueSession};
