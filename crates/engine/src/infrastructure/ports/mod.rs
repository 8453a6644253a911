//! Port traits for infrastructure boundaries.
//!
//! These are the only abstractions in the engine. Everything else is concrete
//! types. Ports exist for:
//! - The game clock (owned by the wider game loop)
//! - The token ledger (could be backed by persistence later)
//! - Queue event delivery (tracing, recording in tests)

mod events;
mod external;

pub use events::QueueEventSink;
pub use external::{read_clock, DeadlineClock, TokenLedger};

// =============================================================================
// Test-Only Mocks (only available during test builds)
// =============================================================================
#[cfg(test)]
pub use events::MockQueueEventSink;
#[cfg(test)]
pub use external::{MockDeadlineClock, MockTokenLedger};
