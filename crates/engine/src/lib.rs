//! Courier Engine library.
//!
//! Hosts the letter queue for a player session: the executor that turns
//! validated operations into queue and ledger changes, the ports it talks to,
//! and the in-process adapters behind them.
//!
//! ## Structure
//!
//! - `use_cases/` - Session facade and the queue operation executor
//! - `infrastructure/` - Port traits and their adapters (clock, ledger, event
//!   sink), configuration, and the per-session registry

pub mod infrastructure;
pub mod use_cases;

pub use infrastructure::config::EngineConfig;
pub use infrastructure::session_registry::SessionRegistry;
pub use use_cases::queue::{QueueExecutionError, QueueSession};
