//! Use cases - User story orchestration.
//!
//! The queue module is the facade the UI and command layers call: preview,
//! execute, and deadline projection for one player session.

pub mod queue;
