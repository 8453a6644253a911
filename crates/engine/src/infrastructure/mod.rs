//! Infrastructure implementations.
//!
//! Contains port trait implementations for the queue's collaborators, plus
//! configuration and the session registry.

pub mod clock;
pub mod config;
pub mod event_sink;
pub mod ledger;
pub mod ports;
pub mod session_registry;
