//! Aggregate roots - domain objects that own their related data
//!
//! The queue is the only aggregate: it owns its letters outright, exposes
//! behavior through methods rather than public fields, and returns a
//! [`QueueChange`](crate::events::QueueChange) from every validated mutation.

pub mod letter_queue;

pub use letter_queue::LetterQueue;
