//! Observability hook for queue operations.

use courier_domain::QueueEvent;

/// Receives one [`QueueEvent`] per attempted operation.
#[cfg_attr(test, mockall::automock)]
pub trait QueueEventSink: Send + Sync {
    fn emit(&self, event: QueueEvent);
}
