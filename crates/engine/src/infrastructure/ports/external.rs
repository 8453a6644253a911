//! Ports for collaborators the queue consumes but does not own.

use courier_domain::{ClockSnapshot, Currency, TimeBlock, TokenBalances};

// =============================================================================
// Clock Port
// =============================================================================

/// Day/time source. Read-only from the queue's point of view.
#[cfg_attr(test, mockall::automock)]
pub trait DeadlineClock: Send + Sync {
    fn current_day(&self) -> u32;
    fn current_hour(&self) -> u32;
    fn current_time_block(&self) -> TimeBlock;
    fn hours_remaining_in_block(&self) -> u32;
    fn hours_per_day(&self) -> u32;
}

/// Copies the clock's current reading so validation never holds the port.
pub fn read_clock(clock: &dyn DeadlineClock) -> ClockSnapshot {
    ClockSnapshot {
        day: clock.current_day(),
        hour: clock.current_hour(),
        time_block: clock.current_time_block(),
        hours_per_day: clock.hours_per_day(),
    }
}

// =============================================================================
// Ledger Port
// =============================================================================

/// Multi-currency token balances owned by the player session.
#[cfg_attr(test, mockall::automock)]
pub trait TokenLedger: Send + Sync {
    fn balance(&self, currency: Currency) -> u32;

    /// Snapshot of every currency, handed to the validator.
    fn balances(&self) -> TokenBalances;

    /// Removes `amount`; returns false and changes nothing when the balance
    /// is short. This is the final authority on affordability.
    fn debit(&mut self, currency: Currency, amount: u32) -> bool;

    fn credit(&mut self, currency: Currency, amount: u32);
}
