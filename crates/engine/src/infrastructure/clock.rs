//! Clock implementations.

use std::sync::atomic::{AtomicU64, Ordering};

use courier_domain::{ClockSnapshot, TimeBlock, HOURS_PER_DAY};

use crate::infrastructure::ports::{read_clock, DeadlineClock};

/// In-memory game clock counting whole hours from the start of day 1.
///
/// Shared between the session and whatever drives time forward, so the
/// counter is atomic and every method takes `&self`.
pub struct GameClock {
    elapsed_hours: AtomicU64,
}

impl GameClock {
    pub fn new() -> Self {
        Self::starting_at(1, 0)
    }

    /// Clock reading `day` (1-based; 0 is treated as 1) at `hour`.
    pub fn starting_at(day: u32, hour: u32) -> Self {
        let day = u64::from(day.max(1) - 1);
        let hour = u64::from(hour % HOURS_PER_DAY);
        Self {
            elapsed_hours: AtomicU64::new(day * u64::from(HOURS_PER_DAY) + hour),
        }
    }

    pub fn advance_hours(&self, hours: u32) -> ClockSnapshot {
        let previous = self.elapsed_hours.fetch_add(u64::from(hours), Ordering::SeqCst);
        let snapshot = read_clock(self);
        tracing::debug!(
            hours,
            from_day = day_of(previous),
            to_day = snapshot.day,
            time_block = %snapshot.time_block,
            "Game clock advanced"
        );
        snapshot
    }

    /// Hours until `block` next begins; zero while inside it.
    pub fn hours_until(&self, block: TimeBlock) -> u32 {
        if self.current_time_block() == block {
            return 0;
        }
        (block.start_hour() + HOURS_PER_DAY - self.current_hour()) % HOURS_PER_DAY
    }

    fn elapsed(&self) -> u64 {
        self.elapsed_hours.load(Ordering::SeqCst)
    }
}

impl Default for GameClock {
    fn default() -> Self {
        Self::new()
    }
}

fn day_of(elapsed: u64) -> u32 {
    u32::try_from(elapsed / u64::from(HOURS_PER_DAY) + 1).unwrap_or(u32::MAX)
}

impl DeadlineClock for GameClock {
    fn current_day(&self) -> u32 {
        day_of(self.elapsed())
    }

    fn current_hour(&self) -> u32 {
        (self.elapsed() % u64::from(HOURS_PER_DAY)) as u32
    }

    fn current_time_block(&self) -> TimeBlock {
        TimeBlock::from_hour(self.current_hour())
    }

    fn hours_remaining_in_block(&self) -> u32 {
        read_clock(self).hours_remaining_in_block()
    }

    fn hours_per_day(&self) -> u32 {
        HOURS_PER_DAY
    }
}

/// Fixed clock for testing.
#[cfg(test)]
pub struct FixedClock(pub ClockSnapshot);

#[cfg(test)]
impl DeadlineClock for FixedClock {
    fn current_day(&self) -> u32 {
        self.0.day
    }

    fn current_hour(&self) -> u32 {
        self.0.hour
    }

    fn current_time_block(&self) -> TimeBlock {
        self.0.time_block
    }

    fn hours_remaining_in_block(&self) -> u32 {
        self.0.hours_remaining_in_block()
    }

    fn hours_per_day(&self) -> u32 {
        self.0.hours_per_day
    }
}
