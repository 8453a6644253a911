use serde::{Deserialize, Serialize};

/// Hours in one game day.
pub const HOURS_PER_DAY: u32 = 24;

// =============================================================================
// Time Block
// =============================================================================

/// Named period of the game day. Some queue operations are only available in
/// a specific block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeBlock {
    Dawn,
    Morning,
    Afternoon,
    Evening,
    Night,
    LateNight,
}

impl TimeBlock {
    pub fn display_name(&self) -> &'static str {
        match self {
            TimeBlock::Dawn => "Dawn",
            TimeBlock::Morning => "Morning",
            TimeBlock::Afternoon => "Afternoon",
            TimeBlock::Evening => "Evening",
            TimeBlock::Night => "Night",
            TimeBlock::LateNight => "Late Night",
        }
    }

    /// Returns the block containing `hour` (taken modulo a day).
    pub fn from_hour(hour: u32) -> TimeBlock {
        match hour % HOURS_PER_DAY {
            6..=8 => TimeBlock::Dawn,
            9..=11 => TimeBlock::Morning,
            12..=15 => TimeBlock::Afternoon,
            16..=19 => TimeBlock::Evening,
            20..=23 => TimeBlock::Night,
            _ => TimeBlock::LateNight,
        }
    }

    /// Returns the starting hour for this block.
    pub fn start_hour(&self) -> u32 {
        match self {
            TimeBlock::Dawn => 6,
            TimeBlock::Morning => 9,
            TimeBlock::Afternoon => 12,
            TimeBlock::Evening => 16,
            TimeBlock::Night => 20,
            TimeBlock::LateNight => 0,
        }
    }

    /// Returns the first hour after this block ends.
    pub fn end_hour(&self) -> u32 {
        match self {
            TimeBlock::LateNight => TimeBlock::Dawn.start_hour(),
            TimeBlock::Night => HOURS_PER_DAY,
            other => other.next().start_hour(),
        }
    }

    /// Returns the next block in sequence.
    pub fn next(&self) -> TimeBlock {
        match self {
            TimeBlock::LateNight => TimeBlock::Dawn,
            TimeBlock::Dawn => TimeBlock::Morning,
            TimeBlock::Morning => TimeBlock::Afternoon,
            TimeBlock::Afternoon => TimeBlock::Evening,
            TimeBlock::Evening => TimeBlock::Night,
            TimeBlock::Night => TimeBlock::LateNight,
        }
    }

    /// Returns all blocks in the order they occur from midnight.
    pub fn all() -> [TimeBlock; 6] {
        [
            TimeBlock::LateNight,
            TimeBlock::Dawn,
            TimeBlock::Morning,
            TimeBlock::Afternoon,
            TimeBlock::Evening,
            TimeBlock::Night,
        ]
    }
}

impl std::fmt::Display for TimeBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// =============================================================================
// Clock Snapshot
// =============================================================================

/// Point-in-time reading of the game clock.
///
/// The validator and projector work from this copy so they never hold a
/// reference to the live clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClockSnapshot {
    pub day: u32,
    pub hour: u32,
    pub time_block: TimeBlock,
    pub hours_per_day: u32,
}

impl ClockSnapshot {
    /// Snapshot at `day` and `hour` on a standard 24-hour day.
    pub fn at(day: u32, hour: u32) -> Self {
        Self {
            day,
            hour: hour % HOURS_PER_DAY,
            time_block: TimeBlock::from_hour(hour),
            hours_per_day: HOURS_PER_DAY,
        }
    }

    /// Hours left before the current block ends.
    pub fn hours_remaining_in_block(&self) -> u32 {
        self.time_block.end_hour().saturating_sub(self.hour)
    }

    pub fn display_date(&self) -> String {
        format!("Day {}, {:02}:00 ({})", self.day, self.hour, self.time_block)
    }
}
