use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Cost and gating constants for queue operations.
///
/// Defaults follow the game's balancing. An extension trades two matching
/// tokens for two extra days and a purge burns three tokens of any kind. The
/// dawn swap is free but limited to once per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueueRules {
    /// Tokens per position travelled by a priority move (default: 1)
    pub priority_move_cost_per_position: u32,
    /// Tokens per position skipped by a skip-deliver (default: 2)
    pub skip_deliver_cost_per_position: u32,
    /// Flat surcharge on every skip-deliver (default: 1)
    pub skip_deliver_premium: u32,
    /// Flat cost of a deadline extension (default: 2)
    pub extend_deadline_cost: u32,
    /// Days added by a deadline extension (default: 2)
    pub extend_deadline_bonus_days: u32,
    /// Flat cost of a reorder, in the moved letter's currency (default: 0)
    pub reorder_cost: u32,
    /// Exact token total a purge must be paid with (default: 3)
    pub purge_cost: u32,
    /// Whether the morning swap may only be used once per day (default: true)
    pub morning_swap_once_per_day: bool,
    /// Tokens lost in a letter's currency when it expires in the queue (default: 2)
    pub expiry_penalty: u32,
}

impl Default for QueueRules {
    fn default() -> Self {
        Self {
            priority_move_cost_per_position: 1,
            skip_deliver_cost_per_position: 2,
            skip_deliver_premium: 1,
            extend_deadline_cost: 2,
            extend_deadline_bonus_days: 2,
            reorder_cost: 0,
            purge_cost: 3,
            morning_swap_once_per_day: true,
            expiry_penalty: 2,
        }
    }
}

impl QueueRules {
    /// Cost of pulling a letter from `from` to position 1.
    pub fn priority_move_cost(&self, from: usize) -> u32 {
        self.priority_move_cost_per_position
            .saturating_mul(distance_to_front(from))
    }

    /// Cost of delivering straight from `position`.
    pub fn skip_deliver_cost(&self, position: usize) -> u32 {
        self.skip_deliver_cost_per_position
            .saturating_mul(distance_to_front(position))
            .saturating_add(self.skip_deliver_premium)
    }

    /// Rejects rule sets that would break cost ordering.
    ///
    /// - priority moves must get strictly dearer with distance
    /// - skip-deliver must cost more than a priority move followed by a
    ///   (free) delivery, at every distance
    /// - extensions must actually extend
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.priority_move_cost_per_position == 0 {
            return Err(DomainError::constraint(
                "priorityMoveCostPerPosition must be at least 1",
            ));
        }
        if self.skip_deliver_cost_per_position < self.priority_move_cost_per_position {
            return Err(DomainError::constraint(
                "skipDeliverCostPerPosition must not be below priorityMoveCostPerPosition",
            ));
        }
        if self.skip_deliver_cost_per_position == self.priority_move_cost_per_position
            && self.skip_deliver_premium == 0
        {
            return Err(DomainError::constraint(
                "skipDeliverPremium must be positive when skip and priority rates match",
            ));
        }
        if self.extend_deadline_bonus_days == 0 {
            return Err(DomainError::constraint(
                "extendDeadlineBonusDays must be at least 1",
            ));
        }
        if self.purge_cost == 0 {
            return Err(DomainError::constraint("purgeCost must be at least 1"));
        }
        Ok(())
    }
}

fn distance_to_front(position: usize) -> u32 {
    u32::try_from(position.saturating_sub(1)).unwrap_or(u32::MAX)
}
