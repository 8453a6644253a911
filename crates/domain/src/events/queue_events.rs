//! Letter queue mutation events
//!
//! Returned by [`LetterQueue::apply`](crate::LetterQueue::apply), the expiry
//! sweep, and displacing intake so the caller learns what actually moved
//! without re-diffing snapshots.

use serde::{Deserialize, Serialize};

use crate::{Letter, LetterId};

/// Why a letter left the queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RemovalReason {
    Delivered,
    SkipDelivered,
    Purged,
    Expired,
    /// Pushed past the last slot by a letter inserted ahead of it.
    Displaced,
}

impl std::fmt::Display for RemovalReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Delivered => write!(f, "delivered"),
            Self::SkipDelivered => write!(f, "skip-delivered"),
            Self::Purged => write!(f, "purged"),
            Self::Expired => write!(f, "expired"),
            Self::Displaced => write!(f, "displaced"),
        }
    }
}

/// Outcome of applying a validated operation to the queue
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueueChange {
    /// Two slots exchanged contents (either may have been empty)
    Swapped { first: usize, second: usize },
    /// Letter pulled to position 1; letters ahead of it shifted back
    MovedToFront { letter_id: LetterId, from: usize },
    /// Letter's countdown increased
    DeadlineExtended {
        letter_id: LetterId,
        position: usize,
        new_deadline: i32,
    },
    /// Letter left the queue; later slots shifted up
    Removed {
        letter: Letter,
        position: usize,
        reason: RemovalReason,
    },
    /// Letter relocated; letters in between shifted toward its old slot
    Relocated {
        letter_id: LetterId,
        from: usize,
        to: usize,
    },
}

impl QueueChange {
    /// The single letter this change was about, if there was one.
    pub fn affected_letter(&self) -> Option<LetterId> {
        match self {
            Self::Swapped { .. } => None,
            Self::MovedToFront { letter_id, .. }
            | Self::DeadlineExtended { letter_id, .. }
            | Self::Relocated { letter_id, .. } => Some(*letter_id),
            Self::Removed { letter, .. } => Some(letter.id()),
        }
    }

    pub fn removed_letter(&self) -> Option<&Letter> {
        match self {
            Self::Removed { letter, .. } => Some(letter),
            _ => None,
        }
    }

    /// Splits a removal into `(position, letter, reason)`.
    pub fn into_removal(self) -> Option<(usize, Letter, RemovalReason)> {
        match self {
            Self::Removed {
                letter,
                position,
                reason,
            } => Some((position, letter, reason)),
            _ => None,
        }
    }

    /// True when the letter left without being delivered.
    pub fn is_forfeit(&self) -> bool {
        matches!(
            self,
            Self::Removed {
                reason: RemovalReason::Expired | RemovalReason::Displaced,
                ..
            }
        )
    }
}
