use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Currency;

/// A requested queue mutation and its arguments.
///
/// Positions are 1-based. The set is closed: the validator and the executor
/// both match exhaustively, so a new variant cannot be forgotten in either.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum QueueOperation {
    /// Free exchange of two slots, only at dawn.
    MorningSwap { first: usize, second: usize },
    /// Pay to pull a letter to position 1, pushing the letters ahead of it back.
    PriorityMove { from: usize },
    /// Pay to add days to a letter's deadline.
    ExtendDeadline { position: usize },
    /// Hand over the letter at position 1.
    Deliver,
    /// Pay a premium to deliver straight from a later position.
    SkipDeliver { position: usize },
    /// Move a letter to another position, keeping everyone else's order.
    Reorder { from: usize, to: usize },
    /// Destroy the letter in the last position for a fixed number of tokens,
    /// paid in whatever mix of currencies the caller offers.
    Purge { payment: BTreeMap<Currency, u32> },
}

impl QueueOperation {
    pub fn kind(&self) -> QueueOperationKind {
        match self {
            Self::MorningSwap { .. } => QueueOperationKind::MorningSwap,
            Self::PriorityMove { .. } => QueueOperationKind::PriorityMove,
            Self::ExtendDeadline { .. } => QueueOperationKind::ExtendDeadline,
            Self::Deliver => QueueOperationKind::Deliver,
            Self::SkipDeliver { .. } => QueueOperationKind::SkipDeliver,
            Self::Reorder { .. } => QueueOperationKind::Reorder,
            Self::Purge { .. } => QueueOperationKind::Purge,
        }
    }

    /// Positions named by the operation, in argument order.
    pub fn positions(&self) -> Vec<usize> {
        match self {
            Self::MorningSwap { first, second } => vec![*first, *second],
            Self::PriorityMove { from } => vec![*from],
            Self::ExtendDeadline { position } | Self::SkipDeliver { position } => vec![*position],
            Self::Deliver => vec![1],
            Self::Reorder { from, to } => vec![*from, *to],
            Self::Purge { .. } => vec![],
        }
    }
}

/// Fieldless tag for [`QueueOperation`], used in events and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueOperationKind {
    MorningSwap,
    PriorityMove,
    ExtendDeadline,
    Deliver,
    SkipDeliver,
    Reorder,
    Purge,
}

impl QueueOperationKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::MorningSwap => "Morning Swap",
            Self::PriorityMove => "Priority Move",
            Self::ExtendDeadline => "Extend Deadline",
            Self::Deliver => "Deliver",
            Self::SkipDeliver => "Skip Deliver",
            Self::Reorder => "Reorder",
            Self::Purge => "Purge",
        }
    }
}

impl std::fmt::Display for QueueOperationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
