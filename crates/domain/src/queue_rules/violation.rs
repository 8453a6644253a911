use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Currency, TimeBlock};

/// Why a queue operation cannot be performed.
///
/// These are ordinary, recoverable outcomes carried as data in
/// `QueueOperationCost::validation_errors` and `QueueOperationResult`. Broken
/// internal invariants are not represented here; they trip debug assertions.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum QueueViolation {
    #[error("Position {position} is outside the queue (1-{capacity})")]
    OutOfRange { position: usize, capacity: usize },

    #[error("No letter at position {position}")]
    PositionNotOccupied { position: usize },

    #[error("Position {position} is already occupied")]
    PositionAlreadyOccupied { position: usize },

    #[error("Only available during {required} (currently {actual})")]
    WrongTimeBlock {
        required: TimeBlock,
        actual: TimeBlock,
    },

    #[error("Insufficient {currency} tokens: need {required}, have {available}")]
    InsufficientTokens {
        currency: Currency,
        required: u32,
        available: u32,
    },

    #[error("Invalid operation arguments: {reason}")]
    InvalidOperationArguments { reason: String },

    #[error("Morning swap already used on day {day}")]
    DailyLimitReached { day: u32 },

    #[error("Queue is full ({capacity} letters)")]
    QueueFull { capacity: usize },
}

impl QueueViolation {
    pub fn invalid_arguments(reason: impl Into<String>) -> Self {
        Self::InvalidOperationArguments {
            reason: reason.into(),
        }
    }

    /// Stable machine-readable name, used as a structured log field.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OutOfRange { .. } => "out_of_range",
            Self::PositionNotOccupied { .. } => "position_not_occupied",
            Self::PositionAlreadyOccupied { .. } => "position_already_occupied",
            Self::WrongTimeBlock { .. } => "wrong_time_block",
            Self::InsufficientTokens { .. } => "insufficient_tokens",
            Self::InvalidOperationArguments { .. } => "invalid_operation_arguments",
            Self::DailyLimitReached { .. } => "daily_limit_reached",
            Self::QueueFull { .. } => "queue_full",
        }
    }
}
