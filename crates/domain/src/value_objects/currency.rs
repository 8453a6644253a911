//! Relationship currencies that queue operations are paid in.

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// A named pool of relationship tokens.
///
/// Every letter belongs to one currency; paid operations on that letter draw
/// from the matching pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Currency {
    Trust,
    Commerce,
    Status,
    Shadow,
}

impl Currency {
    pub fn display_name(&self) -> &'static str {
        match self {
            Currency::Trust => "Trust",
            Currency::Commerce => "Commerce",
            Currency::Status => "Status",
            Currency::Shadow => "Shadow",
        }
    }

    /// Returns all currencies in display order.
    pub fn all() -> [Currency; 4] {
        [
            Currency::Trust,
            Currency::Commerce,
            Currency::Status,
            Currency::Shadow,
        ]
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl std::str::FromStr for Currency {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "trust" => Ok(Self::Trust),
            "commerce" => Ok(Self::Commerce),
            "status" => Ok(Self::Status),
            "shadow" => Ok(Self::Shadow),
            other => Err(DomainError::parse(format!("Unknown currency: {}", other))),
        }
    }
}
