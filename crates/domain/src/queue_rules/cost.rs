use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::QueueViolation;
use crate::{Currency, Letter, TokenBalances};

/// Preview of what an operation would cost and whether it is currently allowed.
///
/// Computed on demand, never stored. `validation_errors` is empty iff the
/// operation is performable right now, independent of affordability.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueOperationCost {
    /// Required amount per currency; only charged currencies appear.
    pub token_costs: BTreeMap<Currency, u32>,
    pub requires_morning_time: bool,
    pub requires_position_1: bool,
    pub validation_errors: Vec<QueueViolation>,
}

impl QueueOperationCost {
    pub fn is_valid(&self) -> bool {
        self.validation_errors.is_empty()
    }

    pub fn is_free(&self) -> bool {
        self.token_costs.is_empty()
    }

    pub fn total_tokens(&self) -> u32 {
        self.token_costs.values().sum()
    }

    pub fn is_affordable_with(&self, balances: &TokenBalances) -> bool {
        balances.covers(&self.token_costs)
    }

    /// Validation errors followed by any affordability shortfalls.
    pub fn unmet_preconditions(&self, balances: &TokenBalances) -> Vec<QueueViolation> {
        let mut unmet = self.validation_errors.clone();
        unmet.extend(balances.shortfalls(&self.token_costs).into_iter().map(
            |(currency, required, available)| QueueViolation::InsufficientTokens {
                currency,
                required,
                available,
            },
        ));
        unmet
    }

    pub(crate) fn charge(&mut self, currency: Currency, amount: u32) {
        if amount > 0 {
            *self.token_costs.entry(currency).or_insert(0) += amount;
        }
    }

    pub(crate) fn reject(&mut self, violation: QueueViolation) {
        self.validation_errors.push(violation);
    }
}

/// Outcome of an executed operation.
///
/// On failure the snapshot equals the pre-call queue and `tokens_spent` is
/// empty. `failure_reason` is the primary blocker; `unmet_preconditions` lists
/// all of them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueOperationResult {
    pub success: bool,
    pub failure_reason: Option<QueueViolation>,
    pub unmet_preconditions: Vec<QueueViolation>,
    pub tokens_spent: BTreeMap<Currency, u32>,
    pub updated_queue: Vec<Option<Letter>>,
}

impl QueueOperationResult {
    pub fn succeeded(
        tokens_spent: BTreeMap<Currency, u32>,
        updated_queue: Vec<Option<Letter>>,
    ) -> Self {
        Self {
            success: true,
            failure_reason: None,
            unmet_preconditions: Vec::new(),
            tokens_spent,
            updated_queue,
        }
    }

    /// Builds a failure from the full list of unmet preconditions. The first
    /// entry becomes the primary reason.
    pub fn failed(
        unmet_preconditions: Vec<QueueViolation>,
        unchanged_queue: Vec<Option<Letter>>,
    ) -> Self {
        debug_assert!(
            !unmet_preconditions.is_empty(),
            "a failed queue operation must carry at least one reason"
        );
        Self {
            success: false,
            failure_reason: unmet_preconditions.first().cloned(),
            unmet_preconditions,
            tokens_spent: BTreeMap::new(),
            updated_queue: unchanged_queue,
        }
    }
}
