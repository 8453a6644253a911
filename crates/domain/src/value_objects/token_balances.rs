//! Snapshot of a player's token balances.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::Currency;

/// Read-only per-currency balances handed to the validator.
///
/// Missing currencies read as zero. This is a snapshot; the ledger it was taken
/// from remains the authority when debits are applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenBalances(BTreeMap<Currency, u32>);

impl TokenBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style setter.
    pub fn with(mut self, currency: Currency, amount: u32) -> Self {
        self.0.insert(currency, amount);
        self
    }

    pub fn get(&self, currency: Currency) -> u32 {
        self.0.get(&currency).copied().unwrap_or(0)
    }

    /// True if every charged currency has at least the required amount.
    pub fn covers(&self, costs: &BTreeMap<Currency, u32>) -> bool {
        costs
            .iter()
            .all(|(currency, required)| self.get(*currency) >= *required)
    }

    /// Currencies that fall short of `costs`, as `(currency, required, available)`.
    pub fn shortfalls(&self, costs: &BTreeMap<Currency, u32>) -> Vec<(Currency, u32, u32)> {
        costs
            .iter()
            .filter_map(|(currency, required)| {
                let available = self.get(*currency);
                (available < *required).then_some((*currency, *required, available))
            })
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Currency, u32)> + '_ {
        self.0.iter().map(|(c, a)| (*c, *a))
    }
}

impl From<BTreeMap<Currency, u32>> for TokenBalances {
    fn from(value: BTreeMap<Currency, u32>) -> Self {
        Self(value)
    }
}

impl FromIterator<(Currency, u32)> for TokenBalances {
    fn from_iter<T: IntoIterator<Item = (Currency, u32)>>(iter: T) -> Self {
        Self(iter.into_iter().collect())
    }
}
