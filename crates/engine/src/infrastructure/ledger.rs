//! In-memory token ledger.

use std::collections::BTreeMap;

use courier_domain::{Currency, TokenBalances};

use crate::infrastructure::ports::TokenLedger;

/// Per-currency balances that refuse to go negative.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTokenLedger {
    balances: BTreeMap<Currency, u32>,
}

impl InMemoryTokenLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger holding `amount` of every currency.
    pub fn with_uniform_balance(amount: u32) -> Self {
        Self {
            balances: Currency::all().into_iter().map(|c| (c, amount)).collect(),
        }
    }

    pub fn with_balance(mut self, currency: Currency, amount: u32) -> Self {
        self.balances.insert(currency, amount);
        self
    }
}

impl TokenLedger for InMemoryTokenLedger {
    fn balance(&self, currency: Currency) -> u32 {
        self.balances.get(&currency).copied().unwrap_or(0)
    }

    fn balances(&self) -> TokenBalances {
        self.balances.iter().map(|(c, a)| (*c, *a)).collect()
    }

    fn debit(&mut self, currency: Currency, amount: u32) -> bool {
        let available = self.balance(currency);
        if available < amount {
            tracing::debug!(
                currency = %currency,
                required = amount,
                available,
                "Debit refused"
            );
            return false;
        }
        self.balances.insert(currency, available - amount);
        true
    }

    fn credit(&mut self, currency: Currency, amount: u32) {
        let entry = self.balances.entry(currency).or_insert(0);
        *entry = entry.saturating_add(amount);
    }
}
