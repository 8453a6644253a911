//! Value objects - Immutable objects defined by their attributes

mod currency;
mod time_block;
mod token_balances;

pub use currency::Currency;
pub use time_block::{ClockSnapshot, TimeBlock, HOURS_PER_DAY};
pub use token_balances::TokenBalances;
