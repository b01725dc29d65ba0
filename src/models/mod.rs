pub mod amount;
pub mod balance_change;
pub mod chain;

pub use amount::{saturating_sub, scale_amount, wei_to_native, NATIVE_DECIMALS};
pub use balance_change::{BalanceChangeEvent, BalanceRole, ChainTag, TokenChange, NATIVE_CURRENCY};
pub use chain::{Block, RawLog, Receipt, Transaction};
