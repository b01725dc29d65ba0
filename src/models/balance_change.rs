use bigdecimal::{BigDecimal, Zero};
use serde::{Deserialize, Serialize};

use crate::models::amount::saturating_sub;
use crate::models::Transaction;

/// Symbol of the native currency on the watched chain
pub const NATIVE_CURRENCY: &str = "ETH";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ChainTag {
    Solana,
    Near,
    Ethereum,
}

/// Which side of a transfer an event describes.
///
/// The role only decides how the pre-transaction balances are reconstructed
/// from the post-transaction ones; it is not stored on the event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalanceRole {
    Sender,
    Receiver,
}

impl BalanceRole {
    /// Native balance before the transaction, given the balance after it.
    /// A sender gets back what it paid; a receiver loses what it received, floored at zero.
    pub fn previous_native_balance(
        self,
        current: &BigDecimal,
        transaction_cost: &BigDecimal,
        transferred_value: &BigDecimal,
    ) -> BigDecimal {
        match self {
            BalanceRole::Sender => current + transaction_cost + transferred_value,
            BalanceRole::Receiver => saturating_sub(current, transferred_value),
        }
    }

    /// Token balance before the transfer, given the balance after it
    pub fn previous_token_amount(self, post_amount: &BigDecimal, transferred: &BigDecimal) -> BigDecimal {
        match self {
            BalanceRole::Sender => post_amount + transferred,
            BalanceRole::Receiver => saturating_sub(post_amount, transferred),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TokenChange {
    pub symbol: String,
    /// Separate mint address; always empty on account-based chains
    pub mint: String,
    pub pre_amount: BigDecimal,
    pub post_amount: BigDecimal,
}

impl TokenChange {
    pub fn new(role: BalanceRole, symbol: &str, post_amount: BigDecimal, transferred: &BigDecimal) -> Self {
        Self {
            symbol: symbol.to_string(),
            mint: String::new(),
            pre_amount: role.previous_token_amount(&post_amount, transferred),
            post_amount,
        }
    }
}

/// Balance change of one account caused by one transaction
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BalanceChangeEvent {
    pub currency_string: String,
    pub account_address: String,
    pub account_address_blockchain: ChainTag,
    pub current_native_balance: BigDecimal,
    pub previous_native_balance: BigDecimal,
    /// Gas paid by this account; zero when someone else paid
    pub transaction_cost: BigDecimal,
    pub block_hash: String,
    pub sequence_number: u64,
    pub change_signature: String,
    pub token_changes: Vec<TokenChange>,
}

impl BalanceChangeEvent {
    pub fn new(
        role: BalanceRole,
        account_address: &str,
        transaction: &Transaction,
        current_native_balance: BigDecimal,
        transaction_cost: BigDecimal,
        transferred_value: &BigDecimal,
    ) -> Self {
        let current_native_balance = saturating_sub(&current_native_balance, &BigDecimal::zero());
        let previous_native_balance =
            role.previous_native_balance(&current_native_balance, &transaction_cost, transferred_value);

        Self {
            currency_string: NATIVE_CURRENCY.to_string(),
            account_address: account_address.to_string(),
            account_address_blockchain: ChainTag::Ethereum,
            current_native_balance,
            previous_native_balance,
            transaction_cost,
            block_hash: transaction.block_hash.clone(),
            sequence_number: transaction.block_number,
            change_signature: transaction.hash.clone(),
            token_changes: Vec::new(),
        }
    }
}
