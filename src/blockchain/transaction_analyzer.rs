use bigdecimal::{num_bigint::BigInt, BigDecimal, Zero};
use serde_json::json;
use std::sync::Arc;

use crate::blockchain::chain_client::{BlockTag, ChainClient};
use crate::blockchain::transfer_detector::{decode_transfer_log, normalize_address, transfer_logs, TransferLog};
use crate::error::{AnalysisError, WatchError};
use crate::logging::{ErrorLogger, LogContext, MetricsLogger};
use crate::models::{
    scale_amount, wei_to_native, BalanceChangeEvent, BalanceRole, RawLog, Receipt, TokenChange, Transaction,
};

/// Everything one Transfer log needs before it may touch the event list
struct ResolvedTransfer {
    transfer: TransferLog,
    symbol: String,
    amount: BigDecimal,
    from_post: BigDecimal,
    to_post: BigDecimal,
    /// Native balance of `from`, only fetched when it has no event yet
    from_native: Option<BigDecimal>,
    /// Native balance of `to`, only fetched when it has no event yet
    to_native: Option<BigDecimal>,
}

/// Turns a transaction into the balance change events it caused
pub struct TransactionAnalyzer<C: ChainClient> {
    client: Arc<C>,
}

impl<C: ChainClient> TransactionAnalyzer<C> {
    pub fn new(client: Arc<C>) -> Self {
        Self { client }
    }

    /// Analyze one transaction.
    ///
    /// Never fails: a missing receipt yields no events, and a failure midway
    /// yields the events completed before it.
    pub async fn analyze(&self, tx: &Transaction) -> Vec<BalanceChangeEvent> {
        let context = LogContext::new("transaction_analyzer", "analyze")
            .with_transaction_hash(&tx.hash)
            .with_block_number(tx.block_number);

        let receipt = match self.client.receipt_of(&tx.hash).await {
            Ok(Some(receipt)) => receipt,
            Ok(None) => {
                ErrorLogger::log_error(
                    &WatchError::Analysis(AnalysisError::MissingReceipt(tx.hash.clone())),
                    Some(context),
                );
                return Vec::new();
            }
            Err(e) => {
                ErrorLogger::log_error(&WatchError::Analysis(AnalysisError::Rpc(e)), Some(context));
                return Vec::new();
            }
        };

        let gas_used = BigInt::from(receipt.gas_used);
        let cost = wei_to_native(&(receipt.charged_gas_price(tx) * gas_used));
        let value = wei_to_native(&tx.value);

        let mut events = Vec::new();
        let result = if value > BigDecimal::zero() {
            self.native_transfer(tx, &receipt, cost, &value, &mut events).await
        } else {
            self.token_transfers(tx, &receipt, cost, &mut events).await
        };

        if let Err(e) = result {
            let context = context.with_metadata("completed_events", json!(events.len()));
            ErrorLogger::log_error(&WatchError::Analysis(e), Some(context));
        }

        MetricsLogger::log_transaction_analyzed(&tx.hash, tx.block_number, events.len());
        events
    }

    /// Value-carrying transaction: sender pays cost and value, receiver gets value
    async fn native_transfer(
        &self,
        tx: &Transaction,
        receipt: &Receipt,
        cost: BigDecimal,
        value: &BigDecimal,
        events: &mut Vec<BalanceChangeEvent>,
    ) -> Result<(), AnalysisError> {
        let block = BlockTag::Number(tx.block_number);

        let sender = normalize_address(&tx.from);
        let sender_balance = self.client.native_balance_of(&sender, block).await?;
        events.push(BalanceChangeEvent::new(
            BalanceRole::Sender,
            &sender,
            tx,
            sender_balance,
            cost,
            value,
        ));

        // Contract creation credits the new contract
        let receiver = tx.to.as_deref().or(receipt.contract_address.as_deref());
        if let Some(receiver) = receiver.map(normalize_address) {
            let receiver_balance = self.client.native_balance_of(&receiver, block).await?;
            events.push(BalanceChangeEvent::new(
                BalanceRole::Receiver,
                &receiver,
                tx,
                receiver_balance,
                BigDecimal::zero(),
                value,
            ));
        }

        Ok(())
    }

    /// Zero-value transaction: sender pays cost, standard Transfer logs become token changes
    async fn token_transfers(
        &self,
        tx: &Transaction,
        receipt: &Receipt,
        cost: BigDecimal,
        events: &mut Vec<BalanceChangeEvent>,
    ) -> Result<(), AnalysisError> {
        let block = BlockTag::Number(tx.block_number);

        let sender = normalize_address(&tx.from);
        let sender_balance = self.client.native_balance_of(&sender, block).await?;
        events.push(BalanceChangeEvent::new(
            BalanceRole::Sender,
            &sender,
            tx,
            sender_balance,
            cost,
            &BigDecimal::zero(),
        ));

        for log in transfer_logs(receipt) {
            let resolved = self.resolve_transfer(log, block, events).await?;
            apply_transfer(tx, resolved, events);
        }

        Ok(())
    }

    /// Perform every lookup a Transfer log needs without touching `events`
    async fn resolve_transfer(
        &self,
        log: &RawLog,
        block: BlockTag,
        events: &[BalanceChangeEvent],
    ) -> Result<ResolvedTransfer, AnalysisError> {
        let transfer = decode_transfer_log(log)?;
        let token = self.client.token_contract(&transfer.token_address);

        if token.total_supply(block).await?.is_none() {
            return Err(AnalysisError::UnrecognizedTokenContract(transfer.token_address));
        }

        let symbol = token.symbol(block).await?;
        let decimals = token.decimals(block).await?;
        let amount = scale_amount(&transfer.raw_amount, decimals);

        let from_post = scale_amount(&token.balance_of(&transfer.from, block).await?, decimals);
        let to_post = scale_amount(&token.balance_of(&transfer.to, block).await?, decimals);

        let from_native = if has_event(events, &transfer.from) {
            None
        } else {
            Some(self.client.native_balance_of(&transfer.from, block).await?)
        };
        let to_native = if has_event(events, &transfer.to) || transfer.to == transfer.from {
            None
        } else {
            Some(self.client.native_balance_of(&transfer.to, block).await?)
        };

        LogContext::new("transaction_analyzer", "resolve_transfer")
            .with_transaction_hash(&log.transaction_hash)
            .with_address(&transfer.token_address)
            .with_metadata("log_index", json!(transfer.log_index))
            .with_metadata("symbol", json!(symbol))
            .with_metadata("amount", json!(amount.to_string()))
            .debug("Decoded token transfer");

        Ok(ResolvedTransfer {
            transfer,
            symbol,
            amount,
            from_post,
            to_post,
            from_native,
            to_native,
        })
    }
}

fn has_event(events: &[BalanceChangeEvent], account: &str) -> bool {
    events.iter().any(|event| event.account_address == account)
}

/// Index of the event for `account`, creating one from `native` when absent
fn event_for(
    events: &mut Vec<BalanceChangeEvent>,
    role: BalanceRole,
    account: &str,
    tx: &Transaction,
    native: Option<BigDecimal>,
) -> usize {
    if let Some(index) = events.iter().position(|event| event.account_address == account) {
        return index;
    }

    let zero = BigDecimal::zero();
    events.push(BalanceChangeEvent::new(
        role,
        account,
        tx,
        native.unwrap_or_default(),
        zero.clone(),
        &zero,
    ));
    events.len() - 1
}

fn apply_transfer(tx: &Transaction, resolved: ResolvedTransfer, events: &mut Vec<BalanceChangeEvent>) {
    let ResolvedTransfer {
        transfer,
        symbol,
        amount,
        from_post,
        to_post,
        from_native,
        to_native,
    } = resolved;

    let from_index = event_for(events, BalanceRole::Sender, &transfer.from, tx, from_native);
    events[from_index]
        .token_changes
        .push(TokenChange::new(BalanceRole::Sender, &symbol, from_post, &amount));

    let to_index = event_for(events, BalanceRole::Receiver, &transfer.to, tx, to_native);
    events[to_index]
        .token_changes
        .push(TokenChange::new(BalanceRole::Receiver, &symbol, to_post, &amount));
}
