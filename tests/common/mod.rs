#![allow(dead_code)]

use async_trait::async_trait;
use bigdecimal::{num_bigint::BigInt, BigDecimal};
use std::collections::{HashMap, HashSet};
use std::str::FromStr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use balance_watch::blockchain::abi::{encode_address, encode_string, encode_uint};
use balance_watch::blockchain::token_contract::{
    BALANCE_OF_SELECTOR, DECIMALS_SELECTOR, SYMBOL_SELECTOR, TOTAL_SUPPLY_SELECTOR,
};
use balance_watch::blockchain::transfer_detector::TRANSFER_EVENT_SIGNATURE;
use balance_watch::blockchain::{BlockHandler, BlockTag, ChainClient};
use balance_watch::error::{RpcError, SinkError};
use balance_watch::models::{Block, RawLog, Receipt, Transaction};

pub const ALICE: &str = "0x1111111111111111111111111111111111111111";
pub const BOB: &str = "0x2222222222222222222222222222222222222222";
pub const CAROL: &str = "0x3333333333333333333333333333333333333333";
pub const ROUTER: &str = "0x4444444444444444444444444444444444444444";
pub const USDC: &str = "0xa0b86991c6218b36c1d19d4a2e9eb0ce3606eb48";
pub const DAI: &str = "0x6b175474e89094c44da98b954eedeac495271d0f";
pub const NOT_A_TOKEN: &str = "0x5555555555555555555555555555555555555555";

pub fn dec(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).unwrap()
}

/// `value * 10^18`, written as a decimal string
pub fn wei(ether: &str) -> BigInt {
    let scaled = dec(ether) * BigDecimal::from_str("1000000000000000000").unwrap();
    let (digits, scale) = scaled.with_scale(0).into_bigint_and_exponent();
    assert_eq!(scale, 0);
    digits
}

pub struct MockToken {
    pub symbol: String,
    pub decimals: u8,
    pub total_supply: Option<BigInt>,
    pub balances: HashMap<String, BigInt>,
}

impl MockToken {
    pub fn new(symbol: &str, decimals: u8) -> Self {
        Self {
            symbol: symbol.to_string(),
            decimals,
            total_supply: Some(BigInt::from(1_000_000_000_000_000u64)),
            balances: HashMap::new(),
        }
    }

    pub fn with_balance(mut self, owner: &str, raw: u64) -> Self {
        self.balances.insert(owner.to_string(), BigInt::from(raw));
        self
    }
}

#[derive(Default)]
struct MockState {
    height: u64,
    blocks: HashMap<u64, Block>,
    receipts: HashMap<String, Receipt>,
    native: HashMap<String, BigDecimal>,
    tokens: HashMap<String, MockToken>,
    failing_height: bool,
    failing_blocks: HashSet<u64>,
    height_gate: Option<Arc<Notify>>,
    fetched_blocks: Vec<u64>,
}

/// In-memory chain that records every call made against it
#[derive(Default)]
pub struct MockChain {
    state: Mutex<MockState>,
    calls: AtomicUsize,
}

impl MockChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Numbers of the blocks actually returned by `block_at`
    pub fn fetched_blocks(&self) -> Vec<u64> {
        self.state.lock().unwrap().fetched_blocks.clone()
    }

    pub fn set_height(&self, height: u64) {
        self.state.lock().unwrap().height = height;
    }

    /// Make `block` available, with an empty transaction list
    pub fn add_empty_block(&self, number: u64) {
        self.add_block(Block {
            number,
            hash: format!("0xblock{}", number),
            transactions: Vec::new(),
        });
    }

    pub fn add_block(&self, block: Block) {
        self.state.lock().unwrap().blocks.insert(block.number, block);
    }

    pub fn add_receipt(&self, receipt: Receipt) {
        self.state
            .lock()
            .unwrap()
            .receipts
            .insert(receipt.transaction_hash.clone(), receipt);
    }

    pub fn set_native_balance(&self, address: &str, balance: &str) {
        self.state
            .lock()
            .unwrap()
            .native
            .insert(address.to_string(), dec(balance));
    }

    pub fn add_token(&self, address: &str, token: MockToken) {
        self.state.lock().unwrap().tokens.insert(address.to_string(), token);
    }

    pub fn fail_height(&self, failing: bool) {
        self.state.lock().unwrap().failing_height = failing;
    }

    pub fn fail_block(&self, number: u64) {
        self.state.lock().unwrap().failing_blocks.insert(number);
    }

    pub fn heal_block(&self, number: u64) {
        self.state.lock().unwrap().failing_blocks.remove(&number);
    }

    /// Hold every height query until the gate is notified
    pub fn gate_height(&self, gate: Arc<Notify>) {
        self.state.lock().unwrap().height_gate = Some(gate);
    }

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn token_call(&self, contract: &str, calldata: &str) -> String {
        let state = self.state.lock().unwrap();
        let Some(token) = state.tokens.get(contract) else {
            return "0x".to_string();
        };

        let selector = &calldata[..10.min(calldata.len())];
        let word = match selector {
            TOTAL_SUPPLY_SELECTOR => match &token.total_supply {
                Some(supply) => encode_uint(supply),
                None => return "0x".to_string(),
            },
            SYMBOL_SELECTOR => encode_string(&token.symbol),
            DECIMALS_SELECTOR => encode_uint(&BigInt::from(token.decimals)),
            BALANCE_OF_SELECTOR => {
                let owner = format!("0x{}", &calldata[calldata.len() - 40..]);
                encode_uint(&token.balances.get(&owner).cloned().unwrap_or_default())
            }
            _ => return "0x".to_string(),
        };
        format!("0x{}", word)
    }
}

#[async_trait]
impl ChainClient for MockChain {
    async fn current_height(&self) -> Result<u64, RpcError> {
        self.record_call();
        let gate = self.state.lock().unwrap().height_gate.clone();
        if let Some(gate) = gate {
            gate.notified().await;
        }

        let state = self.state.lock().unwrap();
        if state.failing_height {
            return Err(RpcError::Connection("node unreachable".to_string()));
        }
        Ok(state.height)
    }

    async fn block_at(&self, number: u64, _include_transactions: bool) -> Result<Option<Block>, RpcError> {
        self.record_call();
        let mut state = self.state.lock().unwrap();
        if state.failing_blocks.contains(&number) {
            return Err(RpcError::Timeout { seconds: 30 });
        }
        let block = state.blocks.get(&number).cloned();
        if block.is_some() {
            state.fetched_blocks.push(number);
        }
        Ok(block)
    }

    async fn receipt_of(&self, transaction_hash: &str) -> Result<Option<Receipt>, RpcError> {
        self.record_call();
        Ok(self.state.lock().unwrap().receipts.get(transaction_hash).cloned())
    }

    async fn native_balance_of(&self, address: &str, _block: BlockTag) -> Result<BigDecimal, RpcError> {
        self.record_call();
        Ok(self
            .state
            .lock()
            .unwrap()
            .native
            .get(address)
            .cloned()
            .unwrap_or_default())
    }

    async fn call(&self, contract: &str, calldata: &str, _block: BlockTag) -> Result<String, RpcError> {
        self.record_call();
        Ok(self.token_call(contract, calldata))
    }
}

/// Block handler that records the block numbers of every batch
#[derive(Default)]
pub struct RecordingHandler {
    batches: Mutex<Vec<Vec<u64>>>,
    reject: bool,
}

impl RecordingHandler {
    pub fn rejecting() -> Self {
        Self {
            batches: Mutex::new(Vec::new()),
            reject: true,
        }
    }

    pub fn batches(&self) -> Vec<Vec<u64>> {
        self.batches.lock().unwrap().clone()
    }
}

#[async_trait]
impl BlockHandler for RecordingHandler {
    async fn on_blocks(&self, blocks: Vec<Block>) -> Result<(), SinkError> {
        self.batches
            .lock()
            .unwrap()
            .push(blocks.iter().map(|block| block.number).collect());
        if self.reject {
            return Err(SinkError::Rejected("downstream unavailable".to_string()));
        }
        Ok(())
    }
}

pub fn transaction(hash: &str, from: &str, to: Option<&str>, value: BigInt) -> Transaction {
    Transaction {
        hash: hash.to_string(),
        from: from.to_string(),
        to: to.map(str::to_string),
        value,
        gas_price: Some(BigInt::from(20_000_000_000u64)),
        block_number: 100,
        block_hash: "0xblock100".to_string(),
    }
}

/// Receipt charging 50_000 gas, i.e. 0.001 ETH at 20 gwei
pub fn receipt(hash: &str, logs: Vec<RawLog>) -> Receipt {
    Receipt {
        transaction_hash: hash.to_string(),
        gas_used: 50_000,
        effective_gas_price: None,
        contract_address: None,
        logs,
    }
}

pub fn transfer_log(token: &str, from: &str, to: &str, raw_amount: u64, log_index: u32) -> RawLog {
    RawLog {
        address: token.to_string(),
        topics: vec![
            TRANSFER_EVENT_SIGNATURE.to_string(),
            format!("0x{}", encode_address(from).unwrap()),
            format!("0x{}", encode_address(to).unwrap()),
        ],
        data: format!("0x{}", encode_uint(&BigInt::from(raw_amount))),
        transaction_hash: String::new(),
        log_index,
    }
}
