use bigdecimal::num_bigint::BigInt;

/// A fetched block with its full transaction list
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub number: u64,
    pub hash: String,
    pub transactions: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    /// Absent for contract creation
    pub to: Option<String>,
    /// Transferred native value in wei
    pub value: BigInt,
    /// Gas price in wei; absent on some typed transactions
    pub gas_price: Option<BigInt>,
    pub block_number: u64,
    pub block_hash: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Receipt {
    pub transaction_hash: String,
    pub gas_used: u64,
    pub effective_gas_price: Option<BigInt>,
    /// Address of the created contract, if any
    pub contract_address: Option<String>,
    pub logs: Vec<RawLog>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub transaction_hash: String,
    pub log_index: u32,
}

impl Receipt {
    /// Gas price actually charged: the transaction's own price when present,
    /// otherwise the receipt's effective price.
    pub fn charged_gas_price(&self, tx: &Transaction) -> BigInt {
        tx.gas_price
            .clone()
            .or_else(|| self.effective_gas_price.clone())
            .unwrap_or_default()
    }
}
