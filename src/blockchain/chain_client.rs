use async_trait::async_trait;
use bigdecimal::BigDecimal;

use crate::blockchain::abi::{decode_parameter, AbiType, AbiValue};
use crate::blockchain::token_contract::TokenContract;
use crate::error::{AbiError, RpcError};
use crate::models::{Block, Receipt};

/// Block selector for state queries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockTag {
    Latest,
    Number(u64),
}

impl BlockTag {
    /// JSON-RPC representation (`"latest"` or a hex quantity)
    pub fn to_rpc_param(self) -> String {
        match self {
            BlockTag::Latest => "latest".to_string(),
            BlockTag::Number(number) => format!("0x{:x}", number),
        }
    }
}

/// Read-only view of the chain the scanner and analyzer depend on.
///
/// Every call is a suspension point; implementations must not retry on their own.
#[async_trait]
pub trait ChainClient: Send + Sync {
    /// Current chain height
    async fn current_height(&self) -> Result<u64, RpcError>;

    /// Block by number; `None` when the node does not have it (e.g. not produced yet)
    async fn block_at(&self, number: u64, include_transactions: bool) -> Result<Option<Block>, RpcError>;

    /// Receipt by transaction hash; `None` when not yet available
    async fn receipt_of(&self, transaction_hash: &str) -> Result<Option<Receipt>, RpcError>;

    /// Native balance in whole currency units (not wei)
    async fn native_balance_of(&self, address: &str, block: BlockTag) -> Result<BigDecimal, RpcError>;

    /// Read-only contract call; returns the raw hex result
    async fn call(&self, contract: &str, calldata: &str, block: BlockTag) -> Result<String, RpcError>;

    /// Decode a single ABI-encoded parameter from a call result or log field.
    /// Pure; performs no network call.
    fn decode_abi_parameter(&self, kind: AbiType, data: &str) -> Result<AbiValue, AbiError> {
        decode_parameter(kind, data)
    }

    /// Standard token view of the contract at `address`
    fn token_contract<'a>(&'a self, address: &str) -> TokenContract<'a, Self>
    where
        Self: Sized,
    {
        TokenContract::new(self, address)
    }
}
