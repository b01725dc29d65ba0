use async_trait::async_trait;
use bigdecimal::{num_bigint::BigInt, BigDecimal};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::blockchain::chain_client::{BlockTag, ChainClient};
use crate::blockchain::transfer_detector::normalize_address;
use crate::error::RpcError;
use crate::logging::{LogContext, MetricsLogger, PerformanceMonitor};
use crate::models::{wei_to_native, Block, RawLog, Receipt, Transaction};

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    result: Option<Value>,
    error: Option<JsonRpcError>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i32,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcBlock {
    number: String,
    hash: String,
    #[serde(default)]
    transactions: RpcBlockTransactions,
}

/// Blocks carry full objects or bare hashes depending on the request flag
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RpcBlockTransactions {
    Full(Vec<RpcTransaction>),
    Hashes(Vec<String>),
}

impl Default for RpcBlockTransactions {
    fn default() -> Self {
        RpcBlockTransactions::Hashes(Vec::new())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcTransaction {
    hash: String,
    from: String,
    to: Option<String>,
    value: String,
    gas_price: Option<String>,
    block_number: Option<String>,
    block_hash: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcReceipt {
    transaction_hash: String,
    gas_used: String,
    effective_gas_price: Option<String>,
    contract_address: Option<String>,
    #[serde(default)]
    logs: Vec<RpcLog>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RpcLog {
    address: String,
    #[serde(default)]
    topics: Vec<String>,
    data: String,
    transaction_hash: Option<String>,
    log_index: Option<String>,
}

impl RpcBlock {
    fn into_block(self) -> Result<Block, RpcError> {
        let number = parse_hex_to_u64(&self.number)?;
        let transactions = match self.transactions {
            RpcBlockTransactions::Full(transactions) => transactions
                .into_iter()
                .map(|tx| tx.into_transaction(number, &self.hash))
                .collect::<Result<Vec<_>, _>>()?,
            RpcBlockTransactions::Hashes(_) => Vec::new(),
        };

        Ok(Block {
            number,
            hash: self.hash,
            transactions,
        })
    }
}

impl RpcTransaction {
    fn into_transaction(self, block_number: u64, block_hash: &str) -> Result<Transaction, RpcError> {
        let block_number = match self.block_number.as_deref() {
            Some(hex) => parse_hex_to_u64(hex)?,
            None => block_number,
        };

        Ok(Transaction {
            hash: self.hash,
            from: normalize_address(&self.from),
            to: self.to.as_deref().map(normalize_address),
            value: parse_hex_to_bigint(&self.value)?,
            gas_price: self.gas_price.as_deref().map(parse_hex_to_bigint).transpose()?,
            block_number,
            block_hash: self.block_hash.unwrap_or_else(|| block_hash.to_string()),
        })
    }
}

impl RpcReceipt {
    fn into_receipt(self) -> Result<Receipt, RpcError> {
        let logs = self
            .logs
            .into_iter()
            .map(|log| {
                Ok(RawLog {
                    address: normalize_address(&log.address),
                    topics: log.topics,
                    data: log.data,
                    transaction_hash: log
                        .transaction_hash
                        .unwrap_or_else(|| self.transaction_hash.clone()),
                    log_index: log.log_index.as_deref().map(parse_hex_to_u32).transpose()?.unwrap_or(0),
                })
            })
            .collect::<Result<Vec<_>, RpcError>>()?;

        Ok(Receipt {
            gas_used: parse_hex_to_u64(&self.gas_used)?,
            effective_gas_price: self.effective_gas_price.as_deref().map(parse_hex_to_bigint).transpose()?,
            contract_address: self.contract_address.as_deref().map(normalize_address),
            transaction_hash: self.transaction_hash,
            logs,
        })
    }
}

/// HTTP JSON-RPC chain client
pub struct RpcClient {
    client: Client,
    endpoint: String,
    timeout_seconds: Option<u64>,
    next_id: AtomicU64,
}

impl RpcClient {
    /// Client without a request timeout
    pub fn new(endpoint: String) -> Result<Self, RpcError> {
        Self::new_with_config(endpoint, None)
    }

    pub fn new_with_config(endpoint: String, timeout_seconds: Option<u64>) -> Result<Self, RpcError> {
        let context = LogContext::new("rpc_client", "initialization")
            .with_metadata("endpoint", json!(endpoint))
            .with_metadata("timeout_seconds", json!(timeout_seconds));
        context.info("Initializing RPC client");

        let mut builder = Client::builder()
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(30));
        if let Some(seconds) = timeout_seconds {
            builder = builder.timeout(Duration::from_secs(seconds));
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
            timeout_seconds,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn make_request(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let monitor = PerformanceMonitor::new(&format!("rpc_{}", method));
        let result = self.send_request(method, params).await;
        let duration = monitor.finish_with_result(&result);

        MetricsLogger::log_rpc_call(method, duration, result.is_ok());
        result
    }

    async fn send_request(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::Timeout {
                        seconds: self.timeout_seconds.unwrap_or_default(),
                    }
                } else if e.is_connect() {
                    RpcError::Connection(e.to_string())
                } else {
                    RpcError::Http(e)
                }
            })?;

        let status = response.status();
        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(RpcError::RateLimit);
        }
        if !status.is_success() {
            return Err(RpcError::Connection(format!(
                "HTTP error: {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("Unknown")
            )));
        }

        let body = response.text().await?;
        let rpc_response: JsonRpcResponse = serde_json::from_str(&body)?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Method {
                code: error.code,
                message: error.message,
            });
        }

        // A JSON `null` result is meaningful (unknown block/receipt), so keep it
        Ok(rpc_response.result.unwrap_or(Value::Null))
    }
}

#[async_trait]
impl ChainClient for RpcClient {
    async fn current_height(&self) -> Result<u64, RpcError> {
        let result = self.make_request("eth_blockNumber", vec![]).await?;

        let hex_string = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("Block number is not a string".to_string()))?;
        parse_hex_to_u64(hex_string)
    }

    async fn block_at(&self, number: u64, include_transactions: bool) -> Result<Option<Block>, RpcError> {
        let params = vec![
            Value::String(BlockTag::Number(number).to_rpc_param()),
            Value::Bool(include_transactions),
        ];

        let result = self.make_request("eth_getBlockByNumber", params).await?;
        if result.is_null() {
            return Ok(None);
        }

        let block: RpcBlock = serde_json::from_value(result)?;
        let block = block.into_block()?;

        LogContext::new("rpc_client", "block_at")
            .with_block_number(number)
            .with_metadata("transaction_count", json!(block.transactions.len()))
            .debug(&format!("Retrieved block {} with {} transactions", number, block.transactions.len()));

        Ok(Some(block))
    }

    async fn receipt_of(&self, transaction_hash: &str) -> Result<Option<Receipt>, RpcError> {
        let params = vec![Value::String(transaction_hash.to_string())];

        let result = self.make_request("eth_getTransactionReceipt", params).await?;
        if result.is_null() {
            return Ok(None);
        }

        let receipt: RpcReceipt = serde_json::from_value(result)?;
        receipt.into_receipt().map(Some)
    }

    async fn native_balance_of(&self, address: &str, block: BlockTag) -> Result<BigDecimal, RpcError> {
        let params = vec![
            Value::String(address.to_string()),
            Value::String(block.to_rpc_param()),
        ];

        let result = self.make_request("eth_getBalance", params).await?;
        let hex_string = result
            .as_str()
            .ok_or_else(|| RpcError::InvalidResponse("Balance is not a string".to_string()))?;

        Ok(wei_to_native(&parse_hex_to_bigint(hex_string)?))
    }

    async fn call(&self, contract: &str, calldata: &str, block: BlockTag) -> Result<String, RpcError> {
        let params = vec![
            json!({ "to": contract, "data": calldata }),
            Value::String(block.to_rpc_param()),
        ];

        let result = self.make_request("eth_call", params).await?;
        match result {
            Value::Null => Ok("0x".to_string()),
            Value::String(data) => Ok(data),
            other => Err(RpcError::InvalidResponse(format!("Unexpected eth_call result: {}", other))),
        }
    }
}

fn parse_hex_to_u64(hex_str: &str) -> Result<u64, RpcError> {
    let hex_without_prefix = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    u64::from_str_radix(hex_without_prefix, 16)
        .map_err(|e| RpcError::InvalidResponse(format!("Failed to parse hex '{}' to u64: {}", hex_str, e)))
}

fn parse_hex_to_u32(hex_str: &str) -> Result<u32, RpcError> {
    let hex_without_prefix = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    u32::from_str_radix(hex_without_prefix, 16)
        .map_err(|e| RpcError::InvalidResponse(format!("Failed to parse hex '{}' to u32: {}", hex_str, e)))
}

fn parse_hex_to_bigint(hex_str: &str) -> Result<BigInt, RpcError> {
    let hex_without_prefix = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    if hex_without_prefix.is_empty() {
        return Ok(BigInt::default());
    }
    BigInt::parse_bytes(hex_without_prefix.as_bytes(), 16)
        .ok_or_else(|| RpcError::InvalidResponse(format!("Failed to parse hex quantity '{}'", hex_str)))
}
