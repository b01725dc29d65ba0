use bigdecimal::num_bigint::BigInt;

use crate::blockchain::abi::{decode_parameter, AbiType};
use crate::error::AnalysisError;
use crate::models::{RawLog, Receipt};

/// Standard token Transfer event signature: keccak256("Transfer(address,address,uint256)")
pub const TRANSFER_EVENT_SIGNATURE: &str = "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef";

/// A decoded standard token Transfer log
#[derive(Debug, Clone, PartialEq)]
pub struct TransferLog {
    /// Emitting contract, the candidate token
    pub token_address: String,
    pub from: String,
    pub to: String,
    /// Transferred amount before decimal scaling
    pub raw_amount: BigInt,
    pub log_index: u32,
}

/// Check if a log has the shape of a standard token Transfer:
/// exactly three topics, the first being the Transfer signature.
pub fn is_transfer_log(log: &RawLog) -> bool {
    log.topics.len() == 3 && log.topics[0].eq_ignore_ascii_case(TRANSFER_EVENT_SIGNATURE)
}

/// Transfer-shaped logs of a receipt, in log order
pub fn transfer_logs(receipt: &Receipt) -> impl Iterator<Item = &RawLog> {
    receipt.logs.iter().filter(|log| is_transfer_log(log))
}

/// Decode a Transfer log into its parties and raw amount
pub fn decode_transfer_log(log: &RawLog) -> Result<TransferLog, AnalysisError> {
    if !is_transfer_log(log) {
        return Err(AnalysisError::MalformedLog(format!(
            "log {} of {} is not a Transfer event",
            log.log_index, log.transaction_hash
        )));
    }

    let from = decode_parameter(AbiType::Address, &log.topics[1])?.into_address()?;
    let to = decode_parameter(AbiType::Address, &log.topics[2])?.into_address()?;
    let raw_amount = decode_parameter(AbiType::Uint256, &log.data)?.into_uint()?;

    Ok(TransferLog {
        token_address: normalize_address(&log.address),
        from,
        to,
        raw_amount,
        log_index: log.log_index,
    })
}

/// Normalize an address to lowercase with a `0x` prefix
pub fn normalize_address(address: &str) -> String {
    let addr = address.trim();
    let hex = addr
        .strip_prefix("0x")
        .or_else(|| addr.strip_prefix("0X"))
        .unwrap_or(addr);
    format!("0x{}", hex.to_lowercase())
}
