use bigdecimal::{num_bigint::BigInt, ToPrimitive};

use crate::blockchain::abi::{decode_parameter, encode_address, AbiType};
use crate::blockchain::chain_client::{BlockTag, ChainClient};
use crate::error::{AbiError, AnalysisError};

/// `totalSupply()`
pub const TOTAL_SUPPLY_SELECTOR: &str = "0x18160ddd";
/// `symbol()`
pub const SYMBOL_SELECTOR: &str = "0x95d89b41";
/// `decimals()`
pub const DECIMALS_SELECTOR: &str = "0x313ce567";
/// `balanceOf(address)`
pub const BALANCE_OF_SELECTOR: &str = "0x70a08231";

/// Read-only calls against a standard token contract
pub struct TokenContract<'a, C: ChainClient + ?Sized> {
    client: &'a C,
    address: String,
}

impl<'a, C: ChainClient + ?Sized> TokenContract<'a, C> {
    pub fn new(client: &'a C, address: &str) -> Self {
        Self {
            client,
            address: address.to_string(),
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// `totalSupply()`, or `None` when the contract returns nothing.
    ///
    /// Used as the capability probe: an address that does not answer here is not
    /// treated as a token.
    pub async fn total_supply(&self, block: BlockTag) -> Result<Option<BigInt>, AnalysisError> {
        let result = self.client.call(&self.address, TOTAL_SUPPLY_SELECTOR, block).await?;
        if is_empty_result(&result) {
            return Ok(None);
        }
        Ok(Some(decode_parameter(AbiType::Uint256, &result)?.into_uint()?))
    }

    pub async fn symbol(&self, block: BlockTag) -> Result<String, AnalysisError> {
        let result = self.client.call(&self.address, SYMBOL_SELECTOR, block).await?;
        Ok(decode_parameter(AbiType::String, &result)?.into_string()?)
    }

    pub async fn decimals(&self, block: BlockTag) -> Result<u32, AnalysisError> {
        let result = self.client.call(&self.address, DECIMALS_SELECTOR, block).await?;
        let decimals = decode_parameter(AbiType::Uint8, &result)?.into_uint()?;
        Ok(decimals.to_u32().ok_or(AbiError::OutOfRange("uint8"))?)
    }

    /// Raw (unscaled) balance of `owner`
    pub async fn balance_of(&self, owner: &str, block: BlockTag) -> Result<BigInt, AnalysisError> {
        let calldata = format!("{}{}", BALANCE_OF_SELECTOR, encode_address(owner)?);
        let result = self.client.call(&self.address, &calldata, block).await?;
        if is_empty_result(&result) {
            return Ok(BigInt::default());
        }
        Ok(decode_parameter(AbiType::Uint256, &result)?.into_uint()?)
    }
}

fn is_empty_result(result: &str) -> bool {
    let trimmed = result.trim();
    trimmed.is_empty() || trimmed == "0x"
}
