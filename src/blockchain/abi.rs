//! Minimal ABI codec for the handful of types the watcher reads:
//! indexed addresses in log topics, `uint256`/`uint8` words and `string`
//! return values.

use bigdecimal::num_bigint::BigInt;

use crate::error::AbiError;

const WORD_BYTES: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbiType {
    Address,
    Uint256,
    Uint8,
    String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AbiValue {
    Address(String),
    Uint(BigInt),
    String(String),
}

impl AbiValue {
    pub fn into_address(self) -> Result<String, AbiError> {
        match self {
            AbiValue::Address(address) => Ok(address),
            _ => Err(AbiError::TypeMismatch("address")),
        }
    }

    pub fn into_uint(self) -> Result<BigInt, AbiError> {
        match self {
            AbiValue::Uint(value) => Ok(value),
            _ => Err(AbiError::TypeMismatch("uint")),
        }
    }

    pub fn into_string(self) -> Result<String, AbiError> {
        match self {
            AbiValue::String(value) => Ok(value),
            _ => Err(AbiError::TypeMismatch("string")),
        }
    }
}

/// Decode a single ABI-encoded parameter from hex data (with or without `0x`)
pub fn decode_parameter(kind: AbiType, data: &str) -> Result<AbiValue, AbiError> {
    let bytes = hex_to_bytes(data)?;

    match kind {
        AbiType::Address => {
            let word = first_word(&bytes)?;
            Ok(AbiValue::Address(format!("0x{}", bytes_to_hex(&word[12..]))))
        }
        AbiType::Uint256 => Ok(AbiValue::Uint(word_to_uint(first_word(&bytes)?))),
        AbiType::Uint8 => {
            let value = word_to_uint(first_word(&bytes)?);
            if value > BigInt::from(u8::MAX) {
                return Err(AbiError::OutOfRange("uint8"));
            }
            Ok(AbiValue::Uint(value))
        }
        AbiType::String => decode_string(&bytes).map(AbiValue::String),
    }
}

/// ABI-encode an address argument as a 32-byte word (no `0x` prefix)
pub fn encode_address(address: &str) -> Result<String, AbiError> {
    let hex = address.trim_start_matches("0x").trim_start_matches("0X");
    if hex.len() != 40 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(AbiError::InvalidHex(address.to_string()));
    }
    Ok(format!("{:0>64}", hex.to_lowercase()))
}

/// ABI-encode an unsigned integer as a 32-byte word (no `0x` prefix)
pub fn encode_uint(value: &BigInt) -> String {
    format!("{:0>64}", value.to_str_radix(16))
}

/// ABI-encode a single `string` return value (no `0x` prefix)
pub fn encode_string(value: &str) -> String {
    let bytes = value.as_bytes();
    let padded_len = bytes.len().div_ceil(WORD_BYTES) * WORD_BYTES;
    let mut padded = bytes.to_vec();
    padded.resize(padded_len, 0);

    format!(
        "{}{}{}",
        encode_uint(&BigInt::from(WORD_BYTES)),
        encode_uint(&BigInt::from(bytes.len())),
        bytes_to_hex(&padded)
    )
}

fn decode_string(bytes: &[u8]) -> Result<String, AbiError> {
    // Some older tokens return a bare bytes32 instead of a dynamic string
    if bytes.len() == WORD_BYTES {
        let end = bytes.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
        return String::from_utf8(bytes[..end].to_vec()).map_err(|_| AbiError::InvalidUtf8);
    }

    let offset = word_to_usize(first_word(bytes)?)?;
    let length = word_to_usize(slice_at(bytes, offset, WORD_BYTES)?)?;
    let content = slice_at(bytes, offset.saturating_add(WORD_BYTES), length)?;

    String::from_utf8(content.to_vec()).map_err(|_| AbiError::InvalidUtf8)
}

fn slice_at(bytes: &[u8], start: usize, len: usize) -> Result<&[u8], AbiError> {
    let end = start.saturating_add(len);
    bytes.get(start..end).ok_or(AbiError::InsufficientData {
        expected: end,
        got: bytes.len(),
    })
}

fn first_word(bytes: &[u8]) -> Result<&[u8], AbiError> {
    bytes.get(..WORD_BYTES).ok_or(AbiError::InsufficientData {
        expected: WORD_BYTES,
        got: bytes.len(),
    })
}

fn word_to_uint(word: &[u8]) -> BigInt {
    BigInt::parse_bytes(bytes_to_hex(word).as_bytes(), 16).unwrap_or_default()
}

fn word_to_usize(word: &[u8]) -> Result<usize, AbiError> {
    // Offsets and lengths never need more than the low 8 bytes
    if word[..WORD_BYTES - 8].iter().any(|b| *b != 0) {
        return Err(AbiError::OutOfRange("usize"));
    }
    let mut low = [0u8; 8];
    low.copy_from_slice(&word[WORD_BYTES - 8..]);
    usize::try_from(u64::from_be_bytes(low)).map_err(|_| AbiError::OutOfRange("usize"))
}

pub(crate) fn hex_to_bytes(data: &str) -> Result<Vec<u8>, AbiError> {
    let hex = data.trim();
    let hex = hex.strip_prefix("0x").or_else(|| hex.strip_prefix("0X")).unwrap_or(hex);

    if hex.len() % 2 != 0 {
        return Err(AbiError::InvalidHex(data.to_string()));
    }

    (0..hex.len())
        .step_by(2)
        .map(|i| {
            hex.get(i..i + 2)
                .and_then(|pair| u8::from_str_radix(pair, 16).ok())
                .ok_or_else(|| AbiError::InvalidHex(data.to_string()))
        })
        .collect()
}

fn bytes_to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
