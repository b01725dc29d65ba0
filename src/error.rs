use thiserror::Error;

/// Main error type for the balance watcher
#[derive(Error, Debug)]
pub enum WatchError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Scan error: {0}")]
    Scan(#[from] ScanError),

    #[error("Analysis error: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("Sink error: {0}")]
    Sink(#[from] SinkError),
}

/// RPC-related errors
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("RPC method error: code={code}, message={message}")]
    Method { code: i32, message: String },

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),

    #[error("Timeout after {seconds} seconds")]
    Timeout { seconds: u64 },

    #[error("Rate limit exceeded")]
    RateLimit,

    #[error("Connection failed: {0}")]
    Connection(String),
}

/// ABI decoding errors
#[derive(Error, Debug, PartialEq)]
pub enum AbiError {
    #[error("Invalid hex data: {0}")]
    InvalidHex(String),

    #[error("Insufficient data: expected {expected} bytes, got {got}")]
    InsufficientData { expected: usize, got: usize },

    #[error("Invalid UTF-8 in string value")]
    InvalidUtf8,

    #[error("Value out of range for {0}")]
    OutOfRange(&'static str),

    #[error("Expected {0} value")]
    TypeMismatch(&'static str),
}

/// Failures of a single scan cycle. Never escapes the scanner.
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Failed to query chain height: {0}")]
    Height(#[source] RpcError),

    #[error("Failed to fetch block {block_number}: {source}")]
    TransientFetch {
        block_number: u64,
        #[source]
        source: RpcError,
    },
}

/// Failures while analyzing one transaction. Never escapes the analyzer.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Receipt not available for transaction {0}")]
    MissingReceipt(String),

    #[error("Address {0} is not a recognizable token contract")]
    UnrecognizedTokenContract(String),

    #[error("Malformed transfer log: {0}")]
    MalformedLog(String),

    #[error("ABI decoding failed: {0}")]
    Abi(#[from] AbiError),

    #[error("RPC call failed: {0}")]
    Rpc(#[from] RpcError),
}

/// Failures raised by event consumers
#[derive(Error, Debug)]
pub enum SinkError {
    #[error("Failed to serialize event: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Failed to write event: {0}")]
    Io(#[from] std::io::Error),

    #[error("Event rejected: {0}")]
    Rejected(String),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
}

/// Error severity levels for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Critical errors that require immediate attention
    Critical,
    /// High priority errors that affect functionality
    High,
    /// Medium priority errors that may affect performance
    Medium,
    /// Low priority errors that are mostly informational
    Low,
}

impl WatchError {
    /// Get the severity level of an error
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            WatchError::Config(_) => ErrorSeverity::Critical,

            WatchError::Rpc(RpcError::Connection(_)) => ErrorSeverity::High,
            WatchError::Scan(ScanError::Height(RpcError::Connection(_))) => ErrorSeverity::High,
            WatchError::Sink(_) => ErrorSeverity::High,

            WatchError::Rpc(RpcError::Timeout { .. }) => ErrorSeverity::Medium,
            WatchError::Rpc(RpcError::RateLimit) => ErrorSeverity::Medium,
            WatchError::Scan(_) => ErrorSeverity::Medium,

            WatchError::Analysis(AnalysisError::MissingReceipt(_)) => ErrorSeverity::Low,
            WatchError::Analysis(AnalysisError::UnrecognizedTokenContract(_)) => ErrorSeverity::Low,
            _ => ErrorSeverity::Medium,
        }
    }
}
