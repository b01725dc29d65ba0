pub mod blockchain;
pub mod config;
pub mod error;
pub mod logging;
pub mod models;
pub mod sink;

pub use blockchain::{
    BlockHandler, BlockProcessor, BlockScanner, BlockTag, ChainClient, CycleOutcome, RpcClient, TransactionAnalyzer,
};
pub use config::{AppConfig, LoggingConfig, RpcConfig, ScannerConfig};
pub use error::{AbiError, AnalysisError, ConfigError, RpcError, ScanError, SinkError, WatchError};
pub use logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};
pub use models::{BalanceChangeEvent, BalanceRole, Block, ChainTag, RawLog, Receipt, TokenChange, Transaction};
pub use sink::{sink_fn, EventSink, FnSink, JsonLinesSink};
