pub mod abi;
pub mod block_processor;
pub mod block_scanner;
pub mod chain_client;
pub mod rpc_client;
pub mod token_contract;
pub mod transaction_analyzer;
pub mod transfer_detector;

pub use abi::{decode_parameter, AbiType, AbiValue};
pub use block_processor::{BlockHandler, BlockProcessor};
pub use block_scanner::{BlockScanner, CycleOutcome, ScanCursor, ScannerStatus};
pub use chain_client::{BlockTag, ChainClient};
pub use rpc_client::RpcClient;
pub use token_contract::TokenContract;
pub use transaction_analyzer::TransactionAnalyzer;
pub use transfer_detector::{decode_transfer_log, is_transfer_log, normalize_address, TransferLog, TRANSFER_EVENT_SIGNATURE};
