use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

use crate::blockchain::chain_client::ChainClient;
use crate::blockchain::transaction_analyzer::TransactionAnalyzer;
use crate::error::SinkError;
use crate::logging::LogContext;
use crate::models::Block;
use crate::sink::EventSink;

/// Receives every batch of newly fetched blocks from the scanner
#[async_trait]
pub trait BlockHandler: Send + Sync {
    async fn on_blocks(&self, blocks: Vec<Block>) -> Result<(), SinkError>;
}

/// Analyzes every transaction of every block in order and emits the resulting events
pub struct BlockProcessor<C: ChainClient, S: EventSink> {
    analyzer: TransactionAnalyzer<C>,
    sink: S,
}

impl<C: ChainClient, S: EventSink> BlockProcessor<C, S> {
    pub fn new(client: Arc<C>, sink: S) -> Self {
        Self {
            analyzer: TransactionAnalyzer::new(client),
            sink,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Process a single block, returning the number of events emitted
    pub async fn process_block(&self, block: &Block) -> Result<usize, SinkError> {
        let mut emitted = 0;

        for tx in &block.transactions {
            for event in self.analyzer.analyze(tx).await {
                self.sink.emit(event)?;
                emitted += 1;
            }
        }

        LogContext::new("block_processor", "process_block")
            .with_block_number(block.number)
            .with_metadata("transaction_count", json!(block.transactions.len()))
            .with_metadata("event_count", json!(emitted))
            .debug(&format!(
                "Processed block {} with {} transactions",
                block.number,
                block.transactions.len()
            ));

        Ok(emitted)
    }
}

#[async_trait]
impl<C, S> BlockHandler for BlockProcessor<C, S>
where
    C: ChainClient,
    S: EventSink,
{
    async fn on_blocks(&self, blocks: Vec<Block>) -> Result<(), SinkError> {
        let mut total = 0;
        for block in &blocks {
            total += self.process_block(block).await?;
        }

        LogContext::new("block_processor", "on_blocks")
            .with_metadata("block_count", json!(blocks.len()))
            .with_metadata("event_count", json!(total))
            .debug("Block batch processed");
        Ok(())
    }
}
