use serde_json::json;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use crate::blockchain::block_processor::BlockHandler;
use crate::blockchain::chain_client::ChainClient;
use crate::error::{ScanError, WatchError};
use crate::logging::{ErrorLogger, LogContext, MetricsLogger, PerformanceMonitor};

/// Highest block already handed to the block handler
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanCursor {
    pub last_block: Option<u64>,
}

/// What a single scan cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Another cycle was still running; nothing was queried
    Skipped,
    /// First cycle: the cursor was set to the current height, nothing fetched
    Initialized { height: u64 },
    /// No new block to fetch
    UpToDate { height: u64 },
    /// Blocks `first..=last` were fetched and handed over
    Processed { first: u64, last: u64 },
    /// Height or block query failed; the cursor did not move
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScannerStatus {
    pub cursor: Option<u64>,
    pub busy: bool,
}

/// Releases the busy flag when the cycle ends, however it ends
struct BusyGuard<'a> {
    flag: &'a AtomicBool,
}

impl<'a> BusyGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag })
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

/// Polls the chain for new blocks and hands them to a [`BlockHandler`]
pub struct BlockScanner<C: ChainClient> {
    client: Arc<C>,
    cursor: Mutex<ScanCursor>,
    busy: AtomicBool,
    generation: AtomicU64,
    wake: Notify,
}

impl<C: ChainClient + 'static> BlockScanner<C> {
    /// Scanner whose first cycle only records the current height
    pub fn new(client: Arc<C>) -> Self {
        Self::with_cursor(client, ScanCursor::default())
    }

    /// Scanner resuming after `last_block`
    pub fn starting_after(client: Arc<C>, last_block: u64) -> Self {
        Self::with_cursor(
            client,
            ScanCursor {
                last_block: Some(last_block),
            },
        )
    }

    fn with_cursor(client: Arc<C>, cursor: ScanCursor) -> Self {
        Self {
            client,
            cursor: Mutex::new(cursor),
            busy: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            wake: Notify::new(),
        }
    }

    pub async fn cursor(&self) -> Option<u64> {
        self.cursor.lock().await.last_block
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    pub async fn status(&self) -> ScannerStatus {
        ScannerStatus {
            cursor: self.cursor().await,
            busy: self.is_busy(),
        }
    }

    /// Run one scan cycle. Errors are logged here and never escape.
    pub async fn run_cycle(&self, batch_limit: u64, handler: &dyn BlockHandler) -> CycleOutcome {
        let Some(_busy) = BusyGuard::acquire(&self.busy) else {
            LogContext::new("block_scanner", "run_cycle")
                .info("Previous scan cycle still running, skipping tick");
            return CycleOutcome::Skipped;
        };

        let height = match self.client.current_height().await {
            Ok(height) => height,
            Err(e) => {
                ErrorLogger::log_error(
                    &WatchError::Scan(ScanError::Height(e)),
                    Some(LogContext::new("block_scanner", "current_height")),
                );
                return CycleOutcome::Failed;
            }
        };

        let last_block = {
            let mut cursor = self.cursor.lock().await;
            match cursor.last_block {
                Some(last_block) => last_block,
                None => {
                    cursor.last_block = Some(height);
                    LogContext::new("block_scanner", "run_cycle")
                        .with_block_number(height)
                        .info(&format!("Cursor initialized at block {}", height));
                    return CycleOutcome::Initialized { height };
                }
            }
        };

        if height <= last_block {
            LogContext::new("block_scanner", "run_cycle")
                .with_block_number(height)
                .debug("No new blocks");
            return CycleOutcome::UpToDate { height };
        }

        let monitor = PerformanceMonitor::new("scan_cycle")
            .with_metadata("cursor", json!(last_block))
            .with_metadata("batch_limit", json!(batch_limit));

        let mut blocks = Vec::new();
        let first = last_block + 1;
        for number in first..=last_block.saturating_add(batch_limit) {
            match self.client.block_at(number, true).await {
                Ok(Some(block)) => blocks.push(block),
                Ok(None) => {
                    LogContext::new("block_scanner", "fetch_blocks")
                        .with_block_number(number)
                        .debug("Block not available yet, ending batch");
                    break;
                }
                Err(e) => {
                    ErrorLogger::log_error(
                        &WatchError::Scan(ScanError::TransientFetch {
                            block_number: number,
                            source: e,
                        }),
                        Some(LogContext::new("block_scanner", "fetch_blocks").with_block_number(number)),
                    );
                    return CycleOutcome::Failed;
                }
            }
        }

        let Some(last) = blocks.iter().map(|block| block.number).max() else {
            return CycleOutcome::UpToDate { height };
        };
        let block_count = blocks.len();

        let result = handler.on_blocks(blocks).await;
        let duration = monitor.finish_with_result(&result);
        if let Err(e) = result {
            ErrorLogger::log_error(
                &WatchError::Sink(e),
                Some(
                    LogContext::new("block_scanner", "handle_blocks")
                        .with_metadata("first_block", json!(first))
                        .with_metadata("last_block", json!(last)),
                ),
            );
        }

        {
            let mut cursor = self.cursor.lock().await;
            cursor.last_block = Some(cursor.last_block.map_or(last, |current| current.max(last)));
        }

        MetricsLogger::log_cycle_completed(first, last, block_count, duration);
        CycleOutcome::Processed { first, last }
    }

    /// Begin polling every `interval_seconds`. Replaces any previous schedule.
    ///
    /// Each tick spawns its own cycle; ticks arriving while a cycle is busy are dropped.
    pub fn start(
        self: &Arc<Self>,
        interval_seconds: u64,
        batch_limit: u64,
        handler: Arc<dyn BlockHandler>,
    ) -> JoinHandle<()> {
        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.wake.notify_waiters();

        LogContext::new("block_scanner", "start")
            .with_metadata("interval_seconds", json!(interval_seconds))
            .with_metadata("batch_limit", json!(batch_limit))
            .info("Starting block scanner");

        let scanner = Arc::clone(self);
        tokio::spawn(async move {
            let period = Duration::from_secs(interval_seconds.max(1));
            let mut ticker = interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                if scanner.generation.load(Ordering::SeqCst) != generation {
                    LogContext::new("block_scanner", "schedule")
                        .debug("Scan schedule replaced or stopped");
                    break;
                }

                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = scanner.wake.notified() => continue,
                }

                // A stop racing the tick wins
                if scanner.generation.load(Ordering::SeqCst) != generation {
                    continue;
                }

                let cycle_scanner = Arc::clone(&scanner);
                let cycle_handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    cycle_scanner.run_cycle(batch_limit, cycle_handler.as_ref()).await;
                });
            }
        })
    }

    /// Halt future cycles. A cycle already running completes normally.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.wake.notify_waiters();
        LogContext::new("block_scanner", "stop").info("Stopping block scanner");
    }
}
