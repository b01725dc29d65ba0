use std::io::{self, Write};
use std::sync::Mutex;

use crate::error::SinkError;
use crate::models::BalanceChangeEvent;

/// Consumer of balance change events
pub trait EventSink: Send + Sync {
    fn emit(&self, event: BalanceChangeEvent) -> Result<(), SinkError>;
}

/// Writes each event as one compact JSON object per line
pub struct JsonLinesSink<W: Write + Send> {
    writer: Mutex<W>,
}

impl JsonLinesSink<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> JsonLinesSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> Result<W, SinkError> {
        self.writer
            .into_inner()
            .map_err(|_| SinkError::Rejected("writer lock poisoned".to_string()))
    }
}

impl<W: Write + Send> EventSink for JsonLinesSink<W> {
    fn emit(&self, event: BalanceChangeEvent) -> Result<(), SinkError> {
        let line = serde_json::to_string(&event)?;

        let mut writer = self
            .writer
            .lock()
            .map_err(|_| SinkError::Rejected("writer lock poisoned".to_string()))?;
        writeln!(writer, "{}", line)?;
        writer.flush()?;
        Ok(())
    }
}

/// Adapts a closure into a sink
pub struct FnSink<F> {
    f: F,
}

impl<F> FnSink<F>
where
    F: Fn(BalanceChangeEvent) -> Result<(), SinkError> + Send + Sync,
{
    pub fn new(f: F) -> Self {
        Self { f }
    }
}

impl<F> EventSink for FnSink<F>
where
    F: Fn(BalanceChangeEvent) -> Result<(), SinkError> + Send + Sync,
{
    fn emit(&self, event: BalanceChangeEvent) -> Result<(), SinkError> {
        (self.f)(event)
    }
}

pub fn sink_fn<F>(f: F) -> FnSink<F>
where
    F: Fn(BalanceChangeEvent) -> Result<(), SinkError> + Send + Sync,
{
    FnSink::new(f)
}
