use crate::errors::Result;
use crate::model::{LogEntry, LogFilter, NewLogEntry};
use async_trait::async_trait;

/// Persistence seam used by the HTTP handlers
#[async_trait]
pub trait LogStore: Send + Sync {
    /// Inserts the whole batch atomically, returning the number of rows written
    async fn insert_batch(&self, entries: &[NewLogEntry]) -> Result<u64>;

    /// Returns rows matching every set filter, in insertion order
    async fn query(&self, filter: &LogFilter) -> Result<Vec<LogEntry>>;
}
