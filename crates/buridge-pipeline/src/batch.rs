// Batch Writer
//
// Accumulates decoded records into bounded batches and flushes each batch to
// the destination store in one atomic backend call. Two bound kinds, fixed
// per destination: a record count (the key-value table's native batch-write
// limit) or a cumulative serialized size (the document store's request cap).
//
// A failed flush fails the run; the pending batch is lost. There is no
// partial-batch retry.

use crate::decode::Record;
use crate::error::Result;
use async_trait::async_trait;
use tracing::{debug, info};

/// The key-value table's native batch-write limit
pub const TABLE_BATCH_LIMIT: usize = 25;

/// The document store's request size cap
pub const DOCUMENT_BATCH_MAX_BYTES: usize = 15 * 1024 * 1024;

/// Threshold policy deciding when a pending batch is flushed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Flush when the pending batch reaches this many records
    Count(usize),
    /// Flush before a record would push the pending serialized size past
    /// this many bytes
    Size(usize),
}

/// Destination store accepting one batch per call
#[async_trait]
pub trait BatchSink: Send + Sync {
    /// Write one batch as a single atomic request to the backend
    async fn write_batch(&self, batch: &[Record]) -> Result<()>;
}

/// Accumulator applying a BatchPolicy to an incoming record sequence
pub struct Batcher {
    policy: BatchPolicy,
    pending: Vec<Record>,
    pending_bytes: usize,
}

impl Batcher {
    pub fn new(policy: BatchPolicy) -> Self {
        Batcher {
            policy,
            pending: Vec::new(),
            pending_bytes: 0,
        }
    }

    /// Accept one record; returns a full batch when the policy says flush
    ///
    /// Under the size policy the returned batch never contains the incoming
    /// record (it flushes what was pending first); under the count policy
    /// the incoming record completes the batch.
    pub fn push(&mut self, record: Record) -> Option<Vec<Record>> {
        match self.policy {
            BatchPolicy::Count(limit) => {
                self.pending.push(record);
                if self.pending.len() >= limit {
                    Some(self.take())
                } else {
                    None
                }
            },
            BatchPolicy::Size(max_bytes) => {
                let record_bytes = record.serialized_size();
                let would_overflow = !self.pending.is_empty()
                    && self.pending_bytes + record_bytes > max_bytes;

                if would_overflow {
                    let batch = self.take();
                    self.pending.push(record);
                    self.pending_bytes = record_bytes;
                    Some(batch)
                } else {
                    // A single record larger than the bound still goes in;
                    // it will be flushed alone
                    self.pending.push(record);
                    self.pending_bytes += record_bytes;
                    None
                }
            },
        }
    }

    /// Remove and return the pending batch (end-of-stream remainder)
    pub fn take(&mut self) -> Vec<Record> {
        self.pending_bytes = 0;
        std::mem::take(&mut self.pending)
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

/// Drive a record sequence into a sink under a batch policy
///
/// Returns the number of records written. The first decoder or sink error
/// aborts the load.
pub async fn load_records<I>(records: I, policy: BatchPolicy, sink: &dyn BatchSink) -> Result<u64>
where
    I: IntoIterator<Item = Result<Record>>,
{
    let mut batcher = Batcher::new(policy);
    let mut written = 0u64;
    let mut flushes = 0u32;

    for record in records {
        if let Some(batch) = batcher.push(record?) {
            written += batch.len() as u64;
            flushes += 1;
            debug!(records = batch.len(), flush = flushes, "Flushing batch");
            sink.write_batch(&batch).await?;
        }
    }

    if !batcher.is_empty() {
        let remainder = batcher.take();
        written += remainder.len() as u64;
        flushes += 1;
        debug!(records = remainder.len(), flush = flushes, "Flushing final batch");
        sink.write_batch(&remainder).await?;
    }

    info!(records = written, flushes, "Load complete");
    Ok(written)
}

// ============================================================================
// Tests
// ============================================================================
