//! Batching of harvested records.
//!
//! Records are buffered until the threshold is reached, then the first
//! `threshold` records are filtered and the survivors handed to a
//! [`BatchSink`]. Batch indices start at 1 and advance on every flush,
//! including flushes whose records were all filtered out.

use std::path::PathBuf;

use thiserror::Error;
use tracing::info;
use zendesk_api_rs::models::Record;

use crate::proposition::Proposition;

/// Default number of records per batch.
pub const DEFAULT_BATCH_SIZE: usize = 100;

/// Errors raised by output writers.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Writing a batch file failed.
    #[error("failed to write {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A record could not be serialized.
    #[error("failed to serialize batch {index}: {message}")]
    Serialize { index: u32, message: String },
}

impl OutputError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        OutputError::Io {
            path: path.into(),
            source,
        }
    }
}

/// One flushed, filtered batch.
#[derive(Debug, Clone, PartialEq)]
pub struct Batch {
    /// 1-based, strictly increasing within a run.
    pub index: u32,
    /// Surviving records, in harvest order.
    pub records: Vec<Record>,
}

/// Consumer of flushed batches.
///
/// Only batches with at least one record are handed over.
pub trait BatchSink {
    /// Writes a batch and returns how many records were written.
    fn write_batch(&mut self, batch: &Batch) -> Result<usize, OutputError>;
}

impl<S: BatchSink + ?Sized> BatchSink for &mut S {
    fn write_batch(&mut self, batch: &Batch) -> Result<usize, OutputError> {
        (**self).write_batch(batch)
    }
}

/// A sink that keeps every batch in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    pub batches: Vec<Batch>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All written records across batches.
    pub fn records(&self) -> impl Iterator<Item = &Record> {
        self.batches.iter().flat_map(|b| b.records.iter())
    }
}

impl BatchSink for MemorySink {
    fn write_batch(&mut self, batch: &Batch) -> Result<usize, OutputError> {
        self.batches.push(batch.clone());
        Ok(batch.records.len())
    }
}

/// Append-only buffer that flushes every `threshold` records.
#[derive(Debug)]
pub struct BatchAccumulator {
    threshold: usize,
    buffer: Vec<Record>,
    next_index: u32,
    total_written: usize,
    total_scanned: usize,
}

impl Default for BatchAccumulator {
    fn default() -> Self {
        Self::new(DEFAULT_BATCH_SIZE)
    }
}

impl BatchAccumulator {
    /// Creates an accumulator flushing every `threshold` records (at least 1).
    pub fn new(threshold: usize) -> Self {
        Self {
            threshold: threshold.max(1),
            buffer: Vec::new(),
            next_index: 1,
            total_written: 0,
            total_scanned: 0,
        }
    }

    pub fn threshold(&self) -> usize {
        self.threshold
    }

    /// Records waiting for the next flush.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Index the next flush will use.
    pub fn next_index(&self) -> u32 {
        self.next_index
    }

    /// Number of flushes performed so far.
    pub fn batches_flushed(&self) -> u32 {
        self.next_index - 1
    }

    /// Records written across all batches.
    pub fn total_written(&self) -> usize {
        self.total_written
    }

    /// Records flushed (before filtering) across all batches.
    pub fn total_scanned(&self) -> usize {
        self.total_scanned
    }

    /// Appends a record, flushing if the buffer reached the threshold.
    ///
    /// Returns the number of records written by this call.
    pub fn push<S>(
        &mut self,
        record: Record,
        filter: &Proposition,
        sink: &mut S,
    ) -> Result<usize, OutputError>
    where
        S: BatchSink + ?Sized,
    {
        self.buffer.push(record);
        if self.buffer.len() >= self.threshold {
            self.flush(filter, sink)
        } else {
            Ok(0)
        }
    }

    /// Flushes up to `threshold` buffered records.
    ///
    /// An empty buffer is a no-op and does not consume a batch index.
    pub fn flush<S>(&mut self, filter: &Proposition, sink: &mut S) -> Result<usize, OutputError>
    where
        S: BatchSink + ?Sized,
    {
        if self.buffer.is_empty() {
            return Ok(0);
        }

        let take = self.threshold.min(self.buffer.len());
        let slice: Vec<Record> = self.buffer.drain(..take).collect();
        let scanned = slice.len();
        let index = self.next_index;
        self.next_index += 1;
        self.total_scanned += scanned;

        let survivors = filter.apply_filters(slice);
        let written = if survivors.is_empty() {
            0
        } else {
            sink.write_batch(&Batch {
                index,
                records: survivors,
            })?
        };

        self.total_written += written;
        info!(batch = index, scanned, written, "flushed batch");
        Ok(written)
    }

    /// Flushes everything still buffered, in threshold-sized slices.
    pub fn finish<S>(&mut self, filter: &Proposition, sink: &mut S) -> Result<usize, OutputError>
    where
        S: BatchSink + ?Sized,
    {
        let mut written = 0;
        while !self.buffer.is_empty() {
            written += self.flush(filter, sink)?;
        }
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::proposition::{Atom, MergeMode};
    use serde_json::json;

    fn record(id: u64) -> Record {
        Record::from_value(json!({"id": id})).unwrap()
    }

    fn even_only() -> Proposition {
        let mut p = Proposition::new();
        p.merge(
            Atom::new("(even)", |r: &Record| {
                r.get("id").and_then(|v| v.as_u64()).is_some_and(|id| id % 2 == 0)
            }),
            MergeMode::Overwrite,
        );
        p
    }

    #[test]
    fn test_exactly_threshold_flushes_once() {
        let filter = Proposition::new();
        let mut sink = MemorySink::new();
        let mut acc = BatchAccumulator::new(3);

        for id in 1..=3 {
            acc.push(record(id), &filter, &mut sink).unwrap();
        }

        assert_eq!(sink.batches.len(), 1);
        assert_eq!(sink.batches[0].index, 1);
        assert_eq!(sink.batches[0].records.len(), 3);
        assert_eq!(acc.buffered(), 0);
        assert_eq!(acc.finish(&filter, &mut sink).unwrap(), 0);
        assert_eq!(sink.batches.len(), 1);
        assert_eq!(acc.batches_flushed(), 1);
    }

    #[test]
    fn test_remainder_flushed_as_next_batch() {
        let filter = Proposition::new();
        let mut sink = MemorySink::new();
        let mut acc = BatchAccumulator::new(3);

        for id in 1..=4 {
            acc.push(record(id), &filter, &mut sink).unwrap();
        }
        assert_eq!(sink.batches.len(), 1);
        assert_eq!(acc.buffered(), 1);

        assert_eq!(acc.finish(&filter, &mut sink).unwrap(), 1);
        assert_eq!(sink.batches.len(), 2);
        assert_eq!(sink.batches[1].index, 2);
        assert_eq!(sink.batches[1].records, vec![record(4)]);
        assert_eq!(acc.total_written(), 4);
    }

    #[test]
    fn test_index_advances_when_everything_is_filtered_out() {
        let filter = even_only();
        let mut sink = MemorySink::new();
        let mut acc = BatchAccumulator::new(2);

        // Batch 1: [1, 3] -> nothing survives. Batch 2: [4, 5] -> [4].
        for id in [1, 3, 4, 5] {
            acc.push(record(id), &filter, &mut sink).unwrap();
        }

        assert_eq!(sink.batches.len(), 1);
        assert_eq!(sink.batches[0].index, 2);
        assert_eq!(sink.batches[0].records, vec![record(4)]);
        assert_eq!(acc.next_index(), 3);
        assert_eq!(acc.total_written(), 1);
        assert_eq!(acc.total_scanned(), 4);
    }

    #[test]
    fn test_empty_flush_does_not_consume_index() {
        let filter = Proposition::new();
        let mut sink = MemorySink::new();
        let mut acc = BatchAccumulator::new(10);

        assert_eq!(acc.flush(&filter, &mut sink).unwrap(), 0);
        assert_eq!(acc.next_index(), 1);
        assert!(sink.batches.is_empty());
    }

    #[test]
    fn test_zero_threshold_is_clamped() {
        assert_eq!(BatchAccumulator::new(0).threshold(), 1);
        assert_eq!(BatchAccumulator::default().threshold(), DEFAULT_BATCH_SIZE);
    }

    #[test]
    fn test_sink_error_propagates() {
        struct FailingSink;
        impl BatchSink for FailingSink {
            fn write_batch(&mut self, batch: &Batch) -> Result<usize, OutputError> {
                Err(OutputError::Serialize {
                    index: batch.index,
                    message: "disk full".to_string(),
                })
            }
        }

        let filter = Proposition::new();
        let mut acc = BatchAccumulator::new(1);
        let err = acc.push(record(1), &filter, &mut FailingSink).unwrap_err();
        assert_eq!(err.to_string(), "failed to serialize batch 1: disk full");
    }
}
