//! The partition space: hash-bucketed, range-partitioned tablets and the
//! planning machinery that prunes them.
//!
//! A partition key is an opaque byte string whose lexicographic order equals
//! the partition order: one 4-byte big-endian bucket ordinal per hash
//! dimension, in dimension order, followed by the encoded range key.

pub mod pruner;
pub mod schema;

/// A range partition's extent on the range-key axis. Empty bytes on either
/// side mean unbounded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct RangeBounds {
    pub(crate) lower: Vec<u8>,
    pub(crate) upper: Vec<u8>,
}

impl RangeBounds {
    pub(crate) fn is_unbounded(&self) -> bool {
        self.lower.is_empty() && self.upper.is_empty()
    }
}

/// A half-open partition-key interval `[start, end)`. An empty `end` means
/// unbounded above.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PartitionKeyRange {
    pub(crate) start: Vec<u8>,
    pub(crate) end: Vec<u8>,
}

/// One tablet's extent in the partition space.
///
/// `partition_key_start`/`partition_key_end` bound the tablet on the full
/// partition-key axis; `range_key_start`/`range_key_end` are the range-key
/// portion alone. Empty bytes mean unbounded on that side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    hash_buckets: Vec<u32>,
    range_key_start: Vec<u8>,
    range_key_end: Vec<u8>,
    partition_key_start: Vec<u8>,
    partition_key_end: Vec<u8>,
}

impl Partition {
    /// Assemble a partition from its bucket assignment and bounds.
    pub fn new(
        hash_buckets: Vec<u32>,
        range_key_start: Vec<u8>,
        range_key_end: Vec<u8>,
        partition_key_start: Vec<u8>,
        partition_key_end: Vec<u8>,
    ) -> Self {
        Self {
            hash_buckets,
            range_key_start,
            range_key_end,
            partition_key_start,
            partition_key_end,
        }
    }

    /// Bucket ordinal per hash dimension.
    pub fn hash_buckets(&self) -> &[u32] {
        &self.hash_buckets
    }

    /// Inclusive range-key lower bound; empty means unbounded.
    pub fn range_key_start(&self) -> &[u8] {
        &self.range_key_start
    }

    /// Exclusive range-key upper bound; empty means unbounded.
    pub fn range_key_end(&self) -> &[u8] {
        &self.range_key_end
    }

    /// Inclusive partition-key lower bound; empty means unbounded.
    pub fn partition_key_start(&self) -> &[u8] {
        &self.partition_key_start
    }

    /// Exclusive partition-key upper bound; empty means unbounded.
    pub fn partition_key_end(&self) -> &[u8] {
        &self.partition_key_end
    }
}
