//! Partition pruning: computing and consuming the partition-key intervals a
//! scan must visit.
//!
//! The pruner hands partition key ranges to a scanner: the scanner reads the
//! inclusive start of the next tablet to visit through [`PartitionPruner::peek`]
//! and reports a consumed tablet by calling [`PartitionPruner::advance`] with
//! the tablet's exclusive upper bound. Partition keys are in the same encoded
//! form the partition schema routes rows with.

use std::collections::HashMap;

use crate::{
    key::{encode_segment, util as key_util, KeyRow},
    logging::{plan_debug, plan_trace},
    partition::{
        schema::{HashDimension, HashSchema, PartitionSchema},
        Partition, PartitionKeyRange, RangeBounds,
    },
    predicate::ColumnPredicate,
    scan_spec::ScanSpec,
    schema::{ColumnId, Schema},
    value::Value,
};

/// One range partition's bounds mapped to its surviving key ranges, stored in
/// descending start order so the next range to scan pops off the tail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct BoundedKeyRanges {
    pub(crate) range_bounds: RangeBounds,
    pub(crate) key_ranges: Vec<PartitionKeyRange>,
}

/// Computes the partition key ranges a scan must visit and iterates over them
/// as tablets are consumed.
///
/// Single-owner and single-threaded: [`PartitionPruner::init`] populates the
/// state, [`PartitionPruner::advance`] is the sole mutator, everything else
/// is a pure read.
#[derive(Debug, Default)]
pub struct PartitionPruner {
    entries: Vec<BoundedKeyRanges>,
}

impl PartitionPruner {
    /// An empty pruner; call [`PartitionPruner::init`] before iterating.
    pub fn new() -> Self {
        Self::default()
    }

    /// Initialize the pruner for a new scan. The scan spec must already be
    /// optimized; a short-circuiting scan spec yields an empty pruner.
    ///
    /// Example key-range sets for a table
    /// `t (a, b, c) PRIMARY KEY (a, b, c)` distributed by
    /// `RANGE (c), HASH (a) INTO 2 BUCKETS, HASH (b) INTO 3 BUCKETS`,
    /// assuming `hash(0) = 0` and `hash(2) = 2`:
    ///
    /// | predicates        | partition key ranges                                     |
    /// |-------------------|----------------------------------------------------------|
    /// | `a=0, b=2, c=0`   | `[(0, 2, c=0), (0, 2, c=1))`                             |
    /// | `a=0, b=2`        | `[(0, 2), (0, 3))`                                       |
    /// | `a=0, c=0`        | one range per bucket of `b`                              |
    /// | `b=2, c=0`        | one range per bucket of `a`                              |
    /// | `a=0`             | `[(0), (1))`                                             |
    /// | none              | `[(), ())`                                               |
    ///
    /// The partition key is truncated after its final constrained component,
    /// and when that component is a hash bucket the upper bound's bucket is
    /// incremented to make the bound exclusive. Every unconstrained hash
    /// dimension before the final constrained component multiplies the number
    /// of ranges by its bucket count; that product is deliberately uncapped,
    /// since heavily hash-partitioned tables benefit the most from pruning.
    pub fn init(
        &mut self,
        schema: &Schema,
        partition_schema: &PartitionSchema,
        scan_spec: &ScanSpec,
    ) {
        self.entries.clear();

        // A short-circuiting scan spec needs no pruning, and lets us assume
        // the scan spec's invariants below: no None predicates, lower PK
        // bound below the upper.
        if scan_spec.can_short_circuit() {
            return;
        }

        // Build the range portion of the partition key from the bounds the
        // scan imposes on the range columns.
        let range_columns = partition_schema.range_schema();
        let (scan_range_lower, scan_range_upper) = if range_columns.is_empty() {
            (Vec::new(), Vec::new())
        } else if range_columns_are_pk_prefix(schema, range_columns) {
            encode_range_keys_from_pk_bounds(schema, scan_spec, range_columns.len())
        } else {
            encode_range_keys_from_predicates(schema, scan_spec.predicates(), range_columns)
        };

        if partition_schema.ranges_with_hash_schemas().is_empty() {
            let mut key_ranges = construct_partition_key_ranges(
                schema,
                scan_spec,
                partition_schema.hash_schema(),
                &RangeBounds {
                    lower: scan_range_lower,
                    upper: scan_range_upper,
                },
            );
            // Reversed so ranges pop off the tail in ascending order.
            key_ranges.reverse();
            self.entries.push(BoundedKeyRanges {
                range_bounds: RangeBounds::default(),
                key_ranges,
            });
        } else {
            for range in partition_schema.ranges_with_hash_schemas() {
                if !range_overlaps_scan(range.lower.as_slice(), range.upper.as_slice(),
                                        &scan_range_lower, &scan_range_upper)
                {
                    continue;
                }
                // When the scan supplied no range bounds, prune within the
                // range partition's own extent; otherwise the scan's bounds
                // apply verbatim.
                let bounds = if scan_range_lower.is_empty() && scan_range_upper.is_empty() {
                    RangeBounds {
                        lower: range.lower.clone(),
                        upper: range.upper.clone(),
                    }
                } else {
                    RangeBounds {
                        lower: scan_range_lower.clone(),
                        upper: scan_range_upper.clone(),
                    }
                };
                let mut key_ranges =
                    construct_partition_key_ranges(schema, scan_spec, &range.hash_schema, &bounds);
                key_ranges.reverse();
                self.entries.push(BoundedKeyRanges {
                    range_bounds: RangeBounds {
                        lower: range.lower.clone(),
                        upper: range.upper.clone(),
                    },
                    key_ranges,
                });
            }
        }

        if !scan_spec.lower_bound_partition_key().is_empty() {
            let lower = scan_spec.lower_bound_partition_key().to_vec();
            self.advance(&lower);
        }

        plan_debug!(
            "pruner_init",
            "entries={} ranges={}",
            self.entries.len(),
            self.num_ranges_remaining(),
        );
    }

    /// Whether any partition key ranges remain to scan.
    pub fn has_more(&self) -> bool {
        self.num_ranges_remaining() != 0
    }

    /// The inclusive lower bound partition key of the next tablet to scan.
    ///
    /// # Panics
    ///
    /// Panics when no ranges remain; check [`PartitionPruner::has_more`]
    /// first.
    pub fn peek(&self) -> &[u8] {
        self.entries
            .iter()
            .rev()
            .find_map(|entry| entry.key_ranges.last())
            .map(|range| range.start.as_slice())
            .expect("no partition key ranges remain")
    }

    /// Remove every portion of every range below the exclusive `upper_bound`.
    /// An empty bound drains the pruner.
    pub fn advance(&mut self, upper_bound: &[u8]) {
        if upper_bound.is_empty() {
            self.entries.clear();
            plan_trace!("pruner_advance", "drained");
            return;
        }

        for entry in &mut self.entries {
            let key_ranges = &mut entry.key_ranges;
            while let Some(last) = key_ranges.last_mut() {
                if upper_bound <= last.start.as_slice() {
                    break;
                }
                if last.end.is_empty() || upper_bound < last.end.as_slice() {
                    last.start = upper_bound.to_vec();
                    break;
                }
                key_ranges.pop();
            }
        }
        plan_trace!(
            "pruner_advance",
            "ranges_remaining={}",
            self.num_ranges_remaining(),
        );
    }

    /// Whether the partition overlaps no surviving key range and can be
    /// skipped by the scan.
    pub fn should_prune(&self, partition: &Partition) -> bool {
        for entry in &self.entries {
            // Check whether the partition belongs to the same range as this
            // entry's key ranges. A bounded entry is skipped only when both
            // of the partition's range-key bounds mismatch; a single-sided
            // match keeps the entry under consideration. This errs toward
            // consulting the key ranges of a foreign partition, never toward
            // skipping a live one.
            let bounds = &entry.range_bounds;
            if !bounds.lower.is_empty()
                && partition.range_key_start() != bounds.lower.as_slice()
                && !bounds.upper.is_empty()
                && partition.range_key_end() != bounds.upper.as_slice()
            {
                continue;
            }

            // Index of the first range, in ascending order from the tail,
            // that overlaps or lies above the partition. Ranges are stored
            // descending, so the candidates form a prefix of the vector.
            let boundary = entry.key_ranges.partition_point(|range| {
                range.end.is_empty() || range.end.as_slice() > partition.partition_key_start()
            });
            if boundary == 0 {
                continue;
            }
            let candidate = &entry.key_ranges[boundary - 1];
            if partition.partition_key_end().is_empty()
                || partition.partition_key_end() > candidate.start.as_slice()
            {
                return false;
            }
        }
        true
    }

    /// Number of partition key ranges remaining in the scan.
    pub fn num_ranges_remaining(&self) -> usize {
        self.entries
            .iter()
            .map(|entry| entry.key_ranges.len())
            .sum()
    }

    /// Text form of the remaining ranges in ascending scan order, suitable
    /// for debug printing.
    pub fn debug_string(&self, schema: &Schema, partition_schema: &PartitionSchema) -> String {
        let mut pieces = Vec::new();
        for entry in &self.entries {
            for range in entry.key_ranges.iter().rev() {
                let start = if range.start.is_empty() {
                    "<start>".to_string()
                } else {
                    partition_schema.partition_key_debug_string(schema, &range.start)
                };
                let end = if range.end.is_empty() {
                    "<end>".to_string()
                } else {
                    partition_schema.partition_key_debug_string(schema, &range.end)
                };
                pieces.push(format!("[({start}), ({end}))"));
            }
        }
        pieces.join(", ")
    }
}

/// Whether the partition schema's range columns are a prefix of the primary
/// key columns.
fn range_columns_are_pk_prefix(schema: &Schema, range_columns: &[ColumnId]) -> bool {
    assert!(
        range_columns.len() <= schema.num_key_columns(),
        "more range columns than key columns"
    );
    range_columns
        .iter()
        .enumerate()
        .all(|(idx, id)| schema.column_id(idx) == *id)
}

/// Translate the scan's primary-key bounds into range keys. Only valid when
/// the range columns are a prefix of the primary key columns.
fn encode_range_keys_from_pk_bounds(
    schema: &Schema,
    scan_spec: &ScanSpec,
    num_range_columns: usize,
) -> (Vec<u8>, Vec<u8>) {
    let mut range_key_start = Vec::new();
    let mut range_key_end = Vec::new();
    if scan_spec.lower_bound_key().is_none() && scan_spec.exclusive_upper_bound_key().is_none() {
        return (range_key_start, range_key_end);
    }

    if num_range_columns == schema.num_key_columns() {
        // The range columns are the primary key columns, so the range key is
        // the primary key.
        if let Some(lower) = scan_spec.lower_bound_key() {
            range_key_start = lower.encoded().to_vec();
        }
        if let Some(upper) = scan_spec.exclusive_upper_bound_key() {
            range_key_end = upper.encoded().to_vec();
        }
        return (range_key_start, range_key_end);
    }

    // The range columns are a proper prefix of the primary key columns. Copy
    // the prefix cells over to a row and encode the row as a range key.
    let col_idxs: Vec<usize> = (0..num_range_columns).collect();

    if let Some(lower) = scan_spec.lower_bound_key() {
        let mut row = KeyRow::new(schema);
        for &idx in &col_idxs {
            row.set_cell(idx, lower.values()[idx].clone());
        }
        key_util::encode_key_cells(&row, &col_idxs, &mut range_key_start);
    }

    if let Some(upper) = scan_spec.exclusive_upper_bound_key() {
        let mut row = KeyRow::new(schema);
        for &idx in &col_idxs {
            row.set_cell(idx, upper.values()[idx].clone());
        }
        // When the primary-key columns beyond the range prefix are all at
        // their minimum, the truncated prefix is already an exclusive bound.
        // Otherwise increment it from inclusive to exclusive; a prefix
        // already at its maximum leaves the range key unbounded above.
        let min_suffix = upper.values()[num_range_columns..]
            .iter()
            .all(Value::is_min);
        if min_suffix || key_util::increment_key(&mut row, &col_idxs) {
            key_util::encode_key_cells(&row, &col_idxs, &mut range_key_end);
        }
    }

    (range_key_start, range_key_end)
}

/// Push the scan predicates on the range columns into range keys.
fn encode_range_keys_from_predicates(
    schema: &Schema,
    predicates: &HashMap<String, ColumnPredicate>,
    range_columns: &[ColumnId],
) -> (Vec<u8>, Vec<u8>) {
    let col_idxs: Vec<usize> = range_columns
        .iter()
        .map(|id| {
            let idx = schema
                .find_column_by_id(*id)
                .unwrap_or_else(|| panic!("range column id {id} resolves in the schema"));
            assert!(
                idx < schema.num_key_columns(),
                "range column id {id} is not a key column"
            );
            idx
        })
        .collect();

    let mut range_key_start = Vec::new();
    let mut range_key_end = Vec::new();

    let mut row = KeyRow::new(schema);
    if key_util::push_lower_bound_key_predicates(&col_idxs, predicates, &mut row) > 0 {
        key_util::encode_key_cells(&row, &col_idxs, &mut range_key_start);
    }

    let mut row = KeyRow::new(schema);
    if key_util::push_upper_bound_key_predicates(&col_idxs, predicates, &mut row) > 0 {
        key_util::encode_key_cells(&row, &col_idxs, &mut range_key_end);
    }

    (range_key_start, range_key_end)
}

/// Whether the range partition `[lower, upper)` overlaps the scan's range
/// bounds `[scan_lower, scan_upper)`.
fn range_overlaps_scan(
    lower: &[u8],
    upper: &[u8],
    scan_lower: &[u8],
    scan_upper: &[u8],
) -> bool {
    (scan_lower.is_empty() || upper.is_empty() || scan_lower < upper)
        && (scan_upper.is_empty() || scan_upper > lower)
}

/// Bucket bitset for one hash dimension: the buckets reachable from the
/// cartesian product of the equality and in-list predicate values across the
/// dimension's columns.
///
/// # Panics
///
/// Panics when a column of the dimension lacks an equality or in-list
/// predicate; callers assert eligibility first.
fn prune_hash_component(
    hash_dimension: &HashDimension,
    schema: &Schema,
    scan_spec: &ScanSpec,
) -> Vec<bool> {
    let mut bitset = vec![false; hash_dimension.num_buckets as usize];
    let mut encoded_columns: Vec<Vec<u8>> = vec![Vec::new()];
    for (col_offset, column_id) in hash_dimension.column_ids.iter().enumerate() {
        let column = schema
            .column_by_id(*column_id)
            .unwrap_or_else(|| panic!("hash column id {column_id} resolves in the schema"));
        let predicate = scan_spec
            .predicates()
            .get(column.name())
            .unwrap_or_else(|| panic!("prunable hash column {} has a predicate", column.name()));
        let values: Vec<&Value> = match predicate {
            ColumnPredicate::Equality { value } => vec![value],
            ColumnPredicate::InList { values } => values.iter().collect(),
            _ => panic!(
                "prunable hash column {} requires an equality or in-list predicate",
                column.name()
            ),
        };

        // Replicate every encoding built so far by the number of predicate
        // values for this column.
        let is_last = col_offset + 1 == hash_dimension.column_ids.len();
        let mut next = Vec::with_capacity(encoded_columns.len() * values.len());
        for prefix in &encoded_columns {
            for value in &values {
                let mut encoded = prefix.clone();
                encode_segment(value, is_last, &mut encoded);
                next.push(encoded);
            }
        }
        encoded_columns = next;
    }
    for encoded in &encoded_columns {
        let bucket = PartitionSchema::hash_bucket(encoded, hash_dimension);
        bitset[bucket as usize] = true;
    }
    bitset
}

/// Construct the set of partition key ranges for one hash schema and one pair
/// of range bounds, clipped to the scan's upper-bound partition key.
fn construct_partition_key_ranges(
    schema: &Schema,
    scan_spec: &ScanSpec,
    hash_schema: &HashSchema,
    range_bounds: &RangeBounds,
) -> Vec<PartitionKeyRange> {
    // Bucket bitsets per hash dimension; all-true when the dimension's
    // columns are not fully covered by equality or in-list predicates.
    let mut bitsets: Vec<Vec<bool>> = Vec::with_capacity(hash_schema.len());
    for hash_dimension in hash_schema {
        let can_prune = hash_dimension.column_ids.iter().all(|id| {
            let column = schema
                .column_by_id(*id)
                .unwrap_or_else(|| panic!("hash column id {id} resolves in the schema"));
            scan_spec
                .predicates()
                .get(column.name())
                .is_some_and(ColumnPredicate::is_discrete)
        });
        if can_prune {
            bitsets.push(prune_hash_component(hash_dimension, schema, scan_spec));
        } else {
            bitsets.push(vec![true; hash_dimension.num_buckets as usize]);
        }
    }

    // Index of the final constrained component in the partition key: all of
    // the hash schema when the range is constrained, otherwise one past the
    // rightmost dimension with an excluded bucket.
    let constrained_index = if !range_bounds.is_unbounded() {
        hash_schema.len()
    } else {
        bitsets
            .iter()
            .rposition(|bitset| bitset.contains(&false))
            .map_or(0, |idx| idx + 1)
    };

    // Expand the hash prefixes. Each dimension appends its bucket ordinal to
    // every range built so far; the final constrained bucket is incremented
    // on the upper bound to make it exclusive, unless the range bounds
    // provide the exclusivity.
    let mut key_ranges = vec![PartitionKeyRange {
        start: Vec::new(),
        end: Vec::new(),
    }];
    for (hash_idx, bitset) in bitsets.iter().take(constrained_index).enumerate() {
        let is_last = hash_idx + 1 == constrained_index && range_bounds.upper.is_empty();
        let live_buckets = bitset.iter().filter(|set| **set).count();
        let mut next = Vec::with_capacity(key_ranges.len() * live_buckets);
        for key_range in &key_ranges {
            for (bucket, _) in bitset.iter().enumerate().filter(|(_, set)| **set) {
                let bucket = bucket as u32;
                let bucket_upper = if is_last { bucket + 1 } else { bucket };
                let mut start = key_range.start.clone();
                let mut end = key_range.end.clone();
                start.extend_from_slice(&bucket.to_be_bytes());
                end.extend_from_slice(&bucket_upper.to_be_bytes());
                next.push(PartitionKeyRange { start, end });
            }
        }
        key_ranges = next;
    }

    // Append the (possibly empty) range bounds.
    for key_range in &mut key_ranges {
        key_range.start.extend_from_slice(&range_bounds.lower);
        key_range.end.extend_from_slice(&range_bounds.upper);
    }

    // Clip everything past the scan's exclusive upper-bound partition key.
    let scan_upper = scan_spec.exclusive_upper_bound_partition_key();
    if !scan_upper.is_empty() {
        while let Some(last) = key_ranges.last_mut() {
            if !last.end.is_empty() && scan_upper >= last.end.as_slice() {
                break;
            }
            if scan_upper <= last.start.as_slice() {
                key_ranges.pop();
            } else {
                last.end = scan_upper.to_vec();
            }
        }
    }

    key_ranges
}
