//! Partition schemas: hash bucketing over column groups plus range
//! partitioning on an ordered column prefix.
//!
//! The writer-side operations live here too: hashing encoded columns to a
//! bucket, encoding a row's partition key, and enumerating the partitions a
//! table materializes. The planner must produce byte-identical prefixes and
//! range keys to these, so they share one codec.

use std::io::Cursor;

use thiserror::Error;

use super::Partition;
use crate::{
    key::{decode_segment, encode_segment},
    schema::{ColumnId, Schema},
    value::{Value, ValueError},
};

/// One independent hash bucketing over an ordered column group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashDimension {
    /// Columns hashed together, in order.
    pub column_ids: Vec<ColumnId>,
    /// Number of buckets; at least two.
    pub num_buckets: u32,
    /// Seed mixed into the hash.
    pub seed: u32,
}

/// An ordered list of hash dimensions, possibly empty.
pub type HashSchema = Vec<HashDimension>;

/// A range partition with the hash schema effective inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RangeWithHashSchema {
    /// Inclusive encoded range-key lower bound; empty means unbounded.
    pub lower: Vec<u8>,
    /// Exclusive encoded range-key upper bound; empty means unbounded.
    pub upper: Vec<u8>,
    /// Hash schema for rows in `[lower, upper)`.
    pub hash_schema: HashSchema,
}

/// Errors raised while building or applying a [`PartitionSchema`].
#[derive(Debug, Error)]
pub enum PartitionError {
    /// A hash dimension listed no columns.
    #[error("hash dimension has no columns")]
    EmptyHashDimension,
    /// A hash dimension declared fewer than two buckets.
    #[error("hash dimension must have at least two buckets, got {0}")]
    TooFewBuckets(u32),
    /// A column id did not resolve against the schema.
    #[error("unknown column id {0}")]
    UnknownColumn(ColumnId),
    /// A hash or range column is not part of the primary key.
    #[error("column id {0} is not a key column")]
    NonKeyColumn(ColumnId),
    /// A column appeared twice within one hash dimension.
    #[error("column id {0} repeated within a hash dimension")]
    DuplicateHashColumn(ColumnId),
    /// A column appeared twice in the range schema.
    #[error("column id {0} repeated in range schema")]
    DuplicateRangeColumn(ColumnId),
    /// Per-range entries were unsorted or overlapping.
    #[error("range partitions must be ascending and non-overlapping")]
    RangeOverlap,
    /// Range splits were not strictly ascending.
    #[error("range splits must be strictly ascending")]
    SplitsOutOfOrder,
    /// Splits and per-range hash schemas are mutually exclusive.
    #[error("range splits cannot be combined with per-range hash schemas")]
    SplitsWithPerRangeSchemas,
    /// A row's range key fell outside every range partition.
    #[error("row's range key is not covered by any range partition")]
    NoRangeForRow,
    /// A range-key value list had the wrong arity.
    #[error("expected {expected} range-column values, got {actual}")]
    RangeValueCount {
        /// Number of range columns.
        expected: usize,
        /// Number of values provided.
        actual: usize,
    },
    /// A row did not cover the key columns.
    #[error("row must provide the {expected} key columns, got {actual} values")]
    RowValueCount {
        /// Number of key columns.
        expected: usize,
        /// Number of values provided.
        actual: usize,
    },
    /// A value's type did not match its column.
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// How a table's rows are distributed across tablets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSchema {
    range_schema: Vec<ColumnId>,
    hash_schema: HashSchema,
    ranges_with_hash_schemas: Vec<RangeWithHashSchema>,
}

impl PartitionSchema {
    /// Build a partition schema with a table-wide hash schema and a range
    /// schema over the listed columns.
    pub fn new(
        schema: &Schema,
        hash_schema: HashSchema,
        range_columns: Vec<ColumnId>,
    ) -> Result<Self, PartitionError> {
        validate_hash_schema(schema, &hash_schema)?;
        let mut seen = Vec::new();
        for id in &range_columns {
            if seen.contains(id) {
                return Err(PartitionError::DuplicateRangeColumn(*id));
            }
            seen.push(*id);
            check_key_column(schema, *id)?;
        }
        Ok(Self {
            range_schema: range_columns,
            hash_schema,
            ranges_with_hash_schemas: Vec::new(),
        })
    }

    /// Override the hash schema per range partition.
    ///
    /// Entries must be ascending by lower bound and non-overlapping; only the
    /// last entry may be unbounded above.
    pub fn with_per_range_hash_schemas(
        mut self,
        schema: &Schema,
        ranges: Vec<RangeWithHashSchema>,
    ) -> Result<Self, PartitionError> {
        for window in ranges.windows(2) {
            let prev = &window[0];
            let next = &window[1];
            if prev.upper.is_empty() || prev.upper > next.lower {
                return Err(PartitionError::RangeOverlap);
            }
        }
        for range in &ranges {
            if !range.upper.is_empty() && range.lower >= range.upper {
                return Err(PartitionError::RangeOverlap);
            }
            validate_hash_schema(schema, &range.hash_schema)?;
        }
        self.ranges_with_hash_schemas = ranges;
        Ok(self)
    }

    /// Range columns, in range-key order.
    pub fn range_schema(&self) -> &[ColumnId] {
        &self.range_schema
    }

    /// The table-wide hash schema.
    pub fn hash_schema(&self) -> &HashSchema {
        &self.hash_schema
    }

    /// Per-range hash schema overrides; empty when the table-wide schema
    /// applies everywhere.
    pub fn ranges_with_hash_schemas(&self) -> &[RangeWithHashSchema] {
        &self.ranges_with_hash_schemas
    }

    /// Bucket of already-encoded hash columns under `dimension`.
    pub fn hash_bucket(encoded_columns: &[u8], dimension: &HashDimension) -> u32 {
        let hash = murmur3::murmur3_32(&mut Cursor::new(encoded_columns), dimension.seed)
            .expect("reading from an in-memory buffer cannot fail");
        hash % dimension.num_buckets
    }

    /// Encode the range-key portion of a partition key from one value per
    /// range column. An empty value list encodes the unbounded key.
    pub fn encode_range_key(
        &self,
        schema: &Schema,
        values: &[Value],
    ) -> Result<Vec<u8>, PartitionError> {
        if values.is_empty() {
            return Ok(Vec::new());
        }
        if values.len() != self.range_schema.len() {
            return Err(PartitionError::RangeValueCount {
                expected: self.range_schema.len(),
                actual: values.len(),
            });
        }
        let mut out = Vec::new();
        for (offset, (id, value)) in self.range_schema.iter().zip(values).enumerate() {
            let column = schema
                .column_by_id(*id)
                .ok_or(PartitionError::UnknownColumn(*id))?;
            if value.data_type() != *column.data_type() {
                return Err(ValueError::TypeMismatch {
                    expected: column.data_type().clone(),
                    actual: value.data_type(),
                }
                .into());
            }
            encode_segment(value, offset + 1 == self.range_schema.len(), &mut out);
        }
        Ok(out)
    }

    /// Encode the partition key a row is routed to.
    ///
    /// `row` holds one value per schema column (key columns at least), in
    /// schema order. When per-range hash schemas are present the row's range
    /// key selects the effective hash schema.
    pub fn encode_partition_key(
        &self,
        schema: &Schema,
        row: &[Value],
    ) -> Result<Vec<u8>, PartitionError> {
        if row.len() < schema.num_key_columns() {
            return Err(PartitionError::RowValueCount {
                expected: schema.num_key_columns(),
                actual: row.len(),
            });
        }

        let range_values: Vec<Value> = self
            .range_schema
            .iter()
            .map(|id| {
                schema
                    .find_column_by_id(*id)
                    .map(|idx| row[idx].clone())
                    .ok_or(PartitionError::UnknownColumn(*id))
            })
            .collect::<Result<_, _>>()?;
        let range_key = self.encode_range_key(schema, &range_values)?;

        let hash_schema = self.hash_schema_for_range_key(&range_key)?;
        let mut key = Vec::new();
        for dimension in hash_schema {
            let mut encoded_columns = Vec::new();
            for (offset, id) in dimension.column_ids.iter().enumerate() {
                let idx = schema
                    .find_column_by_id(*id)
                    .ok_or(PartitionError::UnknownColumn(*id))?;
                let column = schema.column(idx);
                let value = &row[idx];
                if value.data_type() != *column.data_type() {
                    return Err(ValueError::TypeMismatch {
                        expected: column.data_type().clone(),
                        actual: value.data_type(),
                    }
                    .into());
                }
                encode_segment(
                    value,
                    offset + 1 == dimension.column_ids.len(),
                    &mut encoded_columns,
                );
            }
            let bucket = Self::hash_bucket(&encoded_columns, dimension);
            key.extend_from_slice(&bucket.to_be_bytes());
        }
        key.extend_from_slice(&range_key);
        Ok(key)
    }

    /// Enumerate the partitions the table materializes.
    ///
    /// With a table-wide hash schema, `splits` are rows of range-column
    /// values cutting the range axis; with per-range hash schemas the ranges
    /// come from the schema and `splits` must be empty. Partitions are
    /// emitted bucket-major so their keys ascend within each hash schema.
    pub fn create_partitions(
        &self,
        schema: &Schema,
        splits: &[Vec<Value>],
    ) -> Result<Vec<Partition>, PartitionError> {
        let mut partitions = Vec::new();
        if self.ranges_with_hash_schemas.is_empty() {
            let mut bounds = Vec::new();
            let mut encoded_splits = Vec::new();
            for split in splits {
                encoded_splits.push(self.encode_range_key(schema, split)?);
            }
            for window in encoded_splits.windows(2) {
                if window[0] >= window[1] {
                    return Err(PartitionError::SplitsOutOfOrder);
                }
            }
            let mut lower = Vec::new();
            for split in encoded_splits {
                bounds.push((lower.clone(), split.clone()));
                lower = split;
            }
            bounds.push((lower, Vec::new()));

            for buckets in bucket_combinations(&self.hash_schema) {
                for (lo, hi) in &bounds {
                    partitions.push(self.make_partition(&self.hash_schema, &buckets, lo, hi));
                }
            }
        } else {
            if !splits.is_empty() {
                return Err(PartitionError::SplitsWithPerRangeSchemas);
            }
            for range in &self.ranges_with_hash_schemas {
                for buckets in bucket_combinations(&range.hash_schema) {
                    partitions.push(self.make_partition(
                        &range.hash_schema,
                        &buckets,
                        &range.lower,
                        &range.upper,
                    ));
                }
            }
        }
        Ok(partitions)
    }

    /// Human-readable form of a possibly truncated partition key, formatted
    /// against the table-wide hash schema.
    pub fn partition_key_debug_string(&self, schema: &Schema, key: &[u8]) -> String {
        let mut input = key;
        let mut parts = Vec::new();
        for _ in &self.hash_schema {
            if input.len() < 4 {
                break;
            }
            let (bucket_bytes, rest) = input.split_at(4);
            let bucket = u32::from_be_bytes(bucket_bytes.try_into().expect("four bytes"));
            parts.push(bucket.to_string());
            input = rest;
        }
        for (offset, id) in self.range_schema.iter().enumerate() {
            if input.is_empty() {
                break;
            }
            let Some(column) = schema.column_by_id(*id) else {
                break;
            };
            let is_last = offset + 1 == self.range_schema.len();
            match decode_segment(column.data_type(), is_last, &mut input) {
                Ok(value) => parts.push(format!("{}={}", column.name(), value)),
                Err(_) => break,
            }
        }
        if !input.is_empty() {
            let hex: String = input.iter().map(|b| format!("{b:02x}")).collect();
            parts.push(format!("0x{hex}"));
        }
        parts.join(", ")
    }

    fn hash_schema_for_range_key(
        &self,
        range_key: &[u8],
    ) -> Result<&HashSchema, PartitionError> {
        if self.ranges_with_hash_schemas.is_empty() {
            return Ok(&self.hash_schema);
        }
        self.ranges_with_hash_schemas
            .iter()
            .find(|range| {
                range.lower.as_slice() <= range_key
                    && (range.upper.is_empty() || range_key < range.upper.as_slice())
            })
            .map(|range| &range.hash_schema)
            .ok_or(PartitionError::NoRangeForRow)
    }

    fn make_partition(
        &self,
        hash_schema: &HashSchema,
        buckets: &[u32],
        range_lower: &[u8],
        range_upper: &[u8],
    ) -> Partition {
        let mut start = encode_buckets(buckets);
        start.extend_from_slice(range_lower);

        let end = if !range_upper.is_empty() {
            let mut end = encode_buckets(buckets);
            end.extend_from_slice(range_upper);
            end
        } else {
            // The next bucket combination's first key; empty past the last.
            match increment_bucket_tuple(buckets, hash_schema) {
                Some(next) => encode_buckets(&next),
                None => Vec::new(),
            }
        };

        Partition::new(
            buckets.to_vec(),
            range_lower.to_vec(),
            range_upper.to_vec(),
            start,
            end,
        )
    }
}

fn validate_hash_schema(schema: &Schema, hash_schema: &HashSchema) -> Result<(), PartitionError> {
    for dimension in hash_schema {
        if dimension.column_ids.is_empty() {
            return Err(PartitionError::EmptyHashDimension);
        }
        if dimension.num_buckets < 2 {
            return Err(PartitionError::TooFewBuckets(dimension.num_buckets));
        }
        let mut seen = Vec::new();
        for id in &dimension.column_ids {
            if seen.contains(id) {
                return Err(PartitionError::DuplicateHashColumn(*id));
            }
            seen.push(*id);
            check_key_column(schema, *id)?;
        }
    }
    Ok(())
}

fn check_key_column(schema: &Schema, id: ColumnId) -> Result<(), PartitionError> {
    let idx = schema
        .find_column_by_id(id)
        .ok_or(PartitionError::UnknownColumn(id))?;
    if idx >= schema.num_key_columns() {
        return Err(PartitionError::NonKeyColumn(id));
    }
    Ok(())
}

fn bucket_combinations(hash_schema: &HashSchema) -> Vec<Vec<u32>> {
    let mut combos = vec![Vec::new()];
    for dimension in hash_schema {
        let mut next = Vec::with_capacity(combos.len() * dimension.num_buckets as usize);
        for combo in &combos {
            for bucket in 0..dimension.num_buckets {
                let mut extended = combo.clone();
                extended.push(bucket);
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

fn encode_buckets(buckets: &[u32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(buckets.len() * 4);
    for bucket in buckets {
        out.extend_from_slice(&bucket.to_be_bytes());
    }
    out
}

fn increment_bucket_tuple(buckets: &[u32], hash_schema: &HashSchema) -> Option<Vec<u32>> {
    let mut next = buckets.to_vec();
    for i in (0..next.len()).rev() {
        if next[i] + 1 < hash_schema[i].num_buckets {
            next[i] += 1;
            return Some(next);
        }
        next[i] = 0;
    }
    None
}
