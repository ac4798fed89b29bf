//! Composite-key encoding and key-bound construction.
//!
//! A composite key is the concatenation of its column segments in key-column
//! order. Segment bytes preserve the value order of each column, so whole
//! keys compare byte-lexicographically. The last segment of a key is encoded
//! in terminal form; earlier variable-length segments are escaped and
//! terminated so that no segment's bytes are a prefix of another's.

mod encoder;
mod row;
pub(crate) mod util;

use arrow_schema::DataType;
pub use encoder::{decode_segment, encode_segment};
pub(crate) use row::KeyRow;
use thiserror::Error;

use crate::{
    schema::Schema,
    value::{Value, ValueError},
};

/// Errors raised while encoding or decoding composite keys.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The value list does not match the schema's key columns.
    #[error("expected {expected} key values, got {actual}")]
    ValueCount {
        /// Number of key columns in the schema.
        expected: usize,
        /// Number of values provided.
        actual: usize,
    },
    /// A value's type does not match its key column.
    #[error("key column {column}: {source}")]
    ColumnType {
        /// Offending column name.
        column: String,
        /// Underlying type error.
        source: ValueError,
    },
    /// The encoded bytes ended inside a segment.
    #[error("truncated {data_type} segment")]
    TruncatedSegment {
        /// Type of the segment being decoded.
        data_type: DataType,
    },
    /// A non-terminal variable-length segment had no terminator.
    #[error("unterminated segment")]
    MissingTerminator,
    /// An escape sequence other than `00 01` followed a zero byte.
    #[error("invalid escape sequence in segment")]
    InvalidEscape,
    /// The type has no composite-key encoding.
    #[error(transparent)]
    Value(#[from] ValueError),
}

/// A full primary-key row together with its composite encoding.
///
/// Constructed through the schema so the two representations never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedKey {
    values: Vec<Value>,
    encoded: Vec<u8>,
}

impl EncodedKey {
    /// Build an encoded key from one value per key column.
    pub fn from_values(schema: &Schema, values: Vec<Value>) -> Result<Self, KeyError> {
        if values.len() != schema.num_key_columns() {
            return Err(KeyError::ValueCount {
                expected: schema.num_key_columns(),
                actual: values.len(),
            });
        }
        let mut encoded = Vec::new();
        for (idx, value) in values.iter().enumerate() {
            let column = schema.column(idx);
            if value.data_type() != *column.data_type() {
                return Err(KeyError::ColumnType {
                    column: column.name().to_string(),
                    source: ValueError::TypeMismatch {
                        expected: column.data_type().clone(),
                        actual: value.data_type(),
                    },
                });
            }
            encode_segment(value, idx + 1 == values.len(), &mut encoded);
        }
        Ok(EncodedKey { values, encoded })
    }

    /// The raw key cells, one per key column.
    pub fn values(&self) -> &[Value] {
        &self.values
    }

    /// The composite-key bytes.
    pub fn encoded(&self) -> &[u8] {
        &self.encoded
    }
}
