//! Owned scalar values for key cells and predicate operands.
//!
//! [`Value`] covers the column types that may participate in primary keys and
//! partition keys. Ordering between two values of the same type matches the
//! byte order of their composite-key encoding, which the planner relies on
//! when folding predicates into key bounds.

use std::{cmp::Ordering, fmt};

use arrow_schema::DataType;
use thiserror::Error;

/// Errors raised when values are used against an incompatible type.
#[derive(Debug, Error)]
pub enum ValueError {
    /// The value's type does not match the column's declared type.
    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        /// Declared column type.
        expected: DataType,
        /// Type of the provided value.
        actual: DataType,
    },
    /// The type cannot be used in a key or partition column.
    #[error("unsupported key type: {0}")]
    UnsupportedType(DataType),
}

/// A single owned cell value.
#[derive(Debug, Clone)]
pub enum Value {
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    String(String),
    Binary(Vec<u8>),
}

impl Value {
    /// Get the arrow data type of the value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int8(_) => DataType::Int8,
            Value::Int16(_) => DataType::Int16,
            Value::Int32(_) => DataType::Int32,
            Value::Int64(_) => DataType::Int64,
            Value::UInt8(_) => DataType::UInt8,
            Value::UInt16(_) => DataType::UInt16,
            Value::UInt32(_) => DataType::UInt32,
            Value::UInt64(_) => DataType::UInt64,
            Value::String(_) => DataType::Utf8,
            Value::Binary(_) => DataType::Binary,
        }
    }

    /// Whether `data_type` can appear in a primary-key or partition column.
    pub fn is_supported_key_type(data_type: &DataType) -> bool {
        matches!(
            data_type,
            DataType::Int8
                | DataType::Int16
                | DataType::Int32
                | DataType::Int64
                | DataType::UInt8
                | DataType::UInt16
                | DataType::UInt32
                | DataType::UInt64
                | DataType::Utf8
                | DataType::Binary
        )
    }

    /// The minimum value of a supported key type.
    pub fn min_of(data_type: &DataType) -> Result<Value, ValueError> {
        match data_type {
            DataType::Int8 => Ok(Value::Int8(i8::MIN)),
            DataType::Int16 => Ok(Value::Int16(i16::MIN)),
            DataType::Int32 => Ok(Value::Int32(i32::MIN)),
            DataType::Int64 => Ok(Value::Int64(i64::MIN)),
            DataType::UInt8 => Ok(Value::UInt8(u8::MIN)),
            DataType::UInt16 => Ok(Value::UInt16(u16::MIN)),
            DataType::UInt32 => Ok(Value::UInt32(u32::MIN)),
            DataType::UInt64 => Ok(Value::UInt64(u64::MIN)),
            DataType::Utf8 => Ok(Value::String(String::new())),
            DataType::Binary => Ok(Value::Binary(Vec::new())),
            other => Err(ValueError::UnsupportedType(other.clone())),
        }
    }

    /// Whether this value is the minimum of its type.
    pub fn is_min(&self) -> bool {
        match self {
            Value::Int8(v) => *v == i8::MIN,
            Value::Int16(v) => *v == i16::MIN,
            Value::Int32(v) => *v == i32::MIN,
            Value::Int64(v) => *v == i64::MIN,
            Value::UInt8(v) => *v == u8::MIN,
            Value::UInt16(v) => *v == u16::MIN,
            Value::UInt32(v) => *v == u32::MIN,
            Value::UInt64(v) => *v == u64::MIN,
            Value::String(v) => v.is_empty(),
            Value::Binary(v) => v.is_empty(),
        }
    }

    /// The smallest value strictly greater than this one, or `None` when the
    /// type has a maximum and this value is it.
    ///
    /// Variable-length values never overflow: appending a zero byte produces
    /// their immediate successor.
    pub fn incremented(&self) -> Option<Value> {
        match self {
            Value::Int8(v) => v.checked_add(1).map(Value::Int8),
            Value::Int16(v) => v.checked_add(1).map(Value::Int16),
            Value::Int32(v) => v.checked_add(1).map(Value::Int32),
            Value::Int64(v) => v.checked_add(1).map(Value::Int64),
            Value::UInt8(v) => v.checked_add(1).map(Value::UInt8),
            Value::UInt16(v) => v.checked_add(1).map(Value::UInt16),
            Value::UInt32(v) => v.checked_add(1).map(Value::UInt32),
            Value::UInt64(v) => v.checked_add(1).map(Value::UInt64),
            Value::String(v) => {
                let mut next = v.clone();
                next.push('\0');
                Some(Value::String(next))
            }
            Value::Binary(v) => {
                let mut next = v.clone();
                next.push(0);
                Some(Value::Binary(next))
            }
        }
    }
}

impl Eq for Value {}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Int8(a), Value::Int8(b)) => a.eq(b),
            (Value::Int16(a), Value::Int16(b)) => a.eq(b),
            (Value::Int32(a), Value::Int32(b)) => a.eq(b),
            (Value::Int64(a), Value::Int64(b)) => a.eq(b),
            (Value::UInt8(a), Value::UInt8(b)) => a.eq(b),
            (Value::UInt16(a), Value::UInt16(b)) => a.eq(b),
            (Value::UInt32(a), Value::UInt32(b)) => a.eq(b),
            (Value::UInt64(a), Value::UInt64(b)) => a.eq(b),
            (Value::String(a), Value::String(b)) => a.eq(b),
            (Value::Binary(a), Value::Binary(b)) => a.eq(b),
            _ => false,
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    /// # Panics
    ///
    /// Panics when comparing values of different types.
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Value::Int8(a), Value::Int8(b)) => a.cmp(b),
            (Value::Int16(a), Value::Int16(b)) => a.cmp(b),
            (Value::Int32(a), Value::Int32(b)) => a.cmp(b),
            (Value::Int64(a), Value::Int64(b)) => a.cmp(b),
            (Value::UInt8(a), Value::UInt8(b)) => a.cmp(b),
            (Value::UInt16(a), Value::UInt16(b)) => a.cmp(b),
            (Value::UInt32(a), Value::UInt32(b)) => a.cmp(b),
            (Value::UInt64(a), Value::UInt64(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Binary(a), Value::Binary(b)) => a.cmp(b),
            _ => panic!("cannot compare different types: {self:?} and {other:?}"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int8(v) => write!(f, "{v}"),
            Value::Int16(v) => write!(f, "{v}"),
            Value::Int32(v) => write!(f, "{v}"),
            Value::Int64(v) => write!(f, "{v}"),
            Value::UInt8(v) => write!(f, "{v}"),
            Value::UInt16(v) => write!(f, "{v}"),
            Value::UInt32(v) => write!(f, "{v}"),
            Value::UInt64(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v:?}"),
            Value::Binary(v) => {
                write!(f, "0x")?;
                for byte in v {
                    write!(f, "{byte:02x}")?;
                }
                Ok(())
            }
        }
    }
}

macro_rules! impl_value_from {
    ($($native:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$native> for Value {
                fn from(v: $native) -> Self {
                    Value::$variant(v)
                }
            }
        )*
    };
}

impl_value_from!(
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    String => String,
    Vec<u8> => Binary,
);

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

#[cfg(test)]
mod tests {
    use arrow_schema::DataType;

    use super::Value;

    #[test]
    fn min_values_report_is_min() {
        for data_type in [
            DataType::Int8,
            DataType::Int32,
            DataType::UInt64,
            DataType::Utf8,
            DataType::Binary,
        ] {
            let min = Value::min_of(&data_type).unwrap();
            assert!(min.is_min(), "{data_type} minimum should be minimal");
            assert_eq!(min.data_type(), data_type);
        }
    }

    #[test]
    fn increment_fixed_width() {
        assert_eq!(Value::Int32(41).incremented(), Some(Value::Int32(42)));
        assert_eq!(Value::Int32(i32::MAX).incremented(), None);
        assert_eq!(Value::UInt8(u8::MAX).incremented(), None);
    }

    #[test]
    fn increment_variable_width_appends_zero() {
        let next = Value::String("ab".into()).incremented().unwrap();
        assert_eq!(next, Value::String("ab\0".into()));
        let next = Value::Binary(vec![0xff]).incremented().unwrap();
        assert_eq!(next, Value::Binary(vec![0xff, 0x00]));
    }

    #[test]
    fn ordering_within_type() {
        assert!(Value::Int32(-1) < Value::Int32(0));
        assert!(Value::String("a".into()) < Value::String("a\0".into()));
    }

    #[test]
    fn unsupported_min_errors() {
        assert!(Value::min_of(&DataType::Float64).is_err());
    }
}
