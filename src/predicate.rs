//! Column predicates as consumed by the planner.
//!
//! Predicates arrive here already simplified: one predicate per column, with
//! contradictions collapsed to [`ColumnPredicate::None`]. The constructors
//! normalize the degenerate forms so downstream code can rely on the variant
//! invariants (an in-list holds at least two sorted, distinct values; a range
//! has at least one bound and a non-empty extent).

use crate::value::Value;

/// A single-column predicate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnPredicate {
    /// The column equals exactly this value.
    Equality {
        /// The required value.
        value: Value,
    },
    /// The column equals one of these values, sorted ascending and distinct.
    InList {
        /// Accepted values.
        values: Vec<Value>,
    },
    /// The column falls in `[lower, upper)`. At least one bound is present.
    Range {
        /// Inclusive lower bound.
        lower: Option<Value>,
        /// Exclusive upper bound.
        upper: Option<Value>,
    },
    /// The column is non-null.
    IsNotNull,
    /// The column is null.
    IsNull,
    /// No row can satisfy the predicate.
    None,
}

impl ColumnPredicate {
    /// An equality predicate.
    pub fn equality(value: Value) -> Self {
        ColumnPredicate::Equality { value }
    }

    /// An in-list predicate over `values`, which must share one type.
    ///
    /// Values are sorted and deduplicated; an empty list collapses to
    /// [`ColumnPredicate::None`] and a single value to equality.
    pub fn in_list(mut values: Vec<Value>) -> Self {
        values.sort();
        values.dedup();
        match values.len() {
            0 => ColumnPredicate::None,
            1 => ColumnPredicate::Equality {
                value: values.into_iter().next().expect("list has one value"),
            },
            _ => ColumnPredicate::InList { values },
        }
    }

    /// A range predicate `[lower, upper)`.
    ///
    /// Both bounds absent collapses to [`ColumnPredicate::IsNotNull`]; an
    /// empty extent collapses to [`ColumnPredicate::None`].
    pub fn range(lower: Option<Value>, upper: Option<Value>) -> Self {
        match (&lower, &upper) {
            (None, None) => ColumnPredicate::IsNotNull,
            (Some(lo), Some(up)) if lo >= up => ColumnPredicate::None,
            _ => ColumnPredicate::Range { lower, upper },
        }
    }

    /// Whether the predicate restricts the column to an enumerable value set.
    pub fn is_discrete(&self) -> bool {
        matches!(
            self,
            ColumnPredicate::Equality { .. } | ColumnPredicate::InList { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::ColumnPredicate;
    use crate::value::Value;

    #[test]
    fn in_list_normalizes() {
        assert_eq!(ColumnPredicate::in_list(vec![]), ColumnPredicate::None);
        assert_eq!(
            ColumnPredicate::in_list(vec![Value::Int32(7)]),
            ColumnPredicate::Equality {
                value: Value::Int32(7)
            }
        );
        assert_eq!(
            ColumnPredicate::in_list(vec![Value::Int32(3), Value::Int32(1), Value::Int32(3)]),
            ColumnPredicate::InList {
                values: vec![Value::Int32(1), Value::Int32(3)]
            }
        );
    }

    #[test]
    fn range_normalizes() {
        assert_eq!(
            ColumnPredicate::range(None, None),
            ColumnPredicate::IsNotNull
        );
        assert_eq!(
            ColumnPredicate::range(Some(Value::Int32(5)), Some(Value::Int32(5))),
            ColumnPredicate::None
        );
        assert!(matches!(
            ColumnPredicate::range(Some(Value::Int32(0)), None),
            ColumnPredicate::Range { .. }
        ));
    }

    #[test]
    fn discreteness() {
        assert!(ColumnPredicate::equality(Value::Int32(0)).is_discrete());
        assert!(
            ColumnPredicate::in_list(vec![Value::Int32(0), Value::Int32(1)]).is_discrete()
        );
        assert!(!ColumnPredicate::range(Some(Value::Int32(0)), None).is_discrete());
        assert!(!ColumnPredicate::IsNotNull.is_discrete());
    }
}
