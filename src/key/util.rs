//! Folding predicates and bounds into composite keys.

use std::collections::HashMap;

use super::{encoder, KeyRow};
use crate::{predicate::ColumnPredicate, value::Value};

/// Append the composite encoding of the listed cells to `out`.
///
/// The final listed column is encoded in terminal form.
///
/// # Panics
///
/// Panics when any listed cell is unset.
pub(crate) fn encode_key_cells(row: &KeyRow<'_>, col_idxs: &[usize], out: &mut Vec<u8>) {
    for (offset, &idx) in col_idxs.iter().enumerate() {
        encoder::encode_segment(row.cell(idx), offset + 1 == col_idxs.len(), out);
    }
}

/// Fold predicates into an inclusive lower-bound row over `col_idxs`.
///
/// Equality values extend the bound to further columns; a range lower bound
/// or the smallest in-list value ends it. Returns the number of columns that
/// received a predicate value; zero means the predicates impose no lower
/// bound. On a non-zero return every listed column is filled, the remainder
/// with type minimums.
pub(crate) fn push_lower_bound_key_predicates(
    col_idxs: &[usize],
    predicates: &HashMap<String, ColumnPredicate>,
    row: &mut KeyRow<'_>,
) -> usize {
    let mut pushed = 0;
    for &idx in col_idxs {
        let column = row.schema().column(idx);
        let Some(predicate) = predicates.get(column.name()) else {
            break;
        };
        match predicate {
            ColumnPredicate::Equality { value } => {
                row.set_cell(idx, value.clone());
                pushed += 1;
            }
            ColumnPredicate::InList { values } => {
                let smallest = values.first().expect("in-list holds at least two values");
                row.set_cell(idx, smallest.clone());
                pushed += 1;
                break;
            }
            ColumnPredicate::Range { lower, .. } => {
                if let Some(lower) = lower {
                    row.set_cell(idx, lower.clone());
                    pushed += 1;
                }
                break;
            }
            _ => break,
        }
    }
    if pushed == 0 {
        return 0;
    }
    fill_minimums(row, &col_idxs[pushed..]);
    pushed
}

/// Fold predicates into an exclusive upper-bound row over `col_idxs`.
///
/// Equality values extend the bound; a range upper bound (already exclusive)
/// or the largest in-list value ends it. An inclusive fold is incremented to
/// its successor; if the prefix is already at its maximum the predicates
/// impose no upper bound and zero is returned. On a non-zero return every
/// listed column is filled, the remainder with type minimums.
pub(crate) fn push_upper_bound_key_predicates(
    col_idxs: &[usize],
    predicates: &HashMap<String, ColumnPredicate>,
    row: &mut KeyRow<'_>,
) -> usize {
    let mut pushed = 0;
    let mut inclusive = true;
    for &idx in col_idxs {
        let column = row.schema().column(idx);
        let Some(predicate) = predicates.get(column.name()) else {
            break;
        };
        match predicate {
            ColumnPredicate::Equality { value } => {
                row.set_cell(idx, value.clone());
                pushed += 1;
            }
            ColumnPredicate::InList { values } => {
                let largest = values.last().expect("in-list holds at least two values");
                row.set_cell(idx, largest.clone());
                pushed += 1;
                break;
            }
            ColumnPredicate::Range { upper, .. } => {
                if let Some(upper) = upper {
                    row.set_cell(idx, upper.clone());
                    pushed += 1;
                    inclusive = false;
                }
                break;
            }
            _ => break,
        }
    }
    if pushed == 0 {
        return 0;
    }
    if inclusive && !increment_key(row, &col_idxs[..pushed]) {
        return 0;
    }
    fill_minimums(row, &col_idxs[pushed..]);
    pushed
}

/// Replace the listed cells with the lexicographic successor of their tuple.
///
/// Works right to left: a cell that overflows resets to its minimum and
/// carries into the previous column. Returns `false` when every listed cell
/// overflows, i.e. the tuple was already the maximum.
pub(crate) fn increment_key(row: &mut KeyRow<'_>, col_idxs: &[usize]) -> bool {
    for &idx in col_idxs.iter().rev() {
        match row.cell(idx).incremented() {
            Some(next) => {
                row.set_cell(idx, next);
                return true;
            }
            None => {
                let data_type = row.schema().column(idx).data_type().clone();
                let min = Value::min_of(&data_type).expect("key column type is supported");
                row.set_cell(idx, min);
            }
        }
    }
    false
}

fn fill_minimums(row: &mut KeyRow<'_>, col_idxs: &[usize]) {
    for &idx in col_idxs {
        let data_type = row.schema().column(idx).data_type().clone();
        let min = Value::min_of(&data_type).expect("key column type is supported");
        row.set_cell(idx, min);
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use arrow_schema::DataType;

    use super::{
        encode_key_cells, increment_key, push_lower_bound_key_predicates,
        push_upper_bound_key_predicates,
    };
    use crate::{
        key::{encoder, KeyRow},
        predicate::ColumnPredicate,
        schema::{Schema, SchemaBuilder},
        value::Value,
    };

    fn abc_schema() -> Schema {
        SchemaBuilder::new()
            .key_column("a", DataType::Int32)
            .key_column("b", DataType::Int32)
            .key_column("c", DataType::Int32)
            .build()
            .unwrap()
    }

    fn encoded_row(schema: &Schema, values: &[i32]) -> Vec<u8> {
        let mut row = KeyRow::new(schema);
        for (idx, v) in values.iter().enumerate() {
            row.set_cell(idx, Value::Int32(*v));
        }
        let col_idxs: Vec<usize> = (0..values.len()).collect();
        let mut out = Vec::new();
        encode_key_cells(&row, &col_idxs, &mut out);
        out
    }

    #[test]
    fn lower_bound_from_equalities() {
        let schema = abc_schema();
        let mut predicates = HashMap::new();
        predicates.insert("a".to_string(), ColumnPredicate::equality(Value::Int32(1)));
        predicates.insert("b".to_string(), ColumnPredicate::equality(Value::Int32(2)));

        let mut row = KeyRow::new(&schema);
        let pushed = push_lower_bound_key_predicates(&[0, 1, 2], &predicates, &mut row);
        assert_eq!(pushed, 2);

        let mut out = Vec::new();
        encode_key_cells(&row, &[0, 1, 2], &mut out);
        assert_eq!(out, encoded_row(&schema, &[1, 2, i32::MIN]));
    }

    #[test]
    fn lower_bound_stops_at_range() {
        let schema = abc_schema();
        let mut predicates = HashMap::new();
        predicates.insert(
            "a".to_string(),
            ColumnPredicate::range(Some(Value::Int32(5)), None),
        );
        predicates.insert("b".to_string(), ColumnPredicate::equality(Value::Int32(9)));

        let mut row = KeyRow::new(&schema);
        let pushed = push_lower_bound_key_predicates(&[0, 1, 2], &predicates, &mut row);
        assert_eq!(pushed, 1);

        let mut out = Vec::new();
        encode_key_cells(&row, &[0, 1, 2], &mut out);
        assert_eq!(out, encoded_row(&schema, &[5, i32::MIN, i32::MIN]));
    }

    #[test]
    fn no_leading_predicate_means_unbounded() {
        let schema = abc_schema();
        let mut predicates = HashMap::new();
        predicates.insert("b".to_string(), ColumnPredicate::equality(Value::Int32(2)));

        let mut row = KeyRow::new(&schema);
        assert_eq!(
            push_lower_bound_key_predicates(&[0, 1, 2], &predicates, &mut row),
            0
        );
        let mut row = KeyRow::new(&schema);
        assert_eq!(
            push_upper_bound_key_predicates(&[0, 1, 2], &predicates, &mut row),
            0
        );
    }

    #[test]
    fn upper_bound_increments_equality_fold() {
        let schema = abc_schema();
        let mut predicates = HashMap::new();
        predicates.insert("a".to_string(), ColumnPredicate::equality(Value::Int32(1)));
        predicates.insert("b".to_string(), ColumnPredicate::equality(Value::Int32(2)));

        let mut row = KeyRow::new(&schema);
        let pushed = push_upper_bound_key_predicates(&[0, 1, 2], &predicates, &mut row);
        assert_eq!(pushed, 2);

        let mut out = Vec::new();
        encode_key_cells(&row, &[0, 1, 2], &mut out);
        assert_eq!(out, encoded_row(&schema, &[1, 3, i32::MIN]));
    }

    #[test]
    fn upper_bound_uses_exclusive_range_verbatim() {
        let schema = abc_schema();
        let mut predicates = HashMap::new();
        predicates.insert("a".to_string(), ColumnPredicate::equality(Value::Int32(1)));
        predicates.insert(
            "b".to_string(),
            ColumnPredicate::range(None, Some(Value::Int32(7))),
        );

        let mut row = KeyRow::new(&schema);
        let pushed = push_upper_bound_key_predicates(&[0, 1, 2], &predicates, &mut row);
        assert_eq!(pushed, 2);

        let mut out = Vec::new();
        encode_key_cells(&row, &[0, 1, 2], &mut out);
        assert_eq!(out, encoded_row(&schema, &[1, 7, i32::MIN]));
    }

    #[test]
    fn upper_bound_in_list_takes_largest_then_increments() {
        let schema = abc_schema();
        let mut predicates = HashMap::new();
        predicates.insert(
            "a".to_string(),
            ColumnPredicate::in_list(vec![Value::Int32(4), Value::Int32(2)]),
        );

        let mut row = KeyRow::new(&schema);
        let pushed = push_upper_bound_key_predicates(&[0, 1, 2], &predicates, &mut row);
        assert_eq!(pushed, 1);

        let mut out = Vec::new();
        encode_key_cells(&row, &[0, 1, 2], &mut out);
        assert_eq!(out, encoded_row(&schema, &[5, i32::MIN, i32::MIN]));
    }

    #[test]
    fn upper_bound_overflow_is_unbounded() {
        let schema = abc_schema();
        let mut predicates = HashMap::new();
        predicates.insert(
            "a".to_string(),
            ColumnPredicate::equality(Value::Int32(i32::MAX)),
        );

        let mut row = KeyRow::new(&schema);
        assert_eq!(
            push_upper_bound_key_predicates(&[0], &predicates, &mut row),
            0
        );
    }

    #[test]
    fn increment_carries_and_overflows() {
        let schema = abc_schema();
        let mut row = KeyRow::new(&schema);
        row.set_cell(0, Value::Int32(1));
        row.set_cell(1, Value::Int32(i32::MAX));
        assert!(increment_key(&mut row, &[0, 1]));
        assert_eq!(*row.cell(0), Value::Int32(2));
        assert_eq!(*row.cell(1), Value::Int32(i32::MIN));

        let mut row = KeyRow::new(&schema);
        row.set_cell(0, Value::Int32(i32::MAX));
        assert!(!increment_key(&mut row, &[0]));
    }

    #[test]
    fn terminal_segment_is_unterminated() {
        let schema = SchemaBuilder::new()
            .key_column("s", DataType::Utf8)
            .key_column("t", DataType::Utf8)
            .build()
            .unwrap();
        let mut row = KeyRow::new(&schema);
        row.set_cell(0, Value::from("x"));
        row.set_cell(1, Value::from("y"));

        let mut out = Vec::new();
        encode_key_cells(&row, &[0, 1], &mut out);

        let mut expected = Vec::new();
        encoder::encode_segment(&Value::from("x"), false, &mut expected);
        encoder::encode_segment(&Value::from("y"), true, &mut expected);
        assert_eq!(out, expected);
    }
}
