//! Column aggregate engine.
//!
//! Pure computation over already-loaded rows; it holds no state, so results
//! always reflect the rows passed in.

use crate::model::aggregate::{parse_numeric, AggregateOp, AggregateResult};
use crate::model::list::{Column, ColumnId, ListValidationError};
use crate::model::row::ListRow;

/// Computes `op` over the numeric cells of `column` across `rows`.
///
/// Returns `Ok(None)` when no cell parses as a number.
///
/// # Errors
/// - `NonNumericColumn` when `column` is not a `Number` column, regardless
///   of cell contents.
pub fn compute_column_aggregate(
    column: &Column,
    rows: &[ListRow],
    op: AggregateOp,
) -> Result<Option<AggregateResult>, ListValidationError> {
    if !column.is_numeric() {
        return Err(ListValidationError::NonNumericColumn {
            column_id: column.id,
            kind: column.kind,
        });
    }

    let values = numeric_values(column.id, rows);
    Ok(op.apply(&values).map(|value| AggregateResult {
        column_id: column.id,
        op,
        value,
        sample_count: values.len(),
    }))
}

/// Parsed values of one column in row order; unparseable and missing cells
/// are skipped.
pub fn numeric_values(column_id: ColumnId, rows: &[ListRow]) -> Vec<f64> {
    rows.iter()
        .filter_map(|row| row.cell(column_id))
        .filter_map(parse_numeric)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::compute_column_aggregate;
    use crate::model::aggregate::AggregateOp;
    use crate::model::list::{Column, ColumnKind, ListValidationError};
    use crate::model::row::ListRow;
    use uuid::Uuid;

    fn rows_with(column: &Column, values: &[&str]) -> Vec<ListRow> {
        let list_id = Uuid::new_v4();
        values
            .iter()
            .map(|value| {
                let mut row = ListRow::new(list_id);
                row.set_cell(column.id, *value);
                row
            })
            .collect()
    }

    #[test]
    fn unparseable_cells_are_excluded_not_zeroed() {
        let column = Column::new("Amount", ColumnKind::Number).unwrap();
        let mut rows = rows_with(&column, &["10", "20", "abc", ""]);
        rows.push(ListRow::new(Uuid::new_v4()));

        let expected = [
            (AggregateOp::Sum, 30.0),
            (AggregateOp::Average, 15.0),
            (AggregateOp::Min, 10.0),
            (AggregateOp::Max, 20.0),
        ];
        for (op, value) in expected {
            let result = compute_column_aggregate(&column, &rows, op)
                .unwrap()
                .expect("two numeric cells");
            assert_eq!(result.value, value, "{op:?}");
            assert_eq!(result.sample_count, 2);
        }
    }

    #[test]
    fn empty_numeric_set_is_not_computable() {
        let column = Column::new("Amount", ColumnKind::Number).unwrap();
        assert!(compute_column_aggregate(&column, &[], AggregateOp::Sum)
            .unwrap()
            .is_none());

        let rows = rows_with(&column, &["n/a", " "]);
        assert!(compute_column_aggregate(&column, &rows, AggregateOp::Max)
            .unwrap()
            .is_none());
    }

    #[test]
    fn text_columns_are_rejected_even_with_numeric_cells() {
        let column = Column::new("Note", ColumnKind::Text).unwrap();
        let rows = rows_with(&column, &["1", "2"]);
        let err = compute_column_aggregate(&column, &rows, AggregateOp::Sum).unwrap_err();
        assert_eq!(
            err,
            ListValidationError::NonNumericColumn {
                column_id: column.id,
                kind: ColumnKind::Text,
            }
        );
    }

    #[test]
    fn repeated_computation_is_bit_identical() {
        let column = Column::new("Amount", ColumnKind::Number).unwrap();
        let rows = rows_with(&column, &["0.1", "0.2", "0.3", "1e-3"]);
        let first = compute_column_aggregate(&column, &rows, AggregateOp::Average)
            .unwrap()
            .unwrap();
        let second = compute_column_aggregate(&column, &rows, AggregateOp::Average)
            .unwrap()
            .unwrap();
        assert_eq!(first.value.to_bits(), second.value.to_bits());
    }
}
