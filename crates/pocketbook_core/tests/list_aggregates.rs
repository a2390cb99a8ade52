use pocketbook_core::db::open_db_in_memory;
use pocketbook_core::{
    AggregateOp, ColumnKind, ErrorKind, ListService, ListServiceError, ListValidationError,
    SqliteListRepository, SqliteRowRepository,
};
use rusqlite::Connection;
use uuid::Uuid;

fn service(conn: &Connection) -> ListService<SqliteListRepository<'_>, SqliteRowRepository<'_>> {
    ListService::new(
        SqliteListRepository::try_new(conn).unwrap(),
        SqliteRowRepository::try_new(conn).unwrap(),
    )
}

#[test]
fn aggregates_skip_unparseable_cells() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let list = service.create_list("Expenses").unwrap();
    let amount = service.add_column(list.id, "Amount", ColumnKind::Number).unwrap();
    for value in ["10", "20", "abc", ""] {
        service.add_row_with_cells(list.id, [(amount.id, value)]).unwrap();
    }
    service.add_row(list.id).unwrap();

    let cases = [
        (AggregateOp::Sum, 30.0),
        (AggregateOp::Average, 15.0),
        (AggregateOp::Min, 10.0),
        (AggregateOp::Max, 20.0),
    ];
    for (op, expected) in cases {
        let result = service
            .compute_aggregate(list.id, amount.id, op)
            .unwrap()
            .unwrap();
        assert_eq!(result.value, expected, "{}", op.as_str());
        assert_eq!(result.column_id, amount.id);
        assert_eq!(result.op, op);
        assert_eq!(result.sample_count, 2);
    }
}

#[test]
fn aggregate_is_none_without_numeric_values() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let list = service.create_list("Expenses").unwrap();
    let amount = service.add_column(list.id, "Amount", ColumnKind::Number).unwrap();

    for op in AggregateOp::ALL {
        assert_eq!(service.compute_aggregate(list.id, amount.id, op).unwrap(), None);
    }

    for value in ["n/a", "", "."] {
        service.add_row_with_cells(list.id, [(amount.id, value)]).unwrap();
    }
    for op in AggregateOp::ALL {
        assert_eq!(service.compute_aggregate(list.id, amount.id, op).unwrap(), None);
    }
}

#[test]
fn text_column_aggregate_is_validation_error() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let list = service.create_list("Expenses").unwrap();
    let note = service.add_column(list.id, "Note", ColumnKind::Text).unwrap();
    service.add_row_with_cells(list.id, [(note.id, "12")]).unwrap();

    let err = service
        .compute_aggregate(list.id, note.id, AggregateOp::Sum)
        .unwrap_err();

    assert!(matches!(
        err,
        ListServiceError::Validation(ListValidationError::NonNumericColumn { .. })
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn aggregate_on_unknown_list_or_column_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let list = service.create_list("Expenses").unwrap();
    let amount = service.add_column(list.id, "Amount", ColumnKind::Number).unwrap();

    let err = service
        .compute_aggregate(Uuid::new_v4(), amount.id, AggregateOp::Sum)
        .unwrap_err();
    assert!(matches!(err, ListServiceError::ListNotFound(_)));

    let err = service
        .compute_aggregate(list.id, Uuid::new_v4(), AggregateOp::Sum)
        .unwrap_err();
    assert!(matches!(err, ListServiceError::ColumnNotFound { .. }));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn aggregate_reflects_writes_immediately() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let list = service.create_list("Expenses").unwrap();
    let amount = service.add_column(list.id, "Amount", ColumnKind::Number).unwrap();
    let row = service.add_row_with_cells(list.id, [(amount.id, "5")]).unwrap();
    let extra = service.add_row_with_cells(list.id, [(amount.id, "100")]).unwrap();

    let sum = || {
        service
            .compute_aggregate(list.id, amount.id, AggregateOp::Sum)
            .unwrap()
            .map(|result| result.value)
    };
    assert_eq!(sum(), Some(105.0));

    service.set_cell_value(row.id, amount.id, "7").unwrap();
    assert_eq!(sum(), Some(107.0));

    service.delete_row(extra.id).unwrap();
    assert_eq!(sum(), Some(7.0));
}

#[test]
fn foreign_cells_do_not_leak_into_aggregates() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let list = service.create_list("Expenses").unwrap();
    let amount = service.add_column(list.id, "Amount", ColumnKind::Number).unwrap();
    let row = service.add_row_with_cells(list.id, [(amount.id, "3")]).unwrap();
    service
        .set_cell_value(row.id, Uuid::new_v4(), "1000")
        .unwrap();

    let result = service
        .compute_aggregate(list.id, amount.id, AggregateOp::Max)
        .unwrap()
        .unwrap();
    assert_eq!(result.value, 3.0);
}

#[test]
fn column_summaries_join_columns_with_aggregates() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let list = service.create_list("Trip").unwrap();
    let item = service.add_column(list.id, "Item", ColumnKind::Text).unwrap();
    let cost = service.add_column(list.id, "Cost", ColumnKind::Number).unwrap();
    let tip = service.add_column(list.id, "Tip", ColumnKind::Number).unwrap();
    service
        .add_row_with_cells(list.id, [(item.id, "Hotel"), (cost.id, "250.5")])
        .unwrap();
    service
        .add_row_with_cells(list.id, [(item.id, "Taxi"), (cost.id, "-0.5e1")])
        .unwrap();

    let summaries = service.column_summaries(list.id, AggregateOp::Sum).unwrap();

    let columns: Vec<_> = summaries.iter().map(|s| s.column.id).collect();
    assert_eq!(columns, vec![item.id, cost.id, tip.id]);
    assert_eq!(summaries[0].aggregate, None);
    assert_eq!(summaries[1].aggregate.as_ref().map(|a| a.value), Some(245.5));
    assert_eq!(summaries[2].aggregate, None);

    let json = serde_json::to_value(&summaries[1]).unwrap();
    assert_eq!(json["column"]["type"], "number");
    assert_eq!(json["aggregate"]["op"], "sum");
}
