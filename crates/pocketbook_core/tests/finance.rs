use pocketbook_core::db::open_db_in_memory;
use pocketbook_core::{
    expenses_by_category, monthly_overview, AssetCategory, CalendarDate, ErrorKind,
    FinanceService, FinanceServiceError, FinanceValidationError, MonthKey, NewTransaction,
    RepoError, SqliteFinanceRepository, TransactionKind,
};
use rusqlite::Connection;
use uuid::Uuid;

fn service(conn: &Connection) -> FinanceService<SqliteFinanceRepository<'_>> {
    FinanceService::new(SqliteFinanceRepository::try_new(conn).unwrap())
}

fn date(value: &str) -> CalendarDate {
    value.parse().unwrap()
}

fn month(value: &str) -> MonthKey {
    value.parse().unwrap()
}

fn record(
    service: &FinanceService<SqliteFinanceRepository<'_>>,
    kind: TransactionKind,
    value: f64,
    category: &str,
    on: &str,
) -> Uuid {
    service
        .record_transaction(&NewTransaction {
            kind,
            title: format!("{category} on {on}"),
            value,
            category: category.to_string(),
            date: date(on),
        })
        .unwrap()
        .id
}

#[test]
fn transactions_for_month_are_newest_first_and_bounded() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    record(&service, TransactionKind::Expense, 10.0, "Food", "2024-02-29");
    record(&service, TransactionKind::Expense, 20.0, "Food", "2024-03-01");
    record(&service, TransactionKind::Income, 500.0, "Salary", "2024-03-31");
    record(&service, TransactionKind::Expense, 30.0, "Food", "2024-04-01");

    let march = service.transactions_for_month(month("2024-03")).unwrap();
    let dates: Vec<_> = march.iter().map(|t| t.date.to_string()).collect();
    assert_eq!(dates, vec!["2024-03-31", "2024-03-01"]);

    let leap_day = service.transactions_on(date("2024-02-29")).unwrap();
    assert_eq!(leap_day.len(), 1);
    assert_eq!(leap_day[0].value, 10.0);
}

#[test]
fn invalid_transactions_are_validation_errors() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let err = service
        .record_transaction(&NewTransaction {
            kind: TransactionKind::Expense,
            title: "Refund".to_string(),
            value: -5.0,
            category: "Food".to_string(),
            date: date("2024-03-01"),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        FinanceServiceError::Validation(FinanceValidationError::InvalidAmount(_))
    ));
    assert_eq!(err.kind(), ErrorKind::Validation);

    let err = service
        .record_transaction(&NewTransaction {
            kind: TransactionKind::Income,
            title: "  ".to_string(),
            value: 5.0,
            category: "Gift".to_string(),
            date: date("2024-03-01"),
        })
        .unwrap_err();
    assert!(matches!(
        err,
        FinanceServiceError::Validation(FinanceValidationError::BlankTitle)
    ));

    assert!(service
        .transactions_for_month(month("2024-03"))
        .unwrap()
        .is_empty());
}

#[test]
fn deleted_transactions_disappear_and_unknown_ids_are_not_found() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let id = record(&service, TransactionKind::Expense, 12.0, "Fun", "2024-05-05");

    service.delete_transaction(id).unwrap();
    assert!(service.transactions_on(date("2024-05-05")).unwrap().is_empty());

    let err = service.delete_transaction(Uuid::new_v4()).unwrap_err();
    assert!(matches!(
        err,
        FinanceServiceError::NotFound {
            table: "transactions",
            ..
        }
    ));
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[test]
fn budget_upserts_by_month() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    let may = month("2024-05");

    assert_eq!(service.budget_for(may).unwrap(), None);
    service.set_budget(may, 1500.0).unwrap();
    service.set_budget(may, 1800.0).unwrap();

    let plan = service.budget_for(may).unwrap().unwrap();
    assert_eq!(plan.amount, 1800.0);
    assert_eq!(service.budget_for(month("2024-06")).unwrap(), None);

    let err = service.set_budget(may, f64::NAN).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn month_summary_compares_against_previous_calendar_month() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    record(&service, TransactionKind::Income, 2000.0, "Salary", "2023-12-28");
    record(&service, TransactionKind::Expense, 400.0, "Food", "2023-12-10");
    record(&service, TransactionKind::Income, 2500.0, "Salary", "2024-01-28");
    record(&service, TransactionKind::Expense, 300.0, "Food", "2024-01-03");
    record(&service, TransactionKind::Expense, 300.0, "Housing", "2024-01-01");
    service.set_budget(month("2024-01"), 1200.0).unwrap();

    let summary = service.month_summary(month("2024-01")).unwrap();

    assert_eq!(summary.totals.income, 2500.0);
    assert_eq!(summary.totals.expenses, 600.0);
    assert_eq!(summary.totals.net(), 1900.0);
    assert_eq!(summary.income_change_percent, 25.0);
    assert_eq!(summary.expenses_change_percent, 50.0);
    assert_eq!(summary.planned_budget, Some(1200.0));
    assert_eq!(summary.budget_used_percent, Some(50.0));
    assert_eq!(summary.net_worth, 0.0);
}

#[test]
fn month_summary_without_history_reports_full_increase() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    record(&service, TransactionKind::Income, 100.0, "Gift", "2024-07-04");

    let summary = service.month_summary(month("2024-07")).unwrap();

    assert_eq!(summary.income_change_percent, 100.0);
    assert_eq!(summary.expenses_change_percent, 100.0);
    assert_eq!(summary.planned_budget, None);
    assert_eq!(summary.budget_used_percent, None);
}

#[test]
fn net_worth_history_and_trend() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);

    let later = service
        .record_net_worth(
            date("2024-02-29"),
            &[
                AssetCategory::new("Savings", 1200.0),
                AssetCategory::new("Investments", 0.0),
            ],
        )
        .unwrap();
    let earlier = service
        .record_net_worth(date("2024-01-31"), &[AssetCategory::new("Savings", 1000.0)])
        .unwrap();
    assert_eq!(later.title, "Savings: $1200.00");

    let history = service.net_worth_history().unwrap();
    let ids: Vec<_> = history.iter().map(|entry| entry.id).collect();
    assert_eq!(ids, vec![earlier.id, later.id]);

    let trend = service.net_worth_trend().unwrap();
    assert_eq!(trend.current, 1200.0);
    assert_eq!(trend.previous, 1000.0);
    assert!((trend.change_percent - 20.0).abs() < 1e-9);

    assert_eq!(service.month_summary(month("2024-03")).unwrap().net_worth, 1200.0);

    service.delete_net_worth_entry(later.id).unwrap();
    let trend = service.net_worth_trend().unwrap();
    assert_eq!(trend.current, 1000.0);
    assert_eq!(trend.previous, 0.0);
    assert_eq!(trend.change_percent, 0.0);
}

#[test]
fn breakdowns_over_stored_transactions() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    record(&service, TransactionKind::Expense, 50.0, "Food", "2024-03-20");
    record(&service, TransactionKind::Expense, 900.0, "Housing", "2024-03-01");
    record(&service, TransactionKind::Income, 3000.0, "Salary", "2024-03-25");
    record(&service, TransactionKind::Expense, 25.0, "Food", "2024-03-02");

    let march = service.transactions_for_month(month("2024-03")).unwrap();
    let breakdown = expenses_by_category(&march);

    // Newest-first input: Food (03-20) appears before Housing (03-01).
    let categories: Vec<_> = breakdown
        .categories
        .iter()
        .map(|slice| (slice.category.as_str(), slice.total))
        .collect();
    assert_eq!(categories, vec![("Food", 75.0), ("Housing", 900.0)]);
    assert_eq!(breakdown.total, 975.0);

    let overview = monthly_overview(&march);
    assert_eq!(overview.len(), 1);
    assert_eq!(overview[0].month, month("2024-03"));
    assert_eq!(overview[0].income, 3000.0);
    assert_eq!(overview[0].expenses, 975.0);
}

#[test]
fn transaction_serializes_with_stored_field_names() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    record(&service, TransactionKind::Income, 10.0, "Gift", "2024-08-15");

    let stored = service.transactions_on(date("2024-08-15")).unwrap();
    let json = serde_json::to_value(&stored[0]).unwrap();

    assert_eq!(json["transaction_type"], "income");
    assert_eq!(json["date"], "2024-08-15");
    assert_eq!(json["category"], "Gift");
}

#[test]
fn corrupted_stored_transaction_is_a_store_failure() {
    let conn = open_db_in_memory().unwrap();
    let service = service(&conn);
    conn.execute(
        "INSERT INTO transactions (
            id, transaction_type, title, value, category, date, created_at
        ) VALUES (?1, 'expense', 'Groceries', -5.0, 'Food', '2024-05-10', 1);",
        [Uuid::new_v4().to_string()],
    )
    .unwrap();

    let err = service
        .transactions_for_month(month("2024-05"))
        .unwrap_err();
    assert!(matches!(
        err,
        FinanceServiceError::Repo(RepoError::InvalidData(_))
    ));
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);

    let err = service.month_summary(month("2024-05")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::StoreUnavailable);
}
