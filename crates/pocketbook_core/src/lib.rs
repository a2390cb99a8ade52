//! Core domain logic for Pocketbook.
//! This crate is the single source of truth for list and finance invariants.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use db::{open_db, open_db_in_memory, DbError, DbResult, DbTarget};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::aggregate::{parse_numeric, AggregateOp, AggregateResult};
pub use model::calendar::{CalendarDate, CalendarError, MonthKey};
pub use model::finance::{
    AssetCategory, BudgetPlan, FinanceValidationError, NetWorthEntry, NetWorthEntryId,
    Transaction, TransactionId, TransactionKind,
};
pub use model::list::{Column, ColumnId, ColumnKind, FinancialList, ListId, ListValidationError};
pub use model::row::{ListRow, RowId};
pub use repo::finance_repo::{FinanceRepository, SqliteFinanceRepository};
pub use repo::list_repo::{ListRepository, SqliteListRepository};
pub use repo::row_repo::{RowRepository, SqliteRowRepository};
pub use repo::{RepoError, RepoResult};
pub use service::finance_service::{
    expenses_by_category, monthly_overview, percent_change, CategoryBreakdown, CategoryTotal,
    FinanceService, FinanceServiceError, MonthSummary, MonthlyTotals, NetWorthTrend,
    NewTransaction, TransactionTotals,
};
pub use service::list_service::{
    ColumnSummary, ListService, ListServiceError, ListServiceOptions, ListServiceResult,
};
pub use service::{ClassifiedError, ErrorKind};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
