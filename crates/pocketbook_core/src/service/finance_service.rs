//! Finance use-case service: transactions, budgets, net worth, dashboard.
//!
//! # Responsibility
//! - Validate and persist finance records through `FinanceRepository`.
//! - Compute the month-level dashboard figures from stored records.
//!
//! # Invariants
//! - Month-over-month change compares against the previous calendar month,
//!   fetched separately from the selected month.
//! - A previous-month total of zero yields +100% for income/expenses and 0%
//!   for net worth.
//! - Aggregations are pure and recomputed on every call.

use crate::model::calendar::{CalendarDate, CalendarError, MonthKey};
use crate::model::finance::{
    AssetCategory, BudgetPlan, FinanceValidationError, NetWorthEntry, NetWorthEntryId,
    Transaction, TransactionId, TransactionKind,
};
use crate::repo::finance_repo::FinanceRepository;
use crate::repo::RepoError;
use crate::service::{observe, ClassifiedError, ErrorKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

const MODULE: &str = "finance";
const CHANGE_FROM_ZERO_PERCENT: f64 = 100.0;
const NET_WORTH_CHANGE_FROM_ZERO_PERCENT: f64 = 0.0;

pub type FinanceServiceResult<T> = Result<T, FinanceServiceError>;

/// Service error for finance use-cases.
#[derive(Debug)]
pub enum FinanceServiceError {
    Validation(FinanceValidationError),
    NotFound { table: &'static str, id: Uuid },
    Repo(RepoError),
}

impl Display for FinanceServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { table, id } => write!(f, "{table} record not found: {id}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FinanceServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            Self::NotFound { .. } => None,
        }
    }
}

impl ClassifiedError for FinanceServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Repo(_) => ErrorKind::StoreUnavailable,
        }
    }
}

impl FinanceServiceError {
    pub fn kind(&self) -> ErrorKind {
        ClassifiedError::kind(self)
    }
}

impl From<FinanceValidationError> for FinanceServiceError {
    fn from(value: FinanceValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<CalendarError> for FinanceServiceError {
    fn from(value: CalendarError) -> Self {
        Self::Validation(value.into())
    }
}

impl From<RepoError> for FinanceServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::FinanceValidation(err) => Self::Validation(err),
            RepoError::RecordNotFound { table, id } => Self::NotFound { table, id },
            other => Self::Repo(other),
        }
    }
}

/// Request model for recording a transaction.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub kind: TransactionKind,
    pub title: String,
    pub value: f64,
    pub category: String,
    pub date: CalendarDate,
}

/// Income and expense totals over a set of transactions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TransactionTotals {
    pub income: f64,
    pub expenses: f64,
}

impl TransactionTotals {
    pub fn from_transactions(transactions: &[Transaction]) -> Self {
        transactions
            .iter()
            .fold(Self::default(), |mut totals, transaction| {
                match transaction.kind {
                    TransactionKind::Income => totals.income += transaction.value,
                    TransactionKind::Expense => totals.expenses += transaction.value,
                }
                totals
            })
    }

    pub fn net(&self) -> f64 {
        self.income - self.expenses
    }
}

/// Dashboard figures for one calendar month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthSummary {
    pub month: MonthKey,
    pub totals: TransactionTotals,
    pub income_change_percent: f64,
    pub expenses_change_percent: f64,
    /// Latest recorded net worth, 0 when nothing was recorded.
    pub net_worth: f64,
    pub planned_budget: Option<f64>,
    /// Expenses as a percentage of the planned budget.
    pub budget_used_percent: Option<f64>,
}

/// Latest net worth compared with the snapshot before it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NetWorthTrend {
    pub current: f64,
    pub previous: f64,
    pub change_percent: f64,
}

/// Expense total for one category.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
}

/// Expense totals grouped by category, in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryBreakdown {
    pub categories: Vec<CategoryTotal>,
    pub total: f64,
}

/// Income and expense totals for one month bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct MonthlyTotals {
    pub month: MonthKey,
    pub income: f64,
    pub expenses: f64,
}

/// Finance service facade over repository implementations.
pub struct FinanceService<R: FinanceRepository> {
    repo: R,
}

impl<R: FinanceRepository> FinanceService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Validates and stores one transaction.
    pub fn record_transaction(&self, request: &NewTransaction) -> FinanceServiceResult<Transaction> {
        observe("transaction_create", MODULE, || {
            let transaction = Transaction::new(
                request.kind,
                request.title.as_str(),
                request.value,
                request.category.as_str(),
                request.date,
            )?;
            self.repo.create_transaction(&transaction)?;
            Ok(transaction)
        })
    }

    pub fn delete_transaction(&self, id: TransactionId) -> FinanceServiceResult<()> {
        observe("transaction_delete", MODULE, || {
            self.repo.soft_delete_transaction(id)?;
            Ok(())
        })
    }

    /// Transactions dated inside `month`, newest first.
    pub fn transactions_for_month(&self, month: MonthKey) -> FinanceServiceResult<Vec<Transaction>> {
        Ok(self
            .repo
            .list_transactions_between(month.first_day(), month.last_day())?)
    }

    /// Transactions dated exactly `date`.
    pub fn transactions_on(&self, date: CalendarDate) -> FinanceServiceResult<Vec<Transaction>> {
        Ok(self.repo.list_transactions_between(date, date)?)
    }

    /// Sets (or replaces) the planned budget of one month.
    pub fn set_budget(&self, month: MonthKey, amount: f64) -> FinanceServiceResult<BudgetPlan> {
        observe("budget_set", MODULE, || {
            let plan = BudgetPlan::new(month, amount)?;
            self.repo.upsert_budget(&plan)?;
            Ok(plan)
        })
    }

    pub fn budget_for(&self, month: MonthKey) -> FinanceServiceResult<Option<BudgetPlan>> {
        Ok(self.repo.get_budget(month)?)
    }

    /// Records a net-worth snapshot from asset balances.
    pub fn record_net_worth(
        &self,
        date: CalendarDate,
        assets: &[AssetCategory],
    ) -> FinanceServiceResult<NetWorthEntry> {
        observe("net_worth_create", MODULE, || {
            let entry = NetWorthEntry::from_assets(date, assets)?;
            self.repo.create_net_worth_entry(&entry)?;
            Ok(entry)
        })
    }

    /// Net-worth snapshots, oldest first.
    pub fn net_worth_history(&self) -> FinanceServiceResult<Vec<NetWorthEntry>> {
        Ok(self.repo.list_net_worth_entries()?)
    }

    pub fn delete_net_worth_entry(&self, id: NetWorthEntryId) -> FinanceServiceResult<()> {
        observe("net_worth_delete", MODULE, || {
            self.repo.soft_delete_net_worth_entry(id)?;
            Ok(())
        })
    }

    /// Current and previous net worth with percentage change.
    pub fn net_worth_trend(&self) -> FinanceServiceResult<NetWorthTrend> {
        let history = self.repo.list_net_worth_entries()?;
        Ok(net_worth_trend(&history))
    }

    /// Dashboard figures for `month`.
    pub fn month_summary(&self, month: MonthKey) -> FinanceServiceResult<MonthSummary> {
        let current = TransactionTotals::from_transactions(&self.transactions_for_month(month)?);
        let previous =
            TransactionTotals::from_transactions(&self.transactions_for_month(month.previous())?);
        let trend = self.net_worth_trend()?;
        let planned_budget = self.repo.get_budget(month)?.map(|plan| plan.amount);
        let budget_used_percent = planned_budget
            .filter(|amount| *amount > 0.0)
            .map(|amount| current.expenses / amount * 100.0);

        Ok(MonthSummary {
            month,
            totals: current,
            income_change_percent: percent_change(
                current.income,
                previous.income,
                CHANGE_FROM_ZERO_PERCENT,
            ),
            expenses_change_percent: percent_change(
                current.expenses,
                previous.expenses,
                CHANGE_FROM_ZERO_PERCENT,
            ),
            net_worth: trend.current,
            planned_budget,
            budget_used_percent,
        })
    }
}

/// Relative change from `previous` to `current` in percent.
///
/// Returns `when_previous_zero` when `previous` is zero.
pub fn percent_change(current: f64, previous: f64, when_previous_zero: f64) -> f64 {
    if previous == 0.0 {
        when_previous_zero
    } else {
        (current - previous) / previous * 100.0
    }
}

/// Latest vs. second-latest snapshot of an oldest-first history.
pub fn net_worth_trend(history: &[NetWorthEntry]) -> NetWorthTrend {
    let current = history.last().map_or(0.0, |entry| entry.value);
    let previous = history
        .len()
        .checked_sub(2)
        .and_then(|index| history.get(index))
        .map_or(0.0, |entry| entry.value);

    NetWorthTrend {
        current,
        previous,
        change_percent: percent_change(current, previous, NET_WORTH_CHANGE_FROM_ZERO_PERCENT),
    }
}

/// Groups expense transactions by category; income is ignored.
pub fn expenses_by_category(transactions: &[Transaction]) -> CategoryBreakdown {
    let mut breakdown = CategoryBreakdown::default();
    for transaction in transactions.iter().filter(|item| item.is_expense()) {
        match breakdown
            .categories
            .iter_mut()
            .find(|slice| slice.category == transaction.category)
        {
            Some(slice) => slice.total += transaction.value,
            None => breakdown.categories.push(CategoryTotal {
                category: transaction.category.clone(),
                total: transaction.value,
            }),
        }
        breakdown.total += transaction.value;
    }
    breakdown
}

/// Buckets transactions by calendar month, oldest month first.
pub fn monthly_overview(transactions: &[Transaction]) -> Vec<MonthlyTotals> {
    let mut buckets: BTreeMap<MonthKey, MonthlyTotals> = BTreeMap::new();
    for transaction in transactions {
        let month = transaction.date.month_key();
        let bucket = buckets.entry(month).or_insert(MonthlyTotals {
            month,
            income: 0.0,
            expenses: 0.0,
        });
        match transaction.kind {
            TransactionKind::Income => bucket.income += transaction.value,
            TransactionKind::Expense => bucket.expenses += transaction.value,
        }
    }
    buckets.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::{expenses_by_category, monthly_overview, net_worth_trend, percent_change};
    use crate::model::finance::{AssetCategory, NetWorthEntry, Transaction, TransactionKind};

    fn transaction(kind: TransactionKind, value: f64, category: &str, date: &str) -> Transaction {
        Transaction::new(kind, "item", value, category, date.parse().unwrap()).unwrap()
    }

    #[test]
    fn percent_change_uses_fallback_for_zero_baseline() {
        assert_eq!(percent_change(150.0, 100.0, 100.0), 50.0);
        assert_eq!(percent_change(50.0, 100.0, 100.0), -50.0);
        assert_eq!(percent_change(42.0, 0.0, 100.0), 100.0);
    }

    #[test]
    fn expenses_by_category_keeps_first_appearance_order() {
        let items = [
            transaction(TransactionKind::Expense, 30.0, "Food", "2024-05-03"),
            transaction(TransactionKind::Income, 999.0, "Salary", "2024-05-01"),
            transaction(TransactionKind::Expense, 1200.0, "Housing", "2024-05-01"),
            transaction(TransactionKind::Expense, 20.0, "Food", "2024-05-09"),
        ];
        let breakdown = expenses_by_category(&items);
        let names: Vec<_> = breakdown
            .categories
            .iter()
            .map(|slice| slice.category.as_str())
            .collect();
        assert_eq!(names, vec!["Food", "Housing"]);
        assert_eq!(breakdown.categories[0].total, 50.0);
        assert_eq!(breakdown.total, 1250.0);
    }

    #[test]
    fn monthly_overview_separates_years() {
        let items = [
            transaction(TransactionKind::Income, 100.0, "Salary", "2024-01-15"),
            transaction(TransactionKind::Expense, 40.0, "Food", "2023-01-20"),
            transaction(TransactionKind::Expense, 10.0, "Food", "2024-01-02"),
        ];
        let overview = monthly_overview(&items);
        assert_eq!(overview.len(), 2);
        assert_eq!(overview[0].month.to_string(), "2023-01");
        assert_eq!(overview[0].expenses, 40.0);
        assert_eq!(overview[1].income, 100.0);
        assert_eq!(overview[1].expenses, 10.0);
    }

    #[test]
    fn net_worth_trend_handles_short_histories() {
        let empty = net_worth_trend(&[]);
        assert_eq!((empty.current, empty.previous, empty.change_percent), (0.0, 0.0, 0.0));

        let date = "2024-01-31".parse().unwrap();
        let first = NetWorthEntry::from_assets(date, &[AssetCategory::new("Savings", 1000.0)])
            .unwrap();
        let second = NetWorthEntry::from_assets(date, &[AssetCategory::new("Savings", 1100.0)])
            .unwrap();

        let single = net_worth_trend(std::slice::from_ref(&first));
        assert_eq!(single.current, 1000.0);
        assert_eq!(single.change_percent, 0.0);

        let trend = net_worth_trend(&[first, second]);
        assert_eq!(trend.previous, 1000.0);
        assert!((trend.change_percent - 10.0).abs() < 1e-9);
    }
}
