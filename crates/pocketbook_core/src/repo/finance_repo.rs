//! Finance repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist transactions, monthly budget plans and net-worth snapshots.
//! - Serve the date-range queries the dashboard aggregations need.
//!
//! # Invariants
//! - Dates are stored as `YYYY-MM-DD` text so range filters compare
//!   chronologically.
//! - `planned_budgets` holds at most one row per month; writes upsert.
//! - Default reads exclude soft-deleted records.

use crate::model::calendar::{now_epoch_ms, CalendarDate, MonthKey};
use crate::model::finance::{
    BudgetPlan, NetWorthEntry, NetWorthEntryId, Transaction, TransactionId, TransactionKind,
};
use crate::repo::guard::{ensure_connection_ready, parse_uuid, RequiredTable};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;

const TRANSACTION_SELECT_SQL: &str = "SELECT
    id,
    transaction_type,
    title,
    value,
    category,
    date,
    created_at,
    deleted_at
FROM transactions";

const NET_WORTH_SELECT_SQL: &str = "SELECT
    id,
    date,
    title,
    value,
    created_at,
    deleted_at
FROM net_worth_log";

const REQUIRED_TABLES: &[RequiredTable] = &[
    (
        "transactions",
        &[
            "id",
            "transaction_type",
            "title",
            "value",
            "category",
            "date",
            "created_at",
            "deleted_at",
        ],
    ),
    ("planned_budgets", &["month", "amount", "updated_at"]),
    (
        "net_worth_log",
        &["id", "date", "title", "value", "created_at", "deleted_at"],
    ),
];

/// Repository interface for finance records.
pub trait FinanceRepository {
    fn create_transaction(&self, transaction: &Transaction) -> RepoResult<TransactionId>;
    /// Active transactions with `start <= date <= end`, newest date first.
    fn list_transactions_between(
        &self,
        start: CalendarDate,
        end: CalendarDate,
    ) -> RepoResult<Vec<Transaction>>;
    fn soft_delete_transaction(&self, id: TransactionId) -> RepoResult<()>;
    /// Inserts or replaces the plan for `plan.month`.
    fn upsert_budget(&self, plan: &BudgetPlan) -> RepoResult<()>;
    fn get_budget(&self, month: MonthKey) -> RepoResult<Option<BudgetPlan>>;
    fn create_net_worth_entry(&self, entry: &NetWorthEntry) -> RepoResult<NetWorthEntryId>;
    /// Active snapshots, oldest date first.
    fn list_net_worth_entries(&self) -> RepoResult<Vec<NetWorthEntry>>;
    fn soft_delete_net_worth_entry(&self, id: NetWorthEntryId) -> RepoResult<()>;
}

/// SQLite-backed finance repository.
pub struct SqliteFinanceRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteFinanceRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn soft_delete(&self, table: &'static str, id: uuid::Uuid) -> RepoResult<()> {
        let changed = self.conn.execute(
            &format!(
                "UPDATE {table}
                 SET deleted_at = COALESCE(deleted_at, ?2)
                 WHERE id = ?1;"
            ),
            params![id.to_string(), now_epoch_ms()],
        )?;

        if changed == 0 {
            return Err(RepoError::RecordNotFound { table, id });
        }

        Ok(())
    }
}

impl FinanceRepository for SqliteFinanceRepository<'_> {
    fn create_transaction(&self, transaction: &Transaction) -> RepoResult<TransactionId> {
        transaction.validate()?;

        self.conn.execute(
            "INSERT INTO transactions (
                id,
                transaction_type,
                title,
                value,
                category,
                date,
                created_at,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8);",
            params![
                transaction.id.to_string(),
                transaction.kind.as_str(),
                transaction.title.as_str(),
                transaction.value,
                transaction.category.as_str(),
                transaction.date.to_string(),
                transaction.created_at,
                transaction.deleted_at,
            ],
        )?;

        Ok(transaction.id)
    }

    fn list_transactions_between(
        &self,
        start: CalendarDate,
        end: CalendarDate,
    ) -> RepoResult<Vec<Transaction>> {
        let mut stmt = self.conn.prepare(&format!(
            "{TRANSACTION_SELECT_SQL}
             WHERE deleted_at IS NULL
               AND date >= ?1
               AND date <= ?2
             ORDER BY date DESC, created_at DESC, rowid DESC;"
        ))?;

        let mut rows = stmt.query(params![start.to_string(), end.to_string()])?;
        let mut transactions = Vec::new();
        while let Some(row) = rows.next()? {
            transactions.push(parse_transaction_row(row)?);
        }

        Ok(transactions)
    }

    fn soft_delete_transaction(&self, id: TransactionId) -> RepoResult<()> {
        self.soft_delete("transactions", id)
    }

    fn upsert_budget(&self, plan: &BudgetPlan) -> RepoResult<()> {
        BudgetPlan::new(plan.month, plan.amount)?;

        self.conn.execute(
            "INSERT INTO planned_budgets (month, amount, updated_at)
             VALUES (?1, ?2, ?3)
             ON CONFLICT(month) DO UPDATE SET
                amount = excluded.amount,
                updated_at = excluded.updated_at;",
            params![plan.month.to_string(), plan.amount, now_epoch_ms()],
        )?;

        Ok(())
    }

    fn get_budget(&self, month: MonthKey) -> RepoResult<Option<BudgetPlan>> {
        let amount: Option<f64> = self
            .conn
            .query_row(
                "SELECT amount FROM planned_budgets WHERE month = ?1;",
                [month.to_string()],
                |row| row.get(0),
            )
            .optional()?;

        Ok(amount.map(|amount| BudgetPlan { month, amount }))
    }

    fn create_net_worth_entry(&self, entry: &NetWorthEntry) -> RepoResult<NetWorthEntryId> {
        self.conn.execute(
            "INSERT INTO net_worth_log (
                id,
                date,
                title,
                value,
                created_at,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                entry.id.to_string(),
                entry.date.to_string(),
                entry.title.as_str(),
                entry.value,
                entry.created_at,
                entry.deleted_at,
            ],
        )?;

        Ok(entry.id)
    }

    fn list_net_worth_entries(&self) -> RepoResult<Vec<NetWorthEntry>> {
        let mut stmt = self.conn.prepare(&format!(
            "{NET_WORTH_SELECT_SQL}
             WHERE deleted_at IS NULL
             ORDER BY date ASC, created_at ASC, rowid ASC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut entries = Vec::new();
        while let Some(row) = rows.next()? {
            entries.push(parse_net_worth_row(row)?);
        }

        Ok(entries)
    }

    fn soft_delete_net_worth_entry(&self, id: NetWorthEntryId) -> RepoResult<()> {
        self.soft_delete("net_worth_log", id)
    }
}

fn parse_transaction_row(row: &Row<'_>) -> RepoResult<Transaction> {
    let id_text: String = row.get("id")?;
    let kind_text: String = row.get("transaction_type")?;
    let kind = TransactionKind::parse(&kind_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid transaction type `{kind_text}` in transactions.transaction_type"
        ))
    })?;

    let transaction = Transaction {
        id: parse_uuid(&id_text, "transactions.id")?,
        kind,
        title: row.get("title")?,
        value: row.get("value")?,
        category: row.get("category")?,
        date: parse_date(row, "transactions.date")?,
        created_at: row.get("created_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    transaction.validate().map_err(|err| {
        RepoError::InvalidData(format!(
            "transaction `{id_text}` violates record invariants: {err}"
        ))
    })?;
    Ok(transaction)
}

fn parse_net_worth_row(row: &Row<'_>) -> RepoResult<NetWorthEntry> {
    let id_text: String = row.get("id")?;
    Ok(NetWorthEntry {
        id: parse_uuid(&id_text, "net_worth_log.id")?,
        date: parse_date(row, "net_worth_log.date")?,
        title: row.get("title")?,
        value: row.get("value")?,
        created_at: row.get("created_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

fn parse_date(row: &Row<'_>, field: &str) -> RepoResult<CalendarDate> {
    let text: String = row.get("date")?;
    CalendarDate::from_str(&text)
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{text}` in {field}")))
}
