//! Finance records: transactions, monthly budgets and net-worth snapshots.
//!
//! # Invariants
//! - Amounts are finite and non-negative; direction lives in
//!   `TransactionKind`, not in the sign.
//! - Titles and categories are non-blank (stored trimmed).
//! - At most one planned budget exists per calendar month.

use crate::model::calendar::{now_epoch_ms, CalendarDate, CalendarError, MonthKey};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type TransactionId = Uuid;
pub type NetWorthEntryId = Uuid;

const DEFAULT_NET_WORTH_TITLE: &str = "Net Worth Update";

/// Direction of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "income",
            Self::Expense => "expense",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "income" => Some(Self::Income),
            "expense" => Some(Self::Expense),
            _ => None,
        }
    }
}

/// Validation failures for finance input.
#[derive(Debug, Clone, PartialEq)]
pub enum FinanceValidationError {
    BlankTitle,
    BlankCategory,
    /// Amount is negative, NaN or infinite.
    InvalidAmount(f64),
    Calendar(CalendarError),
}

impl Display for FinanceValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "title must not be blank"),
            Self::BlankCategory => write!(f, "category must not be blank"),
            Self::InvalidAmount(value) => {
                write!(f, "amount must be a finite non-negative number, got {value}")
            }
            Self::Calendar(err) => write!(f, "{err}"),
        }
    }
}

impl Error for FinanceValidationError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Calendar(err) => Some(err),
            _ => None,
        }
    }
}

impl From<CalendarError> for FinanceValidationError {
    fn from(value: CalendarError) -> Self {
        Self::Calendar(value)
    }
}

/// One income or expense record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Serialized as `transaction_type` to match the stored record.
    #[serde(rename = "transaction_type")]
    pub kind: TransactionKind,
    pub title: String,
    pub value: f64,
    pub category: String,
    pub date: CalendarDate,
    pub created_at: i64,
    pub deleted_at: Option<i64>,
}

impl Transaction {
    /// Builds a validated transaction with a generated id.
    pub fn new(
        kind: TransactionKind,
        title: impl Into<String>,
        value: f64,
        category: impl Into<String>,
        date: CalendarDate,
    ) -> Result<Self, FinanceValidationError> {
        let transaction = Self {
            id: Uuid::new_v4(),
            kind,
            title: title.into().trim().to_string(),
            value,
            category: category.into().trim().to_string(),
            date,
            created_at: now_epoch_ms(),
            deleted_at: None,
        };
        transaction.validate()?;
        Ok(transaction)
    }

    pub fn validate(&self) -> Result<(), FinanceValidationError> {
        if self.title.trim().is_empty() {
            return Err(FinanceValidationError::BlankTitle);
        }
        if self.category.trim().is_empty() {
            return Err(FinanceValidationError::BlankCategory);
        }
        validate_amount(self.value)
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }
}

/// Planned spending for one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BudgetPlan {
    pub month: MonthKey,
    pub amount: f64,
}

impl BudgetPlan {
    pub fn new(month: MonthKey, amount: f64) -> Result<Self, FinanceValidationError> {
        validate_amount(amount)?;
        Ok(Self { month, amount })
    }
}

/// Named asset balance contributing to a net-worth snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssetCategory {
    pub name: String,
    pub value: f64,
}

impl AssetCategory {
    pub fn new(name: impl Into<String>, value: f64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Point-in-time net-worth snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetWorthEntry {
    pub id: NetWorthEntryId,
    pub date: CalendarDate,
    pub title: String,
    pub value: f64,
    pub created_at: i64,
    pub deleted_at: Option<i64>,
}

impl NetWorthEntry {
    /// Builds a snapshot from asset balances.
    ///
    /// `value` is the sum of all balances. `title` lists the positive
    /// balances as `Name: $1234.00` joined by `, `, falling back to
    /// `Net Worth Update` when no balance is positive.
    pub fn from_assets(
        date: CalendarDate,
        assets: &[AssetCategory],
    ) -> Result<Self, FinanceValidationError> {
        for asset in assets {
            if !asset.value.is_finite() {
                return Err(FinanceValidationError::InvalidAmount(asset.value));
            }
            if asset.name.trim().is_empty() {
                return Err(FinanceValidationError::BlankCategory);
            }
        }

        let value = assets.iter().map(|asset| asset.value).sum();
        let title = assets
            .iter()
            .filter(|asset| asset.value > 0.0)
            .map(|asset| format!("{}: ${:.2}", asset.name.trim(), asset.value))
            .collect::<Vec<_>>()
            .join(", ");
        let title = if title.is_empty() {
            DEFAULT_NET_WORTH_TITLE.to_string()
        } else {
            title
        };

        Ok(Self {
            id: Uuid::new_v4(),
            date,
            title,
            value,
            created_at: now_epoch_ms(),
            deleted_at: None,
        })
    }
}

fn validate_amount(value: f64) -> Result<(), FinanceValidationError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FinanceValidationError::InvalidAmount(value))
    }
}
