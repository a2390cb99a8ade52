//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes validate model invariants before persistence.
//! - Every mutation is a single SQL statement, so a failure leaves no
//!   partially applied state.
//! - Repository APIs return semantic errors (`*NotFound`) in addition to DB
//!   transport errors.

use crate::db::DbError;
use crate::model::finance::FinanceValidationError;
use crate::model::list::{ListId, ListValidationError};
use crate::model::row::RowId;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod finance_repo;
mod guard;
pub mod list_repo;
pub mod row_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by list, row and finance persistence.
#[derive(Debug)]
pub enum RepoError {
    Validation(ListValidationError),
    FinanceValidation(FinanceValidationError),
    Db(DbError),
    ListNotFound(ListId),
    RowNotFound(RowId),
    RecordNotFound {
        table: &'static str,
        id: Uuid,
    },
    InvalidData(String),
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::FinanceValidation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::RowNotFound(id) => write!(f, "row not found: {id}"),
            Self::RecordNotFound { table, id } => write!(f, "{table} record not found: {id}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "connection schema version {actual_version} does not match expected {expected_version}; open it with db::open_db"
            ),
            Self::MissingRequiredTable(table) => write!(f, "missing required table `{table}`"),
            Self::MissingRequiredColumn { table, column } => {
                write!(f, "missing required column `{table}.{column}`")
            }
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::FinanceValidation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ListValidationError> for RepoError {
    fn from(value: ListValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<FinanceValidationError> for RepoError {
    fn from(value: FinanceValidationError) -> Self {
        Self::FinanceValidation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<serde_json::Error> for RepoError {
    fn from(value: serde_json::Error) -> Self {
        Self::InvalidData(format!("malformed json document: {value}"))
    }
}
