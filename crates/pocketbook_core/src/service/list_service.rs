//! Dynamic list use-case service.
//!
//! # Responsibility
//! - Expose create-list, add-column, add-row, set-cell and aggregate
//!   use-cases to UI callers.
//! - Join column metadata with aggregate results for display.
//!
//! # Invariants
//! - Every mutating call is one repository write and returns the affected
//!   entity; callers decide whether to re-fetch anything else.
//! - Aggregates are recomputed from current rows on every request.
//! - Cell writes are permissive about column membership unless
//!   `ListServiceOptions::strict_cell_columns` is set.

use crate::model::aggregate::{AggregateOp, AggregateResult};
use crate::model::list::{Column, ColumnId, ColumnKind, FinancialList, ListId, ListValidationError};
use crate::model::row::{ListRow, RowId};
use crate::repo::list_repo::ListRepository;
use crate::repo::row_repo::RowRepository;
use crate::repo::RepoError;
use crate::service::aggregate::compute_column_aggregate;
use crate::service::{observe, ClassifiedError, ErrorKind};
use serde::Serialize;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const MODULE: &str = "list";

pub type ListServiceResult<T> = Result<T, ListServiceError>;

/// Service error for list use-cases.
#[derive(Debug)]
pub enum ListServiceError {
    /// Caller input violates a list/column precondition.
    Validation(ListValidationError),
    /// Target list does not exist or is soft-deleted.
    ListNotFound(ListId),
    /// Target row does not exist or is soft-deleted.
    RowNotFound(RowId),
    /// Column id is not part of the list.
    ColumnNotFound { list_id: ListId, column_id: ColumnId },
    /// Persistence-layer failure.
    Repo(RepoError),
    /// Internal consistency mismatch between write and read-back.
    InconsistentState(&'static str),
}

impl Display for ListServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::ListNotFound(id) => write!(f, "list not found: {id}"),
            Self::RowNotFound(id) => write!(f, "row not found: {id}"),
            Self::ColumnNotFound { list_id, column_id } => {
                write!(f, "column {column_id} not found in list {list_id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
            Self::InconsistentState(details) => write!(f, "inconsistent list state: {details}"),
        }
    }
}

impl Error for ListServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl ClassifiedError for ListServiceError {
    fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::ListNotFound(_) | Self::RowNotFound(_) | Self::ColumnNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::Repo(_) | Self::InconsistentState(_) => ErrorKind::StoreUnavailable,
        }
    }
}

impl ListServiceError {
    pub fn kind(&self) -> ErrorKind {
        ClassifiedError::kind(self)
    }
}

impl From<ListValidationError> for ListServiceError {
    fn from(value: ListValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<RepoError> for ListServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::ListNotFound(id) => Self::ListNotFound(id),
            RepoError::RowNotFound(id) => Self::RowNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Behavior switches for [`ListService`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ListServiceOptions {
    /// Reject cell writes whose column id is not part of the row's list.
    pub strict_cell_columns: bool,
}

/// Column metadata joined with its aggregate, shaped for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ColumnSummary {
    pub column: Column,
    /// `None` for text columns and for columns without numeric cells.
    pub aggregate: Option<AggregateResult>,
}

/// List manager facade over schema and row repositories.
pub struct ListService<L: ListRepository, R: RowRepository> {
    lists: L,
    rows: R,
    options: ListServiceOptions,
}

impl<L: ListRepository, R: RowRepository> ListService<L, R> {
    /// Creates a service with default (permissive) options.
    pub fn new(lists: L, rows: R) -> Self {
        Self::with_options(lists, rows, ListServiceOptions::default())
    }

    pub fn with_options(lists: L, rows: R, options: ListServiceOptions) -> Self {
        Self {
            lists,
            rows,
            options,
        }
    }

    /// Creates an empty list.
    ///
    /// # Errors
    /// - `Validation(BlankTitle)` when the title is blank after trim.
    pub fn create_list(&self, title: impl Into<String>) -> ListServiceResult<FinancialList> {
        let title = title.into();
        observe("list_create", MODULE, || {
            let list = FinancialList::new(title)?;
            self.lists.create_list(&list)?;
            Ok(list)
        })
    }

    /// Appends a typed column to the end of a list.
    ///
    /// # Errors
    /// - `Validation(BlankColumnName)` when the name is blank after trim.
    /// - `ListNotFound` when the list is missing or soft-deleted.
    pub fn add_column(
        &self,
        list_id: ListId,
        name: impl Into<String>,
        kind: ColumnKind,
    ) -> ListServiceResult<Column> {
        let name = name.into();
        observe("list_add_column", MODULE, || {
            let column = Column::new(name, kind)?;
            self.lists.append_column(list_id, &column)?;
            Ok(column)
        })
    }

    /// Gets one active list.
    pub fn get_list(&self, list_id: ListId) -> ListServiceResult<FinancialList> {
        self.lists
            .get_list(list_id, false)?
            .ok_or(ListServiceError::ListNotFound(list_id))
    }

    /// Lists active lists, newest first.
    pub fn list_all(&self) -> ListServiceResult<Vec<FinancialList>> {
        Ok(self.lists.list_lists()?)
    }

    /// Soft-deletes a list. Its rows are left untouched.
    pub fn delete_list(&self, list_id: ListId) -> ListServiceResult<()> {
        observe("list_delete", MODULE, || {
            self.lists.soft_delete_list(list_id)?;
            Ok(())
        })
    }

    /// Adds an empty row under a list.
    ///
    /// # Errors
    /// - `ListNotFound` when the list is missing; no row is created.
    pub fn add_row(&self, list_id: ListId) -> ListServiceResult<ListRow> {
        observe("list_add_row", MODULE, || {
            let row = ListRow::new(list_id);
            self.rows.create_row(&row)?;
            Ok(row)
        })
    }

    /// Adds a row with initial cell values in a single write.
    pub fn add_row_with_cells<I, V>(&self, list_id: ListId, cells: I) -> ListServiceResult<ListRow>
    where
        I: IntoIterator<Item = (ColumnId, V)>,
        V: Into<String>,
    {
        let cells: BTreeMap<ColumnId, String> = cells
            .into_iter()
            .map(|(column_id, value)| (column_id, value.into()))
            .collect();

        observe("list_add_row", MODULE, || {
            if self.options.strict_cell_columns && !cells.is_empty() {
                let list = self.get_list(list_id)?;
                for column_id in cells.keys() {
                    ensure_column(&list, *column_id)?;
                }
            }

            let row = ListRow::with_cells(list_id, cells);
            self.rows.create_row(&row)?;
            Ok(row)
        })
    }

    /// Sets or overwrites one cell and returns the updated row.
    ///
    /// # Errors
    /// - `RowNotFound` when the row is missing or soft-deleted.
    /// - `ColumnNotFound` in strict mode when the column is not part of the
    ///   row's list.
    pub fn set_cell_value(
        &self,
        row_id: RowId,
        column_id: ColumnId,
        raw_value: impl Into<String>,
    ) -> ListServiceResult<ListRow> {
        let raw_value = raw_value.into();
        observe("list_set_cell", MODULE, || {
            if self.options.strict_cell_columns {
                let row = self
                    .rows
                    .get_row(row_id)?
                    .ok_or(ListServiceError::RowNotFound(row_id))?;
                let list = self.get_list(row.list_id)?;
                ensure_column(&list, column_id)?;
            }

            self.rows.set_cell(row_id, column_id, raw_value.as_str())?;
            self.rows
                .get_row(row_id)?
                .ok_or(ListServiceError::InconsistentState(
                    "updated row not found in read-back",
                ))
        })
    }

    /// Soft-deletes one row.
    pub fn delete_row(&self, row_id: RowId) -> ListServiceResult<()> {
        observe("list_delete_row", MODULE, || {
            self.rows.soft_delete_row(row_id)?;
            Ok(())
        })
    }

    /// Rows of an active list, oldest first.
    pub fn list_rows(&self, list_id: ListId) -> ListServiceResult<Vec<ListRow>> {
        self.get_list(list_id)?;
        Ok(self.rows.list_rows(list_id)?)
    }

    /// Computes one statistic over a number column.
    ///
    /// Returns `Ok(None)` when no row holds a parseable value.
    ///
    /// # Errors
    /// - `ListNotFound` / `ColumnNotFound` for unknown ids.
    /// - `Validation(NonNumericColumn)` when the column is not `Number`.
    pub fn compute_aggregate(
        &self,
        list_id: ListId,
        column_id: ColumnId,
        op: AggregateOp,
    ) -> ListServiceResult<Option<AggregateResult>> {
        observe("list_aggregate", MODULE, || {
            let list = self.get_list(list_id)?;
            let column = ensure_column(&list, column_id)?;
            let rows = self.rows.list_rows(list_id)?;
            Ok(compute_column_aggregate(column, &rows, op)?)
        })
    }

    /// Every column of a list joined with `op` computed over its values.
    ///
    /// Text columns are listed with no aggregate instead of failing.
    pub fn column_summaries(
        &self,
        list_id: ListId,
        op: AggregateOp,
    ) -> ListServiceResult<Vec<ColumnSummary>> {
        let list = self.get_list(list_id)?;
        let rows = self.rows.list_rows(list_id)?;

        let mut summaries = Vec::with_capacity(list.columns.len());
        for column in list.columns {
            let aggregate = if column.is_numeric() {
                compute_column_aggregate(&column, &rows, op)?
            } else {
                None
            };
            summaries.push(ColumnSummary { column, aggregate });
        }

        Ok(summaries)
    }
}

fn ensure_column(list: &FinancialList, column_id: ColumnId) -> ListServiceResult<&Column> {
    list.column(column_id)
        .ok_or(ListServiceError::ColumnNotFound {
            list_id: list.id,
            column_id,
        })
}
