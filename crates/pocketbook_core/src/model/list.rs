//! Dynamic list schema model.
//!
//! # Responsibility
//! - Define user-defined lists and their typed column definitions.
//! - Validate schema invariants before persistence and after reads.
//!
//! # Invariants
//! - `title` and column `name` values are non-blank (stored trimmed).
//! - Column ids are unique within a list.
//! - Columns are append-only: id and kind never change after append.
//! - `deleted_at` is the source of truth for tombstone state.

use crate::model::calendar::now_epoch_ms;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Stable identifier of a user-defined list.
pub type ListId = Uuid;

/// Stable identifier of a column. Generated globally unique so that row
/// cells can be keyed by it without list context.
pub type ColumnId = Uuid;

/// Value kind declared for a column.
///
/// Cells are always stored as raw text; the kind only decides whether the
/// column participates in numeric aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnKind {
    /// Free text.
    Text,
    /// Numeric text, parsed lazily at aggregation time.
    Number,
}

impl ColumnKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "text" => Some(Self::Text),
            "number" => Some(Self::Number),
            _ => None,
        }
    }
}

/// Validation failures for list schema input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListValidationError {
    /// List title is empty or whitespace-only.
    BlankTitle,
    /// Column name is empty or whitespace-only.
    BlankColumnName,
    /// The same column id appears twice in one list.
    DuplicateColumnId(ColumnId),
    /// Aggregation was requested on a column that is not `Number`.
    NonNumericColumn {
        column_id: ColumnId,
        kind: ColumnKind,
    },
}

impl Display for ListValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "list title must not be blank"),
            Self::BlankColumnName => write!(f, "column name must not be blank"),
            Self::DuplicateColumnId(id) => write!(f, "duplicate column id: {id}"),
            Self::NonNumericColumn { column_id, kind } => write!(
                f,
                "column {column_id} has kind `{}`; only number columns can be aggregated",
                kind.as_str()
            ),
        }
    }
}

impl Error for ListValidationError {}

/// Typed field definition inside a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub id: ColumnId,
    pub name: String,
    /// Serialized as `type` to match the stored column document.
    #[serde(rename = "type")]
    pub kind: ColumnKind,
}

impl Column {
    /// Creates a column definition with a freshly generated id.
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Result<Self, ListValidationError> {
        let name = normalize_required(name.into()).ok_or(ListValidationError::BlankColumnName)?;
        Ok(Self {
            id: Uuid::new_v4(),
            name,
            kind,
        })
    }

    pub fn is_numeric(&self) -> bool {
        self.kind == ColumnKind::Number
    }

    pub fn validate(&self) -> Result<(), ListValidationError> {
        if self.name.trim().is_empty() {
            return Err(ListValidationError::BlankColumnName);
        }
        Ok(())
    }
}

/// One user-defined table: a title plus an ordered column sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialList {
    pub id: ListId,
    pub title: String,
    /// Insertion order is display order.
    pub columns: Vec<Column>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Soft-delete tombstone, Unix epoch milliseconds.
    pub deleted_at: Option<i64>,
}

impl FinancialList {
    /// Creates an empty list with a generated id.
    ///
    /// # Errors
    /// - `BlankTitle` when `title` is empty after trim.
    pub fn new(title: impl Into<String>) -> Result<Self, ListValidationError> {
        let title = normalize_required(title.into()).ok_or(ListValidationError::BlankTitle)?;
        Ok(Self {
            id: Uuid::new_v4(),
            title,
            columns: Vec::new(),
            created_at: now_epoch_ms(),
            deleted_at: None,
        })
    }

    /// Looks up a column by id.
    pub fn column(&self, column_id: ColumnId) -> Option<&Column> {
        self.columns.iter().find(|column| column.id == column_id)
    }

    /// Appends a column at the end of the sequence.
    pub fn push_column(&mut self, column: Column) -> Result<(), ListValidationError> {
        column.validate()?;
        if self.column(column.id).is_some() {
            return Err(ListValidationError::DuplicateColumnId(column.id));
        }
        self.columns.push(column);
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }

    /// Checks every schema invariant of this list.
    pub fn validate(&self) -> Result<(), ListValidationError> {
        if self.title.trim().is_empty() {
            return Err(ListValidationError::BlankTitle);
        }

        let mut seen = HashSet::with_capacity(self.columns.len());
        for column in &self.columns {
            column.validate()?;
            if !seen.insert(column.id) {
                return Err(ListValidationError::DuplicateColumnId(column.id));
            }
        }
        Ok(())
    }
}

fn normalize_required(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else if trimmed.len() == value.len() {
        Some(value)
    } else {
        Some(trimmed.to_string())
    }
}
