//! List row model.
//!
//! # Invariants
//! - A row belongs to exactly one list, referenced by id only.
//! - Cells are sparse and hold raw text regardless of column kind.
//! - Cells for column ids unknown to the owning list may exist.

use crate::model::calendar::now_epoch_ms;
use crate::model::list::{ColumnId, ListId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// Stable identifier of a list row.
pub type RowId = Uuid;

/// One record under a list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListRow {
    pub id: RowId,
    pub list_id: ListId,
    /// Sparse `column id -> raw text` mapping.
    pub cells: BTreeMap<ColumnId, String>,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Soft-delete tombstone, Unix epoch milliseconds.
    pub deleted_at: Option<i64>,
}

impl ListRow {
    /// Creates an empty row under `list_id`.
    pub fn new(list_id: ListId) -> Self {
        Self::with_cells(list_id, BTreeMap::new())
    }

    /// Creates a row with initial cell values.
    pub fn with_cells(list_id: ListId, cells: BTreeMap<ColumnId, String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            list_id,
            cells,
            created_at: now_epoch_ms(),
            deleted_at: None,
        }
    }

    /// Raw value stored for `column_id`, if any.
    pub fn cell(&self, column_id: ColumnId) -> Option<&str> {
        self.cells.get(&column_id).map(String::as_str)
    }

    /// Sets or overwrites one cell.
    pub fn set_cell(&mut self, column_id: ColumnId, raw_value: impl Into<String>) {
        self.cells.insert(column_id, raw_value.into());
    }

    pub fn is_active(&self) -> bool {
        self.deleted_at.is_none()
    }
}
