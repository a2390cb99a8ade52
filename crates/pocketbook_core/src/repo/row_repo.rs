//! List row repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist rows and their sparse cell documents.
//! - Overwrite single cells in place without touching sibling cells.
//!
//! # Invariants
//! - A row can only be created under an active list; the existence check and
//!   the insert are one statement.
//! - Cell writes do not check that the column belongs to the owning list.
//! - Row listings are ordered oldest first.

use crate::model::calendar::now_epoch_ms;
use crate::model::list::{ColumnId, ListId};
use crate::model::row::{ListRow, RowId};
use crate::repo::guard::{ensure_connection_ready, parse_uuid, RequiredTable};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};
use serde_json::Value;
use std::collections::BTreeMap;

const ROW_SELECT_SQL: &str = "SELECT
    id,
    list_id,
    cell_values,
    created_at,
    deleted_at
FROM list_rows";

const REQUIRED_TABLES: &[RequiredTable] = &[
    ("lists", &["id", "deleted_at"]),
    (
        "list_rows",
        &["id", "list_id", "cell_values", "created_at", "deleted_at"],
    ),
];

/// Repository interface for the row store.
pub trait RowRepository {
    /// Inserts a row; fails with `ListNotFound` when the owning list is
    /// missing or soft-deleted.
    fn create_row(&self, row: &ListRow) -> RepoResult<RowId>;
    /// Sets or overwrites one cell of an active row.
    fn set_cell(&self, row_id: RowId, column_id: ColumnId, raw_value: &str) -> RepoResult<()>;
    fn get_row(&self, row_id: RowId) -> RepoResult<Option<ListRow>>;
    /// Active rows of one list, oldest first.
    fn list_rows(&self, list_id: ListId) -> RepoResult<Vec<ListRow>>;
    fn soft_delete_row(&self, row_id: RowId) -> RepoResult<()>;
}

/// SQLite-backed row repository.
pub struct SqliteRowRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRowRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl RowRepository for SqliteRowRepository<'_> {
    fn create_row(&self, row: &ListRow) -> RepoResult<RowId> {
        let changed = self.conn.execute(
            "INSERT INTO list_rows (
                id,
                list_id,
                cell_values,
                created_at,
                deleted_at
            )
            SELECT ?1, ?2, ?3, ?4, ?5
            WHERE EXISTS (
                SELECT 1
                FROM lists
                WHERE id = ?2
                  AND deleted_at IS NULL
            );",
            params![
                row.id.to_string(),
                row.list_id.to_string(),
                serde_json::to_string(&row.cells)?,
                row.created_at,
                row.deleted_at,
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::ListNotFound(row.list_id));
        }

        Ok(row.id)
    }

    fn set_cell(&self, row_id: RowId, column_id: ColumnId, raw_value: &str) -> RepoResult<()> {
        // Column ids are UUIDs, so the quoted path needs no escaping.
        let path = format!("$.\"{column_id}\"");
        let changed = self.conn.execute(
            "UPDATE list_rows
             SET cell_values = json_set(cell_values, ?2, ?3)
             WHERE id = ?1
               AND deleted_at IS NULL;",
            params![row_id.to_string(), path, raw_value],
        )?;

        if changed == 0 {
            return Err(RepoError::RowNotFound(row_id));
        }

        Ok(())
    }

    fn get_row(&self, row_id: RowId) -> RepoResult<Option<ListRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ROW_SELECT_SQL}
             WHERE id = ?1
               AND deleted_at IS NULL;"
        ))?;

        let mut rows = stmt.query([row_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_list_row(row)?));
        }

        Ok(None)
    }

    fn list_rows(&self, list_id: ListId) -> RepoResult<Vec<ListRow>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ROW_SELECT_SQL}
             WHERE list_id = ?1
               AND deleted_at IS NULL
             ORDER BY created_at ASC, rowid ASC;"
        ))?;

        let mut rows = stmt.query([list_id.to_string()])?;
        let mut items = Vec::new();
        while let Some(row) = rows.next()? {
            items.push(parse_list_row(row)?);
        }

        Ok(items)
    }

    fn soft_delete_row(&self, row_id: RowId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE list_rows
             SET deleted_at = COALESCE(deleted_at, ?2)
             WHERE id = ?1;",
            params![row_id.to_string(), now_epoch_ms()],
        )?;

        if changed == 0 {
            return Err(RepoError::RowNotFound(row_id));
        }

        Ok(())
    }
}

fn parse_list_row(row: &Row<'_>) -> RepoResult<ListRow> {
    let id_text: String = row.get("id")?;
    let list_id_text: String = row.get("list_id")?;
    let cells_text: String = row.get("cell_values")?;

    Ok(ListRow {
        id: parse_uuid(&id_text, "list_rows.id")?,
        list_id: parse_uuid(&list_id_text, "list_rows.list_id")?,
        cells: parse_cells(&id_text, &cells_text)?,
        created_at: row.get("created_at")?,
        deleted_at: row.get("deleted_at")?,
    })
}

/// Decodes a stored cell document.
///
/// Numbers written by older clients are kept as their text form; `null`
/// cells are treated as absent.
fn parse_cells(row_id: &str, text: &str) -> RepoResult<BTreeMap<ColumnId, String>> {
    let document: Value = serde_json::from_str(text)?;
    let Value::Object(entries) = document else {
        return Err(RepoError::InvalidData(format!(
            "cell document of row `{row_id}` in list_rows.cell_values is not an object"
        )));
    };

    let mut cells = BTreeMap::new();
    for (key, value) in entries {
        let column_id = parse_uuid(&key, "list_rows.cell_values")?;
        let raw = match value {
            Value::String(text) => text,
            Value::Number(number) => number.to_string(),
            Value::Null => continue,
            other => {
                return Err(RepoError::InvalidData(format!(
                    "unsupported cell value `{other}` for column `{key}` of row `{row_id}`"
                )));
            }
        };
        cells.insert(column_id, raw);
    }

    Ok(cells)
}
