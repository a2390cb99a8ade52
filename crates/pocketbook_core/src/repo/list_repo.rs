//! List schema repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Persist user-defined lists and their ordered column documents.
//! - Append columns without rewriting or reordering existing ones.
//!
//! # Invariants
//! - Write paths call `FinancialList::validate()` / `Column::validate()`
//!   before SQL mutations.
//! - Read paths reject invalid persisted state instead of masking it.
//! - Default reads exclude soft-deleted lists.

use crate::model::calendar::now_epoch_ms;
use crate::model::list::{Column, FinancialList, ListId, ListValidationError};
use crate::repo::guard::{ensure_connection_ready, parse_uuid, RequiredTable};
use crate::repo::{RepoError, RepoResult};
use rusqlite::{params, Connection, Row};

const LIST_SELECT_SQL: &str = "SELECT
    id,
    title,
    columns,
    created_at,
    deleted_at
FROM lists";

const REQUIRED_TABLES: &[RequiredTable] = &[(
    "lists",
    &["id", "title", "columns", "created_at", "deleted_at"],
)];

/// Repository interface for the list schema store.
pub trait ListRepository {
    fn create_list(&self, list: &FinancialList) -> RepoResult<ListId>;
    /// Appends one column at the end of the list's column sequence.
    fn append_column(&self, list_id: ListId, column: &Column) -> RepoResult<()>;
    fn get_list(&self, id: ListId, include_deleted: bool) -> RepoResult<Option<FinancialList>>;
    /// Active lists, newest first.
    fn list_lists(&self) -> RepoResult<Vec<FinancialList>>;
    fn soft_delete_list(&self, id: ListId) -> RepoResult<()>;
}

/// SQLite-backed list repository.
pub struct SqliteListRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteListRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }

    fn list_exists(&self, id: ListId) -> RepoResult<bool> {
        let exists: i64 = self.conn.query_row(
            "SELECT EXISTS(
                SELECT 1
                FROM lists
                WHERE id = ?1
                  AND deleted_at IS NULL
            );",
            [id.to_string()],
            |row| row.get(0),
        )?;
        Ok(exists == 1)
    }
}

impl ListRepository for SqliteListRepository<'_> {
    fn create_list(&self, list: &FinancialList) -> RepoResult<ListId> {
        list.validate()?;

        self.conn.execute(
            "INSERT INTO lists (
                id,
                title,
                columns,
                created_at,
                deleted_at
            ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![
                list.id.to_string(),
                list.title.as_str(),
                serde_json::to_string(&list.columns)?,
                list.created_at,
                list.deleted_at,
            ],
        )?;

        Ok(list.id)
    }

    fn append_column(&self, list_id: ListId, column: &Column) -> RepoResult<()> {
        column.validate()?;

        // Single statement: append only when the list is active and the
        // column id is not already present.
        let changed = self.conn.execute(
            "UPDATE lists
             SET columns = json_insert(columns, '$[#]', json(?2))
             WHERE id = ?1
               AND deleted_at IS NULL
               AND NOT EXISTS (
                   SELECT 1
                   FROM json_each(lists.columns)
                   WHERE json_extract(json_each.value, '$.id') = ?3
               );",
            params![
                list_id.to_string(),
                serde_json::to_string(column)?,
                column.id.to_string(),
            ],
        )?;

        if changed == 0 {
            if self.list_exists(list_id)? {
                return Err(ListValidationError::DuplicateColumnId(column.id).into());
            }
            return Err(RepoError::ListNotFound(list_id));
        }

        Ok(())
    }

    fn get_list(&self, id: ListId, include_deleted: bool) -> RepoResult<Option<FinancialList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LIST_SELECT_SQL}
             WHERE id = ?1
               AND (?2 = 1 OR deleted_at IS NULL);"
        ))?;

        let mut rows = stmt.query(params![id.to_string(), include_deleted])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_list_row(row)?));
        }

        Ok(None)
    }

    fn list_lists(&self) -> RepoResult<Vec<FinancialList>> {
        let mut stmt = self.conn.prepare(&format!(
            "{LIST_SELECT_SQL}
             WHERE deleted_at IS NULL
             ORDER BY created_at DESC, rowid DESC;"
        ))?;

        let mut rows = stmt.query([])?;
        let mut lists = Vec::new();
        while let Some(row) = rows.next()? {
            lists.push(parse_list_row(row)?);
        }

        Ok(lists)
    }

    fn soft_delete_list(&self, id: ListId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE lists
             SET deleted_at = COALESCE(deleted_at, ?2)
             WHERE id = ?1;",
            params![id.to_string(), now_epoch_ms()],
        )?;

        if changed == 0 {
            return Err(RepoError::ListNotFound(id));
        }

        Ok(())
    }
}

fn parse_list_row(row: &Row<'_>) -> RepoResult<FinancialList> {
    let id_text: String = row.get("id")?;
    let columns_text: String = row.get("columns")?;
    let columns: Vec<Column> = serde_json::from_str(&columns_text).map_err(|err| {
        RepoError::InvalidData(format!(
            "invalid column document for list `{id_text}` in lists.columns: {err}"
        ))
    })?;

    let list = FinancialList {
        id: parse_uuid(&id_text, "lists.id")?,
        title: row.get("title")?,
        columns,
        created_at: row.get("created_at")?,
        deleted_at: row.get("deleted_at")?,
    };
    list.validate().map_err(|err| {
        RepoError::InvalidData(format!("list `{id_text}` violates schema invariants: {err}"))
    })?;
    Ok(list)
}
