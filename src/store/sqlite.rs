use std::collections::HashSet;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use rusqlite::{Connection, OptionalExtension, Row, Transaction, TransactionBehavior, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const PROJECT_COLUMNS: &str =
    "id, name, type, slug, visible, sort_order, created_at, updated_at, deleted_at";
const BLOCK_COLUMNS: &str =
    "id, project_id, name, text, formatted_text, sort_order, created_at, updated_at, deleted_at";
const IMAGE_COLUMNS: &str =
    "id, project_id, name, caption, alt, path, sort_order, created_at, updated_at, deleted_at";
const LINK_COLUMNS: &str =
    "id, project_id, name, text, url, sort_order, created_at, updated_at, deleted_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;
        Self::from_connection(conn)
    }

    /// Opens a private in-memory database. Nothing is persisted.
    pub fn in_memory() -> Result<Self> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self> {
        conn.busy_timeout(std::time::Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Runs `insert` inside an immediate transaction, resolving `placement`
    /// against the scope first so concurrent appends cannot share an order.
    fn insert_placed<F>(&self, scope: Scope<'_>, placement: Placement, insert: F) -> Result<i64>
    where
        F: FnOnce(&Transaction<'_>, i64) -> rusqlite::Result<usize>,
    {
        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let order = match placement {
            Placement::At(order) => order,
            Placement::Append => max_order_in(&tx, scope)?.map_or(0, |max| max + 1),
        };

        insert(&tx, order)?;
        tx.commit()?;
        Ok(order)
    }

    fn list_children<T>(
        &self,
        kind: EntityKind,
        columns: &str,
        project_id: &str,
        filter: &Filter,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Vec<T>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {columns} FROM {} WHERE project_id = ?1{} {}",
            kind.table(),
            deleted_condition(filter.deleted),
            order_clause(filter.ordered),
        ))?;

        let rows = stmt.query_map(params![project_id], map)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn get_by_id<T>(
        &self,
        kind: EntityKind,
        columns: &str,
        id: &str,
        map: fn(&Row<'_>) -> rusqlite::Result<T>,
    ) -> Result<Option<T>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {columns} FROM {} WHERE id = ?1", kind.table()),
            params![id],
            map,
        )
        .optional()
        .map_err(Error::from)
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

fn parse_optional_datetime(s: Option<String>) -> Option<DateTime<Utc>> {
    s.map(|s| parse_datetime(&s))
}

fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339()
}

fn project_from_row(row: &Row<'_>) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        project_type: row.get(2)?,
        slug: row.get(3)?,
        visible: row.get(4)?,
        order: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
        deleted_at: parse_optional_datetime(row.get(8)?),
    })
}

fn block_from_row(row: &Row<'_>) -> rusqlite::Result<Block> {
    Ok(Block {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        text: row.get(3)?,
        formatted_text: row.get(4)?,
        order: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
        deleted_at: parse_optional_datetime(row.get(8)?),
    })
}

fn image_from_row(row: &Row<'_>) -> rusqlite::Result<Image> {
    Ok(Image {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        caption: row.get(3)?,
        alt: row.get(4)?,
        path: row.get(5)?,
        order: row.get(6)?,
        created_at: parse_datetime(&row.get::<_, String>(7)?),
        updated_at: parse_datetime(&row.get::<_, String>(8)?),
        deleted_at: parse_optional_datetime(row.get(9)?),
    })
}

fn link_from_row(row: &Row<'_>) -> rusqlite::Result<Link> {
    Ok(Link {
        id: row.get(0)?,
        project_id: row.get(1)?,
        name: row.get(2)?,
        text: row.get(3)?,
        url: row.get(4)?,
        order: row.get(5)?,
        created_at: parse_datetime(&row.get::<_, String>(6)?),
        updated_at: parse_datetime(&row.get::<_, String>(7)?),
        deleted_at: parse_optional_datetime(row.get(8)?),
    })
}

/// Condition selecting a scope's rows; `?1` is always bound to the scope's
/// project id (NULL for the project scope).
fn scope_condition(scope: Scope<'_>) -> &'static str {
    match scope {
        Scope::Projects => "?1 IS NULL",
        Scope::Blocks(_) | Scope::Images(_) | Scope::Links(_) => "project_id = ?1",
    }
}

fn deleted_condition(deleted: Deleted) -> &'static str {
    match deleted {
        Deleted::Exclude => " AND deleted_at IS NULL",
        Deleted::Include => "",
        Deleted::Only => " AND deleted_at IS NOT NULL",
    }
}

fn order_clause(ordered: bool) -> &'static str {
    if ordered {
        "ORDER BY sort_order, rowid"
    } else {
        "ORDER BY rowid"
    }
}

/// Trashed rows count toward the maximum so a restore never collides.
fn max_order_in(conn: &Connection, scope: Scope<'_>) -> rusqlite::Result<Option<i64>> {
    conn.query_row(
        &format!(
            "SELECT MAX(sort_order) FROM {} WHERE {}",
            scope.kind().table(),
            scope_condition(scope)
        ),
        params![scope.project_id()],
        |row| row.get(0),
    )
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        let conn = self.conn();
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // Project operations

    fn create_project(&self, project: &Project, placement: Placement) -> Result<i64> {
        self.insert_placed(Scope::Projects, placement, |tx, order| {
            tx.execute(
                "INSERT INTO projects (id, name, type, slug, visible, sort_order, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    project.id,
                    project.name,
                    project.project_type,
                    project.slug,
                    project.visible,
                    order,
                    format_datetime(&project.created_at),
                    format_datetime(&project.updated_at),
                ],
            )
        })
    }

    fn get_project(&self, id: &str) -> Result<Option<Project>> {
        self.get_by_id(EntityKind::Project, PROJECT_COLUMNS, id, project_from_row)
    }

    fn list_projects(&self, filter: &Filter) -> Result<Vec<Project>> {
        let visible = match filter.visible {
            Some(true) => " AND visible = 1",
            Some(false) => " AND visible = 0",
            None => "",
        };

        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects WHERE 1 = 1{}{} {}",
            deleted_condition(filter.deleted),
            visible,
            order_clause(filter.ordered),
        ))?;

        let rows = stmt.query_map([], project_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_project(&self, id: &str, patch: &ProjectPatch, at: DateTime<Utc>) -> Result<Project> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "UPDATE projects SET name = COALESCE(?1, name), slug = COALESCE(?2, slug),
                     type = COALESCE(?3, type), visible = COALESCE(?4, visible),
                     sort_order = COALESCE(?5, sort_order), updated_at = ?6
                 WHERE id = ?7
                 RETURNING {PROJECT_COLUMNS}"
            ),
            params![
                patch.name,
                patch.slug(),
                patch.project_type,
                patch.visible,
                patch.order,
                format_datetime(&at),
                id,
            ],
            project_from_row,
        )
        .optional()?
        .ok_or(Error::NotFound)
    }

    fn list_projects_with_child_named(&self, kind: EntityKind, name: &str) -> Result<Vec<Project>> {
        if kind == EntityKind::Project {
            return Err(Error::BadRequest(
                "projects do not contain other projects".to_string(),
            ));
        }

        let conn = self.conn();
        let mut stmt = conn.prepare(&format!(
            "SELECT {PROJECT_COLUMNS} FROM projects p
             WHERE p.deleted_at IS NULL AND EXISTS (
                 SELECT 1 FROM {} c
                 WHERE c.project_id = p.id AND c.name = ?1 AND c.deleted_at IS NULL
             )
             ORDER BY p.rowid",
            kind.table()
        ))?;

        let rows = stmt.query_map(params![name], project_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    // Block operations

    fn create_block(&self, block: &Block, placement: Placement) -> Result<i64> {
        self.insert_placed(block.scope(), placement, |tx, order| {
            tx.execute(
                "INSERT INTO blocks (id, project_id, name, text, formatted_text, sort_order, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    block.id,
                    block.project_id,
                    block.name,
                    block.text,
                    block.formatted_text,
                    order,
                    format_datetime(&block.created_at),
                    format_datetime(&block.updated_at),
                ],
            )
        })
    }

    fn get_block(&self, id: &str) -> Result<Option<Block>> {
        self.get_by_id(EntityKind::Block, BLOCK_COLUMNS, id, block_from_row)
    }

    fn list_blocks(&self, project_id: &str, filter: &Filter) -> Result<Vec<Block>> {
        self.list_children(EntityKind::Block, BLOCK_COLUMNS, project_id, filter, block_from_row)
    }

    fn update_block(&self, id: &str, patch: &BlockPatch, at: DateTime<Utc>) -> Result<Block> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "UPDATE blocks SET name = COALESCE(?1, name), text = COALESCE(?2, text),
                     formatted_text = COALESCE(?3, formatted_text),
                     sort_order = COALESCE(?4, sort_order), updated_at = ?5
                 WHERE id = ?6
                 RETURNING {BLOCK_COLUMNS}"
            ),
            params![
                patch.name,
                patch.text,
                patch.formatted_text,
                patch.order,
                format_datetime(&at),
                id,
            ],
            block_from_row,
        )
        .optional()?
        .ok_or(Error::NotFound)
    }

    // Image operations

    fn create_image(&self, image: &Image, placement: Placement) -> Result<i64> {
        self.insert_placed(image.scope(), placement, |tx, order| {
            tx.execute(
                "INSERT INTO images (id, project_id, name, caption, alt, path, sort_order, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    image.id,
                    image.project_id,
                    image.name,
                    image.caption,
                    image.alt,
                    image.path,
                    order,
                    format_datetime(&image.created_at),
                    format_datetime(&image.updated_at),
                ],
            )
        })
    }

    fn get_image(&self, id: &str) -> Result<Option<Image>> {
        self.get_by_id(EntityKind::Image, IMAGE_COLUMNS, id, image_from_row)
    }

    fn list_images(&self, project_id: &str, filter: &Filter) -> Result<Vec<Image>> {
        self.list_children(EntityKind::Image, IMAGE_COLUMNS, project_id, filter, image_from_row)
    }

    fn update_image(&self, id: &str, patch: &ImagePatch, at: DateTime<Utc>) -> Result<Image> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "UPDATE images SET name = COALESCE(?1, name), path = COALESCE(?2, path),
                     caption = CASE WHEN ?3 THEN ?4 ELSE caption END,
                     alt = CASE WHEN ?5 THEN ?6 ELSE alt END,
                     sort_order = COALESCE(?7, sort_order), updated_at = ?8
                 WHERE id = ?9
                 RETURNING {IMAGE_COLUMNS}"
            ),
            params![
                patch.name,
                patch.path,
                patch.caption.is_some(),
                patch.caption.as_ref().and_then(|caption| caption.as_deref()),
                patch.alt.is_some(),
                patch.alt.as_ref().and_then(|alt| alt.as_deref()),
                patch.order,
                format_datetime(&at),
                id,
            ],
            image_from_row,
        )
        .optional()?
        .ok_or(Error::NotFound)
    }

    // Link operations

    fn create_link(&self, link: &Link, placement: Placement) -> Result<i64> {
        self.insert_placed(link.scope(), placement, |tx, order| {
            tx.execute(
                "INSERT INTO links (id, project_id, name, text, url, sort_order, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    link.id,
                    link.project_id,
                    link.name,
                    link.text,
                    link.url,
                    order,
                    format_datetime(&link.created_at),
                    format_datetime(&link.updated_at),
                ],
            )
        })
    }

    fn get_link(&self, id: &str) -> Result<Option<Link>> {
        self.get_by_id(EntityKind::Link, LINK_COLUMNS, id, link_from_row)
    }

    fn list_links(&self, project_id: &str, filter: &Filter) -> Result<Vec<Link>> {
        self.list_children(EntityKind::Link, LINK_COLUMNS, project_id, filter, link_from_row)
    }

    fn update_link(&self, id: &str, patch: &LinkPatch, at: DateTime<Utc>) -> Result<Link> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "UPDATE links SET name = COALESCE(?1, name), text = COALESCE(?2, text),
                     url = COALESCE(?3, url), sort_order = COALESCE(?4, sort_order),
                     updated_at = ?5
                 WHERE id = ?6
                 RETURNING {LINK_COLUMNS}"
            ),
            params![
                patch.name,
                patch.text,
                patch.url,
                patch.order,
                format_datetime(&at),
                id,
            ],
            link_from_row,
        )
        .optional()?
        .ok_or(Error::NotFound)
    }

    // Lifecycle operations

    fn soft_delete(&self, kind: EntityKind, id: &str, at: DateTime<Utc>) -> Result<bool> {
        let rows = self.conn().execute(
            &format!(
                "UPDATE {} SET deleted_at = ?1 WHERE id = ?2 AND deleted_at IS NULL",
                kind.table()
            ),
            params![format_datetime(&at), id],
        )?;
        Ok(rows > 0)
    }

    fn restore(&self, kind: EntityKind, id: &str) -> Result<bool> {
        let table = kind.table();
        let owner = match kind {
            EntityKind::Project => "NULL",
            EntityKind::Block | EntityKind::Image | EntityKind::Link => "project_id",
        };

        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let removed: Option<(Option<String>, i64)> = tx
            .query_row(
                &format!(
                    "SELECT {owner}, sort_order FROM {table} WHERE id = ?1 AND deleted_at IS NOT NULL"
                ),
                params![id],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        let Some((project_id, order)) = removed else {
            return Ok(false);
        };
        let scope = project_id
            .as_deref()
            .map_or(Scope::Projects, |project_id| Scope::children(kind, project_id));

        let taken: bool = tx.query_row(
            &format!(
                "SELECT EXISTS (SELECT 1 FROM {table}
                     WHERE {} AND sort_order = ?2 AND deleted_at IS NULL)",
                scope_condition(scope)
            ),
            params![scope.project_id(), order],
            |row| row.get(0),
        )?;

        let order = if taken {
            max_order_in(&tx, scope)?.map_or(0, |max| max + 1)
        } else {
            order
        };

        tx.execute(
            &format!("UPDATE {table} SET deleted_at = NULL, sort_order = ?1 WHERE id = ?2"),
            params![order, id],
        )?;
        tx.commit()?;
        Ok(true)
    }

    fn purge(&self, kind: EntityKind, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute(&format!("DELETE FROM {} WHERE id = ?1", kind.table()), params![id])?;
        Ok(rows > 0)
    }

    fn is_trashed(&self, kind: EntityKind, id: &str) -> Result<Option<bool>> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT deleted_at IS NOT NULL FROM {} WHERE id = ?1",
                kind.table()
            ),
            params![id],
            |row| row.get(0),
        )
        .optional()
        .map_err(Error::from)
    }

    // Ordering operations

    fn max_order(&self, scope: Scope<'_>) -> Result<Option<i64>> {
        max_order_in(&self.conn(), scope).map_err(Error::from)
    }

    fn reorder(&self, scope: Scope<'_>, ids: &[String]) -> Result<()> {
        let mut seen = HashSet::with_capacity(ids.len());
        if let Some(dup) = ids.iter().find(|id| !seen.insert(id.as_str())) {
            return Err(Error::BadRequest(format!("duplicate id in ordering: {dup}")));
        }

        let kind = scope.kind();
        let table = kind.table();
        let condition = scope_condition(scope);

        let mut conn = self.conn();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let active: i64 = tx.query_row(
            &format!("SELECT COUNT(*) FROM {table} WHERE {condition} AND deleted_at IS NULL"),
            params![scope.project_id()],
            |row| row.get(0),
        )?;

        if active != ids.len() as i64 {
            return Err(Error::BadRequest(format!(
                "ordering must list every active {kind} in scope: expected {active}, got {}",
                ids.len()
            )));
        }

        let now = format_datetime(&Utc::now());
        for (position, id) in ids.iter().enumerate() {
            let rows = tx.execute(
                &format!(
                    "UPDATE {table} SET sort_order = ?2, updated_at = ?3
                     WHERE {condition} AND id = ?4 AND deleted_at IS NULL"
                ),
                params![scope.project_id(), position as i64, now, id],
            )?;

            if rows == 0 {
                return Err(Error::BadRequest(format!(
                    "{kind} '{id}' is not an active member of this scope"
                )));
            }
        }

        // Removed rows follow the active ones so a later restore keeps a free slot.
        let removed: Vec<String> = {
            let mut stmt = tx.prepare(&format!(
                "SELECT id FROM {table} WHERE {condition} AND deleted_at IS NOT NULL
                 ORDER BY sort_order, rowid"
            ))?;
            let rows = stmt.query_map(params![scope.project_id()], |row| row.get(0))?;
            rows.collect::<rusqlite::Result<_>>()?
        };
        for (offset, id) in removed.iter().enumerate() {
            tx.execute(
                &format!("UPDATE {table} SET sort_order = ?1 WHERE id = ?2"),
                params![active + offset as i64, id],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    fn count(&self, kind: EntityKind, deleted: Deleted) -> Result<i64> {
        let conn = self.conn();
        conn.query_row(
            &format!(
                "SELECT COUNT(*) FROM {} WHERE 1 = 1{}",
                kind.table(),
                deleted_condition(deleted)
            ),
            [],
            |row| row.get(0),
        )
        .map_err(Error::from)
    }
}
