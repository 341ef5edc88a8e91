mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the persistence interface the portfolio engine runs on.
///
/// Creation methods take a [`Placement`]; with `Placement::Append` the store
/// assigns `max(order) + 1` for the entity's scope atomically with the insert
/// and returns the order it assigned.
///
/// Update methods write only the fields present in the patch and return the
/// stored row, or `Error::NotFound` when no row has the id.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // Project operations
    fn create_project(&self, project: &Project, placement: Placement) -> Result<i64>;
    fn get_project(&self, id: &str) -> Result<Option<Project>>;
    fn list_projects(&self, filter: &Filter) -> Result<Vec<Project>>;
    fn update_project(&self, id: &str, patch: &ProjectPatch, at: DateTime<Utc>) -> Result<Project>;

    /// Active projects owning at least one active child of `kind` named `name`.
    fn list_projects_with_child_named(&self, kind: EntityKind, name: &str) -> Result<Vec<Project>>;

    // Block operations
    fn create_block(&self, block: &Block, placement: Placement) -> Result<i64>;
    fn get_block(&self, id: &str) -> Result<Option<Block>>;
    fn list_blocks(&self, project_id: &str, filter: &Filter) -> Result<Vec<Block>>;
    fn update_block(&self, id: &str, patch: &BlockPatch, at: DateTime<Utc>) -> Result<Block>;

    // Image operations
    fn create_image(&self, image: &Image, placement: Placement) -> Result<i64>;
    fn get_image(&self, id: &str) -> Result<Option<Image>>;
    fn list_images(&self, project_id: &str, filter: &Filter) -> Result<Vec<Image>>;
    fn update_image(&self, id: &str, patch: &ImagePatch, at: DateTime<Utc>) -> Result<Image>;

    // Link operations
    fn create_link(&self, link: &Link, placement: Placement) -> Result<i64>;
    fn get_link(&self, id: &str) -> Result<Option<Link>>;
    fn list_links(&self, project_id: &str, filter: &Filter) -> Result<Vec<Link>>;
    fn update_link(&self, id: &str, patch: &LinkPatch, at: DateTime<Utc>) -> Result<Link>;

    // Lifecycle operations, shared by every entity kind
    fn soft_delete(&self, kind: EntityKind, id: &str, at: DateTime<Utc>) -> Result<bool>;
    /// Clears the deletion timestamp. A restored row whose order is now held
    /// by an active sibling moves to the end of its scope.
    fn restore(&self, kind: EntityKind, id: &str) -> Result<bool>;
    fn purge(&self, kind: EntityKind, id: &str) -> Result<bool>;
    /// `None` when the row does not exist.
    fn is_trashed(&self, kind: EntityKind, id: &str) -> Result<Option<bool>>;

    // Ordering operations
    fn max_order(&self, scope: Scope<'_>) -> Result<Option<i64>>;
    /// Rewrites the scope's orders to `0..ids.len()` following `ids`. The ids
    /// must be exactly the active members of the scope; removed members are
    /// renumbered after them.
    fn reorder(&self, scope: Scope<'_>, ids: &[String]) -> Result<()>;

    fn count(&self, kind: EntityKind, deleted: Deleted) -> Result<i64>;
}
