//! The ordering and grouping engine.
//!
//! [`Portfolio`] owns the `order` column of every sibling scope: projects are
//! one scope, and each project's blocks, images, and links form three more.
//! New entities append at `max(order) + 1`; [`Portfolio::reorder_projects`]
//! and friends rewrite a scope to the dense sequence `0..n`.

mod content;
mod grouping;
mod projects;

pub use grouping::Grouped;
pub use projects::{ProjectView, ViewOptions};

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::config::FolioConfig;
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Entity, Resource};

pub struct Portfolio {
    store: Arc<dyn Store>,
    image_url_prefix: String,
    default_image_size: String,
}

impl Portfolio {
    pub fn new(store: Arc<dyn Store>, config: &FolioConfig) -> Self {
        Self {
            store,
            image_url_prefix: config.image_url_prefix.clone(),
            default_image_size: config.default_image_size.clone(),
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn image_url_prefix(&self) -> &str {
        &self.image_url_prefix
    }

    pub fn default_image_size(&self) -> &str {
        &self.default_image_size
    }

    /// Soft-deletes the entity. Returns false if it was already removed or
    /// does not exist.
    pub fn remove<E: Entity>(&self, entity: &E) -> Result<bool> {
        let removed = self.store.soft_delete(E::KIND, entity.id(), Utc::now())?;
        if removed {
            info!("Removed {} {}", E::KIND, entity.id());
        }
        Ok(removed)
    }

    /// Clears the deletion timestamp. Returns false if the entity was not
    /// removed or does not exist.
    pub fn restore<E: Entity>(&self, entity: &E) -> Result<bool> {
        let restored = self.store.restore(E::KIND, entity.id())?;
        if restored {
            info!("Restored {} {}", E::KIND, entity.id());
        }
        Ok(restored)
    }

    /// Permanently deletes a removed entity. Purging an active entity is
    /// rejected with [`Error::NotTrashed`]; purging a project also purges
    /// its blocks, images, and links.
    pub fn purge<E: Entity>(&self, entity: &E) -> Result<bool> {
        match self.store.is_trashed(E::KIND, entity.id())? {
            None => Ok(false),
            Some(false) => {
                warn!("Refusing to purge active {} {}", E::KIND, entity.id());
                Err(Error::NotTrashed)
            }
            Some(true) => {
                let purged = self.store.purge(E::KIND, entity.id())?;
                info!("Purged {} {}", E::KIND, entity.id());
                Ok(purged)
            }
        }
    }
}

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// The child named exactly `name`, if any.
fn named<R: Resource>(children: Vec<R>, name: &str) -> Option<R> {
    children.into_iter().find(|child| child.name() == name)
}

/// The child sharing the parent's name, else the first child.
fn canonical<R: Resource>(parent_name: &str, children: Vec<R>) -> Option<R> {
    let idx = children
        .iter()
        .position(|child| child.name() == parent_name)
        .unwrap_or(0);
    children.into_iter().nth(idx)
}
