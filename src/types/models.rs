use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::slug::slugify;

/// The four persisted entity kinds. Each maps to its own table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    Project,
    Block,
    Image,
    Link,
}

impl EntityKind {
    pub const fn table(self) -> &'static str {
        match self {
            Self::Project => "projects",
            Self::Block => "blocks",
            Self::Image => "images",
            Self::Link => "links",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Project => "project",
            Self::Block => "block",
            Self::Image => "image",
            Self::Link => "link",
        };
        f.write_str(name)
    }
}

/// A sibling set within which `order` values are kept unique and dense.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    Projects,
    Blocks(&'a str),
    Images(&'a str),
    Links(&'a str),
}

impl<'a> Scope<'a> {
    pub const fn kind(self) -> EntityKind {
        match self {
            Self::Projects => EntityKind::Project,
            Self::Blocks(_) => EntityKind::Block,
            Self::Images(_) => EntityKind::Image,
            Self::Links(_) => EntityKind::Link,
        }
    }

    /// The owning project, or `None` for the top-level project scope.
    pub const fn project_id(self) -> Option<&'a str> {
        match self {
            Self::Projects => None,
            Self::Blocks(id) | Self::Images(id) | Self::Links(id) => Some(id),
        }
    }

    pub const fn children(kind: EntityKind, project_id: &'a str) -> Self {
        match kind {
            EntityKind::Project => Self::Projects,
            EntityKind::Block => Self::Blocks(project_id),
            EntityKind::Image => Self::Images(project_id),
            EntityKind::Link => Self::Links(project_id),
        }
    }
}

/// Capabilities shared by every persisted entity.
pub trait Entity {
    const KIND: EntityKind;

    fn id(&self) -> &str;
    fn name(&self) -> &str;
    fn order(&self) -> i64;
    fn deleted_at(&self) -> Option<DateTime<Utc>>;

    fn is_trashed(&self) -> bool {
        self.deleted_at().is_some()
    }
}

/// A sub-resource owned by exactly one project.
pub trait Resource: Entity {
    fn project_id(&self) -> &str;

    fn scope(&self) -> Scope<'_> {
        Scope::children(Self::KIND, self.project_id())
    }
}

/// Where a newly created entity lands in its scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// After every existing sibling: `max(order) + 1`, or 0 in an empty scope.
    #[default]
    Append,
    At(i64),
}

impl From<Option<i64>> for Placement {
    fn from(order: Option<i64>) -> Self {
        order.map_or(Self::Append, Self::At)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Deleted {
    #[default]
    Exclude,
    Include,
    Only,
}

/// Read filter for a scope query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Filter {
    pub visible: Option<bool>,
    pub deleted: Deleted,
    /// Sort by `order`; ties and unordered reads keep insertion order.
    pub ordered: bool,
}

impl Filter {
    #[must_use]
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = Some(visible);
        self
    }

    #[must_use]
    pub fn ordered(mut self, ordered: bool) -> Self {
        self.ordered = ordered;
        self
    }

    #[must_use]
    pub fn deleted(mut self, deleted: Deleted) -> Self {
        self.deleted = deleted;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub project_type: String,
    pub slug: String,
    pub visible: bool,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProject {
    pub name: String,
    #[serde(rename = "type", default)]
    pub project_type: Option<String>,
    #[serde(default)]
    pub visible: Option<bool>,
}

/// Partial update for a project. Absent fields are left untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProjectPatch {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub project_type: Option<String>,
    pub visible: Option<bool>,
    pub order: Option<i64>,
}

impl ProjectPatch {
    /// The slug to store alongside a rename.
    pub fn slug(&self) -> Option<String> {
        self.name.as_deref().map(slugify)
    }
}

impl Entity for Project {
    const KIND: EntityKind = EntityKind::Project;

    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn order(&self) -> i64 {
        self.order
    }

    fn deleted_at(&self) -> Option<DateTime<Utc>> {
        self.deleted_at
    }
}

/// A named text block. `formatted_text` holds the rendered form of `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub text: String,
    pub formatted_text: String,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Block {
    pub fn text(&self, formatted: bool) -> &str {
        if formatted {
            &self.formatted_text
        } else {
            &self.text
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewBlock {
    pub name: String,
    pub text: String,
    #[serde(default)]
    pub formatted_text: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlockPatch {
    pub name: Option<String>,
    pub text: Option<String>,
    pub formatted_text: Option<String>,
    pub order: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub project_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alt: Option<String>,
    pub path: String,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Image {
    /// Public URL of the image rendition at `size`, e.g. `/manager/images/small/cat.jpg`.
    pub fn url(&self, prefix: &str, size: &str) -> String {
        format!(
            "{}/{}/{}",
            prefix.trim_end_matches('/'),
            size,
            self.path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewImage {
    pub name: String,
    pub path: String,
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub alt: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

/// Partial update for an image. `caption` and `alt` are cleared with
/// `Some(None)` (`null` in JSON) and left untouched when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ImagePatch {
    pub name: Option<String>,
    pub path: Option<String>,
    #[serde(default, deserialize_with = "present")]
    pub caption: Option<Option<String>>,
    #[serde(default, deserialize_with = "present")]
    pub alt: Option<Option<String>>,
    pub order: Option<i64>,
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Link {
    pub id: String,
    pub project_id: String,
    pub name: String,
    pub text: String,
    pub url: String,
    pub order: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewLink {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub order: Option<i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkPatch {
    pub name: Option<String>,
    pub text: Option<String>,
    pub url: Option<String>,
    pub order: Option<i64>,
}

macro_rules! impl_resource {
    ($ty:ty, $kind:expr) => {
        impl Entity for $ty {
            const KIND: EntityKind = $kind;

            fn id(&self) -> &str {
                &self.id
            }

            fn name(&self) -> &str {
                &self.name
            }

            fn order(&self) -> i64 {
                self.order
            }

            fn deleted_at(&self) -> Option<DateTime<Utc>> {
                self.deleted_at
            }
        }

        impl Resource for $ty {
            fn project_id(&self) -> &str {
                &self.project_id
            }
        }
    };
}

impl_resource!(Block, EntityKind::Block);
impl_resource!(Image, EntityKind::Image);
impl_resource!(Link, EntityKind::Link);
