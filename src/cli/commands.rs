use clap::{Args, Subcommand, ValueEnum};

/// Which projects `project list` shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ListView {
    /// Visible projects, grouped by type unless --flat
    Visible,
    /// Hidden projects
    Hidden,
    /// All projects grouped by type
    Grouped,
    /// All projects sorted by order
    Ordered,
    /// Removed projects
    Trashed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ChildKind {
    Block,
    Image,
    Link,
}

/// Arguments shared by remove, restore, and purge.
#[derive(Debug, Args)]
pub struct LifecycleArgs {
    /// ID of the entity
    #[arg(long)]
    pub id: String,

    /// Skip confirmation prompt (purge only)
    #[arg(long, short = 'y')]
    pub yes: bool,

    /// Skip interactive prompts (purge requires --yes)
    #[arg(long)]
    pub non_interactive: bool,
}

#[derive(Debug, Args)]
pub struct ReorderArgs {
    /// Owning project ID
    #[arg(long)]
    pub project_id: String,

    /// Every active ID in the new order, comma separated
    #[arg(long, value_delimiter = ',', required = true)]
    pub ids: Vec<String>,
}

#[derive(Debug, Subcommand)]
pub enum ProjectCommands {
    /// Add a project at the end of the ordering
    Add {
        /// Project name
        #[arg(long)]
        name: String,

        /// Project type used for grouping
        #[arg(long = "type")]
        project_type: Option<String>,

        /// Make the project visible
        #[arg(long)]
        visible: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update fields of a project
    Update {
        /// Project ID
        #[arg(long)]
        id: String,

        /// New name (the slug follows)
        #[arg(long)]
        name: Option<String>,

        /// New type
        #[arg(long = "type")]
        project_type: Option<String>,

        /// Visibility
        #[arg(long)]
        visible: Option<bool>,

        /// Explicit order value
        #[arg(long)]
        order: Option<i64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a project (it can be restored)
    Remove(LifecycleArgs),

    /// Restore a removed project
    Restore(LifecycleArgs),

    /// Permanently delete a removed project and its content
    Purge(LifecycleArgs),

    /// List projects
    List {
        /// Which view to show
        #[arg(long, value_enum, default_value = "ordered")]
        view: ListView,

        /// Do not group the visible view by type
        #[arg(long)]
        flat: bool,

        /// Keep insertion order instead of sorting by order
        #[arg(long)]
        unordered: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show a project with its blocks, images, and links
    Show {
        /// Project ID
        #[arg(long, conflicts_with = "slug", required_unless_present = "slug")]
        id: Option<String>,

        /// Project slug
        #[arg(long)]
        slug: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Rewrite project order to follow the given IDs
    Reorder {
        /// Every active project ID in the new order, comma separated
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,
    },

    /// List projects owning content with an exact name
    Having {
        /// Content kind to search
        #[arg(long, value_enum)]
        kind: ChildKind,

        /// Exact content name
        #[arg(long)]
        name: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Subcommand)]
pub enum BlockCommands {
    /// Add a text block to a project
    Add {
        /// Owning project ID
        #[arg(long)]
        project_id: String,

        /// Block name
        #[arg(long)]
        name: String,

        /// Raw text
        #[arg(long)]
        text: String,

        /// Rendered text (defaults to the raw text)
        #[arg(long)]
        formatted_text: Option<String>,

        /// Explicit order (defaults to the end)
        #[arg(long)]
        order: Option<i64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update a text block
    Update {
        /// Block ID
        #[arg(long)]
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        formatted_text: Option<String>,

        #[arg(long)]
        order: Option<i64>,
    },

    /// List a project's blocks in order
    List {
        /// Owning project ID
        #[arg(long)]
        project_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a block (it can be restored)
    Remove(LifecycleArgs),

    /// Restore a removed block
    Restore(LifecycleArgs),

    /// Permanently delete a removed block
    Purge(LifecycleArgs),

    /// Rewrite block order to follow the given IDs
    Reorder(ReorderArgs),
}

#[derive(Debug, Subcommand)]
pub enum ImageCommands {
    /// Add an image to a project
    Add {
        /// Owning project ID
        #[arg(long)]
        project_id: String,

        /// Image name
        #[arg(long)]
        name: String,

        /// Path of the stored image file
        #[arg(long)]
        path: String,

        #[arg(long)]
        caption: Option<String>,

        #[arg(long)]
        alt: Option<String>,

        /// Explicit order (defaults to the end)
        #[arg(long)]
        order: Option<i64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update an image
    Update {
        /// Image ID
        #[arg(long)]
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        path: Option<String>,

        #[arg(long)]
        caption: Option<String>,

        /// Remove the caption
        #[arg(long, conflicts_with = "caption")]
        clear_caption: bool,

        #[arg(long)]
        alt: Option<String>,

        /// Remove the alt text
        #[arg(long, conflicts_with = "alt")]
        clear_alt: bool,

        #[arg(long)]
        order: Option<i64>,
    },

    /// List a project's images in order, with URLs
    List {
        /// Owning project ID
        #[arg(long)]
        project_id: String,

        /// Rendition size for URLs (defaults to the configured size)
        #[arg(long)]
        size: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove an image (it can be restored)
    Remove(LifecycleArgs),

    /// Restore a removed image
    Restore(LifecycleArgs),

    /// Permanently delete a removed image
    Purge(LifecycleArgs),

    /// Rewrite image order to follow the given IDs
    Reorder(ReorderArgs),
}

#[derive(Debug, Subcommand)]
pub enum LinkCommands {
    /// Add a link to a project
    Add {
        /// Owning project ID
        #[arg(long)]
        project_id: String,

        /// Link name
        #[arg(long)]
        name: String,

        /// Target URL
        #[arg(long)]
        url: String,

        /// Link text (defaults to the name)
        #[arg(long)]
        text: Option<String>,

        /// Explicit order (defaults to the end)
        #[arg(long)]
        order: Option<i64>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update a link
    Update {
        /// Link ID
        #[arg(long)]
        id: String,

        #[arg(long)]
        name: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        text: Option<String>,

        #[arg(long)]
        order: Option<i64>,
    },

    /// List a project's links in order
    List {
        /// Owning project ID
        #[arg(long)]
        project_id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Remove a link (it can be restored)
    Remove(LifecycleArgs),

    /// Restore a removed link
    Restore(LifecycleArgs),

    /// Permanently delete a removed link
    Purge(LifecycleArgs),

    /// Rewrite link order to follow the given IDs
    Reorder(ReorderArgs),
}
