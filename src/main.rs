use std::fs;
use std::path::PathBuf;

use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use folio::cli::{
    BlockCommands, ImageCommands, LinkCommands, ProjectCommands, run_block, run_image, run_info,
    run_link, run_project,
};
use folio::config::FolioConfig;
use folio::store::{SqliteStore, Store};

#[derive(Parser)]
#[command(name = "folio")]
#[command(about = "A portfolio content manager", long_about = None)]
struct Cli {
    /// Data directory holding folio.db and folio.toml
    #[arg(long, global = true, default_value = "./data")]
    data_dir: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and configuration in the data directory
    Init {
        /// URL prefix image paths are served under
        #[arg(long)]
        image_url_prefix: Option<String>,

        /// Rendition used for image URLs when no size is given
        #[arg(long)]
        default_image_size: Option<String>,
    },

    /// Manage projects
    Project {
        #[command(subcommand)]
        command: ProjectCommands,
    },

    /// Manage text blocks
    Block {
        #[command(subcommand)]
        command: BlockCommands,
    },

    /// Manage images
    Image {
        #[command(subcommand)]
        command: ImageCommands,
    },

    /// Manage links
    Link {
        #[command(subcommand)]
        command: LinkCommands,
    },

    /// Show portfolio status
    Info {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

fn run_init(
    data_dir: &str,
    image_url_prefix: Option<String>,
    default_image_size: Option<String>,
) -> anyhow::Result<()> {
    let mut config = FolioConfig {
        data_dir: PathBuf::from(data_dir),
        ..FolioConfig::default()
    };
    if let Some(prefix) = image_url_prefix {
        config.image_url_prefix = prefix;
    }
    if let Some(size) = default_image_size {
        config.default_image_size = size;
    }
    config.validate()?;

    fs::create_dir_all(&config.data_dir)?;

    let db_path = config.db_path();
    if db_path.exists() {
        bail!("Folio already initialized at {}", db_path.display());
    }

    let store = SqliteStore::new(&db_path)?;
    store.initialize()?;
    config.save()?;

    info!("Initialized database at {}", db_path.display());
    println!("Initialized folio in {}", config.data_dir.display());

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("folio=info".parse()?))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let data_dir = cli.data_dir;

    match cli.command {
        Commands::Init {
            image_url_prefix,
            default_image_size,
        } => run_init(&data_dir, image_url_prefix, default_image_size)?,
        Commands::Project { command } => run_project(&data_dir, command)?,
        Commands::Block { command } => run_block(&data_dir, command)?,
        Commands::Image { command } => run_image(&data_dir, command)?,
        Commands::Link { command } => run_link(&data_dir, command)?,
        Commands::Info { json } => run_info(&data_dir, json)?,
    }

    Ok(())
}
