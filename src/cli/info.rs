use serde::Serialize;

use crate::portfolio::ViewOptions;
use crate::types::{Deleted, EntityKind};

use super::{init_portfolio, print_json};

#[derive(Serialize)]
struct KindCounts {
    active: i64,
    removed: i64,
}

#[derive(Serialize)]
struct FolioInfo {
    projects: KindCounts,
    projects_visible: usize,
    projects_hidden: usize,
    blocks: KindCounts,
    images: KindCounts,
    links: KindCounts,
    image_url_prefix: String,
    default_image_size: String,
}

pub fn run_info(data_dir: &str, json: bool) -> anyhow::Result<()> {
    let portfolio = init_portfolio(data_dir)?;
    let store = portfolio.store();

    let counts = |kind: EntityKind| -> anyhow::Result<KindCounts> {
        Ok(KindCounts {
            active: store.count(kind, Deleted::Exclude)?,
            removed: store.count(kind, Deleted::Only)?,
        })
    };

    let visible = portfolio
        .all_visible(ViewOptions {
            grouped: false,
            ordered: false,
        })?
        .flatten();

    let info = FolioInfo {
        projects: counts(EntityKind::Project)?,
        projects_visible: visible.len(),
        projects_hidden: portfolio.all_hidden()?.len(),
        blocks: counts(EntityKind::Block)?,
        images: counts(EntityKind::Image)?,
        links: counts(EntityKind::Link)?,
        image_url_prefix: portfolio.image_url_prefix().to_string(),
        default_image_size: portfolio.default_image_size().to_string(),
    };

    if json {
        return print_json(&info);
    }

    println!();
    println!("Folio Status");
    println!("{}", "─".repeat(20));
    println!(
        "Projects:  {} ({} visible, {} hidden, {} removed)",
        info.projects.active, info.projects_visible, info.projects_hidden, info.projects.removed
    );
    println!("Blocks:    {} ({} removed)", info.blocks.active, info.blocks.removed);
    println!("Images:    {} ({} removed)", info.images.active, info.images.removed);
    println!("Links:     {} ({} removed)", info.links.active, info.links.removed);
    println!();
    println!("Image URLs:  {}/{}/<path>", info.image_url_prefix, info.default_image_size);
    println!();

    Ok(())
}
