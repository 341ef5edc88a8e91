use serde::Serialize;

use crate::portfolio::Portfolio;
use crate::types::{
    BlockPatch, Entity, ImagePatch, LinkPatch, NewBlock, NewImage, NewLink, Project,
};

use super::commands::{BlockCommands, ImageCommands, LinkCommands, ReorderArgs};
use super::{Lifecycle, init_portfolio, print_json, run_lifecycle};

fn project(portfolio: &Portfolio, id: &str) -> anyhow::Result<Project> {
    portfolio
        .find_project(id)?
        .ok_or_else(|| anyhow::anyhow!("Project not found: {}", id))
}

fn found<E: Entity>(entity: Option<E>, id: &str) -> anyhow::Result<E> {
    entity.ok_or_else(|| anyhow::anyhow!("{} not found: {}", E::KIND, id))
}

fn print_added<E: Entity + Serialize>(entity: &E, json: bool) -> anyhow::Result<()> {
    if json {
        print_json(entity)
    } else {
        println!(
            "Added {} \"{}\" ({}) at order {}",
            E::KIND,
            entity.name(),
            entity.id(),
            entity.order()
        );
        Ok(())
    }
}

fn print_entities<E: Entity>(entities: &[E]) {
    if entities.is_empty() {
        println!("No {}s.", E::KIND);
    }
    for entity in entities {
        println!("  {:>4}  {}  {}", entity.order(), entity.id(), entity.name());
    }
}

pub fn run_block(data_dir: &str, command: BlockCommands) -> anyhow::Result<()> {
    let portfolio = init_portfolio(data_dir)?;

    match command {
        BlockCommands::Add {
            project_id,
            name,
            text,
            formatted_text,
            order,
            json,
        } => {
            let project = project(&portfolio, &project_id)?;
            let block = portfolio.add_block(
                &project,
                NewBlock {
                    name,
                    text,
                    formatted_text,
                    order,
                },
            )?;
            print_added(&block, json)?;
        }
        BlockCommands::Update {
            id,
            name,
            text,
            formatted_text,
            order,
        } => {
            let block = found(portfolio.find_block(&id)?, &id)?;
            let block = portfolio.update_block(
                &block,
                BlockPatch {
                    name,
                    text,
                    formatted_text,
                    order,
                },
            )?;
            println!("Updated block \"{}\"", block.name);
        }
        BlockCommands::List { project_id, json } => {
            let blocks = portfolio.blocks(&project(&portfolio, &project_id)?)?;
            if json {
                print_json(&blocks)?;
            } else {
                print_entities(&blocks);
            }
        }
        BlockCommands::Remove(args) => {
            let block = found(portfolio.find_block(&args.id)?, &args.id)?;
            run_lifecycle(&portfolio, &block, Lifecycle::Remove, &args)?;
        }
        BlockCommands::Restore(args) => {
            let block = found(portfolio.find_block(&args.id)?, &args.id)?;
            run_lifecycle(&portfolio, &block, Lifecycle::Restore, &args)?;
        }
        BlockCommands::Purge(args) => {
            let block = found(portfolio.find_block(&args.id)?, &args.id)?;
            run_lifecycle(&portfolio, &block, Lifecycle::Purge, &args)?;
        }
        BlockCommands::Reorder(ReorderArgs { project_id, ids }) => {
            let blocks = portfolio.reorder_blocks(&project(&portfolio, &project_id)?, &ids)?;
            print_entities(&blocks);
        }
    }

    Ok(())
}

#[derive(Serialize)]
struct ImageOutput {
    #[serde(flatten)]
    image: crate::types::Image,
    url: String,
}

pub fn run_image(data_dir: &str, command: ImageCommands) -> anyhow::Result<()> {
    let portfolio = init_portfolio(data_dir)?;

    match command {
        ImageCommands::Add {
            project_id,
            name,
            path,
            caption,
            alt,
            order,
            json,
        } => {
            let project = project(&portfolio, &project_id)?;
            let image = portfolio.add_image(
                &project,
                NewImage {
                    name,
                    path,
                    caption,
                    alt,
                    order,
                },
            )?;
            print_added(&image, json)?;
        }
        ImageCommands::Update {
            id,
            name,
            path,
            caption,
            clear_caption,
            alt,
            clear_alt,
            order,
        } => {
            let image = found(portfolio.find_image(&id)?, &id)?;
            let image = portfolio.update_image(
                &image,
                ImagePatch {
                    name,
                    path,
                    caption: if clear_caption { Some(None) } else { caption.map(Some) },
                    alt: if clear_alt { Some(None) } else { alt.map(Some) },
                    order,
                },
            )?;
            println!("Updated image \"{}\"", image.name);
        }
        ImageCommands::List {
            project_id,
            size,
            json,
        } => {
            let images = portfolio.images(&project(&portfolio, &project_id)?)?;
            let outputs: Vec<ImageOutput> = images
                .into_iter()
                .map(|image| ImageOutput {
                    url: portfolio.url_for(&image, size.as_deref()),
                    image,
                })
                .collect();

            if json {
                print_json(&outputs)?;
            } else if outputs.is_empty() {
                println!("No images.");
            } else {
                for output in &outputs {
                    println!(
                        "  {:>4}  {}  {}  {}",
                        output.image.order, output.image.id, output.image.name, output.url
                    );
                }
            }
        }
        ImageCommands::Remove(args) => {
            let image = found(portfolio.find_image(&args.id)?, &args.id)?;
            run_lifecycle(&portfolio, &image, Lifecycle::Remove, &args)?;
        }
        ImageCommands::Restore(args) => {
            let image = found(portfolio.find_image(&args.id)?, &args.id)?;
            run_lifecycle(&portfolio, &image, Lifecycle::Restore, &args)?;
        }
        ImageCommands::Purge(args) => {
            let image = found(portfolio.find_image(&args.id)?, &args.id)?;
            run_lifecycle(&portfolio, &image, Lifecycle::Purge, &args)?;
        }
        ImageCommands::Reorder(ReorderArgs { project_id, ids }) => {
            let images = portfolio.reorder_images(&project(&portfolio, &project_id)?, &ids)?;
            print_entities(&images);
        }
    }

    Ok(())
}

pub fn run_link(data_dir: &str, command: LinkCommands) -> anyhow::Result<()> {
    let portfolio = init_portfolio(data_dir)?;

    match command {
        LinkCommands::Add {
            project_id,
            name,
            url,
            text,
            order,
            json,
        } => {
            let project = project(&portfolio, &project_id)?;
            let link = portfolio.add_link(
                &project,
                NewLink {
                    name,
                    url,
                    text,
                    order,
                },
            )?;
            print_added(&link, json)?;
        }
        LinkCommands::Update {
            id,
            name,
            url,
            text,
            order,
        } => {
            let link = found(portfolio.find_link(&id)?, &id)?;
            let link = portfolio.update_link(
                &link,
                LinkPatch {
                    name,
                    text,
                    url,
                    order,
                },
            )?;
            println!("Updated link \"{}\"", link.name);
        }
        LinkCommands::List { project_id, json } => {
            let links = portfolio.links(&project(&portfolio, &project_id)?)?;
            if json {
                print_json(&links)?;
            } else {
                print_entities(&links);
            }
        }
        LinkCommands::Remove(args) => {
            let link = found(portfolio.find_link(&args.id)?, &args.id)?;
            run_lifecycle(&portfolio, &link, Lifecycle::Remove, &args)?;
        }
        LinkCommands::Restore(args) => {
            let link = found(portfolio.find_link(&args.id)?, &args.id)?;
            run_lifecycle(&portfolio, &link, Lifecycle::Restore, &args)?;
        }
        LinkCommands::Purge(args) => {
            let link = found(portfolio.find_link(&args.id)?, &args.id)?;
            run_lifecycle(&portfolio, &link, Lifecycle::Purge, &args)?;
        }
        LinkCommands::Reorder(ReorderArgs { project_id, ids }) => {
            let links = portfolio.reorder_links(&project(&portfolio, &project_id)?, &ids)?;
            print_entities(&links);
        }
    }

    Ok(())
}
