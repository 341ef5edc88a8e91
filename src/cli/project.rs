use crate::portfolio::{Portfolio, ProjectView, ViewOptions};
use crate::types::{NewProject, Project, ProjectPatch};

use super::commands::{ChildKind, ListView, ProjectCommands};
use super::{Lifecycle, init_portfolio, print_json, run_lifecycle};

pub fn run_project(data_dir: &str, command: ProjectCommands) -> anyhow::Result<()> {
    let portfolio = init_portfolio(data_dir)?;

    match command {
        ProjectCommands::Add {
            name,
            project_type,
            visible,
            json,
        } => {
            let project = portfolio.add_project(NewProject {
                name,
                project_type,
                visible: Some(visible),
            })?;

            if json {
                print_json(&project)?;
            } else {
                println!(
                    "Created project \"{}\" ({}) at order {}",
                    project.name, project.id, project.order
                );
            }
        }
        ProjectCommands::Update {
            id,
            name,
            project_type,
            visible,
            order,
            json,
        } => {
            let project = find(&portfolio, &id)?;
            let project = portfolio.update_project(
                &project,
                ProjectPatch {
                    name,
                    project_type,
                    visible,
                    order,
                },
            )?;

            if json {
                print_json(&project)?;
            } else {
                println!("Updated project \"{}\"", project.name);
            }
        }
        ProjectCommands::Remove(args) => {
            run_lifecycle(&portfolio, &find(&portfolio, &args.id)?, Lifecycle::Remove, &args)?;
        }
        ProjectCommands::Restore(args) => {
            run_lifecycle(&portfolio, &find(&portfolio, &args.id)?, Lifecycle::Restore, &args)?;
        }
        ProjectCommands::Purge(args) => {
            run_lifecycle(&portfolio, &find(&portfolio, &args.id)?, Lifecycle::Purge, &args)?;
        }
        ProjectCommands::List {
            view,
            flat,
            unordered,
            json,
        } => run_list(&portfolio, view, flat, unordered, json)?,
        ProjectCommands::Show { id, slug, json } => {
            let project = match (id, slug) {
                (Some(id), _) => find(&portfolio, &id)?,
                (None, Some(slug)) => portfolio
                    .find_project_by_slug(&slug)?
                    .ok_or_else(|| anyhow::anyhow!("Project not found: {}", slug))?,
                (None, None) => anyhow::bail!("--id or --slug is required"),
            };
            run_show(&portfolio, project, json)?;
        }
        ProjectCommands::Reorder { ids } => {
            let projects = portfolio.reorder_projects(&ids)?;
            print_projects(&projects);
        }
        ProjectCommands::Having { kind, name, json } => {
            let projects = match kind {
                ChildKind::Block => portfolio.has_block_named(&name)?,
                ChildKind::Image => portfolio.has_image_named(&name)?,
                ChildKind::Link => portfolio.has_link_named(&name)?,
            };

            if json {
                print_json(&projects)?;
            } else {
                print_projects(&projects);
            }
        }
    }

    Ok(())
}

fn find(portfolio: &Portfolio, id: &str) -> anyhow::Result<Project> {
    portfolio
        .find_project(id)?
        .ok_or_else(|| anyhow::anyhow!("Project not found: {}", id))
}

fn run_list(
    portfolio: &Portfolio,
    view: ListView,
    flat: bool,
    unordered: bool,
    json: bool,
) -> anyhow::Result<()> {
    let view = match view {
        ListView::Visible => portfolio.all_visible(ViewOptions {
            grouped: !flat,
            ordered: !unordered,
        })?,
        ListView::Hidden => ProjectView::Flat(portfolio.all_hidden()?),
        ListView::Grouped => ProjectView::Grouped(portfolio.all_grouped(!unordered)?),
        ListView::Ordered => ProjectView::Flat(portfolio.all_ordered()?),
        ListView::Trashed => ProjectView::Flat(portfolio.all_trashed()?),
    };

    if json {
        return print_json(&view);
    }

    match view {
        ProjectView::Grouped(grouped) => {
            if grouped.is_empty() {
                println!("No projects.");
            }
            for (project_type, projects) in grouped.iter() {
                let label = if project_type.is_empty() {
                    "(untyped)"
                } else {
                    project_type
                };
                println!("{label}");
                print_projects(projects);
            }
        }
        ProjectView::Flat(projects) => {
            if projects.is_empty() {
                println!("No projects.");
            }
            print_projects(&projects);
        }
    }

    Ok(())
}

fn print_projects(projects: &[Project]) {
    for project in projects {
        let visibility = if project.visible { "visible" } else { "hidden" };
        println!(
            "  {:>4}  {}  {}  [{}] {}",
            project.order, project.id, project.name, project.slug, visibility
        );
    }
}

#[derive(serde::Serialize)]
struct ProjectDetail {
    #[serde(flatten)]
    project: Project,
    blocks: Vec<crate::types::Block>,
    images: Vec<ImageDetail>,
    links: Vec<crate::types::Link>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_block_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    project_image_url: Option<String>,
}

#[derive(serde::Serialize)]
struct ImageDetail {
    #[serde(flatten)]
    image: crate::types::Image,
    url: String,
}

fn run_show(portfolio: &Portfolio, project: Project, json: bool) -> anyhow::Result<()> {
    let images = portfolio
        .images(&project)?
        .into_iter()
        .map(|image| ImageDetail {
            url: portfolio.url_for(&image, None),
            image,
        })
        .collect();

    let detail = ProjectDetail {
        blocks: portfolio.blocks(&project)?,
        links: portfolio.links(&project)?,
        project_block_text: portfolio.project_block_text(&project, true)?,
        project_image_url: portfolio.project_image_url(&project, None)?,
        images,
        project,
    };

    if json {
        return print_json(&detail);
    }

    let project = &detail.project;
    println!();
    println!("{} ({})", project.name, project.id);
    println!("{}", "─".repeat(20));
    println!("Slug:     {}", project.slug);
    println!("Type:     {}", project.project_type);
    println!("Visible:  {}", project.visible);
    println!("Order:    {}", project.order);
    if let Some(deleted_at) = project.deleted_at {
        println!("Removed:  {}", deleted_at.to_rfc3339());
    }
    if let Some(text) = &detail.project_block_text {
        println!();
        println!("{text}");
    }

    println!();
    println!("Blocks:");
    for block in &detail.blocks {
        println!("  {:>4}  {}  {}", block.order, block.id, block.name);
    }
    println!("Images:");
    for image in &detail.images {
        println!(
            "  {:>4}  {}  {}  {}",
            image.image.order, image.image.id, image.image.name, image.url
        );
    }
    println!("Links:");
    for link in &detail.links {
        println!("  {:>4}  {}  {}  {}", link.order, link.id, link.name, link.url);
    }
    println!();

    Ok(())
}
