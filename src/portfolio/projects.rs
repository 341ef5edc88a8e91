use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use super::{Grouped, Portfolio, new_id};
use crate::error::Result;
use crate::types::*;

/// Shape of the visible-projects view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewOptions {
    /// Group by project type.
    pub grouped: bool,
    /// Sort by `order` (within each group when grouped).
    pub ordered: bool,
}

impl Default for ViewOptions {
    fn default() -> Self {
        Self {
            grouped: true,
            ordered: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ProjectView {
    Grouped(Grouped<Project>),
    Flat(Vec<Project>),
}

impl ProjectView {
    pub fn flatten(self) -> Vec<Project> {
        match self {
            Self::Grouped(grouped) => grouped.flatten(),
            Self::Flat(projects) => projects,
        }
    }
}

fn group_by_type(projects: Vec<Project>) -> Grouped<Project> {
    Grouped::group_by(projects, |p| p.project_type.as_str())
}

impl Portfolio {
    /// Adds a project at the end of the project ordering.
    pub fn add_project(&self, new: NewProject) -> Result<Project> {
        let now = Utc::now();
        let mut project = Project {
            id: new_id(),
            slug: slugify(&new.name),
            name: new.name,
            project_type: new.project_type.unwrap_or_default(),
            visible: new.visible.unwrap_or(false),
            order: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        project.order = self.store.create_project(&project, Placement::Append)?;

        info!("Added project '{}' at order {}", project.name, project.order);
        Ok(project)
    }

    /// Writes the fields present in `patch` and returns the stored project.
    /// Fields the patch leaves out keep their stored values, even when
    /// `project` is an older copy.
    pub fn update_project(&self, project: &Project, patch: ProjectPatch) -> Result<Project> {
        let updated = self.store.update_project(&project.id, &patch, Utc::now())?;

        info!("Updated project {}", updated.id);
        Ok(updated)
    }

    /// Looks up a project by id, removed or not.
    pub fn find_project(&self, id: &str) -> Result<Option<Project>> {
        self.store.get_project(id)
    }

    pub fn find_project_by_slug(&self, slug: &str) -> Result<Option<Project>> {
        Ok(self
            .store
            .list_projects(&Filter::default())?
            .into_iter()
            .find(|p| p.slug == slug))
    }

    /// Visible projects, by default grouped by type and ordered.
    pub fn all_visible(&self, options: ViewOptions) -> Result<ProjectView> {
        let filter = Filter::default().visible(true).ordered(options.ordered);
        let projects = self.store.list_projects(&filter)?;
        debug!("Loaded {} visible projects", projects.len());

        if options.grouped {
            Ok(ProjectView::Grouped(group_by_type(projects)))
        } else {
            Ok(ProjectView::Flat(projects))
        }
    }

    /// Every active project grouped by type, visible or not.
    pub fn all_grouped(&self, ordered: bool) -> Result<Grouped<Project>> {
        let projects = self
            .store
            .list_projects(&Filter::default().ordered(ordered))?;
        Ok(group_by_type(projects))
    }

    /// Every active project sorted by `order`; ties keep insertion order.
    pub fn all_ordered(&self) -> Result<Vec<Project>> {
        self.store.list_projects(&Filter::default().ordered(true))
    }

    pub fn all_hidden(&self) -> Result<Vec<Project>> {
        self.store.list_projects(&Filter::default().visible(false))
    }

    /// Removed projects awaiting restore or purge.
    pub fn all_trashed(&self) -> Result<Vec<Project>> {
        self.store
            .list_projects(&Filter::default().deleted(Deleted::Only).ordered(true))
    }

    pub fn has_block_named(&self, name: &str) -> Result<Vec<Project>> {
        self.store
            .list_projects_with_child_named(EntityKind::Block, name)
    }

    pub fn has_image_named(&self, name: &str) -> Result<Vec<Project>> {
        self.store
            .list_projects_with_child_named(EntityKind::Image, name)
    }

    pub fn has_link_named(&self, name: &str) -> Result<Vec<Project>> {
        self.store
            .list_projects_with_child_named(EntityKind::Link, name)
    }

    /// Renumbers the active projects `0..n` in the order of `ids`, which must
    /// name every active project exactly once.
    pub fn reorder_projects(&self, ids: &[String]) -> Result<Vec<Project>> {
        self.store.reorder(Scope::Projects, ids)?;
        info!("Reordered {} projects", ids.len());
        self.all_ordered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::portfolio::test_support::{add_named, portfolio};

    fn add(portfolio: &Portfolio, name: &str, project_type: &str, visible: bool) -> Project {
        portfolio
            .add_project(NewProject {
                name: name.to_string(),
                project_type: Some(project_type.to_string()),
                visible: Some(visible),
            })
            .unwrap()
    }

    fn orders(projects: &[Project]) -> Vec<i64> {
        projects.iter().map(|p| p.order).collect()
    }

    fn names(projects: &[Project]) -> Vec<&str> {
        projects.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn test_add_project_assigns_next_order_and_slug() {
        let portfolio = portfolio();

        for i in 0..5 {
            let project = add_named(&portfolio, &format!("project {i}"));
            assert_eq!(project.order, i);
            assert_eq!(project.slug, format!("project_{i}"));
            assert!(!project.visible);
        }

        assert_eq!(orders(&portfolio.all_ordered().unwrap()), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_add_project_persists_fields() {
        let portfolio = portfolio();
        let project = add(&portfolio, "name", "site", false);

        let stored = portfolio.find_project(&project.id).unwrap().unwrap();
        assert_eq!(stored, project);
        assert_eq!(stored.project_type, "site");
    }

    #[test]
    fn test_update_project_merges_fields() {
        let portfolio = portfolio();
        let project = add(&portfolio, "name", "site", false);

        let updated = portfolio
            .update_project(
                &project,
                ProjectPatch {
                    project_type: Some("new link".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let stored = portfolio.find_project(&project.id).unwrap().unwrap();
        assert_eq!(stored, updated);
        assert_eq!(stored.project_type, "new link");
        assert_eq!(stored.name, project.name);
        assert_eq!(stored.order, project.order);
        assert!(!stored.visible);
    }

    #[test]
    fn test_update_visibility() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "a");

        portfolio
            .update_project(
                &project,
                ProjectPatch {
                    visible: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        assert!(portfolio.find_project(&project.id).unwrap().unwrap().visible);
    }

    #[test]
    fn test_slug_follows_name_updates() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "first name");
        assert_eq!(project.slug, "first_name");

        let project = portfolio
            .update_project(
                &project,
                ProjectPatch {
                    name: Some("second name".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(project.slug, "second_name");
        assert_eq!(
            portfolio
                .find_project_by_slug("second_name")
                .unwrap()
                .unwrap()
                .id,
            project.id
        );
        assert!(portfolio.find_project_by_slug("first_name").unwrap().is_none());
    }

    #[test]
    fn test_update_from_stale_copy_keeps_stored_order() {
        let portfolio = portfolio();
        let a = add_named(&portfolio, "a");
        let b = add_named(&portfolio, "b");

        portfolio
            .reorder_projects(&[b.id.clone(), a.id.clone()])
            .unwrap();
        let updated = portfolio
            .update_project(
                &a,
                ProjectPatch {
                    visible: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.order, 1);
        assert!(updated.visible);
        let ordered: Vec<(String, i64)> = portfolio
            .all_ordered()
            .unwrap()
            .into_iter()
            .map(|p| (p.name, p.order))
            .collect();
        assert_eq!(
            ordered,
            vec![("b".to_string(), 0), ("a".to_string(), 1)]
        );
    }

    #[test]
    fn test_restore_after_reorder_keeps_orders_unique() {
        let portfolio = portfolio();
        let a = add_named(&portfolio, "a");
        let b = add_named(&portfolio, "b");
        let c = add_named(&portfolio, "c");

        portfolio.remove(&b).unwrap();
        portfolio
            .reorder_projects(&[a.id.clone(), c.id.clone()])
            .unwrap();
        assert!(portfolio.restore(&b).unwrap());

        let ordered: Vec<(String, i64)> = portfolio
            .all_ordered()
            .unwrap()
            .into_iter()
            .map(|p| (p.name, p.order))
            .collect();
        assert_eq!(
            ordered,
            vec![
                ("a".to_string(), 0),
                ("c".to_string(), 1),
                ("b".to_string(), 2)
            ]
        );
    }

    #[test]
    fn test_update_missing_project_is_not_found() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "a");
        portfolio.remove(&project).unwrap();
        portfolio.purge(&project).unwrap();

        assert!(matches!(
            portfolio.update_project(&project, ProjectPatch::default()),
            Err(Error::NotFound)
        ));
    }

    #[test]
    fn test_all_visible_groups_by_type() {
        let portfolio = portfolio();
        let p0 = add(&portfolio, "p0", "web", true);
        let p1 = add(&portfolio, "p1", "web", true);
        let p2 = add(&portfolio, "p2", "oss", true);
        add(&portfolio, "hidden", "web", false);

        let ProjectView::Grouped(grouped) = portfolio.all_visible(ViewOptions::default()).unwrap()
        else {
            panic!("expected grouped view");
        };

        assert_eq!(grouped.keys().collect::<Vec<_>>(), ["web", "oss"]);
        assert_eq!(grouped.get("web").unwrap(), [p0, p1]);
        assert_eq!(grouped.get("oss").unwrap(), [p2]);
    }

    #[test]
    fn test_all_visible_partitions_exactly_the_visible_subset() {
        let portfolio = portfolio();
        for (i, (t, v)) in [("web", true), ("oss", false), ("cli", true), ("oss", true), ("web", false)]
            .into_iter()
            .enumerate()
        {
            add(&portfolio, &format!("p{i}"), t, v);
        }

        let grouped = match portfolio.all_visible(ViewOptions::default()).unwrap() {
            ProjectView::Grouped(g) => g,
            ProjectView::Flat(_) => panic!("expected grouped view"),
        };
        for (key, members) in grouped.iter() {
            assert!(members.iter().all(|p| p.visible && p.project_type == key));
        }

        let mut flat = names(&grouped.flatten()).into_iter().map(String::from).collect::<Vec<_>>();
        flat.sort();
        assert_eq!(flat, ["p0", "p2", "p3"]);
    }

    #[test]
    fn test_all_visible_follows_type_changes() {
        let portfolio = portfolio();
        let first = add(&portfolio, "a", "web", true);
        add(&portfolio, "b", "web", true);

        portfolio
            .update_project(
                &first,
                ProjectPatch {
                    project_type: Some("open source".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        let ProjectView::Grouped(grouped) = portfolio.all_visible(ViewOptions::default()).unwrap()
        else {
            panic!("expected grouped view");
        };
        let mut keys: Vec<&str> = grouped.keys().collect();
        keys.sort();
        assert_eq!(keys, ["open source", "web"]);
    }

    #[test]
    fn test_all_visible_grouping_can_be_turned_off() {
        let portfolio = portfolio();
        add(&portfolio, "a", "web", true);
        add(&portfolio, "b", "oss", true);

        let view = portfolio
            .all_visible(ViewOptions {
                grouped: false,
                ordered: true,
            })
            .unwrap();

        match view {
            ProjectView::Flat(projects) => assert_eq!(names(&projects), ["a", "b"]),
            ProjectView::Grouped(_) => panic!("expected flat view"),
        }
    }

    #[test]
    fn test_all_visible_ordering_is_conditional() {
        let portfolio = portfolio();
        let a = add(&portfolio, "a", "web", true);
        let b = add(&portfolio, "b", "web", true);
        let c = add(&portfolio, "c", "web", true);

        // Move the first-inserted project to the end of the ordering.
        portfolio
            .update_project(
                &a,
                ProjectPatch {
                    order: Some(10),
                    ..Default::default()
                },
            )
            .unwrap();

        let flat = |ordered| {
            portfolio
                .all_visible(ViewOptions {
                    grouped: false,
                    ordered,
                })
                .unwrap()
                .flatten()
        };

        assert_eq!(names(&flat(false)), [a.name.as_str(), b.name.as_str(), c.name.as_str()]);
        assert_eq!(names(&flat(true)), [b.name.as_str(), c.name.as_str(), a.name.as_str()]);
        assert_eq!(orders(&flat(true)), [1, 2, 10]);

        let grouped = portfolio.all_visible(ViewOptions::default()).unwrap();
        assert_eq!(orders(&grouped.flatten()), [1, 2, 10]);
    }

    #[test]
    fn test_all_hidden_returns_only_hidden_projects() {
        let portfolio = portfolio();
        let shown = add_named(&portfolio, "shown");
        add_named(&portfolio, "h1");
        add_named(&portfolio, "h2");
        portfolio
            .update_project(
                &shown,
                ProjectPatch {
                    visible: Some(true),
                    ..Default::default()
                },
            )
            .unwrap();

        let hidden = portfolio.all_hidden().unwrap();
        assert!(hidden.iter().all(|p| !p.visible));
        assert_eq!(names(&hidden), ["h1", "h2"]);
    }

    #[test]
    fn test_all_grouped_includes_hidden_projects() {
        let portfolio = portfolio();
        add(&portfolio, "a", "web", true);
        add(&portfolio, "b", "web", false);
        add(&portfolio, "c", "web", true);

        let grouped = portfolio.all_grouped(false).unwrap();
        assert_eq!(grouped.len(), 1);
        assert_eq!(grouped.keys().next(), Some("web"));
        assert_eq!(grouped.flatten().len(), 3);
    }

    #[test]
    fn test_all_ordered_is_non_decreasing_and_stable() {
        let portfolio = portfolio();
        let a = add(&portfolio, "a", "web", true);
        add(&portfolio, "b", "oss", false);
        let c = add(&portfolio, "c", "github", true);

        // a and c now tie at order 1 with b; insertion order breaks the tie.
        for p in [&a, &c] {
            portfolio
                .update_project(
                    p,
                    ProjectPatch {
                        order: Some(1),
                        ..Default::default()
                    },
                )
                .unwrap();
        }

        let ordered = portfolio.all_ordered().unwrap();
        assert!(orders(&ordered).windows(2).all(|w| w[0] <= w[1]));
        assert_eq!(names(&ordered), ["a", "b", "c"]);
    }

    #[test]
    fn test_removed_projects_leave_default_views() {
        let portfolio = portfolio();
        let a = add(&portfolio, "a", "web", true);
        add(&portfolio, "b", "web", true);

        portfolio.remove(&a).unwrap();

        assert_eq!(names(&portfolio.all_ordered().unwrap()), ["b"]);
        assert_eq!(
            portfolio.all_visible(ViewOptions::default()).unwrap().flatten().len(),
            1
        );
        assert_eq!(names(&portfolio.all_trashed().unwrap()), ["a"]);
    }

    #[test]
    fn test_reorder_projects() {
        let portfolio = portfolio();
        let a = add_named(&portfolio, "a");
        let b = add_named(&portfolio, "b");
        let c = add_named(&portfolio, "c");

        let reordered = portfolio
            .reorder_projects(&[c.id.clone(), a.id.clone(), b.id.clone()])
            .unwrap();

        assert_eq!(names(&reordered), ["c", "a", "b"]);
        assert_eq!(orders(&reordered), [0, 1, 2]);
    }

    #[test]
    fn test_has_child_named_queries() {
        let portfolio = portfolio();
        let mut with_block = Vec::new();
        for i in 0..3 {
            let project = add_named(&portfolio, &format!("p{i}"));
            portfolio
                .add_block(
                    &project,
                    NewBlock {
                        name: "block name".to_string(),
                        text: "text".to_string(),
                        ..Default::default()
                    },
                )
                .unwrap();
            with_block.push(project.id);
        }
        let other = add_named(&portfolio, "other");
        portfolio
            .add_block(
                &other,
                NewBlock {
                    name: "other name".to_string(),
                    text: "text".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        portfolio
            .add_image(
                &other,
                NewImage {
                    name: "image name".to_string(),
                    path: "cat.jpg".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();
        portfolio
            .add_link(
                &other,
                NewLink {
                    name: "link name".to_string(),
                    url: "https://example.com".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();

        let found = portfolio.has_block_named("block name").unwrap();
        assert_eq!(found.iter().map(|p| p.id.clone()).collect::<Vec<_>>(), with_block);
        for project in &found {
            assert_eq!(portfolio.blocks(project).unwrap()[0].name, "block name");
        }

        assert_eq!(names(&portfolio.has_image_named("image name").unwrap()), ["other"]);
        assert_eq!(names(&portfolio.has_link_named("link name").unwrap()), ["other"]);
        assert!(portfolio.has_link_named("nope").unwrap().is_empty());
    }
}
