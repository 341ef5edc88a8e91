use chrono::Utc;
use tracing::info;

use super::{Portfolio, canonical, named, new_id};
use crate::error::Result;
use crate::types::*;

fn ordered() -> Filter {
    Filter::default().ordered(true)
}

impl Portfolio {
    // Blocks

    /// Adds a text block to `project`. Without an explicit order the block is
    /// appended after the project's existing blocks. Formatted text defaults
    /// to the raw text.
    pub fn add_block(&self, project: &Project, new: NewBlock) -> Result<Block> {
        let now = Utc::now();
        let placement = Placement::from(new.order);
        let mut block = Block {
            id: new_id(),
            project_id: project.id.clone(),
            name: new.name,
            formatted_text: new.formatted_text.unwrap_or_else(|| new.text.clone()),
            text: new.text,
            order: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        block.order = self.store.create_block(&block, placement)?;

        info!("Added block '{}' to project {}", block.name, project.id);
        Ok(block)
    }

    pub fn update_block(&self, block: &Block, patch: BlockPatch) -> Result<Block> {
        self.store.update_block(&block.id, &patch, Utc::now())
    }

    pub fn find_block(&self, id: &str) -> Result<Option<Block>> {
        self.store.get_block(id)
    }

    /// Active blocks of `project`, ordered.
    pub fn blocks(&self, project: &Project) -> Result<Vec<Block>> {
        self.store.list_blocks(&project.id, &ordered())
    }

    pub fn has_blocks(&self, project: &Project) -> Result<bool> {
        Ok(!self.blocks(project)?.is_empty())
    }

    pub fn block(&self, project: &Project, name: &str) -> Result<Option<Block>> {
        Ok(named(self.blocks(project)?, name))
    }

    pub fn block_text(&self, project: &Project, name: &str, formatted: bool) -> Result<Option<String>> {
        Ok(self
            .block(project, name)?
            .map(|block| block.text(formatted).to_string()))
    }

    /// The project's primary block: the one named after the project, else
    /// the first block.
    pub fn project_block(&self, project: &Project) -> Result<Option<Block>> {
        Ok(canonical(&project.name, self.blocks(project)?))
    }

    pub fn project_block_text(&self, project: &Project, formatted: bool) -> Result<Option<String>> {
        Ok(self
            .project_block(project)?
            .map(|block| block.text(formatted).to_string()))
    }

    pub fn reorder_blocks(&self, project: &Project, ids: &[String]) -> Result<Vec<Block>> {
        self.store.reorder(Scope::Blocks(&project.id), ids)?;
        info!("Reordered {} blocks of project {}", ids.len(), project.id);
        self.blocks(project)
    }

    // Images

    pub fn add_image(&self, project: &Project, new: NewImage) -> Result<Image> {
        let now = Utc::now();
        let placement = Placement::from(new.order);
        let mut image = Image {
            id: new_id(),
            project_id: project.id.clone(),
            name: new.name,
            caption: new.caption,
            alt: new.alt,
            path: new.path,
            order: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        image.order = self.store.create_image(&image, placement)?;

        info!("Added image '{}' to project {}", image.name, project.id);
        Ok(image)
    }

    pub fn update_image(&self, image: &Image, patch: ImagePatch) -> Result<Image> {
        self.store.update_image(&image.id, &patch, Utc::now())
    }

    pub fn find_image(&self, id: &str) -> Result<Option<Image>> {
        self.store.get_image(id)
    }

    pub fn images(&self, project: &Project) -> Result<Vec<Image>> {
        self.store.list_images(&project.id, &ordered())
    }

    pub fn has_images(&self, project: &Project) -> Result<bool> {
        Ok(!self.images(project)?.is_empty())
    }

    pub fn image(&self, project: &Project, name: &str) -> Result<Option<Image>> {
        Ok(named(self.images(project)?, name))
    }

    /// URL of `image` at `size`, or at the configured default size.
    pub fn url_for(&self, image: &Image, size: Option<&str>) -> String {
        image.url(
            &self.image_url_prefix,
            size.unwrap_or(&self.default_image_size),
        )
    }

    pub fn image_url(&self, project: &Project, name: &str, size: Option<&str>) -> Result<Option<String>> {
        Ok(self
            .image(project, name)?
            .map(|image| self.url_for(&image, size)))
    }

    pub fn project_image(&self, project: &Project) -> Result<Option<Image>> {
        Ok(canonical(&project.name, self.images(project)?))
    }

    pub fn project_image_url(&self, project: &Project, size: Option<&str>) -> Result<Option<String>> {
        Ok(self
            .project_image(project)?
            .map(|image| self.url_for(&image, size)))
    }

    pub fn reorder_images(&self, project: &Project, ids: &[String]) -> Result<Vec<Image>> {
        self.store.reorder(Scope::Images(&project.id), ids)?;
        info!("Reordered {} images of project {}", ids.len(), project.id);
        self.images(project)
    }

    // Links

    /// Adds a link to `project`. Link text defaults to the link name.
    pub fn add_link(&self, project: &Project, new: NewLink) -> Result<Link> {
        let now = Utc::now();
        let placement = Placement::from(new.order);
        let mut link = Link {
            id: new_id(),
            project_id: project.id.clone(),
            text: new.text.unwrap_or_else(|| new.name.clone()),
            name: new.name,
            url: new.url,
            order: 0,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };

        link.order = self.store.create_link(&link, placement)?;

        info!("Added link '{}' to project {}", link.name, project.id);
        Ok(link)
    }

    pub fn update_link(&self, link: &Link, patch: LinkPatch) -> Result<Link> {
        self.store.update_link(&link.id, &patch, Utc::now())
    }

    pub fn find_link(&self, id: &str) -> Result<Option<Link>> {
        self.store.get_link(id)
    }

    pub fn links(&self, project: &Project) -> Result<Vec<Link>> {
        self.store.list_links(&project.id, &ordered())
    }

    pub fn has_links(&self, project: &Project) -> Result<bool> {
        Ok(!self.links(project)?.is_empty())
    }

    pub fn link(&self, project: &Project, name: &str) -> Result<Option<Link>> {
        Ok(named(self.links(project)?, name))
    }

    pub fn link_url(&self, project: &Project, name: &str) -> Result<Option<String>> {
        Ok(self.link(project, name)?.map(|link| link.url))
    }

    pub fn link_text(&self, project: &Project, name: &str) -> Result<Option<String>> {
        Ok(self.link(project, name)?.map(|link| link.text))
    }

    pub fn reorder_links(&self, project: &Project, ids: &[String]) -> Result<Vec<Link>> {
        self.store.reorder(Scope::Links(&project.id), ids)?;
        info!("Reordered {} links of project {}", ids.len(), project.id);
        self.links(project)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::portfolio::test_support::{add_named, portfolio};

    fn new_block(name: &str, order: Option<i64>) -> NewBlock {
        NewBlock {
            name: name.to_string(),
            text: "text".to_string(),
            formatted_text: Some("formatted".to_string()),
            order,
        }
    }

    fn new_image(name: &str, path: &str) -> NewImage {
        NewImage {
            name: name.to_string(),
            path: path.to_string(),
            ..Default::default()
        }
    }

    fn new_link(name: &str) -> NewLink {
        NewLink {
            name: name.to_string(),
            url: format!("https://example.com/{name}"),
            text: Some(format!("{name} text")),
            order: None,
        }
    }

    #[test]
    fn test_children_append_in_their_own_scope() {
        let portfolio = portfolio();
        let first = add_named(&portfolio, "first");
        let second = add_named(&portfolio, "second");

        for i in 0..3 {
            let block = portfolio.add_block(&first, new_block("b", None)).unwrap();
            assert_eq!(block.order, i);
            let link = portfolio.add_link(&first, new_link("l")).unwrap();
            assert_eq!(link.order, i);
        }
        let image = portfolio.add_image(&first, new_image("i", "a.jpg")).unwrap();
        assert_eq!(image.order, 0);

        let other = portfolio.add_block(&second, new_block("b", None)).unwrap();
        assert_eq!(other.order, 0);
    }

    #[test]
    fn test_blocks_are_ordered_by_block_order() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");

        portfolio.add_block(&project, new_block("a", None)).unwrap();
        portfolio.add_block(&project, new_block("b", Some(3))).unwrap();
        portfolio.add_block(&project, new_block("c", Some(2))).unwrap();
        let appended = portfolio.add_block(&project, new_block("d", None)).unwrap();
        assert_eq!(appended.order, 4);

        let orders: Vec<i64> = portfolio
            .blocks(&project)
            .unwrap()
            .iter()
            .map(|b| b.order)
            .collect();
        assert_eq!(orders, [0, 2, 3, 4]);
    }

    #[test]
    fn test_links_are_ordered_by_link_order() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");

        portfolio.add_link(&project, new_link("a")).unwrap();
        for order in [3, 2] {
            portfolio
                .add_link(
                    &project,
                    NewLink {
                        order: Some(order),
                        ..new_link("new name")
                    },
                )
                .unwrap();
        }

        let orders: Vec<i64> = portfolio
            .links(&project)
            .unwrap()
            .iter()
            .map(|l| l.order)
            .collect();
        assert_eq!(orders, [0, 2, 3]);
    }

    #[test]
    fn test_project_block_prefers_block_named_after_project() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "portfolio site");

        portfolio.add_block(&project, new_block("name1", Some(5))).unwrap();
        portfolio
            .add_block(&project, new_block("portfolio site", Some(5)))
            .unwrap();
        portfolio.add_block(&project, new_block("name2", Some(5))).unwrap();

        let block = portfolio.project_block(&project).unwrap().unwrap();
        assert_eq!(block.name, "portfolio site");
    }

    #[test]
    fn test_project_block_falls_back_to_first_block() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");

        portfolio.add_block(&project, new_block("name1", Some(5))).unwrap();
        portfolio.add_block(&project, new_block("name2", Some(5))).unwrap();

        let block = portfolio.project_block(&project).unwrap().unwrap();
        assert_eq!(block.name, "name1");
    }

    #[test]
    fn test_project_block_none_without_blocks() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");

        assert!(portfolio.project_block(&project).unwrap().is_none());
        assert!(portfolio.project_block_text(&project, true).unwrap().is_none());
        assert!(!portfolio.has_blocks(&project).unwrap());
    }

    #[test]
    fn test_project_block_text() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");
        portfolio.add_block(&project, new_block("p", None)).unwrap();

        assert_eq!(
            portfolio.project_block_text(&project, true).unwrap().as_deref(),
            Some("formatted")
        );
        assert_eq!(
            portfolio.project_block_text(&project, false).unwrap().as_deref(),
            Some("text")
        );
    }

    #[test]
    fn test_block_formatted_text_defaults_to_text() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");
        let block = portfolio
            .add_block(
                &project,
                NewBlock {
                    name: "intro".to_string(),
                    text: "hello".to_string(),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(block.formatted_text, "hello");
        assert_eq!(
            portfolio.block_text(&project, "intro", true).unwrap().as_deref(),
            Some("hello")
        );
        assert!(portfolio.block_text(&project, "missing", true).unwrap().is_none());
    }

    #[test]
    fn test_project_image_prefers_image_named_after_project() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");

        portfolio.add_image(&project, new_image("name1", "1.jpg")).unwrap();
        portfolio.add_image(&project, new_image("p", "p.jpg")).unwrap();
        portfolio.add_image(&project, new_image("name2", "2.jpg")).unwrap();

        assert_eq!(portfolio.project_image(&project).unwrap().unwrap().name, "p");
    }

    #[test]
    fn test_project_image_falls_back_to_first_image() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");

        portfolio.add_image(&project, new_image("name1", "1.jpg")).unwrap();
        portfolio.add_image(&project, new_image("name2", "2.jpg")).unwrap();

        assert_eq!(
            portfolio.project_image(&project).unwrap().unwrap().name,
            "name1"
        );
    }

    #[test]
    fn test_project_image_none_without_images() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");

        assert!(portfolio.project_image(&project).unwrap().is_none());
        assert!(portfolio.project_image_url(&project, None).unwrap().is_none());
    }

    #[test]
    fn test_project_image_url_by_size() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");
        portfolio.add_image(&project, new_image("cover", "url")).unwrap();

        assert_eq!(
            portfolio.project_image_url(&project, None).unwrap().as_deref(),
            Some("/manager/images/small/url")
        );
        assert_eq!(
            portfolio
                .project_image_url(&project, Some("medium"))
                .unwrap()
                .as_deref(),
            Some("/manager/images/medium/url")
        );
        assert_eq!(
            portfolio
                .image_url(&project, "cover", Some("large"))
                .unwrap()
                .as_deref(),
            Some("/manager/images/large/url")
        );
    }

    #[test]
    fn test_link_lookups() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");
        portfolio.add_link(&project, new_link("github")).unwrap();

        assert!(portfolio.has_links(&project).unwrap());
        assert_eq!(
            portfolio.link_url(&project, "github").unwrap().as_deref(),
            Some("https://example.com/github")
        );
        assert_eq!(
            portfolio.link_text(&project, "github").unwrap().as_deref(),
            Some("github text")
        );
        assert!(portfolio.link(&project, "missing").unwrap().is_none());
        assert!(portfolio.link_url(&project, "missing").unwrap().is_none());
    }

    #[test]
    fn test_removed_children_are_hidden_and_restorable() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");
        let block = portfolio.add_block(&project, new_block("p", None)).unwrap();
        let image = portfolio.add_image(&project, new_image("p", "p.jpg")).unwrap();

        assert!(portfolio.remove(&block).unwrap());
        assert!(portfolio.remove(&image).unwrap());
        assert!(portfolio.blocks(&project).unwrap().is_empty());
        assert!(portfolio.has_block_named("p").unwrap().is_empty());
        assert!(!portfolio.has_images(&project).unwrap());

        assert!(portfolio.restore(&block).unwrap());
        assert_eq!(portfolio.blocks(&project).unwrap(), [block.clone()]);

        assert!(matches!(portfolio.purge(&block), Err(Error::NotTrashed)));
        portfolio.remove(&block).unwrap();
        assert!(portfolio.purge(&block).unwrap());
        assert!(portfolio.find_block(&block.id).unwrap().is_none());
    }

    #[test]
    fn test_update_children() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");
        let block = portfolio.add_block(&project, new_block("a", None)).unwrap();
        let image = portfolio.add_image(&project, new_image("a", "a.jpg")).unwrap();
        let link = portfolio.add_link(&project, new_link("a")).unwrap();

        let block = portfolio
            .update_block(
                &block,
                BlockPatch {
                    text: Some("new text".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        let image = portfolio
            .update_image(
                &image,
                ImagePatch {
                    caption: Some(Some("A caption".to_string())),
                    ..Default::default()
                },
            )
            .unwrap();
        let link = portfolio
            .update_link(
                &link,
                LinkPatch {
                    url: Some("https://new.example.com".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(portfolio.find_block(&block.id).unwrap().unwrap(), block);
        assert_eq!(block.text, "new text");
        assert_eq!(block.formatted_text, "formatted");
        assert_eq!(portfolio.find_image(&image.id).unwrap().unwrap(), image);
        assert_eq!(image.caption.as_deref(), Some("A caption"));
        assert_eq!(portfolio.find_link(&link.id).unwrap().unwrap(), link);
        assert_eq!(link.name, "a");
    }

    #[test]
    fn test_reorder_children() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");
        let a = portfolio.add_image(&project, new_image("a", "a.jpg")).unwrap();
        let b = portfolio.add_image(&project, new_image("b", "b.jpg")).unwrap();

        let images = portfolio
            .reorder_images(&project, &[b.id.clone(), a.id.clone()])
            .unwrap();
        let order: Vec<(&str, i64)> = images.iter().map(|i| (i.name.as_str(), i.order)).collect();
        assert_eq!(order, [("b", 0), ("a", 1)]);

        let missing = portfolio.reorder_images(&project, &[a.id.clone()]);
        assert!(matches!(missing, Err(Error::BadRequest(_))));
    }

    #[test]
    fn test_adding_to_missing_project_fails_in_store() {
        let portfolio = portfolio();
        let project = add_named(&portfolio, "p");
        portfolio.remove(&project).unwrap();
        portfolio.purge(&project).unwrap();

        assert!(matches!(
            portfolio.add_block(&project, new_block("a", None)),
            Err(Error::Database(_))
        ));
    }
}
