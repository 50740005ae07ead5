use crate::announce::Announce;
use crate::controller::FeedController;
use crate::error::MountError;
use crate::i18n::Catalog;
use crate::render::render_error_panel;
use crate::runtime::{FeedHandle, spawn_feed};
use crate::settings::{FeedConfig, HostSettings};
use crate::transport::ReviewTransport;
use crate::types::block::BlockAttributes;
use crate::types::enums::{ImageType, SortKey};
use crate::types::ids::ProductId;
use crate::types::query::CategorySelection;
use crate::types::review::Review;
use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

pub const BLOCK_CLASSES: [&str; 3] = [
    "wp-block-woocommerce-all-reviews",
    "wp-block-woocommerce-reviews-by-product",
    "wp-block-woocommerce-reviews-by-category",
];

pub const WRAPPER_CLASSES: [&str; 1] = ["wp-block-woocommerce-cart"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Node {
    pub id: String,
    pub classes: Vec<String>,
    pub dataset: BTreeMap<String, String>,
    pub children: Vec<Node>,
}

impl Node {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_class(mut self, class: &str) -> Self {
        self.classes.push(class.to_string());
        self
    }

    #[must_use]
    pub fn with_data(mut self, key: &str, value: &str) -> Self {
        self.dataset.insert(key.to_string(), value.to_string());
        self
    }

    #[must_use]
    pub fn with_child(mut self, child: Node) -> Self {
        self.children.push(child);
        self
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.iter().any(|candidate| candidate == class)
    }

    pub fn is_block(&self) -> bool {
        BLOCK_CLASSES.iter().any(|class| self.has_class(class))
    }

    pub fn is_wrapper(&self) -> bool {
        WRAPPER_CLASSES.iter().any(|class| self.has_class(class))
    }

    fn data(&self, key: &str) -> Option<&str> {
        self.dataset
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    fn find(&self, id: &str) -> Option<&Node> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(id))
    }
}

fn invalid(name: &str, message: impl ToString) -> MountError {
    MountError::InvalidAttribute {
        name: name.to_string(),
        message: message.to_string(),
    }
}

fn parse_count(node: &Node, key: &str, default: usize) -> Result<usize, MountError> {
    match node.data(key) {
        Some(value) => value.trim().parse().map_err(|_| invalid(key, format!("not a number: {value}"))),
        None => Ok(default),
    }
}

pub fn block_attributes(node: &Node) -> Result<BlockAttributes, MountError> {
    let defaults = BlockAttributes::default();
    let product_id = node
        .data("product-id")
        .map(ProductId::from_str)
        .transpose()
        .map_err(|err| invalid("product-id", err))?;
    let image_type = node
        .data("image-type")
        .map(ImageType::from_str)
        .transpose()
        .map_err(|err| invalid("image-type", err))?
        .unwrap_or(defaults.image_type);
    let preview_reviews = node
        .data("preview-reviews")
        .map(|raw| serde_json::from_str::<Vec<Review>>(raw))
        .transpose()
        .map_err(|err| invalid("preview-reviews", err))?;

    Ok(BlockAttributes {
        product_id,
        category_ids: node
            .data("category-ids")
            .map(|raw| CategorySelection::Raw(raw.to_string())),
        orderby: node.data("orderby").map_or(defaults.orderby, SortKey::from),
        reviews_on_page_load: parse_count(node, "reviews-on-page-load", defaults.reviews_on_page_load)?,
        reviews_on_load_more: parse_count(node, "reviews-on-load-more", defaults.reviews_on_load_more)?,
        image_type,
        show_orderby: node.data("show-orderby") == Some("true"),
        show_load_more: node.data("show-load-more") == Some("true"),
        show_review_date: node.has_class("has-date"),
        show_reviewer_name: node.has_class("has-name"),
        show_review_image: node.has_class("has-image"),
        show_review_rating: node.has_class("has-rating"),
        show_review_content: node.has_class("has-content"),
        show_product_name: node.has_class("has-product-name"),
        preview_reviews,
    })
}

fn collect_blocks<'a>(node: &'a Node, skip_wrapped: bool, out: &mut Vec<&'a Node>) {
    if node.is_block() {
        out.push(node);
    }
    for child in &node.children {
        if skip_wrapped && child.is_wrapper() {
            continue;
        }
        collect_blocks(child, skip_wrapped, out);
    }
}

pub struct MountHost<T> {
    pub transport: Arc<T>,
    pub announcer: Arc<dyn Announce>,
    pub catalog: Arc<dyn Catalog>,
    pub settings: HostSettings,
    pub append_debounce: Duration,
    pub asset_url: String,
}

pub enum MountedBlock {
    Feed {
        node_id: String,
        attributes: BlockAttributes,
        handle: FeedHandle,
    },
    Fallback { node_id: String, html: String },
}

impl MountedBlock {
    pub fn node_id(&self) -> &str {
        match self {
            Self::Feed { node_id, .. } | Self::Fallback { node_id, .. } => node_id,
        }
    }
}

#[derive(Debug, Default)]
pub struct Mounter {
    mounted: HashSet<String>,
}

impl Mounter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_mounted(&self, node_id: &str) -> bool {
        self.mounted.contains(node_id)
    }

    pub fn release(&mut self, node_id: &str) -> bool {
        self.mounted.remove(node_id)
    }

    pub fn scan<T: ReviewTransport>(&mut self, root: &Node, host: &MountHost<T>) -> Vec<MountedBlock> {
        let mut blocks = Vec::new();
        collect_blocks(root, true, &mut blocks);
        self.mount_all(blocks, host)
    }

    pub fn render_signal<T: ReviewTransport>(
        &mut self,
        root: &Node,
        wrapper_id: &str,
        host: &MountHost<T>,
    ) -> Vec<MountedBlock> {
        let Some(wrapper) = root.find(wrapper_id) else {
            tracing::debug!(wrapper_id, "render signal for unknown wrapper");
            return Vec::new();
        };
        let mut blocks = Vec::new();
        collect_blocks(wrapper, false, &mut blocks);
        self.mount_all(blocks, host)
    }

    fn mount_all<T: ReviewTransport>(
        &mut self,
        blocks: Vec<&Node>,
        host: &MountHost<T>,
    ) -> Vec<MountedBlock> {
        blocks
            .into_iter()
            .filter(|node| self.mounted.insert(node.id.clone()))
            .map(|node| mount_one(node, host))
            .collect()
    }
}

fn mount_one<T: ReviewTransport>(node: &Node, host: &MountHost<T>) -> MountedBlock {
    match block_attributes(node) {
        Ok(attributes) => {
            tracing::debug!(node_id = %node.id, "mounting review feed");
            let config = FeedConfig::new(attributes.clone(), host.settings)
                .with_append_debounce(host.append_debounce);
            let handle = spawn_feed(
                FeedController::new(config),
                Arc::clone(&host.transport),
                Arc::clone(&host.announcer),
                Arc::clone(&host.catalog),
            );
            MountedBlock::Feed {
                node_id: node.id.clone(),
                attributes,
                handle,
            }
        }
        Err(err) => {
            tracing::warn!(node_id = %node.id, error = %err, "review block failed to mount");
            MountedBlock::Fallback {
                node_id: node.id.clone(),
                html: render_error_panel(host.catalog.as_ref(), &host.asset_url, Some(&err.to_string())),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::announce::TracingAnnouncer;
    use crate::controller::FeedPhase;
    use crate::error::FetchError;
    use crate::i18n::SourceCatalog;
    use crate::settings::DEFAULT_APPEND_DEBOUNCE;
    use crate::transport::RawResponse;

    struct EmptyTransport;

    impl ReviewTransport for EmptyTransport {
        async fn get(&self, _path_and_query: &str) -> Result<RawResponse, FetchError> {
            Ok(RawResponse {
                status: 200,
                total: Some("0".to_string()),
                body: b"[]".to_vec(),
            })
        }
    }

    fn host() -> MountHost<EmptyTransport> {
        MountHost {
            transport: Arc::new(EmptyTransport),
            announcer: Arc::new(TracingAnnouncer),
            catalog: Arc::new(SourceCatalog::new()),
            settings: HostSettings::default(),
            append_debounce: DEFAULT_APPEND_DEBOUNCE,
            asset_url: "/assets".to_string(),
        }
    }

    fn page() -> Node {
        Node::new("body")
            .with_child(
                Node::new("by-product")
                    .with_class("wp-block-woocommerce-reviews-by-product")
                    .with_class("has-rating")
                    .with_class("has-name")
                    .with_data("product-id", "42")
                    .with_data("show-orderby", "true")
                    .with_data("show-load-more", "false"),
            )
            .with_child(
                Node::new("cart").with_class("wp-block-woocommerce-cart").with_child(
                    Node::new("nested").with_class("wp-block-woocommerce-all-reviews"),
                ),
            )
    }

    #[test]
    fn test_attributes_from_classes_and_data() {
        let root = page();
        let attributes = block_attributes(&root.children[0]).unwrap();
        assert_eq!(attributes.product_id, Some(ProductId::new(42).unwrap()));
        assert!(attributes.show_orderby);
        assert!(!attributes.show_load_more);
        assert!(attributes.show_review_rating);
        assert!(attributes.show_reviewer_name);
        assert!(!attributes.show_review_date);
        assert!(!attributes.show_review_content);
        assert_eq!(attributes.reviews_on_page_load, 10);
        assert_eq!(attributes.orderby, SortKey::MostRecent);
    }

    #[test]
    fn test_bad_numbers_are_fatal_but_categories_are_not() {
        let node = Node::new("x")
            .with_class("wp-block-woocommerce-all-reviews")
            .with_data("reviews-on-page-load", "ten");
        assert!(matches!(
            block_attributes(&node),
            Err(MountError::InvalidAttribute { name, .. }) if name == "reviews-on-page-load"
        ));

        let node = Node::new("y").with_data("category-ids", "{not json");
        let attributes = block_attributes(&node).unwrap();
        assert_eq!(
            attributes.category_ids,
            Some(CategorySelection::Raw("{not json".to_string()))
        );
    }

    #[tokio::test]
    async fn test_initial_scan_skips_wrapped_blocks() {
        let root = page();
        let mut mounter = Mounter::new();
        let mounted = mounter.scan(&root, &host());
        let ids: Vec<_> = mounted.iter().map(MountedBlock::node_id).collect();
        assert_eq!(ids, vec!["by-product"]);
        assert!(!mounter.is_mounted("nested"));
    }

    #[tokio::test]
    async fn test_render_signal_mounts_only_new_blocks() {
        let root = page();
        let host = host();
        let mut mounter = Mounter::new();
        mounter.scan(&root, &host);

        let mounted = mounter.render_signal(&root, "cart", &host);
        assert_eq!(mounted.len(), 1);
        assert_eq!(mounted[0].node_id(), "nested");

        assert!(mounter.render_signal(&root, "cart", &host).is_empty());
        assert!(mounter.scan(&root, &host).is_empty());
        assert!(mounter.render_signal(&root, "missing", &host).is_empty());
    }

    #[tokio::test]
    async fn test_released_block_mounts_again() {
        let root = page();
        let host = host();
        let mut mounter = Mounter::new();
        assert_eq!(mounter.scan(&root, &host).len(), 1);
        assert!(mounter.scan(&root, &host).is_empty());

        assert!(mounter.release("by-product"));
        assert!(!mounter.is_mounted("by-product"));
        assert!(!mounter.release("by-product"));

        let mounted = mounter.scan(&root, &host);
        let ids: Vec<_> = mounted.iter().map(MountedBlock::node_id).collect();
        assert_eq!(ids, vec!["by-product"]);
        assert!(mounter.is_mounted("by-product"));
    }

    #[tokio::test]
    async fn test_fatal_configuration_mounts_fallback_panel() {
        let root = Node::new("body").with_child(
            Node::new("broken")
                .with_class("wp-block-woocommerce-all-reviews")
                .with_data("product-id", "abc"),
        );
        let mut mounter = Mounter::new();
        let mounted = mounter.scan(&root, &host());
        match &mounted[0] {
            MountedBlock::Fallback { node_id, html } => {
                assert_eq!(node_id, "broken");
                assert!(html.contains("Oops!"));
                assert!(html.contains("Error: invalid attribute product-id"));
            }
            MountedBlock::Feed { .. } => panic!("expected fallback"),
        }
    }

    #[tokio::test]
    async fn test_mounted_feed_runs_independently() {
        let root = page();
        let mut mounter = Mounter::new();
        let mut mounted = mounter.scan(&root, &host());
        let Some(MountedBlock::Feed { mut handle, .. }) = mounted.pop() else {
            panic!("expected a feed");
        };
        let snapshot = handle
            .wait_until(|snapshot| snapshot.phase == FeedPhase::Loaded)
            .await
            .unwrap();
        assert!(snapshot.reviews.is_empty());
        assert_eq!(snapshot.total_reviews, 0);
        handle.unmount().await.unwrap();
    }
}
