use crate::types::enums::{ImageType, SortKey};
use crate::types::ids::ProductId;
use crate::types::query::CategorySelection;
use crate::types::review::Review;

pub const DEFAULT_REVIEWS_ON_PAGE_LOAD: usize = 10;
pub const DEFAULT_REVIEWS_ON_LOAD_MORE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockAttributes {
    pub product_id: Option<ProductId>,
    pub category_ids: Option<CategorySelection>,
    pub orderby: SortKey,
    pub reviews_on_page_load: usize,
    pub reviews_on_load_more: usize,
    pub image_type: ImageType,
    pub show_orderby: bool,
    pub show_load_more: bool,
    pub show_review_date: bool,
    pub show_reviewer_name: bool,
    pub show_review_image: bool,
    pub show_review_rating: bool,
    pub show_review_content: bool,
    pub show_product_name: bool,
    /// Static review set; when present the feed never touches the network.
    pub preview_reviews: Option<Vec<Review>>,
}

impl Default for BlockAttributes {
    fn default() -> Self {
        Self {
            product_id: None,
            category_ids: None,
            orderby: SortKey::MostRecent,
            reviews_on_page_load: DEFAULT_REVIEWS_ON_PAGE_LOAD,
            reviews_on_load_more: DEFAULT_REVIEWS_ON_LOAD_MORE,
            image_type: ImageType::Reviewer,
            show_orderby: true,
            show_load_more: true,
            show_review_date: true,
            show_reviewer_name: true,
            show_review_image: true,
            show_review_rating: true,
            show_review_content: true,
            show_product_name: false,
            preview_reviews: None,
        }
    }
}

impl BlockAttributes {
    pub fn is_preview(&self) -> bool {
        self.preview_reviews.is_some()
    }
}
