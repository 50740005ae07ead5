use crate::types::ids::{CategoryId, ProductId, ReviewId};
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: ReviewId,
    pub date_created: NaiveDateTime,
    pub formatted_date_created: String,
    pub date_created_gmt: NaiveDateTime,
    pub product_id: ProductId,
    pub product_name: String,
    pub product_permalink: String,
    #[serde(default)]
    pub product_image: Option<ProductImage>,
    pub reviewer: String,
    pub review: String,
    #[serde(default)]
    pub rating: Option<u8>,
    pub verified: bool,
    #[serde(default)]
    pub reviewer_avatar_urls: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ProductImage {
    pub id: u64,
    pub src: String,
    pub thumbnail: String,
    #[serde(default)]
    pub srcset: String,
    #[serde(default)]
    pub sizes: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub alt: String,
}

impl Review {
    pub fn avatar_url(&self, size: u32) -> Option<&str> {
        self.reviewer_avatar_urls
            .get(&size.to_string())
            .map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEntry {
    Placeholder,
    Loaded(Review),
}

impl FeedEntry {
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder)
    }

    pub fn review(&self) -> Option<&Review> {
        match self {
            Self::Loaded(review) => Some(review),
            Self::Placeholder => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewPage {
    pub reviews: Vec<Review>,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReview {
    pub product_id: ProductId,
    pub product_name: String,
    pub product_permalink: String,
    #[serde(default)]
    pub product_image: Option<ProductImage>,
    pub reviewer: String,
    pub review: String,
    #[serde(default)]
    pub rating: Option<u8>,
    #[serde(default)]
    pub verified: bool,
    pub date_created_gmt: NaiveDateTime,
    #[serde(default)]
    pub reviewer_avatar_urls: BTreeMap<String, String>,
    #[serde(default)]
    pub category_ids: Vec<CategoryId>,
}
