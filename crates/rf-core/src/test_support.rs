use crate::types::ids::{ProductId, ReviewId};
use crate::types::review::{Review, ReviewPage};
use chrono::NaiveDate;
use std::collections::BTreeMap;

pub(crate) fn review(id: u64) -> Review {
    let created = NaiveDate::from_ymd_opt(2024, 3, 1)
        .unwrap()
        .and_hms_opt(12, 0, 0)
        .unwrap()
        + chrono::Duration::hours(i64::try_from(id).unwrap());
    let mut avatars = BTreeMap::new();
    avatars.insert("96".to_string(), format!("https://example.test/avatar/{id}?s=96"));
    Review {
        id: ReviewId::new(id).unwrap(),
        date_created: created,
        formatted_date_created: created.format("%B %-d, %Y").to_string(),
        date_created_gmt: created,
        product_id: ProductId::new(42).unwrap(),
        product_name: "Beanie".to_string(),
        product_permalink: "https://shop.test/product/beanie".to_string(),
        product_image: None,
        reviewer: format!("Reviewer {id}"),
        review: format!("<p>Review number {id}</p>"),
        rating: Some(u8::try_from(id % 5 + 1).unwrap()),
        verified: id % 2 == 0,
        reviewer_avatar_urls: avatars,
    }
}

pub(crate) fn reviews(ids: std::ops::RangeInclusive<u64>) -> Vec<Review> {
    ids.map(review).collect()
}

pub(crate) fn page(ids: std::ops::RangeInclusive<u64>, total: usize) -> ReviewPage {
    ReviewPage {
        reviews: reviews(ids),
        total,
    }
}
