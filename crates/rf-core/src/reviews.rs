use crate::error::StoreError;
use crate::types::ids::ReviewId;
use crate::types::query::FeedQuery;
use crate::types::review::{NewReview, Review, ReviewPage};

pub trait ReviewRepository {
    fn insert(&self, input: NewReview) -> Result<Review, StoreError>;
    fn get(&self, id: ReviewId) -> Result<Option<Review>, StoreError>;
    fn list(&self, query: &FeedQuery) -> Result<ReviewPage, StoreError>;
    fn delete(&self, id: ReviewId) -> Result<(), StoreError>;
}
