pub mod block;
pub mod enums;
pub mod ids;
pub mod query;
pub mod review;

pub use block::BlockAttributes;
pub use enums::{ErrorType, ImageType, Order, OrderBy, SortKey};
pub use ids::{CategoryId, IdError, ProductId, ReviewId};
pub use query::{CategorySelection, FeedQuery, QueryError, REVIEWS_ROUTE};
pub use review::{FeedEntry, NewReview, ProductImage, Review, ReviewPage};
