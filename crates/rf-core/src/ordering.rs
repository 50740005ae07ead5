use crate::types::enums::{Order, OrderBy, SortKey};

/// Rating sorts only exist while ratings are enabled.
pub fn sort_to_query(key: &SortKey, ratings_enabled: bool) -> (OrderBy, Order) {
    if ratings_enabled {
        match key {
            SortKey::HighestRating => return (OrderBy::Rating, Order::Desc),
            SortKey::LowestRating => return (OrderBy::Rating, Order::Asc),
            SortKey::MostRecent | SortKey::Other(_) => {}
        }
    }
    (OrderBy::DateGmt, Order::Desc)
}
