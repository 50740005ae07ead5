pub mod announce;
pub mod clamp;
pub mod controller;
pub mod error;
pub mod i18n;
pub mod mount;
pub mod normalize;
pub mod ordering;
pub mod render;
pub mod reviews;
pub mod runtime;
pub mod sanitize;
pub mod scheduler;
pub mod settings;
pub mod store;
pub mod transport;

pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use crate::controller::{FeedAction, FeedController, FeedEffect, FeedSnapshot};
pub use crate::error::RevfeedError;
pub use crate::runtime::{FeedHandle, spawn_feed};
pub use crate::store::Store;
