use chrono::NaiveDate;
use rf_client::RouterTransport;
use rf_core::announce::AnnouncementBus;
use rf_core::controller::{FeedController, FeedPhase};
use rf_core::i18n::SourceCatalog;
use rf_core::reviews::ReviewRepository;
use rf_core::settings::{FeedConfig, HostSettings};
use rf_core::store::Store;
use rf_core::types::block::BlockAttributes;
use rf_core::types::enums::SortKey;
use rf_core::types::ids::ProductId;
use rf_core::types::review::NewReview;
use rf_core::{FeedHandle, spawn_feed};
use rf_db::schema;
use rf_db::store::DbStore;
use rf_serve::{AppState, app};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

fn seed(db_path: &str, product: u64, count: u32) {
    let store = DbStore::new(schema::open_and_migrate(db_path).unwrap());
    store
        .with_tx(|tx| {
            for day in 1..=count {
                tx.reviews().insert(NewReview {
                    product_id: ProductId::new(product).unwrap(),
                    product_name: format!("Product {product}"),
                    product_permalink: format!("https://shop.test/p/{product}"),
                    product_image: None,
                    reviewer: format!("Reviewer {product}-{day}"),
                    review: format!("<p>Day {day} was good.</p>"),
                    rating: Some(u8::try_from(day % 5 + 1).unwrap()),
                    verified: true,
                    date_created_gmt: NaiveDate::from_ymd_opt(2024, 1, day)
                        .unwrap()
                        .and_hms_opt(8, 0, 0)
                        .unwrap(),
                    reviewer_avatar_urls: BTreeMap::new(),
                    category_ids: Vec::new(),
                })?;
            }
            Ok(())
        })
        .unwrap();
}

fn start(dir: &TempDir, attributes: BlockAttributes) -> (FeedHandle, AnnouncementBus) {
    let db_path = dir.path().join("reviews.db").display().to_string();
    let transport = Arc::new(RouterTransport::new(app(AppState::new(db_path))));
    let config = FeedConfig::new(attributes, HostSettings::default())
        .with_append_debounce(Duration::from_millis(10));
    let bus = AnnouncementBus::new(16);
    let handle = spawn_feed(
        FeedController::new(config),
        transport,
        Arc::new(bus.clone()),
        Arc::new(SourceCatalog::new()),
    );
    (handle, bus)
}

fn seeded_dir() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("reviews.db").display().to_string();
    seed(&db_path, 42, 25);
    seed(&db_path, 9, 3);
    dir
}

fn reviewers(handle: &FeedHandle) -> Vec<String> {
    handle
        .snapshot()
        .reviews
        .iter()
        .filter_map(|entry| entry.review().map(|review| review.reviewer.clone()))
        .collect()
}

#[tokio::test]
async fn test_feed_pages_through_product_reviews() {
    let dir = seeded_dir();
    let (mut handle, bus) = start(
        &dir,
        BlockAttributes {
            product_id: Some(ProductId::new(42).unwrap()),
            ..BlockAttributes::default()
        },
    );
    let mut spoken = bus.subscribe();

    let snapshot = handle
        .wait_until(|snapshot| snapshot.phase == FeedPhase::Loaded)
        .await
        .unwrap();
    assert_eq!(snapshot.total_reviews, 25);
    assert_eq!(snapshot.reviews.len(), 10);
    assert_eq!(reviewers(&handle)[0], "Reviewer 42-25");
    assert_eq!(spoken.recv().await.unwrap(), "Reviews list updated.");

    handle.load_more().await.unwrap();
    let snapshot = handle
        .wait_until(|snapshot| {
            snapshot.phase == FeedPhase::Loaded
                && snapshot.reviews.len() == 20
                && snapshot.reviews.iter().all(|entry| !entry.is_placeholder())
        })
        .await
        .unwrap();
    assert_eq!(snapshot.total_reviews, 25);
    assert_eq!(reviewers(&handle)[19], "Reviewer 42-6");
    assert_eq!(spoken.recv().await.unwrap(), "10 reviews loaded.");

    handle.unmount().await.unwrap();
}

#[tokio::test]
async fn test_ordering_change_refetches_from_the_start() {
    let dir = seeded_dir();
    let (mut handle, _bus) = start(
        &dir,
        BlockAttributes {
            product_id: Some(ProductId::new(42).unwrap()),
            ..BlockAttributes::default()
        },
    );
    handle
        .wait_until(|snapshot| snapshot.phase == FeedPhase::Loaded)
        .await
        .unwrap();

    handle.change_ordering(SortKey::LowestRating).await.unwrap();
    let snapshot = handle
        .wait_until(|snapshot| {
            snapshot.phase == FeedPhase::Loaded && snapshot.sort_key == SortKey::LowestRating
        })
        .await
        .unwrap();
    let ratings: Vec<u8> = snapshot
        .reviews
        .iter()
        .filter_map(|entry| entry.review().and_then(|review| review.rating))
        .collect();
    assert_eq!(ratings.len(), 10);
    assert!(ratings.iter().all(|rating| *rating == 1 || *rating == 2));
    assert!(ratings.windows(2).all(|pair| pair[0] <= pair[1]));

    handle.unmount().await.unwrap();
}

#[tokio::test]
async fn test_rejected_page_size_surfaces_api_error() {
    let dir = seeded_dir();
    let (mut handle, bus) = start(
        &dir,
        BlockAttributes {
            reviews_on_page_load: 150,
            ..BlockAttributes::default()
        },
    );
    let mut spoken = bus.subscribe();

    let snapshot = handle
        .wait_until(|snapshot| snapshot.phase == FeedPhase::Errored)
        .await
        .unwrap();
    let error = snapshot.error.unwrap();
    assert_eq!(error.code, "rest_invalid_param");
    assert!(error.message.contains("per_page"), "{}", error.message);
    assert!(snapshot.reviews.is_empty());
    assert_eq!(snapshot.total_reviews, 0);
    assert_eq!(
        spoken.recv().await.unwrap(),
        "There was an error loading the reviews."
    );

    handle.unmount().await.unwrap();
}
