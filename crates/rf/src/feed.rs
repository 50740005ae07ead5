use crate::output::print_summary;
use crate::{CliError, LINE_HEIGHT};
use clap::Args;
use rf_client::HttpTransport;
use rf_core::announce::TracingAnnouncer;
use rf_core::clamp::MonospaceMeasure;
use rf_core::controller::{FeedController, FeedPhase, FeedSnapshot};
use rf_core::i18n::SourceCatalog;
use rf_core::render::Renderer;
use rf_core::sanitize::AllowListSanitizer;
use rf_core::settings::SettingsFile;
use rf_core::spawn_feed;
use rf_core::types::block::BlockAttributes;
use rf_core::types::enums::SortKey;
use rf_core::types::ids::{CategoryId, ProductId, parse_id_list};
use rf_core::types::query::CategorySelection;
use std::sync::Arc;

#[derive(Args)]
pub(crate) struct FeedArgs {
    /// REST root; defaults to the configured server.
    #[arg(long)]
    pub base_url: Option<String>,
    #[arg(long)]
    pub product: Option<u64>,
    /// Comma separated category ids.
    #[arg(long)]
    pub categories: Option<String>,
    #[arg(long, default_value = "most-recent")]
    pub sort: String,
    /// Reviews per request.
    #[arg(long, default_value_t = 10)]
    pub per_page: usize,
    /// How many times to press "Load more".
    #[arg(long, default_value_t = 0)]
    pub more: usize,
    /// Print block markup instead of a summary.
    #[arg(long)]
    pub html: bool,
    #[arg(long, default_value_t = 80)]
    pub columns: usize,
}

impl FeedArgs {
    fn attributes(&self) -> Result<BlockAttributes, CliError> {
        let product_id = self
            .product
            .map(ProductId::new)
            .transpose()
            .map_err(|err| CliError::Argument {
                name: "product",
                message: err.to_string(),
            })?;
        let category_ids = self
            .categories
            .as_deref()
            .map(parse_id_list::<CategoryId>)
            .transpose()
            .map_err(|err| CliError::Argument {
                name: "categories",
                message: err.to_string(),
            })?
            .map(CategorySelection::Ids);
        Ok(BlockAttributes {
            product_id,
            category_ids,
            orderby: SortKey::from(self.sort.as_str()),
            reviews_on_page_load: self.per_page,
            reviews_on_load_more: self.per_page,
            ..BlockAttributes::default()
        })
    }
}

fn settled(snapshot: &FeedSnapshot) -> bool {
    snapshot.phase == FeedPhase::Errored
        || (snapshot.phase == FeedPhase::Loaded
            && !snapshot.loading
            && snapshot.reviews.iter().all(|entry| !entry.is_placeholder()))
}

/// The append started after `before` fetches has been applied, even when it
/// brought back fewer reviews than asked for.
fn append_settled(next: &FeedSnapshot, before: u64) -> bool {
    next.phase == FeedPhase::Errored || (next.settled_fetches > before && settled(next))
}

pub(crate) async fn run(args: FeedArgs, settings: &SettingsFile) -> Result<(), CliError> {
    let attributes = args.attributes()?;
    let base_url = args
        .base_url
        .clone()
        .unwrap_or_else(|| settings.server.base_url.clone());
    let transport = Arc::new(HttpTransport::new(base_url.clone()));
    let controller = FeedController::new(settings.feed_config(attributes.clone()));
    let mut handle = spawn_feed(
        controller,
        transport,
        Arc::new(TracingAnnouncer),
        Arc::new(SourceCatalog::new()),
    );

    let mut snapshot = handle.wait_until(settled).await?;
    for _ in 0..args.more {
        if snapshot.phase == FeedPhase::Errored || snapshot.total_reviews <= snapshot.reviews.len()
        {
            break;
        }
        let shown = snapshot.reviews.len();
        let before = snapshot.settled_fetches;
        handle.load_more().await?;
        snapshot = handle
            .wait_until(|next| append_settled(next, before))
            .await?;
        if snapshot.reviews.len() <= shown {
            break;
        }
    }
    handle.unmount().await?;

    if args.html {
        let catalog = SourceCatalog::new();
        let sanitizer = AllowListSanitizer::default();
        let measure = MonospaceMeasure::new(args.columns, LINE_HEIGHT);
        let renderer = Renderer {
            settings: settings.settings,
            catalog: &catalog,
            sanitizer: &sanitizer,
            measure: &measure,
            max_lines: settings.feed.max_lines,
            asset_url: &base_url,
        };
        println!("{}", renderer.render_feed(&snapshot, &attributes));
    } else {
        print_summary(&snapshot, args.columns);
    }
    Ok(())
}
