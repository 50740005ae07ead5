use crate::announce::Announcement;
use crate::error::FetchError;
use crate::normalize::{NormalizedError, normalize};
use crate::ordering::sort_to_query;
use crate::settings::FeedConfig;
use crate::types::enums::SortKey;
use crate::types::ids::ProductId;
use crate::types::query::{CategorySelection, FeedQuery};
use crate::types::review::{FeedEntry, ReviewPage};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedPhase {
    Idle,
    Loading,
    Loaded,
    Errored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    Replace,
    Append,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub generation: u64,
    pub kind: FetchKind,
    pub query: FeedQuery,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedFilter {
    pub product_id: Option<ProductId>,
    pub category_ids: Option<CategorySelection>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedAction {
    Mount,
    SetFilter(FeedFilter),
    ChangeOrdering(SortKey),
    LoadMore,
    AppendDue,
    FetchSettled {
        generation: u64,
        kind: FetchKind,
        result: Result<ReviewPage, FetchError>,
    },
    Unmount,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FeedEffect {
    Fetch(FetchTicket),
    ScheduleAppend,
    CancelScheduledAppend,
    Announce(Announcement),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedState {
    pub entries: Vec<FeedEntry>,
    pub total_reviews: usize,
    pub loading: bool,
    pub error: Option<NormalizedError>,
    pub sort_key: SortKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedSnapshot {
    pub phase: FeedPhase,
    pub reviews: Vec<FeedEntry>,
    pub total_reviews: usize,
    pub loading: bool,
    pub error: Option<NormalizedError>,
    pub sort_key: SortKey,
    pub reviews_to_display: usize,
    /// Fetches applied so far, successful or not.
    pub settled_fetches: u64,
}

#[derive(Debug)]
pub struct FeedController {
    config: Arc<FeedConfig>,
    filter: FeedFilter,
    reviews_to_display: usize,
    state: FeedState,
    phase: FeedPhase,
    generation: u64,
    settled_fetches: u64,
    replace_in_flight: bool,
    append_in_flight: bool,
    append_requested: bool,
    torn_down: bool,
}

impl FeedController {
    pub fn new(config: impl Into<Arc<FeedConfig>>) -> Self {
        let config = config.into();
        let attributes = &config.attributes;
        let filter = FeedFilter {
            product_id: attributes.product_id,
            category_ids: attributes.category_ids.clone(),
        };
        let (entries, total_reviews, phase) = match &attributes.preview_reviews {
            Some(preview) => (
                preview.iter().cloned().map(FeedEntry::Loaded).collect(),
                preview.len(),
                FeedPhase::Loaded,
            ),
            None => (Vec::new(), 0, FeedPhase::Loading),
        };
        let state = FeedState {
            entries,
            total_reviews,
            loading: phase == FeedPhase::Loading,
            error: None,
            sort_key: attributes.orderby.clone(),
        };
        Self {
            reviews_to_display: attributes.reviews_on_page_load,
            filter,
            state,
            phase,
            generation: 0,
            settled_fetches: 0,
            replace_in_flight: false,
            append_in_flight: false,
            append_requested: false,
            torn_down: false,
            config,
        }
    }

    pub fn config(&self) -> &FeedConfig {
        &self.config
    }

    pub fn state(&self) -> &FeedState {
        &self.state
    }

    pub fn phase(&self) -> FeedPhase {
        self.phase
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reviews_to_display(&self) -> usize {
        self.reviews_to_display
    }

    pub fn is_preview(&self) -> bool {
        self.config.attributes.is_preview()
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    pub fn loaded_count(&self) -> usize {
        self.state
            .entries
            .iter()
            .filter(|entry| !entry.is_placeholder())
            .count()
    }

    pub fn visible_reviews(&self) -> &[FeedEntry] {
        let end = self.state.entries.len().min(self.reviews_to_display);
        &self.state.entries[..end]
    }

    pub fn snapshot(&self) -> FeedSnapshot {
        FeedSnapshot {
            phase: self.phase,
            reviews: self.visible_reviews().to_vec(),
            total_reviews: self.state.total_reviews,
            loading: self.state.loading,
            error: self.state.error.clone(),
            sort_key: self.state.sort_key.clone(),
            reviews_to_display: self.reviews_to_display,
            settled_fetches: self.settled_fetches,
        }
    }

    pub fn dispatch(&mut self, action: FeedAction) -> Vec<FeedEffect> {
        let mut effects = Vec::new();
        if self.torn_down {
            return effects;
        }
        match action {
            FeedAction::Mount => self.replace(&mut effects),
            FeedAction::SetFilter(filter) => {
                if filter != self.filter {
                    self.filter = filter;
                    self.replace(&mut effects);
                }
            }
            FeedAction::ChangeOrdering(sort_key) => {
                self.state.sort_key = sort_key;
                self.reviews_to_display = self.config.attributes.reviews_on_page_load;
                self.replace(&mut effects);
            }
            FeedAction::LoadMore => {
                self.reviews_to_display += self.config.attributes.reviews_on_load_more;
                if !self.is_preview() {
                    effects.push(FeedEffect::ScheduleAppend);
                }
            }
            FeedAction::AppendDue => self.append(&mut effects),
            FeedAction::FetchSettled {
                generation,
                kind,
                result,
            } => self.settle(generation, kind, result, &mut effects),
            FeedAction::Unmount => {
                self.torn_down = true;
                self.generation += 1;
                self.replace_in_flight = false;
                self.append_in_flight = false;
                self.append_requested = false;
                effects.push(FeedEffect::CancelScheduledAppend);
            }
        }
        effects
    }

    fn replace(&mut self, effects: &mut Vec<FeedEffect>) {
        if self.is_preview() {
            return;
        }
        self.generation += 1;
        self.reviews_to_display = self.config.attributes.reviews_on_page_load;
        self.append_in_flight = false;
        self.append_requested = false;
        effects.push(FeedEffect::CancelScheduledAppend);

        match self.build_query(0, self.reviews_to_display) {
            Ok(query) => {
                let expected = self.state.total_reviews.min(self.reviews_to_display);
                self.state.entries = vec![FeedEntry::Placeholder; expected];
                self.state.loading = true;
                self.phase = FeedPhase::Loading;
                self.replace_in_flight = true;
                effects.push(FeedEffect::Fetch(FetchTicket {
                    generation: self.generation,
                    kind: FetchKind::Replace,
                    query,
                }));
            }
            Err(err) => {
                self.replace_in_flight = false;
                self.fail(FetchKind::Replace, &err, effects);
            }
        }
    }

    fn append(&mut self, effects: &mut Vec<FeedEffect>) {
        if self.is_preview() {
            return;
        }
        if self.replace_in_flight || self.append_in_flight {
            self.append_requested = true;
            return;
        }
        let loaded = self.loaded_count();
        // offset + per_page stays within the known total.
        let target = self.reviews_to_display.min(self.state.total_reviews);
        if loaded >= target {
            return;
        }

        match self.build_query(loaded, target - loaded) {
            Ok(query) => {
                self.state.entries.retain(|entry| !entry.is_placeholder());
                self.state
                    .entries
                    .extend(std::iter::repeat_n(FeedEntry::Placeholder, target - loaded));
                self.state.loading = true;
                self.phase = FeedPhase::Loading;
                self.append_in_flight = true;
                effects.push(FeedEffect::Fetch(FetchTicket {
                    generation: self.generation,
                    kind: FetchKind::Append,
                    query,
                }));
            }
            Err(err) => self.fail(FetchKind::Append, &err, effects),
        }
    }

    fn settle(
        &mut self,
        generation: u64,
        kind: FetchKind,
        result: Result<ReviewPage, FetchError>,
        effects: &mut Vec<FeedEffect>,
    ) {
        if generation != self.generation {
            tracing::debug!(
                generation,
                current = self.generation,
                ?kind,
                "discarding stale review response"
            );
            return;
        }
        self.settled_fetches += 1;
        match kind {
            FetchKind::Replace => self.replace_in_flight = false,
            FetchKind::Append => self.append_in_flight = false,
        }

        match result {
            Ok(page) => {
                let received = page.reviews.len();
                let fresh = page.reviews.into_iter().map(FeedEntry::Loaded);
                match kind {
                    FetchKind::Replace => self.state.entries = fresh.collect(),
                    FetchKind::Append => {
                        self.state.entries.retain(|entry| !entry.is_placeholder());
                        self.state.entries.extend(fresh);
                    }
                }
                self.state.total_reviews = page.total;
                self.state.loading = false;
                self.state.error = None;
                self.phase = FeedPhase::Loaded;
                effects.push(FeedEffect::Announce(match kind {
                    FetchKind::Replace => Announcement::ListUpdated,
                    FetchKind::Append => Announcement::ReviewsLoaded(received),
                }));
                if self.append_requested {
                    self.append_requested = false;
                    self.append(effects);
                }
            }
            Err(err) => self.fail(kind, &err, effects),
        }
    }

    fn fail(&mut self, kind: FetchKind, err: &FetchError, effects: &mut Vec<FeedEffect>) {
        let normalized = normalize(err);
        tracing::warn!(?kind, code = %normalized.code, message = %normalized.message, "review fetch failed");
        match kind {
            FetchKind::Replace => {
                self.state.entries.clear();
                self.state.total_reviews = 0;
            }
            FetchKind::Append => self.state.entries.retain(|entry| !entry.is_placeholder()),
        }
        self.state.loading = false;
        self.state.error = Some(normalized);
        self.phase = FeedPhase::Errored;
        self.append_requested = false;
        effects.push(FeedEffect::Announce(Announcement::LoadError));
    }

    fn build_query(&self, offset: usize, per_page: usize) -> Result<FeedQuery, FetchError> {
        let (orderby, order) = sort_to_query(
            &self.state.sort_key,
            self.config.settings.review_ratings_enabled,
        );
        let category_ids = match &self.filter.category_ids {
            Some(selection) => selection
                .resolve()
                .map_err(|message| FetchError::Configuration { message })?,
            None => Vec::new(),
        };
        Ok(FeedQuery {
            order,
            orderby,
            per_page,
            offset,
            product_id: self.filter.product_id,
            category_ids,
        })
    }
}
