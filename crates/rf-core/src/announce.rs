use crate::i18n::{Catalog, format_count};
use tokio::sync::broadcast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Announcement {
    ReviewsLoaded(usize),
    ListUpdated,
    LoadError,
}

impl Announcement {
    pub fn message(self, catalog: &dyn Catalog) -> String {
        match self {
            Self::ReviewsLoaded(count) => format_count(
                &catalog.translate_plural("%d review loaded.", "%d reviews loaded.", count),
                count,
            ),
            Self::ListUpdated => catalog.translate("Reviews list updated."),
            Self::LoadError => catalog.translate("There was an error loading the reviews."),
        }
    }
}

pub trait Announce: Send + Sync {
    fn speak(&self, message: &str);
}

#[derive(Clone)]
pub struct AnnouncementBus {
    sender: broadcast::Sender<String>,
}

impl AnnouncementBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<String> {
        self.sender.subscribe()
    }
}

impl Announce for AnnouncementBus {
    fn speak(&self, message: &str) {
        // Nobody listening is fine.
        let _ = self.sender.send(message.to_string());
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAnnouncer;

impl Announce for TracingAnnouncer {
    fn speak(&self, message: &str) {
        tracing::info!(target: "revfeed::a11y", %message, "announce");
    }
}
