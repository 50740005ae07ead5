use crate::announce::Announce;
use crate::controller::{FeedAction, FeedController, FeedEffect, FeedFilter, FeedSnapshot, FetchTicket};
use crate::error::RevfeedError;
use crate::i18n::Catalog;
use crate::scheduler::{TrailingDebounce, wait_for};
use crate::transport::{ReviewTransport, fetch_page};
use crate::types::enums::SortKey;
use futures::StreamExt;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;

const COMMAND_BUFFER: usize = 32;

/// Owner-side handle to a running feed. Dropping it tears the feed down.
pub struct FeedHandle {
    commands: mpsc::Sender<FeedAction>,
    snapshots: watch::Receiver<FeedSnapshot>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    pub fn snapshot(&self) -> FeedSnapshot {
        self.snapshots.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<FeedSnapshot> {
        self.snapshots.clone()
    }

    pub async fn set_filter(&self, filter: FeedFilter) -> Result<(), RevfeedError> {
        self.send(FeedAction::SetFilter(filter)).await
    }

    pub async fn change_ordering(&self, sort_key: SortKey) -> Result<(), RevfeedError> {
        self.send(FeedAction::ChangeOrdering(sort_key)).await
    }

    pub async fn load_more(&self) -> Result<(), RevfeedError> {
        self.send(FeedAction::LoadMore).await
    }

    pub async fn wait_until(
        &mut self,
        predicate: impl FnMut(&FeedSnapshot) -> bool,
    ) -> Result<FeedSnapshot, RevfeedError> {
        let snapshot = self
            .snapshots
            .wait_for(predicate)
            .await
            .map_err(|_| closed())?;
        Ok(snapshot.clone())
    }

    pub async fn unmount(self) -> Result<(), RevfeedError> {
        // The task may already be gone; joining below reports anything worse.
        let _ = self.commands.send(FeedAction::Unmount).await;
        self.task.await.map_err(|err| RevfeedError::Internal {
            message: format!("feed task failed: {err}"),
        })
    }

    async fn send(&self, action: FeedAction) -> Result<(), RevfeedError> {
        self.commands.send(action).await.map_err(|_| closed())
    }
}

fn closed() -> RevfeedError {
    RevfeedError::Internal {
        message: "feed is no longer running".to_string(),
    }
}

pub fn spawn_feed<T: ReviewTransport>(
    controller: FeedController,
    transport: Arc<T>,
    announcer: Arc<dyn Announce>,
    catalog: Arc<dyn Catalog>,
) -> FeedHandle {
    let (commands, receiver) = mpsc::channel(COMMAND_BUFFER);
    let (publisher, snapshots) = watch::channel(controller.snapshot());
    let worker = FeedWorker {
        debounce: TrailingDebounce::new(controller.config().append_debounce),
        controller,
        transport,
        announcer,
        catalog,
        in_flight: FuturesUnordered::new(),
        publisher,
    };
    let task = tokio::spawn(worker.run(receiver));
    FeedHandle {
        commands,
        snapshots,
        task,
    }
}

struct FeedWorker<T> {
    controller: FeedController,
    transport: Arc<T>,
    announcer: Arc<dyn Announce>,
    catalog: Arc<dyn Catalog>,
    debounce: TrailingDebounce,
    in_flight: FuturesUnordered<BoxFuture<'static, FeedAction>>,
    publisher: watch::Sender<FeedSnapshot>,
}

impl<T: ReviewTransport> FeedWorker<T> {
    async fn run(mut self, mut commands: mpsc::Receiver<FeedAction>) {
        self.handle(FeedAction::Mount);
        loop {
            tokio::select! {
                command = commands.recv() => {
                    // A dropped handle counts as unmount.
                    let action = command.unwrap_or(FeedAction::Unmount);
                    self.handle(action);
                }
                Some(settled) = self.in_flight.next(), if !self.in_flight.is_empty() => {
                    self.handle(settled);
                }
                () = wait_for(self.debounce.deadline()) => {
                    if self.debounce.take_due(Instant::now()) {
                        self.handle(FeedAction::AppendDue);
                    }
                }
            }
            if self.controller.is_torn_down() {
                tracing::debug!(
                    abandoned = self.in_flight.len(),
                    "feed unmounted"
                );
                break;
            }
        }
    }

    fn handle(&mut self, action: FeedAction) {
        for effect in self.controller.dispatch(action) {
            match effect {
                FeedEffect::Fetch(ticket) => self.start_fetch(ticket),
                FeedEffect::ScheduleAppend => self.debounce.schedule(),
                FeedEffect::CancelScheduledAppend => self.debounce.cancel(),
                FeedEffect::Announce(announcement) => {
                    let message = announcement.message(self.catalog.as_ref());
                    self.announcer.speak(&message);
                }
            }
        }
        let next = self.controller.snapshot();
        self.publisher.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }

    fn start_fetch(&mut self, ticket: FetchTicket) {
        let transport = Arc::clone(&self.transport);
        self.in_flight.push(Box::pin(async move {
            let result = fetch_page(transport.as_ref(), &ticket.query).await;
            FeedAction::FetchSettled {
                generation: ticket.generation,
                kind: ticket.kind,
                result,
            }
        }));
    }
}
