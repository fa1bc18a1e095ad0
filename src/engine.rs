//! Concurrent fan-out of lookups and single-consumer fan-in of their results.
//!
//! Every top-level request gets its own tokio task. Tasks push records and
//! failures into one unbounded channel as they produce them, then terminate.
//! A tracker task joins every task and only then sends the terminal
//! [`Event::Finished`] on the same channel, so the consumer has already
//! received everything the producers sent by the time it sees it.

use std::sync::Arc;

use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, error, info_span, warn};

use crate::config::Endpoints;
use crate::error::LookupFailure;
use crate::feed::FeedClient;
use crate::fetch::HttpClient;
use crate::output::{ErrorSink, Presenter};
use crate::record::StationRecord;
use crate::request::LookupRequest;
use crate::search::SearchClient;

/// What travels from the lookup tasks to the consumer loop.
#[derive(Debug)]
pub enum Event {
    Record(StationRecord),
    Failure(LookupFailure),
    /// Sent once, after every task has terminated.
    Finished { completed: usize },
}

/// Counts for one engine run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub submitted: usize,
    pub completed: usize,
    pub records: usize,
    pub failures: usize,
}

/// Tasks still in flight. Each leaves the set exactly once, when it
/// terminates, however many records or failures it produced.
pub struct PendingSet {
    tasks: Vec<(LookupRequest, JoinHandle<()>)>,
}

impl PendingSet {
    fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    fn insert(&mut self, request: LookupRequest, handle: JoinHandle<()>) {
        self.tasks.push((request, handle));
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Waits for every task to terminate and returns how many did.
    ///
    /// A task that panicked still counts as terminated.
    async fn wait_all(self) -> usize {
        let mut completed = 0;
        for (request, handle) in self.tasks {
            if let Err(e) = handle.await {
                error!(%request, error = %e, "Lookup task aborted");
            }
            completed += 1;
        }
        completed
    }
}

/// Runs feed and search lookups concurrently and hands results to a
/// presenter in arrival order.
pub struct Engine<C: ?Sized> {
    feed: FeedClient<C>,
    search: SearchClient<C>,
}

impl<C> Engine<C>
where
    C: HttpClient + ?Sized + 'static,
{
    pub fn new(http: Arc<C>, endpoints: Endpoints) -> Self {
        let feed = FeedClient::new(http, endpoints.feed);
        let search = SearchClient::new(feed.clone(), endpoints.search);
        Self { feed, search }
    }

    /// Launches one task per request and consumes their output until all of
    /// them have finished.
    ///
    /// Records go to `presenter` and failures to `errors`, one at a time, in
    /// the order they arrive. Lookup failures never abort the run.
    pub async fn run<P, E>(
        &self,
        requests: Vec<LookupRequest>,
        presenter: &mut P,
        errors: &mut E,
    ) -> RunSummary
    where
        P: Presenter + ?Sized,
        E: ErrorSink + ?Sized,
    {
        let (tx, mut rx) = unbounded_channel();
        let submitted = requests.len();

        let mut pending = PendingSet::new();
        for request in requests {
            let handle = self.spawn_lookup(request.clone(), tx.clone());
            pending.insert(request, handle);
        }
        debug!(in_flight = pending.len(), "Lookups launched");

        tokio::spawn(track_completion(pending, tx));

        let mut summary = consume(&mut rx, presenter, errors).await;
        summary.submitted = submitted;
        summary
    }

    fn spawn_lookup(&self, request: LookupRequest, tx: UnboundedSender<Event>) -> JoinHandle<()> {
        let span = info_span!("lookup", request = %request);
        match request {
            LookupRequest::City(identifier) => {
                let feed = self.feed.clone();
                tokio::spawn(
                    async move {
                        forward(&tx, feed.fetch(&identifier).await);
                    }
                    .instrument(span),
                )
            }
            LookupRequest::Keyword(keyword) => {
                let search = self.search.clone();
                tokio::spawn(
                    async move {
                        // Flushed in fetch order; the task ends only after
                        // the last item is queued.
                        for outcome in search.search(&keyword).await.outcomes {
                            forward(&tx, outcome);
                        }
                    }
                    .instrument(span),
                )
            }
        }
    }
}

fn forward(tx: &UnboundedSender<Event>, outcome: Result<StationRecord, LookupFailure>) {
    let event = match outcome {
        Ok(record) => Event::Record(record),
        Err(failure) => Event::Failure(failure),
    };
    // Fails only once the consumer is gone.
    if tx.send(event).is_err() {
        warn!("Result dropped: consumer is gone");
    }
}

async fn track_completion(pending: PendingSet, tx: UnboundedSender<Event>) {
    let completed = pending.wait_all().await;
    debug!(completed, "All lookups terminated");
    let _ = tx.send(Event::Finished { completed });
}

async fn consume<P, E>(
    rx: &mut UnboundedReceiver<Event>,
    presenter: &mut P,
    errors: &mut E,
) -> RunSummary
where
    P: Presenter + ?Sized,
    E: ErrorSink + ?Sized,
{
    let mut summary = RunSummary::default();

    while let Some(event) = rx.recv().await {
        match event {
            Event::Record(record) => {
                summary.records += 1;
                presenter.render(&record);
            }
            Event::Failure(failure) => {
                summary.failures += 1;
                errors.report(&failure);
            }
            Event::Finished { completed } => {
                summary.completed = completed;
                return summary;
            }
        }
    }

    // Only reachable if the tracker task itself died.
    error!("Result channel closed before completion");
    summary
}
