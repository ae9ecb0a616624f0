//! Recursive concurrent traversal
//!
//! Every identifier being crawled gets its own Tokio task. A task claims its
//! identifier in the run's [`VisitedSet`], fetches it, emits one
//! [`ResultItem`], then spawns one child per link. Each child owns its own
//! channel; the parent merges all child receivers and forwards what arrives
//! into its own sender. Dropping a sender is the completion signal, so the
//! root stream ends exactly when every task in the tree has finished.
//!
//! Dropping the [`CrawlStream`] raises a run-wide stop flag. Tasks check it
//! before claiming and again before spawning children, so the tree stops
//! growing within one fetch of the drop.
//!
//! # Ordering
//!
//! A task's own item always precedes its children's items, and items from a
//! single child keep that child's order. Items from different children may
//! interleave.

use crate::crawler::fetcher::Fetcher;
use crate::output::{CrawlReport, RunTally};
use crate::state::{TaskState, VisitedSet};
use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::future::BoxFuture;
use futures::stream::{self, Stream, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};

/// One successfully fetched identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultItem {
    /// The identifier that was fetched
    pub id: String,

    /// Content returned by the fetcher
    pub content: String,

    /// Hops from the seed to the task that claimed this identifier
    pub depth: u32,
}

/// State shared by every task of one crawl run
struct RunContext {
    fetcher: Arc<dyn Fetcher>,
    visited: VisitedSet,
    tally: RunTally,
    stopped: AtomicBool,
}

impl RunContext {
    fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Output of a crawl run
///
/// Yields every [`ResultItem`] of the run and ends once the whole traversal
/// tree has completed. Dropping the stream early stops the run: tasks that
/// have not claimed their identifier yet quit, and tasks whose fetch is in
/// flight finish it but spawn no children.
pub struct CrawlStream {
    items: UnboundedReceiver<ResultItem>,
    context: Arc<RunContext>,
}

impl CrawlStream {
    /// Snapshot of the run's counters so far
    ///
    /// Once the stream has ended the snapshot is final.
    pub fn report(&self) -> CrawlReport {
        self.context.tally.snapshot(self.context.visited.len())
    }

    /// Identifiers claimed so far, sorted
    ///
    /// Includes identifiers whose fetch failed.
    pub fn visited(&self) -> Vec<String> {
        self.context.visited.snapshot()
    }

    /// Drains the stream and returns every item together with the final report
    pub async fn collect_all(mut self) -> (Vec<ResultItem>, CrawlReport) {
        let mut items = Vec::new();
        while let Some(item) = self.next().await {
            items.push(item);
        }
        let report = self.report();
        (items, report)
    }
}

impl Stream for CrawlStream {
    type Item = ResultItem;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.items.poll_next_unpin(cx)
    }
}

impl Drop for CrawlStream {
    fn drop(&mut self) {
        self.context.stopped.store(true, Ordering::Release);
    }
}

/// Starts a crawl from `seed`, following links up to `max_depth` levels
///
/// A `max_depth` of 0 produces an empty stream without fetching anything; a
/// `max_depth` of 1 fetches only the seed.
///
/// Must be called from within a Tokio runtime, since the root task is spawned
/// immediately.
///
/// # Example
///
/// ```
/// use futures::StreamExt;
/// use std::sync::Arc;
/// use sumi_fanout::crawler::{crawl, StaticFetcher};
///
/// # #[tokio::main]
/// # async fn main() {
/// let fetcher = Arc::new(StaticFetcher::golang_sample());
/// let mut stream = crawl("https://golang.org/", 4, fetcher);
///
/// while let Some(item) = stream.next().await {
///     println!("found: {} {:?}", item.id, item.content);
/// }
///
/// assert!(stream.report().failed("https://golang.org/cmd/"));
/// # }
/// ```
pub fn crawl(seed: impl Into<String>, max_depth: u32, fetcher: Arc<dyn Fetcher>) -> CrawlStream {
    let seed = seed.into();
    let context = Arc::new(RunContext {
        fetcher,
        visited: VisitedSet::new(),
        tally: RunTally::new(),
        stopped: AtomicBool::new(false),
    });

    tracing::info!("Starting crawl from {} (max depth {})", seed, max_depth);

    let (tx, rx) = mpsc::unbounded();
    tokio::spawn(traverse(seed, max_depth, 0, Arc::clone(&context), tx));

    CrawlStream { items: rx, context }
}

/// Spawnable wrapper around [`run_task`]
///
/// Returns a boxed future because tasks spawn copies of themselves.
fn traverse(
    id: String,
    remaining: u32,
    hops: u32,
    context: Arc<RunContext>,
    out: UnboundedSender<ResultItem>,
) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        let state = run_task(&id, remaining, hops, &context, &out).await;
        debug_assert!(state.is_terminal(), "{} exited as {}", id, state);

        if state.is_skipped() {
            context.tally.record(state);
        }
        // Counted before the stream can observe this task closing
        drop(out);
    })
}

/// Runs one traversal task to completion and returns its terminal state
///
/// `remaining` is the depth budget left for this task and `hops` is its
/// distance from the seed.
async fn run_task(
    id: &str,
    remaining: u32,
    hops: u32,
    context: &Arc<RunContext>,
    out: &UnboundedSender<ResultItem>,
) -> TaskState {
    let mut state = TaskState::Pending;

    if remaining == 0 {
        return advance(id, &mut state, TaskState::DepthExhausted);
    }

    if context.is_stopped() {
        return advance(id, &mut state, TaskState::Stopped);
    }

    if !context.visited.claim(id) {
        return advance(id, &mut state, TaskState::Duplicate);
    }

    advance(id, &mut state, TaskState::Fetching);
    let page = match context.fetcher.fetch(id).await {
        Ok(page) => page,
        Err(e) => {
            tracing::warn!("{}", e);
            context.tally.record_failure(e);
            return advance(id, &mut state, TaskState::Failed);
        }
    };

    advance(id, &mut state, TaskState::Fetched);
    context.tally.record(state);

    let item = ResultItem {
        id: id.to_string(),
        content: page.content,
        depth: hops,
    };
    if out.unbounded_send(item).is_err() || context.is_stopped() {
        tracing::debug!("Run stopped, not following links of {}", id);
        return advance(id, &mut state, TaskState::Stopped);
    }

    advance(id, &mut state, TaskState::Spawning);
    let children: Vec<UnboundedReceiver<ResultItem>> = page
        .links
        .into_iter()
        .map(|link| {
            let (child_tx, child_rx) = mpsc::unbounded();
            tokio::spawn(traverse(
                link,
                remaining - 1,
                hops + 1,
                Arc::clone(context),
                child_tx,
            ));
            child_rx
        })
        .collect();

    advance(id, &mut state, TaskState::Draining);
    let mut merged = stream::select_all(children);
    while let Some(item) = merged.next().await {
        if out.unbounded_send(item).is_err() {
            tracing::debug!("Output for {} closed while draining children", id);
            return advance(id, &mut state, TaskState::Stopped);
        }
    }

    advance(id, &mut state, TaskState::Done)
}

fn advance(id: &str, state: &mut TaskState, next: TaskState) -> TaskState {
    debug_assert!(
        state.can_transition_to(next),
        "illegal task transition {} -> {} for {}",
        state,
        next,
        id
    );
    tracing::debug!("{}: {} -> {}", id, state, next);
    *state = next;
    next
}
