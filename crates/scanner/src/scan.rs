//! Bounded fan-out of probes over a candidate list.
//!
//! A fixed number of worker tasks pull candidates off a shared queue until it
//! is empty. Each probe bounds its own network time, so the pool needs no
//! cancellation: a slow host only ever occupies one worker.

use crate::probe::Prober;
use crate::record::ServerRecord;
use crate::source::unique_list;
use rand::seq::SliceRandom;
use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinSet;
use tracing::{info, warn};

const PROGRESS_EVERY: usize = 1000;

/// Run `work` over `items` with at most `workers` in flight and collect the
/// `Some` results in completion order. Each item runs in its own task, so a
/// panicking item is dropped on its own and its worker moves on.
pub async fn run_pool<T, R, F, Fut>(items: Vec<T>, workers: usize, work: F) -> Vec<R>
where
    T: Send + 'static,
    R: Send + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<R>> + Send + 'static,
{
    let total = items.len();
    let workers = workers.max(1).min(total.max(1));
    let queue = Arc::new(Mutex::new(VecDeque::from(items)));
    let attempted = Arc::new(AtomicUsize::new(0));
    let work = Arc::new(work);

    let mut set = JoinSet::new();
    for _ in 0..workers {
        let queue = queue.clone();
        let attempted = attempted.clone();
        let work = work.clone();
        set.spawn(async move {
            let mut found = Vec::new();
            loop {
                let next = queue
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .pop_front();
                let Some(item) = next else {
                    break;
                };
                match tokio::spawn(work(item)).await {
                    Ok(Some(result)) => found.push(result),
                    Ok(None) => {}
                    Err(e) => warn!(error = %e, "scan item ended abnormally"),
                }
                let done = attempted.fetch_add(1, Ordering::Relaxed) + 1;
                if done % PROGRESS_EVERY == 0 {
                    info!(done, total, "scan progress");
                }
            }
            found
        });
    }

    let mut results = Vec::new();
    while let Some(joined) = set.join_next().await {
        match joined {
            Ok(found) => results.extend(found),
            Err(e) => warn!(error = %e, "scan worker ended abnormally"),
        }
    }
    results
}

/// Probe every candidate once across `worker_count` workers. Candidates are
/// deduplicated and shuffled first so that neighbouring entries of a source
/// file (often one network block) are not hit in a burst. Returns only the
/// candidates that turned out to be federation servers, in arbitrary order.
pub async fn scan<P: Prober>(
    prober: Arc<P>,
    candidates: impl IntoIterator<Item = String>,
    worker_count: usize,
) -> Vec<ServerRecord> {
    let mut queue = unique_list(candidates);
    queue.shuffle(&mut rand::thread_rng());
    let total = queue.len();
    info!(candidates = total, workers = worker_count, "starting scan");

    let records = run_pool(queue, worker_count, move |candidate: String| {
        let prober = prober.clone();
        async move { prober.probe(&candidate).await }
    })
    .await;

    let mut seen = HashSet::new();
    let records: Vec<ServerRecord> = records
        .into_iter()
        .filter(|record| seen.insert(record.clone()))
        .collect();
    info!(found = records.len(), candidates = total, "scan finished");
    records
}
