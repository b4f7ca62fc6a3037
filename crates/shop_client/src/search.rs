//! Search-as-you-type over orders.
//!
//! [`Debouncer`] decides which typed queries reach the server; [`QuickFind`]
//! drives it from a background task and publishes the newest results.

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use shared::{domain::EventId, protocol::OrderResource};
use tokio::{
    sync::{mpsc, watch},
    task::JoinHandle,
    time::{sleep_until, Instant},
};
use tracing::{debug, warn};

use crate::{api::ShopApi, config::ShopSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    pub min_interval: Duration,
}

impl DispatchPolicy {
    pub fn new(min_interval: Duration) -> Self {
        Self { min_interval }
    }
}

impl From<&ShopSettings> for DispatchPolicy {
    fn from(settings: &ShopSettings) -> Self {
        Self::new(settings.search_interval())
    }
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        Self::new(Duration::from_millis(300))
    }
}

#[derive(Debug)]
pub struct Debouncer {
    policy: DispatchPolicy,
    primed: bool,
    last_dispatch: Option<Instant>,
    pending: Option<String>,
}

impl Debouncer {
    pub fn new(policy: DispatchPolicy) -> Self {
        Self {
            policy,
            primed: false,
            last_dispatch: None,
            pending: None,
        }
    }

    /// Offers a newly typed query. Returns the query when it should be sent
    /// now. The very first value is the initial binding and is never sent.
    pub fn offer(&mut self, query: String, now: Instant) -> Option<String> {
        if !self.primed {
            self.primed = true;
            return None;
        }
        if self.ready(now) {
            self.pending = None;
            self.last_dispatch = Some(now);
            Some(query)
        } else {
            self.pending = Some(query);
            None
        }
    }

    /// Releases the latest suppressed query once the interval has passed.
    pub fn flush(&mut self, now: Instant) -> Option<String> {
        if self.pending.is_none() || !self.ready(now) {
            return None;
        }
        self.last_dispatch = Some(now);
        self.pending.take()
    }

    /// When a pending query becomes eligible for [`Debouncer::flush`].
    pub fn pending_deadline(&self) -> Option<Instant> {
        self.pending.as_ref()?;
        Some(
            self.last_dispatch
                .map_or_else(Instant::now, |at| at + self.policy.min_interval),
        )
    }

    pub fn pending(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    fn ready(&self, now: Instant) -> bool {
        self.last_dispatch
            .map_or(true, |at| now.saturating_duration_since(at) >= self.policy.min_interval)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuickFindResults {
    pub query: String,
    pub results: Vec<OrderResource>,
    pub loaded: bool,
}

pub struct QuickFind {
    queries: mpsc::Sender<String>,
    results: watch::Receiver<QuickFindResults>,
    task: JoinHandle<()>,
}

impl QuickFind {
    pub fn spawn(api: Arc<dyn ShopApi>, event: EventId, policy: DispatchPolicy) -> Self {
        let (queries_tx, queries_rx) = mpsc::channel(32);
        let (results_tx, results_rx) = watch::channel(QuickFindResults::default());
        let mut debouncer = Debouncer::new(policy);
        // The empty search box is the initial binding.
        debouncer.offer(String::new(), Instant::now());
        let task = tokio::spawn(run_quick_find(
            api, event, debouncer, queries_rx, results_tx,
        ));
        Self {
            queries: queries_tx,
            results: results_rx,
            task,
        }
    }

    pub async fn search(&self, query: impl Into<String>) -> Result<()> {
        self.queries
            .send(query.into())
            .await
            .map_err(|_| anyhow!("quick find task has stopped"))
    }

    pub fn results(&self) -> watch::Receiver<QuickFindResults> {
        self.results.clone()
    }

    pub fn latest(&self) -> QuickFindResults {
        self.results.borrow().clone()
    }
}

impl Drop for QuickFind {
    fn drop(&mut self) {
        self.task.abort();
    }
}

type SearchOutcome = (u64, String, Result<Vec<OrderResource>>);

async fn run_quick_find(
    api: Arc<dyn ShopApi>,
    event: EventId,
    mut debouncer: Debouncer,
    mut queries: mpsc::Receiver<String>,
    results: watch::Sender<QuickFindResults>,
) {
    let (done_tx, mut done_rx) = mpsc::unbounded_channel::<SearchOutcome>();
    let mut generation = 0u64;

    let dispatch = |generation: u64, query: String| {
        let api = Arc::clone(&api);
        let done_tx = done_tx.clone();
        debug!(generation, %query, "dispatching order search");
        tokio::spawn(async move {
            let outcome = api.search_orders(event, &query).await;
            let _ = done_tx.send((generation, query, outcome));
        });
    };

    loop {
        let deadline = debouncer.pending_deadline();
        tokio::select! {
            query = queries.recv() => {
                let Some(query) = query else {
                    break;
                };
                if let Some(query) = debouncer.offer(query, Instant::now()) {
                    generation += 1;
                    dispatch(generation, query);
                }
            }
            _ = sleep_until(deadline.unwrap_or_else(Instant::now)), if deadline.is_some() => {
                if let Some(query) = debouncer.flush(Instant::now()) {
                    generation += 1;
                    dispatch(generation, query);
                }
            }
            Some((finished, query, outcome)) = done_rx.recv() => {
                if finished != generation {
                    debug!(finished, latest = generation, %query, "dropping stale search response");
                    continue;
                }
                match outcome {
                    Ok(found) => {
                        results.send_replace(QuickFindResults {
                            query,
                            results: found,
                            loaded: true,
                        });
                    }
                    Err(err) => warn!(%query, "order search failed: {err:#}"),
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod tests;
