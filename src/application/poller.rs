//! # Sticky Poller
//!
//! Background loop that watches one feed for pinned items and announces each new one
//! into the configured channels exactly once.
//!
//! Lifecycle is `Stopped -> Running -> Stopped`. The loop runs on its own tokio task,
//! owns the [`DedupStore`] while running and hands it back when it exits. `stop()` is
//! cooperative: it cancels a token that the loop checks before each sleep and each
//! fetch, then waits for the task, so a persist is never cut short.

use crate::application::dedup::DedupStore;
use crate::application::feed_formatter::FeedFormatter;
use crate::application::parsing::SocialPostMatcher;
use crate::domain::config::PollerConfig;
use crate::domain::error::RelayError;
use crate::domain::traits::{BroadcastTarget, ErrorReporter, ExternalIdSource, FeedSource};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Collaborators the poll cycle talks to.
#[derive(Clone)]
pub struct PollerContext {
    source: Arc<dyn FeedSource>,
    target: Arc<dyn BroadcastTarget>,
    external: Arc<dyn ExternalIdSource>,
    reporter: Arc<dyn ErrorReporter>,
    matcher: Arc<SocialPostMatcher>,
}

/// Outcome of a single poll cycle.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CycleReport {
    pub fetch_failed: bool,
    pub fetched: usize,
    pub announced: usize,
    pub suppressed: usize,
    pub skipped: usize,
    pub sends: usize,
}

#[derive(Debug, Clone, Default)]
pub struct PollerStatus {
    pub running: bool,
    pub cycles: u64,
    pub failed_fetches: u64,
    pub announced: u64,
    pub seen_items: usize,
    pub last_success: Option<DateTime<Utc>>,
    pub target_feed: String,
    pub channels: Vec<String>,
}

#[derive(Debug, Default)]
struct Counters {
    cycles: u64,
    failed_fetches: u64,
    announced: u64,
    seen_items: usize,
    last_success: Option<DateTime<Utc>>,
}

struct Running {
    cancel: CancellationToken,
    handle: JoinHandle<DedupStore>,
}

struct WorkerSlot {
    store: Option<DedupStore>,
    running: Option<Running>,
}

pub struct FeedPoller {
    config_path: PathBuf,
    store_path: PathBuf,
    config: Arc<RwLock<PollerConfig>>,
    counters: Arc<Mutex<Counters>>,
    worker: Mutex<WorkerSlot>,
    context: PollerContext,
}

impl PollerContext {
    pub fn new(
        source: Arc<dyn FeedSource>,
        target: Arc<dyn BroadcastTarget>,
        external: Arc<dyn ExternalIdSource>,
        reporter: Arc<dyn ErrorReporter>,
    ) -> Result<Self, RelayError> {
        Ok(Self {
            source,
            target,
            external,
            reporter,
            matcher: Arc::new(SocialPostMatcher::new()?),
        })
    }

    fn report(&self, error: &RelayError, context: &str) {
        tracing::warn!(kind = error.kind(), "{context}: {error}");
        self.reporter.capture(error, context);
    }

    /// Fetch, filter, announce and record. Every failure is scoped: a fetch
    /// error ends the cycle, a parse error skips one item, a send error skips
    /// one channel, a persist error is reported and the loop carries on.
    pub async fn poll_once(&self, store: &mut DedupStore, config: &PollerConfig) -> CycleReport {
        let mut report = CycleReport::default();
        tracing::debug!(target_feed = %config.target_feed, "Checking feed");

        let items = match self.source.fetch_snapshot(&config.target_feed).await {
            Ok(items) => items,
            Err(e) => {
                self.report(&e, "fetching feed snapshot");
                report.fetch_failed = true;
                return report;
            }
        };
        report.fetched = items.len();

        for item in &items {
            if !item.stickied || store.contains(&item.id) {
                continue;
            }
            tracing::debug!(id = %item.id, "Found sticky to broadcast");

            if let Some(post) = self.matcher.match_url(&item.url) {
                let post_id = match post.post_id() {
                    Ok(id) => id,
                    Err(e) => {
                        self.report(&e, "extracting social post id");
                        report.skipped += 1;
                        continue;
                    }
                };
                // not recorded: re-checked every cycle until the external id moves on
                if config.suppress_cross_module_reposts && self.external.current_external_id() == Some(post_id) {
                    tracing::debug!(id = %item.id, post_id, "Sticky reposts the latest streamed post, skipping");
                    report.suppressed += 1;
                    continue;
                }
            }

            let message = FeedFormatter::announcement(item);
            let joined = self.target.joined_channels();
            for channel in &config.channels {
                if !joined.contains(channel) {
                    tracing::debug!(%channel, "Not joined, skipping channel");
                    continue;
                }
                match self.target.send(channel, &message).await {
                    Ok(()) => report.sends += 1,
                    Err(e) => self.report(&e, "broadcasting sticky"),
                }
            }

            if let Err(e) = store.record(&item.id) {
                self.report(&e, "recording seen item");
            }
            report.announced += 1;
        }

        report
    }
}

impl FeedPoller {
    /// Loads the poller config and the dedup store. The loop is not started.
    pub fn new(
        config_path: impl Into<PathBuf>,
        store_path: impl Into<PathBuf>,
        context: PollerContext,
    ) -> Result<Self, RelayError> {
        let config_path = config_path.into();
        let store_path = store_path.into();
        let config = PollerConfig::load(&config_path)?;
        let store = DedupStore::open(&store_path)?;

        let counters = Counters {
            seen_items: store.len(),
            ..Default::default()
        };

        Ok(Self {
            config_path,
            store_path,
            config: Arc::new(RwLock::new(config)),
            counters: Arc::new(Mutex::new(counters)),
            worker: Mutex::new(WorkerSlot {
                store: Some(store),
                running: None,
            }),
            context,
        })
    }

    pub async fn config(&self) -> PollerConfig {
        self.config.read().await.clone()
    }

    /// Re-reads the config file. The running loop uses the new values from its
    /// next cycle. On error the current config is kept.
    pub async fn reload_config(&self) -> Result<PollerConfig, RelayError> {
        let fresh = PollerConfig::load(&self.config_path)?;
        *self.config.write().await = fresh.clone();
        tracing::info!(target_feed = %fresh.target_feed, channels = fresh.channels.len(), "Reloaded sticky config");
        Ok(fresh)
    }

    /// Starts the loop. No-op while already running.
    pub async fn start(&self) -> Result<(), RelayError> {
        let mut slot = self.worker.lock().await;

        if let Some(running) = &slot.running
            && !running.handle.is_finished()
        {
            tracing::debug!("Sticky poller already running");
            return Ok(());
        }
        if let Some(finished) = slot.running.take() {
            slot.store = self.reap(finished).await;
        }

        let store = match slot.store.take() {
            Some(store) => store,
            None => DedupStore::open(&self.store_path)?,
        };

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run_loop(
            self.context.clone(),
            self.config.clone(),
            self.counters.clone(),
            store,
            cancel.clone(),
        ));
        slot.running = Some(Running { cancel, handle });
        tracing::debug!("Sticky poller task created");
        Ok(())
    }

    /// Requests termination and waits for the loop to exit.
    /// Returns whether a loop was running.
    pub async fn stop(&self) -> bool {
        let mut slot = self.worker.lock().await;
        let Some(running) = slot.running.take() else {
            return false;
        };
        running.cancel.cancel();
        slot.store = self.reap(running).await;
        true
    }

    pub async fn is_alive(&self) -> bool {
        let slot = self.worker.lock().await;
        slot.running.as_ref().is_some_and(|r| !r.handle.is_finished())
    }

    pub async fn status(&self) -> PollerStatus {
        let running = self.is_alive().await;
        let config = self.config.read().await.clone();
        let counters = self.counters.lock().await;
        PollerStatus {
            running,
            cycles: counters.cycles,
            failed_fetches: counters.failed_fetches,
            announced: counters.announced,
            seen_items: counters.seen_items,
            last_success: counters.last_success,
            target_feed: config.target_feed,
            channels: config.channels,
        }
    }

    /// Waits for a loop task and takes its store back. A task that died
    /// abnormally loses its in-memory store; the file is re-read instead.
    async fn reap(&self, running: Running) -> Option<DedupStore> {
        match running.handle.await {
            Ok(store) => Some(store),
            Err(e) => {
                tracing::error!("Sticky poller task ended abnormally: {e}");
                match DedupStore::open(&self.store_path) {
                    Ok(store) => Some(store),
                    Err(e) => {
                        self.context.report(&e, "reopening seen item store");
                        None
                    }
                }
            }
        }
    }
}

async fn run_loop(
    context: PollerContext,
    config: Arc<RwLock<PollerConfig>>,
    counters: Arc<Mutex<Counters>>,
    mut store: DedupStore,
    cancel: CancellationToken,
) -> DedupStore {
    tracing::info!("Sticky poller started");

    loop {
        let interval = Duration::from_secs(config.read().await.poll_interval_seconds);
        if cancel.is_cancelled() {
            break;
        }
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        if cancel.is_cancelled() {
            break;
        }

        let snapshot = config.read().await.clone();
        let report = context.poll_once(&mut store, &snapshot).await;
        tracing::debug!(
            fetched = report.fetched,
            announced = report.announced,
            suppressed = report.suppressed,
            skipped = report.skipped,
            sends = report.sends,
            "Poll cycle finished"
        );

        // retry a write that failed earlier in this or a previous cycle
        if let Err(e) = store.flush() {
            context.report(&e, "retrying seen item persist");
        }

        let mut stats = counters.lock().await;
        stats.cycles += 1;
        stats.seen_items = store.len();
        if report.fetch_failed {
            stats.failed_fetches += 1;
        } else {
            stats.announced += report.announced as u64;
            stats.last_success = Some(Utc::now());
        }
    }

    if let Err(e) = store.flush() {
        context.report(&e, "persisting seen items on stop");
    }
    tracing::info!("Sticky poller stopped");
    store
}
