//! The refresh lifecycle: every trigger (startup, timer, manual, sort change)
//! ends up in [`TickerSynchronizer::refresh`], which publishes list, banner
//! and last-updated state as one snapshot on a watch channel.

use crate::ticker::banner::run_banner_rotation;
use crate::ticker::coinlore::TickerSource;
use crate::ticker::sort::sort_entries;
use crate::ticker::types::{
    DisplaySnapshot, RefreshResult, SortKey, SortSpec, TickerEntry, TickerFeedConfig, ViewState,
    DEFAULT_BANNER_LABEL, LAST_UPDATED_FORMAT, NO_DATA_MESSAGE,
};
use chrono::{DateTime, Local, TimeZone};
use parking_lot::Mutex;
use std::fmt::Display;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshOutcome {
    Applied,
    /// A refresh started later had already published; this result was dropped.
    Stale,
}

pub fn format_server_timestamp<Tz>(timestamp_secs: i64, timezone: &Tz) -> Option<String>
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    DateTime::from_timestamp(timestamp_secs, 0).map(|utc| {
        utc.with_timezone(timezone)
            .format(LAST_UPDATED_FORMAT)
            .to_string()
    })
}

pub struct TickerSynchronizer<S> {
    source: S,
    sort: Mutex<SortSpec>,
    display_tx: watch::Sender<DisplaySnapshot>,
    started_generation: AtomicU64,
    in_flight: AtomicUsize,
}

// Keeps `refreshing` true while any refresh is running, including when the
// refresh future is dropped mid-fetch.
struct RefreshingGuard<'a> {
    in_flight: &'a AtomicUsize,
    display_tx: &'a watch::Sender<DisplaySnapshot>,
}

impl<'a> RefreshingGuard<'a> {
    fn enter(in_flight: &'a AtomicUsize, display_tx: &'a watch::Sender<DisplaySnapshot>) -> Self {
        display_tx.send_modify(|snapshot| {
            in_flight.fetch_add(1, Ordering::SeqCst);
            snapshot.refreshing = true;
        });
        Self {
            in_flight,
            display_tx,
        }
    }
}

impl Drop for RefreshingGuard<'_> {
    fn drop(&mut self) {
        let in_flight = self.in_flight;
        self.display_tx.send_modify(|snapshot| {
            let remaining = in_flight.fetch_sub(1, Ordering::SeqCst) - 1;
            snapshot.refreshing = remaining > 0;
        });
    }
}

impl<S: TickerSource> TickerSynchronizer<S> {
    pub fn new(source: S, sort: SortSpec) -> Self {
        let (display_tx, _) = watch::channel(DisplaySnapshot::initial(sort));
        Self {
            source,
            sort: Mutex::new(sort),
            display_tx,
            started_generation: AtomicU64::new(0),
            in_flight: AtomicUsize::new(0),
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<DisplaySnapshot> {
        self.display_tx.subscribe()
    }

    pub fn snapshot(&self) -> DisplaySnapshot {
        self.display_tx.borrow().clone()
    }

    pub fn sort_spec(&self) -> SortSpec {
        *self.sort.lock()
    }

    pub fn is_refreshing(&self) -> bool {
        self.display_tx.borrow().refreshing
    }

    /// Fetches, sorts and publishes one cycle.
    ///
    /// Results are accepted in start order: a fetch that completes after a
    /// later-started one has already published is discarded.
    pub async fn refresh(&self, show_loading_state: bool) -> RefreshOutcome {
        if show_loading_state {
            self.display_tx.send_modify(|snapshot| {
                snapshot.list = ViewState::Loading;
                snapshot.banner = ViewState::Loading;
            });
        }

        let _refreshing = RefreshingGuard::enter(&self.in_flight, &self.display_tx);
        let generation = self.started_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let result = self.source.fetch().await;

        let sort = self.sort_spec();
        let update = match result {
            RefreshResult::Success {
                entries,
                server_timestamp,
            } => {
                let sorted: Arc<[_]> = sort_entries(&entries, sort).into();
                CycleUpdate::Loaded {
                    entries: sorted,
                    last_updated: format_server_timestamp(server_timestamp, &Local),
                }
            }
            RefreshResult::Empty => CycleUpdate::Empty,
            RefreshResult::Failure { message } => CycleUpdate::Failed(message),
        };

        let applied = self.display_tx.send_if_modified(|snapshot| {
            if generation < snapshot.generation {
                return false;
            }
            update.apply(snapshot);
            snapshot.generation = generation;
            true
        });

        if applied {
            tracing::debug!(generation, "refresh published");
            RefreshOutcome::Applied
        } else {
            tracing::debug!(generation, "discarding stale refresh result");
            RefreshOutcome::Stale
        }
    }

    /// Manual trigger from the renderer.
    pub async fn refresh_data(&self) -> RefreshOutcome {
        self.refresh(false).await
    }

    /// Applies the toggle/reset rule for `key` and re-fetches with the new
    /// spec. Each call costs a full network round-trip even though the
    /// published list could simply be re-sorted locally.
    pub async fn set_sort(&self, key: SortKey) -> SortSpec {
        let spec = {
            let mut sort = self.sort.lock();
            *sort = sort.select(key);
            *sort
        };
        self.display_tx.send_modify(|snapshot| snapshot.sort = spec);
        tracing::info!(key = key.as_str(), direction = ?spec.direction, "sort changed");

        self.refresh(false).await;
        spec
    }
}

enum CycleUpdate {
    Loaded {
        entries: Arc<[TickerEntry]>,
        last_updated: Option<String>,
    },
    Empty,
    Failed(String),
}

impl CycleUpdate {
    fn apply(self, snapshot: &mut DisplaySnapshot) {
        match self {
            Self::Loaded {
                entries,
                last_updated,
            } => {
                snapshot.last_updated = last_updated;
                snapshot.list = ViewState::Success(Arc::clone(&entries));
                snapshot.banner = ViewState::Success(entries);
            }
            Self::Empty => {
                snapshot.list = ViewState::Error(NO_DATA_MESSAGE.to_string());
                snapshot.banner = ViewState::Error(NO_DATA_MESSAGE.to_string());
            }
            Self::Failed(message) => {
                snapshot.list = ViewState::Error(message.clone());
                snapshot.banner = ViewState::Error(message);
                snapshot.last_updated = None;
            }
        }
    }
}

/// Owns the feed tasks. Dropping the handle cancels them; [`Self::shutdown`]
/// also waits for them to finish.
pub struct TickerFeedHandle {
    pub cancellation_token: CancellationToken,
    pub banner_rx: watch::Receiver<String>,
    refresh_task: JoinHandle<()>,
    banner_task: JoinHandle<()>,
}

impl TickerFeedHandle {
    pub async fn shutdown(mut self) {
        self.cancellation_token.cancel();
        let _ = (&mut self.refresh_task).await;
        let _ = (&mut self.banner_task).await;
    }
}

impl Drop for TickerFeedHandle {
    fn drop(&mut self) {
        self.cancellation_token.cancel();
    }
}

async fn run_refresh_loop<S: TickerSource>(
    sync: Arc<TickerSynchronizer<S>>,
    config: TickerFeedConfig,
    cancel_token: CancellationToken,
) {
    tokio::select! {
        _ = cancel_token.cancelled() => return,
        _ = sync.refresh(true) => {}
    }

    let period = config.refresh_interval();
    let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                tokio::select! {
                    _ = cancel_token.cancelled() => break,
                    _ = sync.refresh(false) => {}
                }
            }
        }
    }

    tracing::debug!("refresh loop stopped");
}

/// Starts the initial load, the periodic refresh and the banner rotation.
/// Both tasks stop when `cancel_token` is cancelled.
pub fn spawn_ticker_feed<S: TickerSource>(
    sync: Arc<TickerSynchronizer<S>>,
    config: &TickerFeedConfig,
    cancel_token: CancellationToken,
) -> TickerFeedHandle {
    tracing::info!(
        base_url = %config.base_url,
        refresh_interval_ms = config.refresh_interval_ms,
        "starting ticker feed"
    );

    let (label_tx, banner_rx) = watch::channel(DEFAULT_BANNER_LABEL.to_string());
    let banner_task = tokio::spawn(run_banner_rotation(
        sync.subscribe(),
        label_tx,
        config.banner_dwell(),
        cancel_token.clone(),
    ));
    let refresh_task = tokio::spawn(run_refresh_loop(
        sync,
        config.clone(),
        cancel_token.clone(),
    ));

    TickerFeedHandle {
        cancellation_token: cancel_token,
        banner_rx,
        refresh_task,
        banner_task,
    }
}
