use crate::ticker::numeric::format_compact;
use crate::ticker::types::{DisplaySnapshot, TickerEntry, DEFAULT_BANNER_LABEL};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Position of the marquee: which entry, and whether its volume half is next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BannerRotation {
    index: usize,
    show_volume: bool,
}

impl BannerRotation {
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Label for the current position, then moves on. Each entry shows its
    /// market cap then its volume before the next entry comes up.
    ///
    /// Returns `None` (and rewinds) when the position is out of range for
    /// `entries`.
    pub fn step(&mut self, entries: &[TickerEntry]) -> Option<String> {
        let Some(entry) = entries.get(self.index) else {
            self.reset();
            return None;
        };

        let label = if self.show_volume {
            format!(
                "{} VOL ${}",
                entry.symbol,
                format_compact(entry.volume24.as_deref().unwrap_or_default())
            )
        } else {
            format!(
                "{} CAP ${}",
                entry.symbol,
                format_compact(entry.market_cap_usd.as_deref().unwrap_or_default())
            )
        };

        self.show_volume = !self.show_volume;
        if !self.show_volume {
            self.index = (self.index + 1) % entries.len();
        }
        Some(label)
    }
}

fn same_list(lhs: &Option<Arc<[TickerEntry]>>, rhs: &Option<Arc<[TickerEntry]>>) -> bool {
    match (lhs, rhs) {
        (Some(lhs), Some(rhs)) => Arc::ptr_eq(lhs, rhs),
        (None, None) => true,
        _ => false,
    }
}

fn publish_label(label_tx: &watch::Sender<String>, label: String) {
    label_tx.send_if_modified(|current| {
        if *current == label {
            return false;
        }
        *current = label;
        true
    });
}

enum DwellOutcome {
    Elapsed,
    ListChanged,
    Stop,
}

// Waits out one dwell. Snapshot updates that keep the same banner list
// (refreshing flag, sort spec) do not cut the dwell short.
async fn dwell(
    display_rx: &mut watch::Receiver<DisplaySnapshot>,
    current: &Option<Arc<[TickerEntry]>>,
    duration: Duration,
    cancel_token: &CancellationToken,
) -> DwellOutcome {
    let deadline = Instant::now() + duration;
    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => return DwellOutcome::Stop,
            _ = tokio::time::sleep_until(deadline) => return DwellOutcome::Elapsed,
            changed = display_rx.changed() => {
                if changed.is_err() {
                    return DwellOutcome::Stop;
                }
                let latest = display_rx.borrow().banner.entries().cloned();
                if !same_list(current, &latest) {
                    return DwellOutcome::ListChanged;
                }
            }
        }
    }
}

/// Drives the banner label until cancelled or the display channel closes.
///
/// The position carries over when the banner list is replaced, so periodic
/// refreshes do not keep the marquee on the first entries. A position past
/// the end of a shorter list shows the default label for one dwell and then
/// starts over. Without a non-empty list the default label is held and the
/// list is checked again after each dwell.
pub async fn run_banner_rotation(
    mut display_rx: watch::Receiver<DisplaySnapshot>,
    label_tx: watch::Sender<String>,
    dwell_duration: Duration,
    cancel_token: CancellationToken,
) {
    let mut rotation = BannerRotation::default();

    while !cancel_token.is_cancelled() {
        let current = display_rx.borrow_and_update().banner.entries().cloned();

        let label = match current.as_deref() {
            Some(entries) if !entries.is_empty() => rotation.step(entries).unwrap_or_else(|| {
                tracing::warn!(len = entries.len(), "banner position out of range, rewinding");
                DEFAULT_BANNER_LABEL.to_string()
            }),
            _ => DEFAULT_BANNER_LABEL.to_string(),
        };
        publish_label(&label_tx, label);

        match dwell(&mut display_rx, &current, dwell_duration, &cancel_token).await {
            DwellOutcome::Elapsed | DwellOutcome::ListChanged => {}
            DwellOutcome::Stop => break,
        }
    }

    tracing::debug!("banner rotation stopped");
}
