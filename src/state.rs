use crate::error::AppError;
use crate::ticker::coinlore::CoinloreSource;
use crate::ticker::display::TickerView;
use crate::ticker::sync::{spawn_ticker_feed, TickerFeedHandle, TickerSynchronizer};
use crate::ticker::types::{
    DisplaySnapshot, SortKey, SortSpec, TickerFeedConfig, TickerFeedSession, DEFAULT_BANNER_LABEL,
};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;

pub type CoinloreSynchronizer = TickerSynchronizer<CoinloreSource>;

pub struct RunningFeed {
    pub config: TickerFeedConfig,
    pub sync: Arc<CoinloreSynchronizer>,
    pub handle: TickerFeedHandle,
}

/// Receivers handed to whoever pushes feed updates to the renderer.
pub struct FeedSubscription {
    pub display_rx: watch::Receiver<DisplaySnapshot>,
    pub banner_rx: watch::Receiver<String>,
    pub cancellation_token: CancellationToken,
}

async fn shutdown_feed(feed: RunningFeed) {
    feed.handle.shutdown().await;
    tracing::info!(base_url = %feed.config.base_url, "ticker feed stopped");
}

pub struct AppState {
    pub started_at: Instant,
    feed: Mutex<Option<RunningFeed>>,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            feed: Mutex::new(None),
        }
    }

    /// Starts a feed with `config`, replacing (and joining) any running one.
    ///
    /// The slot stays locked from shutdown of the old feed to storing the new
    /// one, so concurrent starts are serialized and only one feed survives.
    pub async fn start_feed(
        &self,
        config: TickerFeedConfig,
    ) -> Result<(TickerFeedSession, FeedSubscription), AppError> {
        let source = CoinloreSource::new(&config)?;

        let mut feed_slot = self.feed.lock().await;
        if let Some(previous) = feed_slot.take() {
            shutdown_feed(previous).await;
        }

        let sync = Arc::new(TickerSynchronizer::new(source, config.initial_sort));
        let handle = spawn_ticker_feed(Arc::clone(&sync), &config, CancellationToken::new());
        let subscription = FeedSubscription {
            display_rx: sync.subscribe(),
            banner_rx: handle.banner_rx.clone(),
            cancellation_token: handle.cancellation_token.clone(),
        };
        let session = TickerFeedSession::from_config(&config);
        *feed_slot = Some(RunningFeed {
            config,
            sync,
            handle,
        });

        Ok((session, subscription))
    }

    pub async fn stop_feed(&self) -> bool {
        let mut feed_slot = self.feed.lock().await;
        match feed_slot.take() {
            Some(feed) => {
                shutdown_feed(feed).await;
                true
            }
            None => false,
        }
    }

    pub async fn is_running(&self) -> bool {
        self.feed.lock().await.is_some()
    }

    async fn running_sync(&self) -> Result<Arc<CoinloreSynchronizer>, AppError> {
        let feed_slot = self.feed.lock().await;
        feed_slot
            .as_ref()
            .map(|feed| Arc::clone(&feed.sync))
            .ok_or(AppError::FeedNotRunning)
    }

    pub async fn refresh_data(&self) -> Result<TickerView, AppError> {
        let sync = self.running_sync().await?;
        sync.refresh_data().await;
        Ok(sync.snapshot().into())
    }

    pub async fn set_sort(&self, key: SortKey) -> Result<SortSpec, AppError> {
        let sync = self.running_sync().await?;
        Ok(sync.set_sort(key).await)
    }

    pub async fn snapshot(&self) -> Result<DisplaySnapshot, AppError> {
        Ok(self.running_sync().await?.snapshot())
    }

    pub async fn view(&self) -> Result<TickerView, AppError> {
        self.snapshot().await.map(TickerView::from)
    }

    pub async fn banner_label(&self) -> String {
        let feed_slot = self.feed.lock().await;
        feed_slot
            .as_ref()
            .map(|feed| feed.handle.banner_rx.borrow().clone())
            .unwrap_or_else(|| DEFAULT_BANNER_LABEL.to_string())
    }

    pub async fn is_refreshing(&self) -> bool {
        match self.running_sync().await {
            Ok(sync) => sync.is_refreshing(),
            Err(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ticker::numeric::ChangeDirection;
    use crate::ticker::types::{SortDirection, ViewState};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    const TICKERS_BODY: &str = r#"{"data":[
        {"id":"48543","symbol":"SHIB","name":"Shiba Inu","rank":2,"price_usd":"0.0000432",
         "percent_change_24h":"-3.10","percent_change_1h":"0.20","percent_change_7d":"",
         "market_cap_usd":"25400000000","volume24":"410000000"},
        {"id":"90","symbol":"BTC","name":"Bitcoin","rank":1,"price_usd":"67000.5",
         "percent_change_24h":"1.10","percent_change_1h":"0.05","percent_change_7d":"-2.30",
         "market_cap_usd":"1320000000000.00","volume24":28500000000.5}
    ],"info":{"coins_num":2,"time":1735689600}}"#;

    // Answers every connection with the same tickers payload.
    async fn serve_tickers() -> TickerFeedConfig {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("listener should have address");

        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let mut request = vec![0_u8; 4096];
                let _ = socket.read(&mut request).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{TICKERS_BODY}",
                    TICKERS_BODY.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            }
        });

        TickerFeedConfig {
            base_url: format!("http://{address}"),
            connect_timeout_ms: 2_000,
            request_timeout_ms: 5_000,
            ..TickerFeedConfig::default()
        }
    }

    async fn unreachable_config() -> TickerFeedConfig {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("listener should bind");
        let address = listener.local_addr().expect("listener should have address");
        drop(listener);

        TickerFeedConfig {
            base_url: format!("http://{address}"),
            connect_timeout_ms: 1_000,
            request_timeout_ms: 1_000,
            ..TickerFeedConfig::default()
        }
    }

    #[tokio::test]
    async fn commands_fail_while_feed_is_stopped() {
        let state = AppState::new();

        assert!(!state.is_running().await);
        assert!(matches!(
            state.refresh_data().await,
            Err(AppError::FeedNotRunning)
        ));
        assert!(matches!(
            state.set_sort(SortKey::Change7d).await,
            Err(AppError::FeedNotRunning)
        ));
        assert_eq!(state.banner_label().await, DEFAULT_BANNER_LABEL);
        assert!(!state.stop_feed().await);
    }

    #[tokio::test]
    async fn unreachable_endpoint_surfaces_error_state() {
        let state = AppState::new();
        let (session, mut subscription) = state
            .start_feed(unreachable_config().await)
            .await
            .expect("feed should start");
        assert!(session.running);

        let snapshot = subscription
            .display_rx
            .wait_for(|snapshot| snapshot.generation == 1)
            .await
            .expect("initial load should publish")
            .clone();
        assert!(matches!(snapshot.list, ViewState::Error(_)));
        assert!(matches!(snapshot.banner, ViewState::Error(_)));
        assert_eq!(snapshot.last_updated, None);

        let refreshed = state.refresh_data().await.expect("feed is running");
        assert_eq!(refreshed.snapshot.generation, 2);
        assert!(!refreshed.snapshot.refreshing);
        assert!(refreshed.rows.is_empty());
        assert!(!state.is_refreshing().await);

        let spec = state
            .set_sort(SortKey::MarketCap)
            .await
            .expect("feed is running");
        assert_eq!(spec.direction, SortDirection::Ascending);

        assert!(state.stop_feed().await);
        assert!(subscription.cancellation_token.is_cancelled());
        assert!(!state.is_running().await);
    }

    #[tokio::test]
    async fn restarting_cancels_previous_feed() {
        let state = AppState::new();
        let (_, first) = state
            .start_feed(unreachable_config().await)
            .await
            .expect("feed should start");
        let (_, second) = state
            .start_feed(unreachable_config().await)
            .await
            .expect("feed should restart");

        assert!(first.cancellation_token.is_cancelled());
        assert!(!second.cancellation_token.is_cancelled());
        assert!(state.stop_feed().await);
    }

    #[tokio::test]
    async fn concurrent_starts_leave_a_single_feed() {
        let state = Arc::new(AppState::new());

        for _ in 0..20 {
            let first = tokio::spawn({
                let state = Arc::clone(&state);
                let config = unreachable_config().await;
                async move { state.start_feed(config).await }
            });
            let second = tokio::spawn({
                let state = Arc::clone(&state);
                let config = unreachable_config().await;
                async move { state.start_feed(config).await }
            });

            let (_, first) = first
                .await
                .expect("start task should finish")
                .expect("feed should start");
            let (_, second) = second
                .await
                .expect("start task should finish")
                .expect("feed should start");

            let survivors = [&first, &second]
                .iter()
                .filter(|subscription| !subscription.cancellation_token.is_cancelled())
                .count();
            assert_eq!(survivors, 1);

            assert!(state.stop_feed().await);
            assert!(first.cancellation_token.is_cancelled());
            assert!(second.cancellation_token.is_cancelled());
        }
    }

    #[tokio::test]
    async fn view_carries_formatted_rows_in_list_order() {
        let state = AppState::new();
        let (_, mut subscription) = state
            .start_feed(serve_tickers().await)
            .await
            .expect("feed should start");
        subscription
            .display_rx
            .wait_for(|snapshot| snapshot.generation == 1)
            .await
            .expect("initial load should publish");

        let view = state.view().await.expect("feed is running");

        let symbols: Vec<&str> = view.rows.iter().map(|row| row.symbol.as_str()).collect();
        assert_eq!(symbols, vec!["BTC", "SHIB"]);
        assert_eq!(view.rows[0].price, "67,000.50");
        assert_eq!(view.rows[0].market_cap_compact, "1.32T");
        assert_eq!(view.rows[1].price, "0.0000432");
        assert_eq!(view.rows[1].change_24h.direction, ChangeDirection::Down);
        assert_eq!(view.rows[1].change_7d.value, "N/A");
        assert_eq!(view.rows[1].icon_path, "downloaded_icons/SHIB.png");

        assert!(state.stop_feed().await);
    }
}
