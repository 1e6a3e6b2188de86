use crate::error::AppError;
use crate::state::{AppState, FeedSubscription};
use crate::ticker::display::TickerView;
use crate::ticker::types::{
    SortKey, SortSpec, StartTickerFeedArgs, TickerFeedConfig, TickerFeedSession,
};
use crate::ticker::{TICKER_BANNER_EVENT, TICKER_SNAPSHOT_EVENT};
use serde::Serialize;
use tauri::{AppHandle, Emitter, State};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerFeedStopResult {
    pub stopped: bool,
}

/// Starts (or restarts) the feed and forwards its updates to the webview.
pub async fn launch_feed(
    app: AppHandle,
    state: &AppState,
    config: TickerFeedConfig,
) -> Result<TickerFeedSession, AppError> {
    let (session, subscription) = state.start_feed(config).await?;
    tauri::async_runtime::spawn(forward_feed_events(app, subscription));
    Ok(session)
}

async fn forward_feed_events(app: AppHandle, subscription: FeedSubscription) {
    let FeedSubscription {
        mut display_rx,
        mut banner_rx,
        cancellation_token,
    } = subscription;

    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => break,
            changed = display_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = TickerView::from(display_rx.borrow_and_update().clone());
                if let Err(error) = app.emit(TICKER_SNAPSHOT_EVENT, &view) {
                    tracing::warn!(%error, "failed to emit ticker snapshot");
                }
            }
            changed = banner_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let label = banner_rx.borrow_and_update().clone();
                if let Err(error) = app.emit(TICKER_BANNER_EVENT, &label) {
                    tracing::warn!(%error, "failed to emit banner label");
                }
            }
        }
    }

    tracing::debug!("feed event forwarder stopped");
}

#[tauri::command]
pub async fn start_ticker_feed(
    app: AppHandle,
    state: State<'_, AppState>,
    args: Option<StartTickerFeedArgs>,
) -> Result<TickerFeedSession, AppError> {
    let config = args.unwrap_or_default().normalize()?;
    launch_feed(app, &state, config).await
}

#[tauri::command]
pub async fn stop_ticker_feed(
    state: State<'_, AppState>,
) -> Result<TickerFeedStopResult, AppError> {
    Ok(TickerFeedStopResult {
        stopped: state.stop_feed().await,
    })
}

#[tauri::command]
pub async fn refresh_data(state: State<'_, AppState>) -> Result<TickerView, AppError> {
    state.refresh_data().await
}

#[tauri::command]
pub async fn set_sort(state: State<'_, AppState>, key: SortKey) -> Result<SortSpec, AppError> {
    state.set_sort(key).await
}

#[tauri::command]
pub async fn ticker_snapshot(state: State<'_, AppState>) -> Result<TickerView, AppError> {
    state.view().await
}

#[tauri::command]
pub async fn banner_label(state: State<'_, AppState>) -> Result<String, AppError> {
    Ok(state.banner_label().await)
}
