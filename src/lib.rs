pub mod commands;
pub mod error;
pub mod state;
pub mod telemetry;
pub mod ticker;

#[cfg(feature = "desktop")]
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    use commands::{
        health::health,
        ticker_feed::{
            banner_label, launch_feed, refresh_data, set_sort, start_ticker_feed,
            stop_ticker_feed, ticker_snapshot,
        },
    };
    use state::AppState;
    use tauri::Manager;
    use ticker::types::TickerFeedConfig;

    telemetry::init_tracing(telemetry::DEFAULT_LOG_FILTER);

    tauri::Builder::default()
        .setup(|app| {
            app.manage(AppState::new());
            let app_handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                let state = app_handle.state::<AppState>();
                if let Err(error) =
                    launch_feed(app_handle.clone(), &state, TickerFeedConfig::default()).await
                {
                    tracing::error!(%error, "failed to start ticker feed");
                }
            });
            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            health,
            start_ticker_feed,
            stop_ticker_feed,
            refresh_data,
            set_sort,
            ticker_snapshot,
            banner_label
        ])
        .run(tauri::generate_context!())
        .unwrap_or_else(|error| {
            tracing::error!(%error, "error while running tauri application");
            std::process::exit(1);
        });
}
