use serde::Serialize;
use std::time::Instant;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_ms: u128,
    pub feed: &'static str,
    pub refreshing: bool,
}

pub fn build_health_response(
    started_at: Instant,
    feed_running: bool,
    refreshing: bool,
) -> HealthResponse {
    HealthResponse {
        status: "ok",
        uptime_ms: started_at.elapsed().as_millis(),
        feed: if feed_running { "running" } else { "stopped" },
        refreshing,
    }
}

#[cfg(feature = "desktop")]
#[tauri::command]
pub async fn health(
    state: tauri::State<'_, crate::state::AppState>,
) -> Result<HealthResponse, crate::error::AppError> {
    Ok(build_health_response(
        state.started_at,
        state.is_running().await,
        state.is_refreshing().await,
    ))
}
