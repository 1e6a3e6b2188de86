use crate::error::AppError;
use crate::ticker::types::{RefreshResult, TickerFeedConfig, TickerSnapshot, TickersResponseWire};
use reqwest::Client;
use std::future::Future;

const TICKERS_PATH: &str = "/api/tickers/";
const USER_AGENT: &str = concat!("ticker-terminal/", env!("CARGO_PKG_VERSION"));

/// Anything that can produce one full ticker snapshot per call.
///
/// Implementations must not fail: transport and decode problems are reported
/// through [`RefreshResult::Failure`].
pub trait TickerSource: Send + Sync + 'static {
    fn fetch(&self) -> impl Future<Output = RefreshResult> + Send;
}

fn tickers_endpoint(base_url: &str) -> String {
    format!("{}{TICKERS_PATH}", base_url.trim_end_matches('/'))
}

pub fn decode_tickers_payload(payload: &mut [u8]) -> Result<TickerSnapshot, AppError> {
    let wire: TickersResponseWire = simd_json::serde::from_slice(payload)?;
    Ok(wire.into())
}

pub struct CoinloreSource {
    client: Client,
    endpoint: String,
}

impl CoinloreSource {
    pub fn new(config: &TickerFeedConfig) -> Result<Self, AppError> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout())
            .timeout(config.request_timeout())
            .user_agent(USER_AGENT)
            .build()?;

        Ok(Self {
            client,
            endpoint: tickers_endpoint(&config.base_url),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub async fn fetch_snapshot(&self) -> Result<TickerSnapshot, AppError> {
        let response = self
            .client
            .get(&self.endpoint)
            .send()
            .await?
            .error_for_status()?;
        let mut payload = response.bytes().await?.to_vec();
        decode_tickers_payload(&mut payload)
    }
}

impl TickerSource for CoinloreSource {
    async fn fetch(&self) -> RefreshResult {
        match self.fetch_snapshot().await {
            Ok(snapshot) => {
                tracing::debug!(
                    entries = snapshot.entries.len(),
                    server_timestamp = snapshot.server_timestamp,
                    "fetched ticker snapshot"
                );
                snapshot.into()
            }
            Err(error) => {
                tracing::warn!(endpoint = %self.endpoint, %error, "ticker fetch failed");
                RefreshResult::Failure {
                    message: error.to_string(),
                }
            }
        }
    }
}
