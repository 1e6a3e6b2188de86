use crate::error::AppError;
use serde::{Deserialize, Deserializer, Serialize};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "https://api.coinlore.com";
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 120_000;
pub const DEFAULT_BANNER_DWELL_MS: u64 = 2_000;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 30_000;
pub const MIN_REFRESH_INTERVAL_MS: u64 = 5_000;
pub const MAX_REFRESH_INTERVAL_MS: u64 = 3_600_000;
pub const MIN_BANNER_DWELL_MS: u64 = 250;
pub const MAX_BANNER_DWELL_MS: u64 = 60_000;
pub const MIN_TIMEOUT_MS: u64 = 1_000;
pub const MAX_TIMEOUT_MS: u64 = 120_000;

pub const NO_DATA_MESSAGE: &str = "No data available";
pub const DEFAULT_BANNER_LABEL: &str = "CRYPTO TERMINAL";
pub const LAST_UPDATED_FORMAT: &str = "%d/%m/%Y %H:%M:%S";

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SortKey {
    #[serde(rename = "market_cap")]
    MarketCap,
    #[serde(rename = "change_1h")]
    Change1h,
    #[serde(rename = "change_24h")]
    Change24h,
    #[serde(rename = "change_7d")]
    Change7d,
}

impl SortKey {
    pub const ALL: [SortKey; 4] = [
        Self::MarketCap,
        Self::Change1h,
        Self::Change24h,
        Self::Change7d,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::MarketCap => "market_cap",
            Self::Change1h => "change_1h",
            Self::Change24h => "change_24h",
            Self::Change7d => "change_7d",
        }
    }

    pub fn parse_str(value: &str) -> Result<Self, AppError> {
        let normalized = value.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|key| key.as_str() == normalized)
            .ok_or_else(|| AppError::InvalidArgument(format!("unknown sort key '{value}'")))
    }

    /// Raw text of the field this key orders by.
    pub fn field(self, entry: &TickerEntry) -> Option<&str> {
        match self {
            Self::MarketCap => entry.market_cap_usd.as_deref(),
            Self::Change1h => entry.percent_change_1h.as_deref(),
            Self::Change24h => entry.percent_change_24h.as_deref(),
            Self::Change7d => entry.percent_change_7d.as_deref(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn toggled(self) -> Self {
        match self {
            Self::Ascending => Self::Descending,
            Self::Descending => Self::Ascending,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            key: SortKey::MarketCap,
            direction: SortDirection::Descending,
        }
    }
}

impl SortSpec {
    /// Spec after the user picks `key`: same key flips the direction, a new
    /// key starts descending.
    pub fn select(self, key: SortKey) -> Self {
        if self.key == key {
            Self {
                key,
                direction: self.direction.toggled(),
            }
        } else {
            Self {
                key,
                direction: SortDirection::Descending,
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TickerEntry {
    pub id: String,
    pub name: String,
    pub symbol: String,
    pub rank: u32,
    pub price_usd: Option<String>,
    pub percent_change_1h: Option<String>,
    pub percent_change_24h: Option<String>,
    pub percent_change_7d: Option<String>,
    pub market_cap_usd: Option<String>,
    pub volume24: Option<String>,
    pub csupply: Option<String>,
    pub tsupply: Option<String>,
    pub msupply: Option<String>,
}

/// Coinlore sends most numbers as text but a few (notably `volume24`) as
/// bare JSON numbers, and the shape varies between coins.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TextOrNumberWire {
    Text(String),
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl TextOrNumberWire {
    pub fn into_text(self) -> String {
        match self {
            Self::Text(value) => value,
            Self::Unsigned(value) => value.to_string(),
            Self::Signed(value) => value.to_string(),
            Self::Float(value) => value.to_string(),
        }
    }
}

fn deserialize_rank<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<TextOrNumberWire>::deserialize(deserializer)?;
    Ok(raw
        .map(TextOrNumberWire::into_text)
        .and_then(|text| text.trim().parse::<u32>().ok())
        .unwrap_or_default())
}

#[derive(Debug, Deserialize)]
pub struct TickerEntryWire {
    pub id: TextOrNumberWire,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub symbol: String,
    #[serde(default, deserialize_with = "deserialize_rank")]
    pub rank: u32,
    #[serde(default)]
    pub price_usd: Option<TextOrNumberWire>,
    #[serde(default)]
    pub percent_change_1h: Option<TextOrNumberWire>,
    #[serde(default)]
    pub percent_change_24h: Option<TextOrNumberWire>,
    #[serde(default)]
    pub percent_change_7d: Option<TextOrNumberWire>,
    #[serde(default)]
    pub market_cap_usd: Option<TextOrNumberWire>,
    #[serde(default)]
    pub volume24: Option<TextOrNumberWire>,
    #[serde(default)]
    pub csupply: Option<TextOrNumberWire>,
    #[serde(default)]
    pub tsupply: Option<TextOrNumberWire>,
    #[serde(default)]
    pub msupply: Option<TextOrNumberWire>,
}

impl From<TickerEntryWire> for TickerEntry {
    fn from(value: TickerEntryWire) -> Self {
        let text = |field: Option<TextOrNumberWire>| field.map(TextOrNumberWire::into_text);
        Self {
            id: value.id.into_text(),
            name: value.name,
            symbol: value.symbol,
            rank: value.rank,
            price_usd: text(value.price_usd),
            percent_change_1h: text(value.percent_change_1h),
            percent_change_24h: text(value.percent_change_24h),
            percent_change_7d: text(value.percent_change_7d),
            market_cap_usd: text(value.market_cap_usd),
            volume24: text(value.volume24),
            csupply: text(value.csupply),
            tsupply: text(value.tsupply),
            msupply: text(value.msupply),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TickersInfoWire {
    #[serde(default)]
    pub coins_num: Option<u64>,
    pub time: i64,
}

#[derive(Debug, Deserialize)]
pub struct TickersResponseWire {
    #[serde(default)]
    pub data: Vec<TickerEntryWire>,
    pub info: TickersInfoWire,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerSnapshot {
    pub entries: Vec<TickerEntry>,
    pub server_timestamp: i64,
}

impl From<TickersResponseWire> for TickerSnapshot {
    fn from(value: TickersResponseWire) -> Self {
        Self {
            entries: value.data.into_iter().map(TickerEntry::from).collect(),
            server_timestamp: value.info.time,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RefreshResult {
    Success {
        entries: Vec<TickerEntry>,
        server_timestamp: i64,
    },
    Empty,
    Failure {
        message: String,
    },
}

impl From<TickerSnapshot> for RefreshResult {
    fn from(value: TickerSnapshot) -> Self {
        if value.entries.is_empty() {
            Self::Empty
        } else {
            Self::Success {
                entries: value.entries,
                server_timestamp: value.server_timestamp,
            }
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(tag = "state", content = "data", rename_all = "lowercase")]
pub enum ViewState {
    Loading,
    Success(Arc<[TickerEntry]>),
    Error(String),
}

impl ViewState {
    pub fn entries(&self) -> Option<&Arc<[TickerEntry]>> {
        match self {
            Self::Success(entries) => Some(entries),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DisplaySnapshot {
    pub list: ViewState,
    pub banner: ViewState,
    pub last_updated: Option<String>,
    pub sort: SortSpec,
    pub refreshing: bool,
    pub generation: u64,
}

impl DisplaySnapshot {
    pub fn initial(sort: SortSpec) -> Self {
        Self {
            list: ViewState::Loading,
            banner: ViewState::Loading,
            last_updated: None,
            sort,
            refreshing: false,
            generation: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StartTickerFeedArgs {
    pub base_url: Option<String>,
    pub refresh_interval_ms: Option<u64>,
    pub banner_dwell_ms: Option<u64>,
    pub connect_timeout_ms: Option<u64>,
    pub request_timeout_ms: Option<u64>,
    pub initial_sort: Option<SortSpec>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TickerFeedConfig {
    pub base_url: String,
    pub refresh_interval_ms: u64,
    pub banner_dwell_ms: u64,
    pub connect_timeout_ms: u64,
    pub request_timeout_ms: u64,
    pub initial_sort: SortSpec,
}

impl Default for TickerFeedConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            banner_dwell_ms: DEFAULT_BANNER_DWELL_MS,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
            initial_sort: SortSpec::default(),
        }
    }
}

impl TickerFeedConfig {
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    pub fn banner_dwell(&self) -> Duration {
        Duration::from_millis(self.banner_dwell_ms)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerFeedSession {
    pub running: bool,
    pub base_url: String,
    pub refresh_interval_ms: u64,
    pub banner_dwell_ms: u64,
    pub sort: SortSpec,
}

impl TickerFeedSession {
    pub fn from_config(config: &TickerFeedConfig) -> Self {
        Self {
            running: true,
            base_url: config.base_url.clone(),
            refresh_interval_ms: config.refresh_interval_ms,
            banner_dwell_ms: config.banner_dwell_ms,
            sort: config.initial_sort,
        }
    }
}

fn check_range(name: &str, value: u64, min: u64, max: u64) -> Result<u64, AppError> {
    if !(min..=max).contains(&value) {
        return Err(AppError::InvalidArgument(format!(
            "{name} must be between {min} and {max}"
        )));
    }
    Ok(value)
}

impl StartTickerFeedArgs {
    pub fn normalize(self) -> Result<TickerFeedConfig, AppError> {
        let base_url = self
            .base_url
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string())
            .trim()
            .trim_end_matches('/')
            .to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(AppError::InvalidArgument(
                "baseUrl must use http or https".to_string(),
            ));
        }

        let refresh_interval_ms = check_range(
            "refreshIntervalMs",
            self.refresh_interval_ms
                .unwrap_or(DEFAULT_REFRESH_INTERVAL_MS),
            MIN_REFRESH_INTERVAL_MS,
            MAX_REFRESH_INTERVAL_MS,
        )?;
        let banner_dwell_ms = check_range(
            "bannerDwellMs",
            self.banner_dwell_ms.unwrap_or(DEFAULT_BANNER_DWELL_MS),
            MIN_BANNER_DWELL_MS,
            MAX_BANNER_DWELL_MS,
        )?;
        let connect_timeout_ms = check_range(
            "connectTimeoutMs",
            self.connect_timeout_ms.unwrap_or(DEFAULT_CONNECT_TIMEOUT_MS),
            MIN_TIMEOUT_MS,
            MAX_TIMEOUT_MS,
        )?;
        let request_timeout_ms = check_range(
            "requestTimeoutMs",
            self.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS),
            MIN_TIMEOUT_MS,
            MAX_TIMEOUT_MS,
        )?;

        Ok(TickerFeedConfig {
            base_url,
            refresh_interval_ms,
            banner_dwell_ms,
            connect_timeout_ms,
            request_timeout_ms,
            initial_sort: self.initial_sort.unwrap_or_default(),
        })
    }
}
